//! Process-wide event bus
//!
//! Producers post an event as a `(topic, kind)` pair with a small payload. The payload is serialized
//! with postcard into a fixed size buffer, so posting never allocates and the interrupt-safe path
//! can be used directly from an interrupt handler.
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration};
use heapless::Vec;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Maximum serialized payload length in bytes
pub const MAX_PAYLOAD_LEN: usize = 16;

/// Number of envelopes the bus can hold before producers have to wait
pub const BUS_DEPTH: usize = 8;

/// Event source identifier
pub type Topic = &'static str;

/// Event identifier within a topic
pub type Kind = u16;

/// Event bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The bus had no capacity before the timeout elapsed
    Timeout,
    /// The bus had no capacity and the caller cannot wait
    Full,
    /// The payload could not be serialized into the payload buffer
    Encode,
    /// The payload is not a valid encoding of the requested type
    Decode,
}

/// A posted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Event source
    pub topic: Topic,
    /// Event kind
    pub kind: Kind,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl Envelope {
    /// Build an envelope, serializing `data` as its payload
    pub fn new<T: Serialize>(topic: Topic, kind: Kind, data: &T) -> Result<Self, Error> {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let used = postcard::to_slice(data, &mut buf).map_err(|_| Error::Encode)?;
        let payload = Vec::from_slice(used).map_err(|_| Error::Encode)?;

        Ok(Self { topic, kind, payload })
    }

    /// Returns true if this envelope carries the given topic and kind
    pub fn is(&self, topic: Topic, kind: Kind) -> bool {
        self.topic == topic && self.kind == kind
    }

    /// Raw serialized payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Deserialize the payload as `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        postcard::from_bytes(&self.payload).map_err(|_| Error::Decode)
    }
}

/// Multi-producer event bus
pub struct EventBus {
    channel: Channel<CriticalSectionRawMutex, Envelope, BUS_DEPTH>,
}

impl EventBus {
    /// Create a new, empty bus
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Post an event from task context
    ///
    /// Waits for capacity on the bus, for at most `timeout` if one is given.
    pub async fn post<T: Serialize>(
        &self,
        topic: Topic,
        kind: Kind,
        data: &T,
        timeout: Option<Duration>,
    ) -> Result<(), Error> {
        let envelope = Envelope::new(topic, kind, data)?;

        match timeout {
            Some(timeout) => with_timeout(timeout, self.channel.send(envelope))
                .await
                .map_err(|_| Error::Timeout),
            None => {
                self.channel.send(envelope).await;
                Ok(())
            }
        }
    }

    /// Post an event from interrupt context
    ///
    /// Never waits. Returns `Ok(true)` if the bus was empty before this post, in which case a receiver
    /// may have been blocked on it and is now runnable.
    pub fn post_from_isr<T: Serialize>(&self, topic: Topic, kind: Kind, data: &T) -> Result<bool, Error> {
        let envelope = Envelope::new(topic, kind, data)?;
        let was_empty = self.channel.is_empty();

        self.channel.try_send(envelope).map_err(|_| Error::Full)?;
        Ok(was_empty)
    }

    /// Wait for the next event
    pub async fn receive(&self) -> Envelope {
        self.channel.receive().await
    }

    /// Take the next event if one is queued
    pub fn try_receive(&self) -> Option<Envelope> {
        self.channel.try_receive().ok()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Returns true if no event is queued
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
