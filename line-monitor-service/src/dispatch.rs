//! Event delivery
//!
//! Delivery from interrupt context goes through the non-blocking primitives of the bus and group and
//! happens inside the sampling call. Delivery from task context may wait for bus capacity, so it is
//! handed back to the caller as an [`Update`] and performed once the caller has released whatever
//! protects the monitor.
use embassy_time::Duration;
use embedded_services::event_bus::{EventBus, Kind};
use embedded_services::event_group::EventGroup;
use embedded_services::{trace, warn};

use crate::config::{BusRoute, GroupBits};
use crate::event::{LineState, Press, Transition};

/// Where a monitor delivers its events
#[derive(Clone, Copy, Default)]
pub enum DispatchTarget {
    /// Events only reach the callback
    #[default]
    None,
    /// Post one bus message per event
    Bus {
        /// Bus to post to
        bus: &'static EventBus,
        /// Topic and kinds
        route: BusRoute,
    },
    /// Set event group bits
    Group {
        /// Group to set bits on
        group: &'static EventGroup,
        /// Bits per event
        bits: GroupBits,
    },
}

impl BusRoute {
    fn kinds(&self, transition: &Transition) -> impl Iterator<Item = Kind> {
        let press = transition.press.map(|press| match press {
            Press::Short => self.press,
            Press::Long => self.long_press,
        });
        core::iter::once(self.change).chain(press)
    }
}

impl GroupBits {
    /// Bits to set for a transition
    pub fn mask(&self, transition: &Transition) -> u32 {
        let level = if transition.data.active { self.on } else { self.off };
        let press = match transition.press {
            Some(Press::Short) => self.press,
            Some(Press::Long) => self.long_press,
            None => 0,
        };
        level | press
    }
}

impl DispatchTarget {
    /// Deliver from interrupt context, returns true if a waiting task was made runnable
    pub(crate) fn deliver_from_isr(&self, transition: &Transition) -> bool {
        match *self {
            DispatchTarget::None => false,
            DispatchTarget::Bus { bus, route } => {
                let mut woken = false;
                for kind in route.kinds(transition) {
                    match bus.post_from_isr(route.topic, kind, &transition.data) {
                        Ok(w) => woken |= w,
                        Err(e) => warn!("Pin {}: dropped event {} from interrupt: {:?}", transition.data.pin, kind, e),
                    }
                }
                woken
            }
            DispatchTarget::Group { group, bits } => {
                let mask = bits.mask(transition);
                mask != 0 && group.set_bits_from_isr(mask)
            }
        }
    }

    /// Deliver from task context
    pub(crate) async fn deliver(&self, transition: &Transition, timeout: Option<Duration>) {
        match *self {
            DispatchTarget::None => {}
            DispatchTarget::Bus { bus, route } => {
                for kind in route.kinds(transition) {
                    if let Err(e) = bus.post(route.topic, kind, &transition.data, timeout).await {
                        warn!("Pin {}: failed to post event {}: {:?}", transition.data.pin, kind, e);
                    }
                }
            }
            DispatchTarget::Group { group, bits } => {
                let mask = bits.mask(transition);
                if mask != 0 {
                    group.set_bits(mask);
                }
            }
        }
    }
}

struct Pending {
    target: DispatchTarget,
    timeout: Option<Duration>,
    transition: Transition,
}

/// Result of a task context sample
#[must_use = "events are only delivered by `Update::dispatch`"]
pub struct Update {
    state: LineState,
    pending: Option<Pending>,
}

impl Update {
    pub(crate) fn new(
        state: LineState,
        transition: Option<Transition>,
        target: DispatchTarget,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            state,
            pending: transition.map(|transition| Pending {
                target,
                timeout,
                transition,
            }),
        }
    }

    /// State after the sample
    pub fn state(&self) -> LineState {
        self.state
    }

    /// The logical change observed by the sample, if any
    pub fn transition(&self) -> Option<&Transition> {
        self.pending.as_ref().map(|pending| &pending.transition)
    }

    /// Deliver the pending events, returns the sampled state
    pub async fn dispatch(self) -> LineState {
        if let Some(pending) = self.pending {
            trace!("Pin {}: delivering from task context", pending.transition.data.pin);
            pending.target.deliver(&pending.transition, pending.timeout).await;
        }
        self.state
    }
}
