//! Hardware collaborators of a line monitor
//!
//! The monitor drives the pin, the one-shot timer and the clock only through these traits. Platform
//! crates implement them over their GPIO and timer drivers.
use embassy_time::Duration;
use embedded_hal::digital::InputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Pull resistor configuration of an input
pub enum Pull {
    /// Floating input
    None,
    /// Pull-up resistor
    Up,
    /// Pull-down resistor
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Edge selection for line interrupts
pub enum Edge {
    /// Low to high transitions
    Rising,
    /// High to low transitions
    Falling,
    /// Both transitions
    Any,
}

/// An input pin with an edge interrupt source
///
/// `attach_handler` routes the pin's interrupt to the monitor's `on_interrupt`, how that routing is
/// done is up to the platform. The interrupt source itself is masked and unmasked with
/// `disable_interrupt` and `enable_interrupt`.
pub trait LinePin: InputPin {
    /// Configure the pin as an input with the given pull
    fn configure_input(&mut self, pull: Pull) -> Result<(), Self::Error>;

    /// Change the pull resistor of an already configured input
    fn set_pull(&mut self, pull: Pull) -> Result<(), Self::Error>;

    /// Select which edges raise the interrupt
    fn set_interrupt_type(&mut self, edge: Edge) -> Result<(), Self::Error>;

    /// Register the interrupt handler for this pin
    fn attach_handler(&mut self) -> Result<(), Self::Error>;

    /// Remove the interrupt handler for this pin, removing an absent handler is a no-op
    fn detach_handler(&mut self);

    /// Unmask the interrupt source
    fn enable_interrupt(&mut self) -> Result<(), Self::Error>;

    /// Mask the interrupt source
    fn disable_interrupt(&mut self) -> Result<(), Self::Error>;
}

/// One-shot deferred timer
///
/// Expiry must be delivered in task context, never from the interrupt that armed it. Dropping the
/// timer releases it.
pub trait OneShotTimer {
    /// Arm error
    type Error;

    /// Arm the timer to expire once after `delay`
    fn start_once(&mut self, delay: Duration) -> Result<(), Self::Error>;

    /// Disarm the timer, stopping an idle timer is a no-op
    fn stop(&mut self);

    /// Returns true while the timer is armed
    fn is_active(&self) -> bool;
}

/// Allocator of one-shot timers
pub trait TimerService {
    /// Timer type handed out by this service
    type Timer: OneShotTimer;
    /// Allocation error
    type Error;

    /// Allocate a timer
    fn create(&mut self) -> Result<Self::Timer, Self::Error>;
}

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point
    fn now_millis(&self) -> u64;
}

/// Timer type for lines that are never debounced
#[derive(Debug)]
pub enum NoTimer {}

impl OneShotTimer for NoTimer {
    type Error = core::convert::Infallible;

    fn start_once(&mut self, _delay: Duration) -> Result<(), Self::Error> {
        match *self {}
    }

    fn stop(&mut self) {
        match *self {}
    }

    fn is_active(&self) -> bool {
        match *self {}
    }
}

/// Timer service for lines that are never debounced, every allocation fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTimers;

impl TimerService for NoTimers {
    type Timer = NoTimer;
    type Error = ();

    fn create(&mut self) -> Result<NoTimer, ()> {
        Err(())
    }
}
