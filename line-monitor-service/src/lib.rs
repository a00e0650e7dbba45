//! Line Monitor Service
//!
//! Tracks the logical state of a digital input line driven by an edge interrupt. Contact bounce is
//! suppressed with a one-shot timer, changes are classified into level change, short press and long
//! press events and delivered to an event bus or an event group.

#![no_std]
#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod embassy;
pub mod event;
pub mod hal;
pub mod monitor;

#[cfg(test)]
mod mock;

pub use config::{BusRoute, GroupBits, LineConfig};
pub use dispatch::{DispatchTarget, Update};
pub use event::{Callback, LineEventData, LineState, Press, Transition};
pub use monitor::LineMonitor;

/// Platform identifier of a monitored pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(pub u8);

/// Line monitor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The pin could not be configured as an input
    PinConfigurationFailed,
    /// The debounce timer could not be allocated
    TimerCreationFailed,
    /// The interrupt handler could not be registered or unmasked
    InterruptRegistrationFailed,
    /// The pull resistor could not be changed
    PullModeChangeFailed,
    /// The interrupt source could not be masked or unmasked
    InterruptToggleFailed,
}
