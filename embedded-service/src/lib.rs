//! Embedded Services Interface Exports

#![no_std]
#![warn(missing_docs)]

pub mod event_bus;
pub mod event_group;
pub mod fmt;

pub use event_bus::EventBus;
pub use event_group::EventGroup;
