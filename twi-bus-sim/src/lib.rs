//! An in-memory TWI bus backend for host side tests and demos.
//!
//! [`SimBus`] implements the driver's bus trait against a set of
//! simulated devices and records every condition and byte transfer as a
//! [`BusEvent`], so a test can assert on the full wire transcript.

mod bus;
mod delay;
mod device;

pub use self::{
    bus::{BusEvent, SimBus},
    delay::SimDelay,
    device::{RegisterDevice, SimDevice},
};
