#![cfg_attr(not(test), no_std)]

//! A polled TWI (I2C compatible) master driver for AVR style two-wire
//! controllers, with a bus pirate style command interpreter on top.

#[macro_use]
extern crate num_derive;

mod bitrate;
mod command;
mod driver;
mod error;
#[cfg(feature = "hardware-atmega328p")]
pub mod hardware_atmega328p;
mod i2c;
mod status;
pub mod traits;

/// Data direction of a transfer, used for the R/W bit of the address frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    /// Value of the R/W bit for this direction.
    pub const fn bit(self) -> u8 {
        match self {
            Direction::Read => 1,
            Direction::Write => 0,
        }
    }
}

/// Acknowledgement behavior of a master receive.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadMode {
    /// Acknowledge the received byte, telling the device that more data
    /// will be requested.
    RequestMore,
    /// Leave the byte unacknowledged, telling the device that this is the
    /// final byte before a stop.
    LastByte,
}

impl ReadMode {
    /// Whether the master raises the acknowledge bit for this mode.
    pub const fn acknowledges(self) -> bool {
        matches!(self, ReadMode::RequestMore)
    }
}

pub use self::{
    bitrate::{BitRate, Prescaler},
    command::CommandArg,
    driver::{Master, Policy},
    error::{BusError, CommandError},
    status::{TwStatus, Twsr},
    traits::TwiBus,
};
