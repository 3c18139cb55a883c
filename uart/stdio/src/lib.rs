#![cfg_attr(not(test), no_std)]

//! A polled serial port driver for the AVR USART, for wiring textual
//! standard I/O to a serial console.

mod baud;
#[cfg(feature = "hardware-atmega328p")]
pub mod hardware_atmega328p;

/// Receive path failures, decoded from the status flags accompanying
/// the byte at the head of the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// The stop bit of the received frame was low.
    Frame,
    /// The receive buffer overflowed and data was lost.
    Overrun,
    /// The received parity bit did not match.
    Parity,
}

impl embedded_io::Error for SerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            SerialError::Frame => embedded_io::ErrorKind::InvalidData,
            SerialError::Overrun => embedded_io::ErrorKind::Other,
            SerialError::Parity => embedded_io::ErrorKind::InvalidData,
        }
    }
}

pub use baud::BaudRate;
