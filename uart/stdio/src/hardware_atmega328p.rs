//! Register level backend for USART0 of the ATmega328P.

use crate::{baud::BaudRate, SerialError};
use bitfield::bitfield;
use core::fmt;

/// The address of the USART control and status register A.
pub const UCSR0A: *mut u8 = 0x00C0 as *mut u8;

/// The address of the USART control and status register B.
pub const UCSR0B: *mut u8 = 0x00C1 as *mut u8;

/// The address of the USART control and status register C.
pub const UCSR0C: *mut u8 = 0x00C2 as *mut u8;

/// The address of the baud rate register low byte.
pub const UBRR0L: *mut u8 = 0x00C4 as *mut u8;

/// The address of the baud rate register high byte.
pub const UBRR0H: *mut u8 = 0x00C5 as *mut u8;

/// The address of the USART data register.
pub const UDR0: *mut u8 = 0x00C6 as *mut u8;

/// The mask for the UCSR0A double speed bit.
pub const U2X0: u8 = 0x02;

/// The mask for the UCSR0B receiver enable bit.
pub const RXEN0: u8 = 0x10;

/// The mask for the UCSR0B transmitter enable bit.
pub const TXEN0: u8 = 0x08;

/// The mask for the UCSR0C character size bits selecting 8 bit frames.
pub const UCSZ0_8BIT: u8 = 0x06;

bitfield! {
    /// Status flags of the control and status register A.
    #[derive(Clone, Copy)]
    pub struct Status(u8);
    /// A received byte is waiting in the receive buffer.
    pub receive_complete, _: 7;
    /// The transmit buffer can accept a new byte.
    pub data_register_empty, _: 5;
    /// The stop bit of the byte at the buffer head was low.
    pub frame_error, _: 4;
    /// The receive buffer overflowed since the last read.
    pub data_overrun, _: 3;
    /// The parity of the byte at the buffer head did not match.
    pub parity_error, _: 2;
}

fn status() -> Status {
    Status(unsafe { UCSR0A.read_volatile() })
}

/// USART0 operated by polling, framed 8N1.
pub struct Serial {
    baud: BaudRate,
}

impl Serial {
    /// Prepares a port handle for the given CPU clock and baud rate.
    /// Nothing is programmed until [`init`](Self::init) runs.
    pub const fn new(f_cpu_hz: u32, baud: u32) -> Self {
        Self {
            baud: BaudRate::new(f_cpu_hz, baud),
        }
    }

    /// Programs the baud divisor and enables the receiver and
    /// transmitter.
    pub fn init(&mut self) {
        unsafe {
            UBRR0H.write_volatile(self.baud.high());
            UBRR0L.write_volatile(self.baud.low());
            UCSR0A.write_volatile(if self.baud.double_speed { U2X0 } else { 0 });
            UCSR0B.write_volatile(RXEN0 | TXEN0);
            UCSR0C.write_volatile(UCSZ0_8BIT);
        }
    }

    /// Transmits one byte, spinning until the transmit buffer frees up.
    pub fn write_byte(&mut self, byte: u8) {
        while !status().data_register_empty() {
            continue;
        }
        unsafe {
            UDR0.write_volatile(byte);
        }
    }

    /// Receives one byte, spinning until one arrives.
    ///
    /// The status flags belong to the byte at the buffer head, so they
    /// are captured before the data register read consumes it.
    pub fn read_byte(&mut self) -> Result<u8, SerialError> {
        while !status().receive_complete() {
            continue;
        }
        let flags = status();
        let byte = unsafe { UDR0.read_volatile() };

        if flags.frame_error() {
            return Err(SerialError::Frame);
        }
        if flags.data_overrun() {
            return Err(SerialError::Overrun);
        }
        if flags.parity_error() {
            return Err(SerialError::Parity);
        }
        Ok(byte)
    }
}

/// Formatted output with the serial console convention of carriage
/// return before every line feed.
impl fmt::Write for Serial {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}

impl embedded_io::ErrorType for Serial {
    type Error = SerialError;
}

impl embedded_io::Read for Serial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        // Block for the first byte, then drain whatever else is ready.
        buf[0] = self.read_byte()?;
        let mut count = 1;
        while count < buf.len() && status().receive_complete() {
            buf[count] = self.read_byte()?;
            count += 1;
        }
        Ok(count)
    }
}

impl embedded_io::Write for Serial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.write_byte(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // The last byte may still be draining out of the shift register
        // when this returns; only the transmit buffer is observed.
        while !status().data_register_empty() {
            continue;
        }
        Ok(())
    }
}
