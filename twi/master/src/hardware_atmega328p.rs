//! Register level backend for the ATmega328P two-wire controller.

use crate::{
    bitrate::BitRate,
    status::{TwStatus, Twsr},
    traits::TwiBus,
    Direction, ReadMode,
};
use embedded_hal::delay::DelayNs;

/// The address of the two-wire bit rate register.
pub const TWBR: *mut u8 = 0x00B8 as *mut u8;

/// The address of the two-wire status register.
pub const TWSR: *mut u8 = 0x00B9 as *mut u8;

/// The address of the two-wire data register.
pub const TWDR: *mut u8 = 0x00BB as *mut u8;

/// The address of the two-wire control register.
pub const TWCR: *mut u8 = 0x00BC as *mut u8;

/// The mask for the TWCR interrupt flag bit.
pub const TWINT: u8 = 0x80;

/// The mask for the TWCR enable acknowledge bit.
pub const TWEA: u8 = 0x40;

/// The mask for the TWCR start condition bit.
pub const TWSTA: u8 = 0x20;

/// The mask for the TWCR stop condition bit.
pub const TWSTO: u8 = 0x10;

/// The mask for the TWCR enable bit.
pub const TWEN: u8 = 0x04;

/// The two-wire controller of the ATmega328P, operated by polling.
pub struct Twi {
    bit_rate: BitRate,
}

impl Twi {
    /// Prepares a controller handle for the given CPU clock and target
    /// bus clock. Nothing is programmed until [`TwiBus::init`] runs.
    pub const fn new(f_cpu_hz: u32, scl_hz: u32) -> Self {
        Self {
            bit_rate: BitRate::new(f_cpu_hz, scl_hz),
        }
    }
}

/// Spins until the controller raises its interrupt flag.
fn wait_for_completion() {
    while unsafe { TWCR.read_volatile() } & TWINT == 0 {
        continue;
    }
}

/// Loads one byte into the data register, shifts it out and returns the
/// resulting status.
fn raw_write(byte: u8) -> Option<TwStatus> {
    unsafe {
        TWDR.write_volatile(byte);
        TWCR.write_volatile(TWINT | TWEN);
    }
    wait_for_completion();
    read_status()
}

fn read_status() -> Option<TwStatus> {
    Twsr(unsafe { TWSR.read_volatile() }).status()
}

impl TwiBus for Twi {
    fn init(&mut self) {
        let mut twsr = Twsr(0);
        twsr.set_prescaler_bits(self.bit_rate.prescaler.bits());
        unsafe {
            TWSR.write_volatile(twsr.0);
            TWBR.write_volatile(self.bit_rate.twbr);
            TWCR.write_volatile(TWEN);
        }
    }

    fn start(&mut self) -> bool {
        unsafe {
            TWCR.write_volatile(TWINT | TWSTA | TWEN);
        }
        wait_for_completion();
        matches!(
            read_status(),
            Some(TwStatus::Start) | Some(TwStatus::RepeatedStart)
        )
    }

    fn write_address(&mut self, address: u8, direction: Direction) -> bool {
        let frame = (address << 1) | direction.bit();
        match (raw_write(frame), direction) {
            (Some(TwStatus::AddressWriteAck), Direction::Write) => true,
            (Some(TwStatus::AddressReadAck), Direction::Read) => true,
            _ => false,
        }
    }

    /// Only the data acknowledge status counts as acknowledged here: an
    /// address frame shifted out through this method reports `false`
    /// even when the device acknowledged it, because the controller
    /// registers an address acknowledge instead.
    fn write_byte(&mut self, byte: u8) -> bool {
        raw_write(byte) == Some(TwStatus::DataWriteAck)
    }

    fn read_byte(&mut self, mode: ReadMode) -> u8 {
        let twea = if mode.acknowledges() { TWEA } else { 0 };
        unsafe {
            TWCR.write_volatile(TWINT | TWEN | twea);
        }
        wait_for_completion();
        unsafe { TWDR.read_volatile() }
    }

    fn stop(&mut self) {
        unsafe {
            TWCR.write_volatile(TWINT | TWSTO | TWEN);
        }
        // The interrupt flag is not raised after a stop; the stop bit
        // clears once the condition is on the wire.
        while unsafe { TWCR.read_volatile() } & TWSTO != 0 {
            continue;
        }
    }
}

/// Busy loop delay source calibrated against the CPU clock.
///
/// Each loop iteration is assumed to take four cycles, so delays are
/// approximate.
pub struct Delay {
    f_cpu_hz: u32,
}

impl Delay {
    pub const fn new(f_cpu_hz: u32) -> Self {
        Self { f_cpu_hz }
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = ns as u64 * self.f_cpu_hz as u64 / 1_000_000_000;
        let mut remaining = (cycles / 4) as u32;
        while remaining > 0 {
            // Volatile read so the loop is not optimized away.
            unsafe { core::ptr::read_volatile(&remaining) };
            remaining -= 1;
        }
    }
}
