use crate::{Direction, ReadMode};

#[cfg(test)]
use mockall::automock;

/// Register-level access to a two-wire controller.
///
/// Every method blocks by spinning on the controller's completion flag.
/// There is no timeout; a stuck bus hangs the caller.
#[cfg_attr(test, automock)]
pub trait TwiBus {
    /// Programs the bus clock and enables the controller.
    fn init(&mut self);

    /// Asserts a start (or repeated start) condition.
    ///
    /// Returns whether the condition took effect, i.e. the bus was won.
    fn start(&mut self) -> bool;

    /// Shifts out the address frame for `address` with the R/W bit set
    /// per `direction`.
    ///
    /// Returns whether the addressed device acknowledged.
    fn write_address(&mut self, address: u8, direction: Direction) -> bool;

    /// Shifts out one byte.
    ///
    /// Returns whether the receiver acknowledged it.
    fn write_byte(&mut self, byte: u8) -> bool;

    /// Shifts in one byte, raising the acknowledge bit per `mode`.
    ///
    /// A byte is always produced; the bus defines no failed read.
    fn read_byte(&mut self, mode: ReadMode) -> u8;

    /// Asserts a stop condition and waits until the bus is released.
    fn stop(&mut self);
}
