use crate::{traits::TwiBus, Direction, ReadMode};
use embedded_hal::delay::DelayNs;

/// Failure handling applied while a command string executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Policy {
    /// Ignore failed starts and missing acknowledgements and keep
    /// executing. This is the historical contract of the command
    /// language; failures surface only as stale read data.
    #[default]
    BestEffort,
    /// Abort the command with an error at the first failed start or
    /// missing acknowledgement.
    Strict,
}

/// A blocking two-wire master.
///
/// Owns the bus backend exclusively; all operations spin until the
/// controller reports completion and never time out.
pub struct Master<B, D> {
    pub(crate) bus: B,
    pub(crate) delay: D,
    pub(crate) policy: Policy,
}

impl<B, D> Master<B, D>
where
    B: TwiBus,
    D: DelayNs,
{
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            bus,
            delay,
            policy: Policy::default(),
        }
    }

    /// Replaces the command failure policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Programs the bus clock and enables the controller.
    pub fn init(&mut self) {
        self.bus.init();
    }

    /// Asserts a start (or repeated start) condition.
    pub fn start(&mut self) -> bool {
        self.bus.start()
    }

    /// Starts a transfer: asserts a start condition and addresses the
    /// device.
    ///
    /// Returns whether the device acknowledged. When the start condition
    /// itself fails no address frame is sent.
    pub fn start_transfer(&mut self, address: u8, direction: Direction) -> bool {
        self.bus.start() && self.bus.write_address(address, direction)
    }

    /// Starts a transfer towards the device in write direction.
    pub fn start_write_to(&mut self, address: u8) -> bool {
        self.start_transfer(address, Direction::Write)
    }

    /// Starts a transfer from the device in read direction.
    pub fn start_read_from(&mut self, address: u8) -> bool {
        self.start_transfer(address, Direction::Read)
    }

    /// Starts a transfer, retrying for as long as the device does not
    /// acknowledge its address.
    ///
    /// Every unacknowledged attempt is closed with a stop condition
    /// before the next one; a failed start is retried directly. This is
    /// acknowledge polling for devices that go mute during internal
    /// work, and it retries forever: a device that never acknowledges
    /// hangs the caller.
    pub fn ensure_transfer(&mut self, address: u8, direction: Direction) {
        loop {
            if !self.bus.start() {
                continue;
            }
            if self.bus.write_address(address, direction) {
                break;
            }
            self.bus.stop();
        }
    }

    /// Shifts out one byte; returns whether it was acknowledged.
    pub fn send(&mut self, byte: u8) -> bool {
        self.bus.write_byte(byte)
    }

    /// Shifts in one byte, acknowledging per `mode`.
    pub fn receive(&mut self, mode: ReadMode) -> u8 {
        self.bus.read_byte(mode)
    }

    /// Asserts a stop condition, releasing the bus.
    pub fn stop(&mut self) {
        self.bus.stop();
    }

    /// Borrows the bus backend.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Borrows the delay source.
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Consumes the driver, handing back the backend and delay source.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }
}
