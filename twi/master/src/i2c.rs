use crate::{driver::Master, error::BusError, traits::TwiBus, Direction, ReadMode};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c, Operation};

impl<B, D> ErrorType for Master<B, D>
where
    B: TwiBus,
    D: DelayNs,
{
    type Error = BusError;
}

/// `embedded-hal` bus interface on top of the primitive layer.
///
/// Adjacent operations of the same direction continue without a
/// restart; a direction change issues a repeated start and a fresh
/// address frame. Received bytes are acknowledged except for the last
/// byte before a restart or the final stop. A failure closes the
/// transaction with a stop, except for a failed start where the bus was
/// never claimed.
impl<B, D> I2c for Master<B, D>
where
    B: TwiBus,
    D: DelayNs,
{
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }

        for index in 0..operations.len() {
            let direction = direction_of(&operations[index]);
            let starts_run = index == 0 || direction_of(&operations[index - 1]) != direction;
            let ends_run = match operations.get(index + 1) {
                Some(next) => direction_of(next) != direction,
                None => true,
            };

            if starts_run {
                if !self.bus.start() {
                    return Err(BusError::Start);
                }
                if !self.bus.write_address(address, direction) {
                    self.bus.stop();
                    return Err(BusError::AddressNack);
                }
            }

            match &mut operations[index] {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        if !self.bus.write_byte(byte) {
                            self.bus.stop();
                            return Err(BusError::DataNack);
                        }
                    }
                }
                Operation::Read(bytes) => {
                    let count = bytes.len();
                    for (offset, destination) in bytes.iter_mut().enumerate() {
                        let mode = if ends_run && offset + 1 == count {
                            ReadMode::LastByte
                        } else {
                            ReadMode::RequestMore
                        };
                        *destination = self.bus.read_byte(mode);
                    }
                }
            }
        }

        self.bus.stop();
        Ok(())
    }
}

fn direction_of(operation: &Operation<'_>) -> Direction {
    match operation {
        Operation::Read(_) => Direction::Read,
        Operation::Write(_) => Direction::Write,
    }
}
