use twi_master_driver::{Direction, ReadMode};

/// A simulated device attached to a [`SimBus`](crate::SimBus).
pub trait SimDevice {
    /// Called when the master addresses this device.
    ///
    /// Returns whether the device acknowledges its address.
    fn addressed(&mut self, direction: Direction) -> bool;

    /// Called for every data byte the master writes to this device.
    ///
    /// Returns whether the device acknowledges the byte.
    fn write(&mut self, byte: u8) -> bool;

    /// Called for every byte the master reads from this device.
    fn read(&mut self, mode: ReadMode) -> u8;

    /// Called when the master releases the bus while this device is
    /// selected.
    fn stopped(&mut self) {}
}

/// A register file device in the style of small I2C sensors.
///
/// The first byte written after a write selection is a command byte
/// whose register address bits, picked out by the command mask, set the
/// register pointer. Further writes in the same transfer store to the
/// addressed register without moving the pointer. Reads return the
/// addressed register and then advance the pointer, mimicking the auto
/// increment read protocol of devices like the TSL2561 and TCS34725
/// light sensors.
pub struct RegisterDevice {
    registers: [u8; 256],
    pointer: u8,
    command_mask: u8,
    select_pending: bool,
    busy_attempts: u8,
}

impl RegisterDevice {
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
            command_mask: 0xFF,
            select_pending: false,
            busy_attempts: 0,
        }
    }

    /// Masks command bytes down to their register address bits.
    pub fn with_command_mask(mut self, mask: u8) -> Self {
        self.command_mask = mask;
        self
    }

    /// Presets one register.
    pub fn with_register(mut self, register: u8, value: u8) -> Self {
        self.registers[usize::from(register)] = value;
        self
    }

    /// Leaves the next `attempts` address frames unacknowledged, like a
    /// device that is still busy with internal work.
    pub fn busy_for(mut self, attempts: u8) -> Self {
        self.busy_attempts = attempts;
        self
    }

    /// Reads one register directly, bypassing the bus.
    pub fn register(&self, register: u8) -> u8 {
        self.registers[usize::from(register)]
    }
}

impl Default for RegisterDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDevice for RegisterDevice {
    fn addressed(&mut self, direction: Direction) -> bool {
        if self.busy_attempts > 0 {
            self.busy_attempts -= 1;
            return false;
        }
        if direction == Direction::Write {
            self.select_pending = true;
        }
        true
    }

    fn write(&mut self, byte: u8) -> bool {
        if self.select_pending {
            self.pointer = byte & self.command_mask;
            self.select_pending = false;
        } else {
            self.registers[usize::from(self.pointer)] = byte;
        }
        true
    }

    fn read(&mut self, _mode: ReadMode) -> u8 {
        let value = self.registers[usize::from(self.pointer)];
        self.pointer = self.pointer.wrapping_add(1);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    #[test]
    fn first_write_after_a_write_selection_sets_the_pointer() {
        // Given
        let mut device = RegisterDevice::new().with_command_mask(0x0F);

        // When
        assert!(device.addressed(Direction::Write));
        assert!(device.write(0x8A));
        assert!(device.write(0x55));

        // Then
        assert_eq_hex!(0x55, device.register(0x0A));
    }

    #[test]
    fn writes_keep_the_pointer_and_reads_advance_it() {
        // Given
        let mut device = RegisterDevice::new()
            .with_register(0x0C, 0x12)
            .with_register(0x0D, 0x34);

        // When
        assert!(device.addressed(Direction::Write));
        assert!(device.write(0x0C));
        device.addressed(Direction::Read);

        // Then
        assert_eq_hex!(0x12, device.read(ReadMode::RequestMore));
        assert_eq_hex!(0x34, device.read(ReadMode::LastByte));
    }

    #[test]
    fn read_addressing_leaves_the_pointer_in_place() {
        // Given
        let mut device = RegisterDevice::new().with_register(0x00, 0xAB);

        // When
        assert!(device.addressed(Direction::Read));

        // Then
        assert_eq_hex!(0xAB, device.read(ReadMode::LastByte));
    }

    #[test]
    fn busy_device_refuses_its_address_then_recovers() {
        // Given
        let mut device = RegisterDevice::new().busy_for(2);

        // Then
        assert!(!device.addressed(Direction::Write));
        assert!(!device.addressed(Direction::Write));
        assert!(device.addressed(Direction::Write));
    }
}
