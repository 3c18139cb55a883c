//! Walkthrough for a TSL2561 light sensor, run against the bus
//! simulator instead of real hardware.
//!
//! Run with `RUST_LOG=trace` to watch the traffic on the simulated
//! wire.

use embedded_hal::delay::DelayNs;
use twi_bus_sim::{RegisterDevice, SimBus, SimDelay};
use twi_master_driver::{CommandArg, CommandError, Master, ReadMode};

const SENSOR_ADDRESS: u8 = 0x39;

fn main() -> Result<(), CommandError> {
    env_logger::init();

    // A TSL2561 as it powers up: the ID register reports a TSL2561T and
    // a reading of 298 counts waits in the channel 0 data registers.
    let sensor = RegisterDevice::new()
        .with_command_mask(0x0F)
        .with_register(0x0A, 0x50)
        .with_register(0x0C, 0x2A)
        .with_register(0x0D, 0x01);

    let bus = SimBus::new().with_device(SENSOR_ADDRESS, sensor);
    let mut delay = SimDelay::new();
    delay.delay_ms(1);

    let mut master = Master::new(bus, delay);
    master.init();

    // Power up the sensor's internal ADC by writing 0x03 to the control
    // register, then read the register back in the same command. Note
    // the final `s`: the last read of a command must leave the byte
    // unacknowledged so the sensor releases the bus.
    let mut start_code = 0;
    master.run_command(
        "[ 0x72 0x80 0x03 [ 0x73 s ]",
        &mut [CommandArg::Read(&mut start_code)],
    )?;

    // The two low bits read back as 0b11 once the ADC is powered.
    if start_code & 0x03 == 0x03 {
        println!("Sensor enabled successfully!");
    }

    // Read the device ID, passing the command register value as a `w`
    // argument instead of spelling it inside the string.
    let mut device_id = 0;
    master.run_command(
        "[ 0x72 w [ 0x73 s ]",
        &mut [CommandArg::Write(0x8A), CommandArg::Read(&mut device_id)],
    )?;
    println!("Read device ID: {:#04x}", device_id);

    // The same exchange by hand, without the command interpreter.
    master.start_write_to(SENSOR_ADDRESS);
    master.send(0x8A);
    master.start_read_from(SENSOR_ADDRESS);
    let device_id = master.receive(ReadMode::LastByte);
    master.stop();
    println!("Re-read device ID: {:#04x}", device_id);

    // And take repeated light sensor readings, low byte first.
    for _ in 0..5 {
        let mut low = 0;
        let mut high = 0;
        master.run_command(
            "[ 0x72 0xAC [ 0x73 r s ]",
            &mut [CommandArg::Read(&mut low), CommandArg::Read(&mut high)],
        )?;

        println!("Sensor reading: {}", u16::from_le_bytes([low, high]));
        master.delay_mut().delay_ms(100);
    }

    Ok(())
}
