//! Walkthrough for a TCS34725 color sensor, run against the bus
//! simulator instead of real hardware.
//!
//! Run with `RUST_LOG=trace` to watch the traffic on the simulated
//! wire.

use embedded_hal::delay::DelayNs;
use twi_bus_sim::{RegisterDevice, SimBus, SimDelay};
use twi_master_driver::{CommandArg, CommandError, Master, ReadMode};

const SENSOR_ADDRESS: u8 = 0x29;

fn main() -> Result<(), CommandError> {
    env_logger::init();

    // A TCS34725 with a color sample waiting in its data registers:
    // clear 12000, red 4500, green 3800, blue 2900.
    let sensor = RegisterDevice::new()
        .with_command_mask(0x1F)
        .with_register(0x12, 0x44)
        .with_register(0x14, 0xE0)
        .with_register(0x15, 0x2E)
        .with_register(0x16, 0x94)
        .with_register(0x17, 0x11)
        .with_register(0x18, 0xD8)
        .with_register(0x19, 0x0E)
        .with_register(0x1A, 0x54)
        .with_register(0x1B, 0x0B);

    let bus = SimBus::new().with_device(SENSOR_ADDRESS, sensor);
    let mut delay = SimDelay::new();
    delay.delay_ms(1);

    let mut master = Master::new(bus, delay);
    master.init();

    // Power up the sensor by writing 0x03 to the enable register, then
    // read the register back in the same command.
    let mut start_code = 0;
    master.run_command(
        "[ 0x52 0x80 0x03 [ 0x53 s ]",
        &mut [CommandArg::Read(&mut start_code)],
    )?;

    if start_code == 0x03 {
        println!("Sensor enabled successfully!");
    }

    // Read the device ID, passing the command register value as a `w`
    // argument instead of spelling it inside the string.
    let mut device_id = 0;
    master.run_command(
        "[ 0x52 w [ 0x53 s ]",
        &mut [CommandArg::Write(0x92), CommandArg::Read(&mut device_id)],
    )?;
    println!("Read device ID: {:#04x}", device_id);

    // The same exchange by hand, without the command interpreter.
    master.start_write_to(SENSOR_ADDRESS);
    master.send(0x92);
    master.start_read_from(SENSOR_ADDRESS);
    let device_id = master.receive(ReadMode::LastByte);
    master.stop();
    println!("Re-read device ID: {:#04x}", device_id);

    // And take repeated color readings, each channel low byte first.
    for _ in 0..5 {
        let (mut clear_low, mut clear_high) = (0, 0);
        let (mut red_low, mut red_high) = (0, 0);
        let (mut green_low, mut green_high) = (0, 0);
        let (mut blue_low, mut blue_high) = (0, 0);
        master.run_command(
            "[ 0x52 0xB4 [ 0x53 rr rr rr rs ]",
            &mut [
                CommandArg::Read(&mut clear_low),
                CommandArg::Read(&mut clear_high),
                CommandArg::Read(&mut red_low),
                CommandArg::Read(&mut red_high),
                CommandArg::Read(&mut green_low),
                CommandArg::Read(&mut green_high),
                CommandArg::Read(&mut blue_low),
                CommandArg::Read(&mut blue_high),
            ],
        )?;

        println!(
            "Sensor readings (Clear, Red, Green, Blue): {:5}, {:5}, {:5}, {:5}",
            u16::from_le_bytes([clear_low, clear_high]),
            u16::from_le_bytes([red_low, red_high]),
            u16::from_le_bytes([green_low, green_high]),
            u16::from_le_bytes([blue_low, blue_high]),
        );
        master.delay_mut().delay_ms(100);
    }

    Ok(())
}
