use crate::device::SimDevice;
use std::collections::BTreeMap;
use twi_master_driver::{Direction, ReadMode, TwiBus};

/// One condition or byte transfer performed by the master, as seen on
/// the simulated wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    RepeatedStart,
    AddressAck { address: u8, direction: Direction },
    AddressNack { address: u8, direction: Direction },
    DataWrite { byte: u8, acked: bool },
    DataRead { byte: u8, mode: ReadMode },
    Stop,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    Started,
    Writing { address: u8 },
    Reading { address: u8 },
}

/// An in-memory bus holding a set of simulated devices.
///
/// Address frames are understood both ways the driver produces them: as
/// `write_address` calls and as raw first bytes written after a start.
/// Both acknowledge like real hardware, so the strict command policy is
/// usable against the simulator.
pub struct SimBus {
    devices: BTreeMap<u8, Box<dyn SimDevice>>,
    state: State,
    events: Vec<BusEvent>,
    refuse_starts: u8,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            devices: BTreeMap::new(),
            state: State::Idle,
            events: Vec::new(),
            refuse_starts: 0,
        }
    }

    /// Attaches `device` at the seven bit `address`.
    pub fn with_device(mut self, address: u8, device: impl SimDevice + 'static) -> Self {
        self.devices.insert(address, Box::new(device));
        self
    }

    /// Makes the next `count` start conditions fail, as if arbitration
    /// were lost to another master.
    pub fn refuse_next_starts(&mut self, count: u8) {
        self.refuse_starts = count;
    }

    /// The transcript of everything that happened on the wire.
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Clears the transcript.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn address_device(&mut self, address: u8, direction: Direction) -> bool {
        let acked = match self.devices.get_mut(&address) {
            Some(device) => device.addressed(direction),
            None => false,
        };
        if acked {
            self.state = match direction {
                Direction::Write => State::Writing { address },
                Direction::Read => State::Reading { address },
            };
            self.events.push(BusEvent::AddressAck { address, direction });
        } else {
            self.events.push(BusEvent::AddressNack { address, direction });
        }
        log::trace!("address {:#04x} {:?} acked={}", address, direction, acked);
        acked
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TwiBus for SimBus {
    fn init(&mut self) {
        self.state = State::Idle;
        log::trace!("bus initialized");
    }

    fn start(&mut self) -> bool {
        if self.refuse_starts > 0 {
            self.refuse_starts -= 1;
            log::trace!("start refused, arbitration lost");
            return false;
        }
        let event = match self.state {
            State::Idle => BusEvent::Start,
            _ => BusEvent::RepeatedStart,
        };
        log::trace!("{:?}", event);
        self.events.push(event);
        self.state = State::Started;
        true
    }

    fn write_address(&mut self, address: u8, direction: Direction) -> bool {
        match self.state {
            State::Idle => {
                log::trace!("address frame without a start, ignored");
                false
            }
            _ => self.address_device(address, direction),
        }
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        match self.state {
            // The first byte after a start is the raw address frame:
            // seven address bits against the R/W bit.
            State::Started => {
                let direction = if byte & 1 == 1 {
                    Direction::Read
                } else {
                    Direction::Write
                };
                self.address_device(byte >> 1, direction)
            }
            State::Writing { address } => {
                let acked = match self.devices.get_mut(&address) {
                    Some(device) => device.write(byte),
                    None => false,
                };
                log::trace!("write {:#04x} acked={}", byte, acked);
                self.events.push(BusEvent::DataWrite { byte, acked });
                acked
            }
            State::Idle | State::Reading { .. } => {
                log::trace!("write {:#04x} outside a write transfer, ignored", byte);
                false
            }
        }
    }

    fn read_byte(&mut self, mode: ReadMode) -> u8 {
        match self.state {
            State::Reading { address } => {
                let byte = match self.devices.get_mut(&address) {
                    Some(device) => device.read(mode),
                    None => 0xFF,
                };
                log::trace!("read {:#04x} ({:?})", byte, mode);
                self.events.push(BusEvent::DataRead { byte, mode });
                byte
            }
            // Nothing drives the data line; it floats high.
            _ => 0xFF,
        }
    }

    fn stop(&mut self) {
        if let State::Writing { address } | State::Reading { address } = self.state {
            if let Some(device) = self.devices.get_mut(&address) {
                device.stopped();
            }
        }
        log::trace!("stop");
        self.events.push(BusEvent::Stop);
        self.state = State::Idle;
    }
}
