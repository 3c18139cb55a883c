use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Bus level failures reported under the strict command policy and by
/// the `embedded-hal` bus interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// A start condition did not take effect, most commonly because the
    /// bus was busy or arbitration was lost.
    Start,
    /// No device acknowledged the address frame.
    AddressNack,
    /// A transmitted data byte was not acknowledged.
    DataNack,
}

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            BusError::Start => ErrorKind::ArbitrationLoss,
            BusError::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            BusError::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
        }
    }
}

/// Errors reported by the command interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The number of supplied arguments does not match the number of
    /// read and write tokens in the command string.
    ArgumentCount { expected: usize, provided: usize },
    /// The argument at `index` is a read destination where the command
    /// string expects a write value, or the other way around.
    ArgumentKind { index: usize },
    /// A bus operation failed while the strict policy was active.
    Bus(BusError),
}

impl From<BusError> for CommandError {
    fn from(value: BusError) -> Self {
        CommandError::Bus(value)
    }
}
