use bitfield::bitfield;
use num_traits::FromPrimitive;

bitfield! {
    /// Raw contents of the two-wire status register.
    #[derive(Clone, Copy)]
    pub struct Twsr(u8);
    /// Controller status code, left aligned in the register.
    status_bits, _: 7, 3;
    reserved, _: 2;
    /// Bus clock prescaler selection.
    pub prescaler_bits, set_prescaler_bits: 1, 0;
}

impl Twsr {
    /// Decodes the status code, masking off the prescaler bits.
    ///
    /// Returns `None` for codes that are not defined for master mode
    /// operation.
    pub fn status(self) -> Option<TwStatus> {
        TwStatus::from_u8(self.status_bits() << 3)
    }
}

/// Masked status codes reported by the controller in master mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwStatus {
    /// A start condition has been transmitted.
    Start = 0x08,
    /// A repeated start condition has been transmitted.
    RepeatedStart = 0x10,
    /// SLA+W has been transmitted and acknowledged.
    AddressWriteAck = 0x18,
    /// SLA+W has been transmitted and not acknowledged.
    AddressWriteNack = 0x20,
    /// A data byte has been transmitted and acknowledged.
    DataWriteAck = 0x28,
    /// A data byte has been transmitted and not acknowledged.
    DataWriteNack = 0x30,
    /// Arbitration was lost to another master.
    ArbitrationLost = 0x38,
    /// SLA+R has been transmitted and acknowledged.
    AddressReadAck = 0x40,
    /// SLA+R has been transmitted and not acknowledged.
    AddressReadNack = 0x48,
    /// A data byte has been received and acknowledged.
    DataReadAck = 0x50,
    /// A data byte has been received and not acknowledged.
    DataReadNack = 0x58,
    /// Illegal start or stop condition was detected.
    BusError = 0x00,
    /// No relevant state information is available.
    NoInfo = 0xF8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_decode_status() {
        // Given
        let twsr = Twsr(0x28);

        // Then
        assert_eq!(Some(TwStatus::DataWriteAck), twsr.status());
    }

    #[test]
    fn prescaler_bits_do_not_affect_the_status() {
        // Given
        let twsr = Twsr(0x10 | 0x03);

        // Then
        assert_eq!(Some(TwStatus::RepeatedStart), twsr.status());
        assert_eq!(0x03, twsr.prescaler_bits());
    }

    #[test]
    fn slave_mode_codes_are_not_decoded() {
        // 0x68 is "arbitration lost, own SLA+W received", a slave mode code.
        assert_eq!(None, Twsr(0x68).status());
    }

    #[test]
    fn can_set_prescaler_bits() {
        // Given
        let mut twsr = Twsr(0x00);

        // When
        twsr.set_prescaler_bits(0x02);

        // Then
        assert_eq!(0x02, twsr.0);
    }
}
