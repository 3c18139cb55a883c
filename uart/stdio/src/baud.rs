/// Accepted deviation between the requested and the achieved baud rate,
/// in percent.
const TOLERANCE_PERCENT: u64 = 2;

/// The baud rate register is twelve bits wide.
const UBRR_MAX: u64 = 0x0FFF;

/// A baud rate register value and the double speed selection that goes
/// with it.
///
/// The achieved baud rate is `f_cpu / (16 * (ubrr + 1))`, or with
/// double speed enabled `f_cpu / (8 * (ubrr + 1))`. Double speed is
/// chosen when the normal divisor misses the request by more than the
/// tolerance, trading sampling margin for granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudRate {
    pub ubrr: u16,
    pub double_speed: bool,
}

impl BaudRate {
    /// Computes the closest achievable configuration for a requested
    /// baud rate.
    ///
    /// Rates too slow for the register width saturate at the largest
    /// divisor.
    pub const fn new(f_cpu_hz: u32, baud: u32) -> Self {
        assert!(baud > 0);

        let f = f_cpu_hz as u64;
        let b = baud as u64;

        let ubrr = ((f + 8 * b) / (16 * b)).saturating_sub(1);
        let divisor = 16 * (ubrr + 1);
        let too_fast = 100 * f > divisor * (100 * b + b * TOLERANCE_PERCENT);
        let too_slow = 100 * f < divisor * (100 * b - b * TOLERANCE_PERCENT);

        if too_fast || too_slow {
            let ubrr = ((f + 4 * b) / (8 * b)).saturating_sub(1);
            Self {
                ubrr: clamp(ubrr),
                double_speed: true,
            }
        } else {
            Self {
                ubrr: clamp(ubrr),
                double_speed: false,
            }
        }
    }

    /// The high byte of the baud rate register value.
    pub const fn high(&self) -> u8 {
        (self.ubrr >> 8) as u8
    }

    /// The low byte of the baud rate register value.
    pub const fn low(&self) -> u8 {
        (self.ubrr & 0xFF) as u8
    }

    /// The baud rate this configuration actually produces.
    pub const fn baud_hz(&self, f_cpu_hz: u32) -> u32 {
        let samples = if self.double_speed { 8 } else { 16 };
        f_cpu_hz / (samples * (self.ubrr as u32 + 1))
    }
}

const fn clamp(ubrr: u64) -> u16 {
    if ubrr > UBRR_MAX {
        UBRR_MAX as u16
    } else {
        ubrr as u16
    }
}
