/// Bus clock prescaler selections of the two-wire controller.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1 = 0,
    Div4 = 1,
    Div16 = 2,
    Div64 = 3,
}

impl Prescaler {
    /// The division factor this selection applies to the bit rate unit.
    pub const fn factor(self) -> u32 {
        1 << (2 * self as u32)
    }

    /// The prescaler bit pattern for the status register.
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// A prescaler selection and bit rate constant pair for a requested bus
/// clock.
///
/// The bus clock comes out as `f_cpu / (16 + 2 * twbr * factor)`. The
/// search walks the prescaler selections smallest first and keeps the
/// first one whose bit rate constant fits in eight bits, so the clock is
/// configured with the finest granularity the register widths allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitRate {
    pub prescaler: Prescaler,
    pub twbr: u8,
}

impl BitRate {
    /// Computes the configuration for a target bus clock.
    ///
    /// The bit rate constant is rounded up so the configured clock never
    /// exceeds `scl_hz`. Requests too slow to represent even with the
    /// largest prescaler saturate at the slowest configuration, requests
    /// faster than `f_cpu_hz / 16` at the fastest.
    pub const fn new(f_cpu_hz: u32, scl_hz: u32) -> Self {
        assert!(scl_hz > 0);

        let cycles_per_bit = f_cpu_hz.div_ceil(scl_hz);
        let scaled = cycles_per_bit.saturating_sub(16);

        let mut index = 0;
        loop {
            let prescaler = match index {
                0 => Prescaler::Div1,
                1 => Prescaler::Div4,
                2 => Prescaler::Div16,
                _ => Prescaler::Div64,
            };
            let divisor = 2 * prescaler.factor();
            let twbr = scaled.div_ceil(divisor);

            if twbr <= 0xFF {
                return Self {
                    prescaler,
                    twbr: twbr as u8,
                };
            }
            if index == 3 {
                return Self {
                    prescaler,
                    twbr: 0xFF,
                };
            }
            index += 1;
        }
    }

    /// The bus clock this configuration actually produces.
    pub const fn scl_hz(&self, f_cpu_hz: u32) -> u32 {
        f_cpu_hz / (16 + 2 * self.twbr as u32 * self.prescaler.factor())
    }
}
