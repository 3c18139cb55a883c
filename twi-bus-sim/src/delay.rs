use embedded_hal::delay::DelayNs;

/// A delay source that advances a virtual clock instead of sleeping.
#[derive(Debug, Default)]
pub struct SimDelay {
    elapsed_ns: u64,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time spent in delays.
    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed_ns
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
        log::trace!("delay {}ns", ns);
    }
}
