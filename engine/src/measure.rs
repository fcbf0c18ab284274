//! Access-time measurement mode.
//!
//! Selected by the mode strap at power-up. Writes an alternating pattern
//! along the row==col diagonal, then sweeps it forever with the minimum
//! delay budget while a hardware input-capture timer measures how long DOUT
//! takes to settle. The worst capture of each sweep is classified and
//! reported by blinking the green LED; DOUT is never compared against an
//! expected value here, the point is to probe the timing boundary.

use embedded_hal::delay::DelayNs;

use crate::bus::{CellAddress, DramPort};
use crate::indicator::StatusLeds;
use crate::Tester;

/// Captures strictly below this many timer ticks are "fast".
///
/// Ticks are 64 MHz core cycles (15.6 ns). Below 6 ticks (~94 ns) the part
/// is comfortably inside even a -12 speed grade's tCAC.
pub const FAST_LIMIT: u32 = 6;

/// Captures above this many timer ticks are "slow".
///
/// Above 9 ticks (~140 ns) the part is out of spec for a -12/-15 grade and
/// marginal for a -20.
pub const SLOW_LIMIT: u32 = 9;

/// Access-time class of one diagonal sweep, reported as 1/2/3 green blinks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Fast,
    Nominal,
    Slow,
}

impl Speed {
    pub fn classify(ticks: u32) -> Self {
        if ticks < FAST_LIMIT {
            Speed::Fast
        } else if ticks > SLOW_LIMIT {
            Speed::Slow
        } else {
            Speed::Nominal
        }
    }

    pub fn blinks(self) -> u8 {
        match self {
            Speed::Fast => 1,
            Speed::Nominal => 2,
            Speed::Slow => 3,
        }
    }
}

/// The input-capture timer measuring reference-edge-to-DOUT time.
pub trait CaptureTimer {
    /// Zero the counter and drop any stale capture, right before a read.
    fn arm(&mut self);
    /// The captured tick count, or `None` if the timer ran out before DOUT
    /// moved.
    fn capture(&mut self) -> Option<u32>;
}

impl<T: CaptureTimer + ?Sized> CaptureTimer for &mut T {
    fn arm(&mut self) {
        T::arm(self);
    }
    fn capture(&mut self) -> Option<u32> {
        T::capture(self)
    }
}

impl<P: DramPort, L: StatusLeds, D: DelayNs> Tester<P, L, D> {
    /// Write alternating bits along the diagonal. DIN toggles per cell,
    /// which is fine outside a march pass.
    pub fn init_diagonal(&mut self) {
        for d in 0..=255u8 {
            self.bus.set_din(d & 1 != 0);
            self.bus.write(CellAddress {
                row: d,
                col: d,
                row_hi: false,
                col_hi: false,
            });
        }
    }

    /// One capture-instrumented sweep of the diagonal.
    ///
    /// Diagonal addressing maximizes simultaneous bit-line activity, so the
    /// worst capture of the sweep is the number that matters. A failed
    /// capture latches red and the sweep carries on; the next sweep gets a
    /// fresh chance.
    pub fn measure_sweep<C: CaptureTimer>(&mut self, cap: &mut C) -> Speed {
        let mut worst: u32 = 0;
        for d in 0..=255u8 {
            cap.arm();
            let _ = self.bus.read(CellAddress {
                row: d,
                col: d,
                row_hi: false,
                col_hi: false,
            });
            match cap.capture() {
                Some(ticks) => worst = worst.max(ticks),
                None => self.indicator.fail(),
            }
        }
        Speed::classify(worst)
    }

    /// Blink the sweep's class on the green LED.
    pub fn report_sweep(&mut self, speed: Speed) {
        self.indicator.blink_green(speed.blinks(), &mut self.delay);
    }

    /// Measurement loop: sweep, classify, blink, forever.
    pub fn run_measurement<C: CaptureTimer>(&mut self, mut cap: C) -> ! {
        self.init_diagonal();
        info!("measurement mode: sweeping the diagonal");
        loop {
            let speed = self.measure_sweep(&mut cap);
            trace!("sweep class: {}", speed.blinks());
            self.report_sweep(speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_bands() {
        assert_eq!(Speed::classify(0), Speed::Fast);
        assert_eq!(Speed::classify(FAST_LIMIT - 1), Speed::Fast);
        assert_eq!(Speed::classify(FAST_LIMIT), Speed::Nominal);
        assert_eq!(Speed::classify(SLOW_LIMIT), Speed::Nominal);
        assert_eq!(Speed::classify(SLOW_LIMIT + 1), Speed::Slow);
    }

    #[test]
    fn blink_counts() {
        assert_eq!(Speed::Fast.blinks(), 1);
        assert_eq!(Speed::Nominal.blinks(), 2);
        assert_eq!(Speed::Slow.blinks(), 3);
    }
}
