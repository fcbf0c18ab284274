//! The parameterized March C− engine.
//!
//! Passes are parameterized at the type level so that each `march_step`
//! monomorphizes into a straight-line loop: the per-cell body contains no
//! runtime branch on direction, read spec or write spec. That is what keeps
//! a full 256-row sweep fast enough to double as the refresh schedule.

use embedded_hal::delay::DelayNs;

use crate::bus::{CellAddress, DramPort};
use crate::indicator::StatusLeds;
use crate::probe::ChipKind;
use crate::Tester;

/// Walk direction of one pass.
pub trait Direction {
    /// Pre-decrement instead of post-increment.
    const REVERSED: bool;
    /// (row_hi, col_hi) visit order for the four 256K quadrants, chosen so
    /// the 9-bit row and column appear to advance monotonically.
    const QUADRANTS: [(bool, bool); 4];
}

pub enum Up {}

impl Direction for Up {
    const REVERSED: bool = false;
    const QUADRANTS: [(bool, bool); 4] =
        [(false, false), (true, false), (false, true), (true, true)];
}

pub enum Down {}

impl Direction for Down {
    const REVERSED: bool = true;
    const QUADRANTS: [(bool, bool); 4] =
        [(true, true), (false, true), (true, false), (false, false)];
}

/// Whether a pass read-verifies each cell, and against what.
pub trait ReadSpec {
    const VERIFY: bool;
    const EXPECT: bool;
}

pub enum ExpectZero {}

impl ReadSpec for ExpectZero {
    const VERIFY: bool = true;
    const EXPECT: bool = false;
}

pub enum ExpectOne {}

impl ReadSpec for ExpectOne {
    const VERIFY: bool = true;
    const EXPECT: bool = true;
}

pub enum NoRead {}

impl ReadSpec for NoRead {
    const VERIFY: bool = false;
    const EXPECT: bool = false;
}

/// Whether a pass writes each cell, and the DIN level for the whole pass.
/// A read-only pass parks DIN high; the chip ignores it.
pub trait WriteSpec {
    const ENABLED: bool;
    const DIN: bool;
}

pub enum WriteZero {}

impl WriteSpec for WriteZero {
    const ENABLED: bool = true;
    const DIN: bool = false;
}

pub enum WriteOne {}

impl WriteSpec for WriteOne {
    const ENABLED: bool = true;
    const DIN: bool = true;
}

pub enum NoWrite {}

impl WriteSpec for NoWrite {
    const ENABLED: bool = false;
    const DIN: bool = true;
}

impl<P: DramPort, L: StatusLeds, D: DelayNs> Tester<P, L, D> {
    /// One pass over the full 8x8-bit square.
    ///
    /// The counter's low byte rides the row strobe, so every 256
    /// consecutive steps touch all 256 row values and no separate refresh
    /// is needed while a pass runs. Termination on wrap-to-zero gives
    /// exactly 2^16 iterations in either direction.
    fn march_once<Dir: Direction, R: ReadSpec, W: WriteSpec>(&mut self, row_hi: bool, col_hi: bool) {
        let mut counter: u16 = 0;
        loop {
            if Dir::REVERSED {
                counter = counter.wrapping_sub(1);
            }
            let cell = CellAddress::from_counter(counter, row_hi, col_hi);
            if R::VERIFY {
                let bit = self.bus.read(cell);
                if bit != R::EXPECT {
                    self.fault(cell, bit);
                }
            }
            if W::ENABLED {
                self.bus.write(cell);
            }
            if !Dir::REVERSED {
                counter = counter.wrapping_add(1);
            }
            if counter == 0 {
                break;
            }
        }
    }

    /// One March element across the whole probed part.
    ///
    /// DIN is latched once up front; 64K parts get a single pass, 256K
    /// parts get the four A8 quadrants in direction order.
    pub fn march_step<Dir: Direction, R: ReadSpec, W: WriteSpec>(&mut self) {
        self.bus.set_din(W::DIN);
        match self.kind {
            ChipKind::Dram64K => self.march_once::<Dir, R, W>(false, false),
            ChipKind::Dram256K => {
                for (row_hi, col_hi) in Dir::QUADRANTS {
                    self.march_once::<Dir, R, W>(row_hi, col_hi);
                }
            }
        }
    }

    /// One full March C− iteration:
    /// ⇑(W0); ⇑(R0,W1); ⇑(R1,W0); ⇓(R0,W1); ⇓(R1,W0); ⇓(R0).
    ///
    /// Starts from a fresh all-zeros initialization every time, so each
    /// iteration is self-contained. Returns whether the iteration observed
    /// no faults; a clean iteration latches green.
    pub fn march_iteration(&mut self) -> bool {
        let faults_before = self.faults;
        self.march_step::<Up, NoRead, WriteZero>();
        self.march_step::<Up, ExpectZero, WriteOne>();
        self.march_step::<Up, ExpectOne, WriteZero>();
        self.march_step::<Down, ExpectZero, WriteOne>();
        self.march_step::<Down, ExpectOne, WriteZero>();
        self.march_step::<Down, ExpectZero, NoWrite>();
        let clean = self.faults == faults_before;
        if clean {
            self.indicator.pass();
        }
        clean
    }

    /// Probe the part, then march forever. LEDs and the ERR line carry the
    /// verdict; there is no way out.
    pub fn run_march(&mut self) -> ! {
        let kind = self.probe();
        info!("march test: {} cells per element", kind.cells());
        loop {
            let clean = self.march_iteration();
            debug!("march iteration done, clean={} faults={}", clean, self.faults);
        }
    }

    /// Record one verification mismatch: count it, latch red, pulse ERR.
    /// The pass keeps going so an analyzer can count the pulse train.
    fn fault(&mut self, cell: CellAddress, read: bool) {
        self.faults = self.faults.wrapping_add(1);
        self.indicator.fail();
        self.bus.pulse_err();
        warn!(
            "cell mismatch: row={} col={} a8r={} a8c={} read={}",
            cell.row, cell.col, cell.row_hi, cell.col_hi, read,
        );
    }
}
