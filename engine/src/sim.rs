//! Behavioral model of a 4164/41256 for host-side testing.
//!
//! Implements [`DramPort`] the way the silicon sees it: row latched on the
//! RAS edge, column on the CAS edge, the WE level at CAS fall deciding
//! between an early write and a read. On top of the cell array it keeps
//! protocol instrumentation (strobe ordering, settle-before-sample, refresh
//! coverage, ERR pulse count, quadrant order) and supports stuck-at and
//! coupling fault injection.
//!
//! A 64K model ignores A8 entirely, which is exactly the aliasing the
//! geometry probe relies on.

use crate::bus::{self, CellAddress, DramPort};
use crate::indicator::StatusLeds;
use crate::measure::CaptureTimer;
use crate::probe::ChipKind;

/// Cell capacity of the larger part; the 64K model uses the first quarter.
pub const MAX_CELLS: usize = 1 << 18;

const QUADRANT_LOG_CAP: usize = 32;

/// One idempotent coupling fault: writing `trigger` to `aggressor` forces
/// `victim` to `forced`.
#[derive(Clone, Copy)]
struct Coupling {
    aggressor: usize,
    trigger: bool,
    victim: usize,
    forced: bool,
}

pub struct SimDram {
    kind: ChipKind,
    cells: [u8; MAX_CELLS / 8],
    /// Full strobe cycles addressed at each cell since the last
    /// [`clear_visits`](Self::clear_visits).
    visits: [u8; MAX_CELLS],

    // Pin state as driven by the port.
    addr: u8,
    a8: bool,
    din: bool,
    dout: bool,
    ctrl: u8,

    // Latched by the strobe edges.
    row: u16,
    col: u16,
    cycle_row_hi: bool,

    // Read pipeline: DOUT is only valid once an access-time delay has run.
    pending_dout: Option<bool>,
    settled: bool,

    pub reads: u32,
    pub writes: u32,
    pub ras_cycles: u32,
    /// Falling edges seen on the ERR line.
    pub err_pulses: u32,
    /// Wire-protocol violations observed; details in `last_violation`.
    pub violations: u32,
    pub last_violation: Option<&'static str>,

    // Refresh coverage: RAS strobes are a clock, and the largest gap
    // between consecutive strobes of the same 8-bit row is tracked.
    strobe_clock: u32,
    row_last_seen: [u32; 256],
    pub max_row_gap: u32,

    quadrant_log: [(bool, bool); QUADRANT_LOG_CAP],
    quadrant_len: usize,

    stuck: Option<(usize, bool)>,
    coupling: Option<Coupling>,
}

impl SimDram {
    /// A part of the given geometry with all cells reading zero and every
    /// line idle-high.
    pub fn new(kind: ChipKind) -> Self {
        Self {
            kind,
            cells: [0; MAX_CELLS / 8],
            visits: [0; MAX_CELLS],
            addr: 0,
            a8: false,
            din: true,
            dout: false,
            ctrl: bus::CTRL_DEFAULT,
            row: 0,
            col: 0,
            cycle_row_hi: false,
            pending_dout: None,
            settled: false,
            reads: 0,
            writes: 0,
            ras_cycles: 0,
            err_pulses: 0,
            violations: 0,
            last_violation: None,
            strobe_clock: 0,
            row_last_seen: [0; 256],
            max_row_gap: 0,
            quadrant_log: [(false, false); QUADRANT_LOG_CAP],
            quadrant_len: 0,
            stuck: None,
            coupling: None,
        }
    }

    /// Preset every cell, e.g. to model power-up garbage.
    pub fn fill(&mut self, value: bool) {
        self.cells.fill(if value { 0xFF } else { 0 });
    }

    /// The cell's current logical value (stuck-at faults included).
    pub fn cell(&self, cell: CellAddress) -> bool {
        self.load(self.index_of(cell))
    }

    /// Pin the cell to `value` regardless of writes.
    pub fn set_stuck(&mut self, cell: CellAddress, value: bool) {
        let idx = self.index_of(cell);
        self.put(idx, value);
        self.stuck = Some((idx, value));
    }

    /// Install a coupling fault: writing `trigger` to `aggressor` forces
    /// `victim` to `forced`.
    pub fn set_coupling(
        &mut self,
        aggressor: CellAddress,
        trigger: bool,
        victim: CellAddress,
        forced: bool,
    ) {
        self.coupling = Some(Coupling {
            aggressor: self.index_of(aggressor),
            trigger,
            victim: self.index_of(victim),
            forced,
        });
    }

    pub fn visits_at(&self, index: usize) -> u8 {
        self.visits[index]
    }

    pub fn clear_visits(&mut self) {
        self.visits.fill(0);
    }

    /// (row_hi, col_hi) pairs in first-seen order, consecutive duplicates
    /// collapsed.
    pub fn quadrants(&self) -> &[(bool, bool)] {
        &self.quadrant_log[..self.quadrant_len]
    }

    pub fn clear_quadrant_log(&mut self) {
        self.quadrant_len = 0;
    }

    /// All control lines back at their idle-high level?
    pub fn is_idle(&self) -> bool {
        self.ctrl == bus::CTRL_DEFAULT
    }

    fn violation(&mut self, what: &'static str) {
        self.violations += 1;
        self.last_violation = Some(what);
    }

    fn index_of(&self, cell: CellAddress) -> usize {
        let row = cell.row as u16 | ((cell.row_hi as u16) << 8);
        let col = cell.col as u16 | ((cell.col_hi as u16) << 8);
        self.cell_index(row, col)
    }

    /// Decode latched strobes into a cell index. The 64K part has no ninth
    /// address bit, so both high bits fall away and A8 mirrors alias.
    fn cell_index(&self, row: u16, col: u16) -> usize {
        match self.kind {
            ChipKind::Dram64K => ((row as usize & 0xFF) << 8) | (col as usize & 0xFF),
            ChipKind::Dram256K => ((row as usize & 0x1FF) << 9) | (col as usize & 0x1FF),
        }
    }

    fn load(&self, idx: usize) -> bool {
        if let Some((stuck_idx, value)) = self.stuck {
            if stuck_idx == idx {
                return value;
            }
        }
        self.cells[idx >> 3] & (1 << (idx & 7)) != 0
    }

    fn put(&mut self, idx: usize, value: bool) {
        let mask = 1 << (idx & 7);
        if value {
            self.cells[idx >> 3] |= mask;
        } else {
            self.cells[idx >> 3] &= !mask;
        }
    }

    fn store(&mut self, idx: usize, value: bool) {
        self.put(idx, value);
        if let Some(c) = self.coupling {
            if idx == c.aggressor && value == c.trigger {
                self.put(c.victim, c.forced);
            }
        }
    }

    fn note_ras_strobe(&mut self) {
        self.ras_cycles += 1;
        self.strobe_clock += 1;
        let clock = self.strobe_clock;
        let slot = &mut self.row_last_seen[self.addr as usize];
        if *slot != 0 {
            let gap = clock - *slot;
            if gap > self.max_row_gap {
                self.max_row_gap = gap;
            }
        }
        *slot = clock;
    }

    fn log_quadrant(&mut self, pair: (bool, bool)) {
        if self.quadrant_len > 0 && self.quadrant_log[self.quadrant_len - 1] == pair {
            return;
        }
        if self.quadrant_len < QUADRANT_LOG_CAP {
            self.quadrant_log[self.quadrant_len] = pair;
            self.quadrant_len += 1;
        }
    }

    fn on_ctrl(&mut self, ctrl: u8) {
        let falling = self.ctrl & !ctrl;
        let rising = ctrl & !self.ctrl;

        if falling & (bus::RAS | bus::CAS) == (bus::RAS | bus::CAS) {
            self.violation("RAS and CAS fell in the same store");
        }

        if falling & bus::RAS != 0 {
            self.row = self.addr as u16 | ((self.a8 as u16) << 8);
            self.cycle_row_hi = self.a8;
            self.note_ras_strobe();
        }

        if falling & bus::CAS != 0 {
            if ctrl & bus::RAS != 0 {
                self.violation("CAS fell while RAS was high");
            }
            self.col = self.addr as u16 | ((self.a8 as u16) << 8);
            self.log_quadrant((self.cycle_row_hi, self.a8));
            let idx = self.cell_index(self.row, self.col);
            self.visits[idx] = self.visits[idx].saturating_add(1);
            if ctrl & bus::WE == 0 {
                // WE was down before CAS: early write, DIN latched now.
                let din = self.din;
                self.store(idx, din);
                self.writes += 1;
            } else {
                self.pending_dout = Some(self.load(idx));
                self.settled = false;
                self.reads += 1;
            }
        }

        if falling & bus::WE != 0 && self.ctrl & bus::CAS == 0 {
            self.violation("late write: WE fell after CAS");
        }

        if falling & bus::ERR != 0 {
            self.err_pulses += 1;
        }

        if rising & bus::CAS != 0 {
            self.pending_dout = None;
        }

        self.ctrl = ctrl;
    }

    fn settle(&mut self) {
        if self.pending_dout.is_some() {
            self.settled = true;
        }
    }
}

impl DramPort for SimDram {
    fn write_address(&mut self, byte: u8) {
        self.addr = byte;
    }

    fn write_a8(&mut self, high: bool) {
        self.a8 = high;
    }

    fn write_ctrl(&mut self, ctrl: u8) {
        self.on_ctrl(ctrl);
    }

    fn write_din(&mut self, bit: bool) {
        if bit != self.din && self.ctrl & (bus::CAS | bus::WE) == 0 {
            self.violation("DIN changed inside a write cycle");
        }
        self.din = bit;
    }

    fn read_dout(&mut self) -> bool {
        if let Some(bit) = self.pending_dout {
            if !self.settled {
                self.violation("DOUT sampled before the access-time delay");
            }
            self.dout = bit;
        }
        self.dout
    }

    fn delay_tcac(&mut self) {
        self.settle();
    }

    fn delay_tcas(&mut self) {
        self.settle();
    }

    fn delay_tras(&mut self) {
        self.settle();
    }
}

/// LED recorder: latched levels plus off-to-on pulse counts, so tests can
/// count measurement-mode blinks.
#[derive(Default)]
pub struct SimLeds {
    pub green: bool,
    pub red: bool,
    pub green_pulses: u32,
    pub red_pulses: u32,
}

impl StatusLeds for SimLeds {
    fn set_green(&mut self, on: bool) {
        if on && !self.green {
            self.green_pulses += 1;
        }
        self.green = on;
    }

    fn set_red(&mut self, on: bool) {
        if on && !self.red {
            self.red_pulses += 1;
        }
        self.red = on;
    }
}

/// Scripted capture timer: returns `value` on every capture, after first
/// failing `fail_first` times.
pub struct SimCapture {
    pub value: Option<u32>,
    pub fail_first: u32,
    pub captures: u32,
    /// Captures taken without a preceding arm; should stay zero.
    pub unarmed_captures: u32,
    armed: bool,
}

impl SimCapture {
    pub fn with_value(ticks: u32) -> Self {
        Self {
            value: Some(ticks),
            fail_first: 0,
            captures: 0,
            unarmed_captures: 0,
            armed: false,
        }
    }
}

impl CaptureTimer for SimCapture {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn capture(&mut self) -> Option<u32> {
        if !self.armed {
            self.unarmed_captures += 1;
        }
        self.armed = false;
        self.captures += 1;
        if self.fail_first > 0 {
            self.fail_first -= 1;
            return None;
        }
        self.value
    }
}

/// Blocking-delay stand-in that only accumulates the requested time.
#[derive(Default)]
pub struct SimDelay {
    pub elapsed_ns: u64,
}

impl embedded_hal::delay::DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }
}
