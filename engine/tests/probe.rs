//! Geometry probe against both simulated parts.

use engine::bus::CellAddress;
use engine::march::{NoRead, Up, WriteZero};
use engine::probe::ChipKind;
use engine::sim::{SimDelay, SimDram, SimLeds};
use engine::Tester;

const ORIGIN: CellAddress = CellAddress {
    row: 0,
    col: 0,
    row_hi: false,
    col_hi: false,
};

#[test]
fn probe_selects_the_256k_path() {
    let mut dram = Box::new(SimDram::new(ChipKind::Dram256K));
    let mut leds = SimLeds::default();

    let mut tester = Tester::new(&mut *dram, &mut leds, SimDelay::default());
    tester.power_up();
    assert_eq!(tester.probe(), ChipKind::Dram256K);
    assert_eq!(tester.kind(), ChipKind::Dram256K);
    drop(tester);

    // A8 decoded: the zero written at the mirror landed elsewhere and the
    // origin kept its one.
    assert!(dram.cell(ORIGIN));

    // A march element on the selected path covers all 2^18 cells, once.
    dram.clear_visits();
    let mut tester = Tester::new(&mut *dram, &mut leds, SimDelay::default());
    tester.assume_kind(ChipKind::Dram256K);
    tester.march_step::<Up, NoRead, WriteZero>();
    drop(tester);
    for idx in 0..(1usize << 18) {
        assert_eq!(dram.visits_at(idx), 1, "cell {idx} visit count");
    }
}

#[test]
fn probe_selects_the_64k_path() {
    let mut dram = Box::new(SimDram::new(ChipKind::Dram64K));
    let mut leds = SimLeds::default();

    let mut tester = Tester::new(&mut *dram, &mut leds, SimDelay::default());
    tester.power_up();
    assert_eq!(tester.probe(), ChipKind::Dram64K);
    drop(tester);

    // A8 ignored: the second write aliased the first and cleared it.
    assert!(!dram.cell(ORIGIN));

    // The selected path covers exactly the 2^16 real cells.
    dram.clear_visits();
    let mut tester = Tester::new(&mut *dram, &mut leds, SimDelay::default());
    tester.march_step::<Up, NoRead, WriteZero>();
    drop(tester);
    for idx in 0..(1usize << 16) {
        assert_eq!(dram.visits_at(idx), 1, "cell {idx} visit count");
    }
    assert_eq!(dram.writes, 2 + (1 << 16));
}

#[test]
fn probe_runs_clean_on_the_wire() {
    let mut dram = Box::new(SimDram::new(ChipKind::Dram256K));
    let mut leds = SimLeds::default();
    let mut tester = Tester::new(&mut *dram, &mut leds, SimDelay::default());
    tester.power_up();
    tester.probe();
    drop(tester);

    assert!(dram.is_idle());
    assert_eq!(dram.violations, 0, "violation: {:?}", dram.last_violation);
    // Two writes and one read, nothing else.
    assert_eq!(dram.writes, 2);
    assert_eq!(dram.reads, 1);
}
