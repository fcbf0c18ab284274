pub use crate::bus::{CellAddress, DramBus, DramPort};
pub use crate::indicator::{Indicator, StatusLeds};
pub use crate::march::{
    Direction, Down, ExpectOne, ExpectZero, NoRead, NoWrite, ReadSpec, Up, WriteOne, WriteSpec,
    WriteZero,
};
pub use crate::measure::{CaptureTimer, Speed};
pub use crate::probe::ChipKind;
pub use crate::Tester;
