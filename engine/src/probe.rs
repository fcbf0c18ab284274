//! One-shot geometry probe: is the installed part 8-bit or 9-bit addressed?

use embedded_hal::delay::DelayNs;

use crate::bus::{CellAddress, DramPort};
use crate::indicator::StatusLeds;
use crate::Tester;

/// The two supported address geometries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipKind {
    /// 4164 family: 64 Kbit, 8-bit row by 8-bit column.
    Dram64K,
    /// 41256 family: 256 Kbit, 9-bit row by 9-bit column.
    Dram256K,
}

impl ChipKind {
    pub fn cells(self) -> u32 {
        match self {
            ChipKind::Dram64K => 1 << 16,
            ChipKind::Dram256K => 1 << 18,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChipKind::Dram64K => "4164 (64Kx1)",
            ChipKind::Dram256K => "41256 (256Kx1)",
        }
    }
}

const ORIGIN: CellAddress = CellAddress {
    row: 0,
    col: 0,
    row_hi: false,
    col_hi: false,
};

/// Same low byte as [`ORIGIN`], opposite A8 on both strobes. Distinct cell
/// on a 256K part, an alias of the origin on a 64K part.
const MIRROR: CellAddress = CellAddress {
    row: 0,
    col: 0,
    row_hi: true,
    col_hi: true,
};

impl<P: DramPort, L: StatusLeds, D: DelayNs> Tester<P, L, D> {
    /// Detect the installed part by checking whether A8 decodes as an
    /// address bit.
    ///
    /// Write 1 at the origin, write 0 at its A8 mirror, read back the
    /// origin. A 64K part ignores A8, so the second write lands on top of
    /// the first and the read returns 0; a 256K part keeps the two cells
    /// apart and the read returns 1.
    ///
    /// Runs once, right after wake-up and before any pass.
    pub fn probe(&mut self) -> ChipKind {
        self.bus.set_din(true);
        self.bus.write(ORIGIN);
        self.bus.set_din(false);
        self.bus.write(MIRROR);
        let kind = if self.bus.read(ORIGIN) {
            ChipKind::Dram256K
        } else {
            ChipKind::Dram64K
        };
        self.kind = kind;
        info!("probe: {}", kind.name());
        kind
    }
}
