//! Kasli: 7-series DDR3 PHY, four DFI phases, two byte lanes.

use core::fmt;

use crate::config::{MemtestConfig, PhyConfig};
use crate::csr::{CsrMap, CsrPhy, DfiiPhaseCsrs};
use crate::dfii::Dfii;
use crate::memtest::Mmio;
use crate::sdram;
use crate::spin::Cycles;

pub const DFII_BASE: usize = 0xe0002000;
pub const DDRPHY_BASE: usize = 0xe0003800;
pub const MAIN_RAM_BASE: usize = 0x40000000;
pub const CONFIG_L2_SIZE: usize = 131072;

const fn phase(base: usize) -> DfiiPhaseCsrs {
    DfiiPhaseCsrs {
        command:       base,
        command_issue: base + 0x08,
        address:       base + 0x10,
        baddress:      base + 0x20,
        wrdata:        base + 0x28,
        rddata:        base + 0x48,
    }
}

pub const KASLI_CSR: CsrMap = CsrMap {
    stride: 8,
    control: DFII_BASE,
    phases: [
        phase(DFII_BASE + 0x008),
        phase(DFII_BASE + 0x070),
        phase(DFII_BASE + 0x0d8),
        phase(DFII_BASE + 0x140),
    ],
    address_size: 2,
    dly_sel: DDRPHY_BASE,
    dly_sel_size: 1,
    rdly_dq_rst: DDRPHY_BASE + 0x08,
    rdly_dq_inc: DDRPHY_BASE + 0x10,
    rdly_dq_bitslip: DDRPHY_BASE + 0x18,
    wlevel: None,
    en_vtc: None,
};

pub fn kasli_config() -> PhyConfig {
    PhyConfig {
        memtest: MemtestConfig { base: MAIN_RAM_BASE, ..MemtestConfig::DEFAULT },
        ..PhyConfig::S7DDRPHY
    }
}

/// Bring up the Kasli SDRAM through its CSRs and test main RAM.
///
/// # Safety
///
/// Must run once, from the boot path, before anything uses main RAM.
pub unsafe fn init(mut logger: Option<&mut dyn fmt::Write>) -> bool {
    let config = kasli_config();
    let phy = CsrPhy::new(KASLI_CSR);
    let mut ram = Mmio::new(config.memtest.base, CONFIG_L2_SIZE);

    let mut dfii = match Dfii::new(phy, Cycles, config) {
        Ok(dfii) => dfii,
        Err(err) => {
            error!("{}", err);
            return false
        }
    };
    sdram::init(&mut dfii, &mut ram, &mut logger).passed()
}
