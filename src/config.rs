//! PHY capabilities and sizes, resolved once before calibration starts.

use crate::error::Error;

/// Most DFI phases any supported PHY exposes.
pub const MAX_PHASES: usize = 4;
/// Most byte lanes (DQS groups) any supported PHY exposes.
pub const MAX_LANES: usize = 16;

/// DDR3 mode register values loaded by the controller init sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRegisters {
    pub mr0: u16,
    pub mr1: u16,
    pub mr2: u16,
    pub mr3: u16,
}

impl ModeRegisters {
    /// CL=7, BL=8, RTT_NOM=RZQ/4, RTT_WR=RZQ/4.
    pub const DDR3: ModeRegisters = ModeRegisters {
        mr0: 0x930,
        mr1: 0x6,
        mr2: 0x408,
        mr3: 0x0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemtestConfig {
    pub base: usize,
    /// Words written by each of the two data bus patterns.
    pub bus_words: usize,
    /// Bytes covered by the sequential data pass.
    pub data_size: usize,
    /// Bytes worth of words written by the random addressing pass.
    pub addr_size: usize,
    pub data_random: bool,
    pub addr_random: bool,
}

impl MemtestConfig {
    pub const DEFAULT: MemtestConfig = MemtestConfig {
        base: 0x40000000,
        bus_words: 128,
        data_size: 2 * 1024 * 1024,
        addr_size: 32 * 1024,
        data_random: true,
        addr_random: true,
    };

    /// Number of words checked by one memtest run.
    pub fn total_words(&self) -> usize {
        2 * self.bus_words + self.data_size / 4 + self.addr_size / 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyConfig {
    pub nphases: usize,
    /// Data registers per phase; each lane owns two of them.
    pub pix_data_size: usize,
    pub rdphase: usize,
    pub wrphase: usize,
    /// Delay cap for every search (`ERR_DDRPHY_DELAY`).
    pub max_delay: u32,
    pub write_leveling: bool,
    /// Extra taps into the CK=0 zone after a high-skew crossing.
    pub wlevel_zero_margin: u32,
    /// Strobes per bitslip; 7-series ISERDES in DDR mode needs 3 for one bit.
    pub bitslip_pulses: u32,
    /// Taps to advance past the first working read delay.
    pub read_margin: u32,
    /// Reads per probe of the read-delay sweep; all of them must match.
    pub probe_reads: u32,
    pub vtc: bool,
    pub mode_registers: ModeRegisters,
    pub memtest: MemtestConfig,
}

impl PhyConfig {
    pub const S7DDRPHY: PhyConfig = PhyConfig {
        nphases: 4,
        pix_data_size: 4,
        rdphase: 1,
        wrphase: 2,
        max_delay: 32,
        write_leveling: false,
        wlevel_zero_margin: 0,
        bitslip_pulses: 3,
        read_margin: 1,
        probe_reads: 1,
        vtc: false,
        mode_registers: ModeRegisters::DDR3,
        memtest: MemtestConfig::DEFAULT,
    };

    pub const KUSDDRPHY: PhyConfig = PhyConfig {
        nphases: 4,
        pix_data_size: 8,
        rdphase: 1,
        wrphase: 2,
        max_delay: 512,
        write_leveling: true,
        wlevel_zero_margin: 32,
        bitslip_pulses: 1,
        read_margin: 16,
        probe_reads: 1,
        vtc: true,
        mode_registers: ModeRegisters::DDR3,
        memtest: MemtestConfig::DEFAULT,
    };

    /// Preset selected by the gateware configuration at build time.
    pub fn board() -> PhyConfig {
        #[cfg(kusddrphy)]
        let config = PhyConfig::KUSDDRPHY;
        #[cfg(not(kusddrphy))]
        let config = PhyConfig {
            write_leveling: cfg!(ddrphy_wlevel),
            ..PhyConfig::S7DDRPHY
        };
        config
    }

    /// Number of byte lanes (`DFII_PIX_DATA_SIZE / 2`).
    pub fn lanes(&self) -> usize {
        self.pix_data_size / 2
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.nphases == 0 || self.nphases > MAX_PHASES {
            return Err(Error::InvalidConfig("phase count out of range"))
        }
        if self.pix_data_size == 0 || self.pix_data_size % 2 != 0 {
            return Err(Error::InvalidConfig("per-phase data size must be even"))
        }
        if self.lanes() > MAX_LANES {
            return Err(Error::InvalidConfig("too many lanes"))
        }
        if self.rdphase >= self.nphases || self.wrphase >= self.nphases {
            return Err(Error::InvalidConfig("read/write phase out of range"))
        }
        if self.max_delay == 0 {
            return Err(Error::InvalidConfig("delay cap must be nonzero"))
        }
        if self.bitslip_pulses == 0 || self.probe_reads == 0 {
            return Err(Error::InvalidConfig("pulse and probe counts must be nonzero"))
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(PhyConfig::S7DDRPHY.validate(), Ok(()));
        assert_eq!(PhyConfig::KUSDDRPHY.validate(), Ok(()));
        assert_eq!(PhyConfig::board().validate(), Ok(()));
        assert_eq!(PhyConfig::S7DDRPHY.lanes(), 2);
        assert_eq!(PhyConfig::KUSDDRPHY.lanes(), 4);
    }

    #[test]
    fn rejects_odd_data_size() {
        let config = PhyConfig { pix_data_size: 5, ..PhyConfig::S7DDRPHY };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_phase_outside_range() {
        let config = PhyConfig { rdphase: 4, ..PhyConfig::S7DDRPHY };
        assert!(config.validate().is_err());
        let config = PhyConfig { nphases: 5, ..PhyConfig::S7DDRPHY };
        assert!(config.validate().is_err());
    }

    #[test]
    fn memtest_total_counts_every_pass() {
        assert_eq!(MemtestConfig::DEFAULT.total_words(),
                   2 * 128 + 2 * 1024 * 1024 / 4 + 32 * 1024 / 4);
    }
}
