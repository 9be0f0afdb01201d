//! SDRAM bring-up: the sequence that takes the SDRAM from reset to a tested,
//! hardware-controlled main memory.

use core::fmt;
use arrayvec::ArrayVec;

use crate::bitslip::read_bitslip;
use crate::config::MAX_LANES;
use crate::dfii::Dfii;
use crate::error::Error;
use crate::memtest::{memtest, MainRam, MemtestReport};
use crate::phy::Phy;
use crate::rdelay::{read_delays, read_level_scan};
use crate::spin::Spin;
use crate::wlevel::{write_level, write_level_scan};

/// Calibration state of one byte lane (DQS group).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lane {
    pub write_delay: u32,
    pub high_skew: bool,
    pub read_delay_min: u32,
    pub read_delay_max: u32,
    pub read_delay_final: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ControllerInit,
    WriteLevel,
    Bitslip,
    ReadDelay,
    HwHandoff,
    Memtest,
    Pass,
    Fail,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        match *self {
            Stage::Pass | Stage::Fail => true,
            _ => false
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Stage::Start          => "start",
            Stage::ControllerInit => "controller init",
            Stage::WriteLevel     => "write leveling",
            Stage::Bitslip        => "read bitslip",
            Stage::ReadDelay      => "read delays",
            Stage::HwHandoff      => "hardware handoff",
            Stage::Memtest        => "memtest",
            Stage::Pass           => "pass",
            Stage::Fail           => "fail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationResult {
    pub lanes: ArrayVec<Lane, MAX_LANES>,
    /// Whether write leveling ran; without it the lane table keeps zero write delays.
    pub write_leveled: bool,
    /// Lanes that received a read bitslip, highest first.
    pub bitslipped: ArrayVec<usize, MAX_LANES>,
    pub read_delays_done: bool,
    pub memtest: Option<MemtestReport>,
    /// `Pass` or `Fail`.
    pub stage: Stage,
    /// The failing stage and why, if any.
    pub error: Option<(Stage, Error)>,
}

impl CalibrationResult {
    fn new(lanes: usize) -> CalibrationResult {
        CalibrationResult {
            lanes: (0..lanes).map(|_| Lane::default()).collect(),
            write_leveled: false,
            bitslipped: ArrayVec::new(),
            read_delays_done: false,
            memtest: None,
            stage: Stage::Start,
            error: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.stage == Stage::Pass
    }
}

// Runs one stage and names the next.
fn step<P, S, M>(stage: Stage, dfii: &mut Dfii<P, S>, ram: &mut M,
                 logger: &mut Option<&mut dyn fmt::Write>,
                 result: &mut CalibrationResult) -> Result<Stage, Error>
        where P: Phy, S: Spin, M: MainRam {
    match stage {
        Stage::Start => {
            report!(logger, "Initializing SDRAM...\n");
            Ok(Stage::ControllerInit)
        }
        Stage::ControllerInit => {
            dfii.init_sequence();
            if dfii.config().vtc {
                dfii.phy.en_vtc_write(false);
            }
            if dfii.config().write_leveling {
                Ok(Stage::WriteLevel)
            } else {
                Ok(Stage::Bitslip)
            }
        }
        Stage::WriteLevel => {
            write_level(dfii, logger, &mut result.lanes)?;
            result.write_leveled = true;
            Ok(Stage::Bitslip)
        }
        Stage::Bitslip => {
            result.bitslipped = read_bitslip(dfii, logger, &result.lanes)?;
            Ok(Stage::ReadDelay)
        }
        Stage::ReadDelay => {
            read_delays(dfii, logger, &mut result.lanes)?;
            result.read_delays_done = true;
            Ok(Stage::HwHandoff)
        }
        Stage::HwHandoff => {
            if dfii.config().vtc {
                dfii.phy.en_vtc_write(true);
            }
            dfii.hardware_control();
            Ok(Stage::Memtest)
        }
        Stage::Memtest => {
            let config = dfii.config().memtest;
            let outcome = memtest(ram, &config, logger);
            result.memtest = Some(match outcome {
                Ok(report) => report,
                Err(Error::DataIntegrity { errors, total }) => MemtestReport { errors, total },
                Err(err) => return Err(err)
            });
            outcome.map(|_| Stage::Pass)
        }
        Stage::Pass | Stage::Fail => Ok(stage)
    }
}

/// Bring the SDRAM up from reset: init sequence, write leveling (when the
/// PHY supports it), read bitslip, read delays, hand-off to the hardware
/// controller and memtest. Stops at the first failing stage.
///
/// Not reentrant: a second run needs a controller reset first, since the
/// delay lines keep the state left by this one.
pub fn init<P, S, M>(dfii: &mut Dfii<P, S>, ram: &mut M,
                     logger: &mut Option<&mut dyn fmt::Write>) -> CalibrationResult
        where P: Phy, S: Spin, M: MainRam {
    let mut result = CalibrationResult::new(dfii.config().lanes());

    let mut stage = Stage::Start;
    while !stage.is_terminal() {
        let next = match step(stage, dfii, ram, logger, &mut result) {
            Ok(next) => next,
            Err(err) => {
                error!("SDRAM {} failed: {}", stage, err);
                result.error = Some((stage, err));
                Stage::Fail
            }
        };
        info!("{} -> {}", stage, next);
        stage = next;
    }
    result.stage = stage;

    if result.passed() {
        report!(logger, "SDRAM initialized\n");
    } else {
        report!(logger, "SDRAM initialization failed\n");
    }
    result
}

/// Boot entry point: `true` if main memory can be used.
pub fn sdrinit<P, S, M>(dfii: &mut Dfii<P, S>, ram: &mut M,
                        mut logger: Option<&mut dyn fmt::Write>) -> bool
        where P: Phy, S: Spin, M: MainRam {
    init(dfii, ram, &mut logger).passed()
}

/// Write leveling, bitslip and read delays only, leaving the SDRAM under
/// software control. Each leveling stage is preceded by its full scan.
pub fn level<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                              logger: &mut Option<&mut dyn fmt::Write>)
                             -> Result<ArrayVec<Lane, MAX_LANES>, Error> {
    let mut lanes: ArrayVec<Lane, MAX_LANES> =
        (0..dfii.config().lanes()).map(|_| Lane::default()).collect();

    if dfii.config().write_leveling {
        write_level_scan(dfii, logger);
        write_level(dfii, logger, &mut lanes)?;
        read_bitslip(dfii, logger, &lanes)?;
    }

    read_level_scan(dfii, logger);
    read_delays(dfii, logger, &mut lanes)?;
    Ok(lanes)
}
