#![cfg_attr(not(test), no_std)]

//! DDR SDRAM bring-up for MiSoC DFII/DDRPHY gateware: controller init, write
//! leveling, read bitslip, read delay calibration and the memory test.

extern crate arrayvec;
extern crate bitflags;
extern crate byteorder;
#[macro_use]
extern crate log;
#[cfg(target_arch = "riscv32")]
extern crate riscv;

// Diagnostic lines for the boot console; dropped when no sink is attached.
macro_rules! report {
    ($logger:expr, $( $arg:expr ),+) => (
        if let &mut Some(ref mut f) = $logger {
            use core::fmt::Write;
            let _ = write!(f, $( $arg ),+);
        }
    )
}

pub mod error;
pub mod config;
pub mod spin;
pub mod phy;
pub mod csr;
pub mod board;
pub mod dfii;
pub mod pattern;
pub mod wlevel;
pub mod bitslip;
pub mod rdelay;
pub mod memtest;
pub mod sdram;
pub mod console;
pub mod logger;

#[cfg(test)]
mod sim;

pub use config::{PhyConfig, MemtestConfig};
pub use dfii::Dfii;
pub use error::Error;
pub use sdram::{sdrinit, CalibrationResult, Lane, Stage};
