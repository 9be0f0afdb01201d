//! Main RAM test, run once the hardware controller owns the SDRAM.

use core::fmt;
use core::ptr;

use crate::config::MemtestConfig;
use crate::error::Error;
use crate::pattern::{seed_to_data_16, seed_to_data_32};

const ONEZERO: u32 = 0xAAAAAAAA;
const ZEROONE: u32 = 0x55555555;

/// Word-addressed view of main RAM as seen by the CPU.
pub trait MainRam {
    fn write(&mut self, index: usize, value: u32);
    fn read(&mut self, index: usize) -> u32;
    /// Write back and invalidate every cache between the CPU and the SDRAM.
    fn flush(&mut self);
}

impl<'a, M: MainRam + ?Sized> MainRam for &'a mut M {
    fn write(&mut self, index: usize, value: u32) { (**self).write(index, value) }
    fn read(&mut self, index: usize) -> u32 { (**self).read(index) }
    fn flush(&mut self) { (**self).flush() }
}

/// Main RAM behind the CPU data cache and the L2 cache of the SDRAM port.
pub struct Mmio {
    base: *mut u32,
    l2_size: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must be the start of main RAM, and nothing may live in the
    /// region the test overwrites.
    pub const unsafe fn new(base: usize, l2_size: usize) -> Mmio {
        Mmio { base: base as *mut u32, l2_size: l2_size }
    }

    fn flush_cpu_dcache(&self) {
        #[cfg(target_arch = "riscv32")]
        unsafe {
            core::arch::asm!(".word(0x500F)");
        }
        #[cfg(not(target_arch = "riscv32"))]
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    }

    // The L2 cache has no flush; reading twice its size evicts every line.
    fn flush_l2_cache(&self) {
        for i in 0..2 * self.l2_size / 4 {
            unsafe { ptr::read_volatile(self.base.add(i)) };
        }
    }
}

impl MainRam for Mmio {
    fn write(&mut self, index: usize, value: u32) {
        unsafe { ptr::write_volatile(self.base.add(index), value) }
    }

    fn read(&mut self, index: usize) -> u32 {
        unsafe { ptr::read_volatile(self.base.add(index)) }
    }

    fn flush(&mut self) {
        self.flush_cpu_dcache();
        self.flush_l2_cache();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemtestReport {
    pub errors: u32,
    pub total: u32,
}

impl MemtestReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

/// Run the data bus, random data and random addressing passes and count the
/// words that did not read back as written.
pub fn memtest_silent<M: MainRam>(ram: &mut M, config: &MemtestConfig) -> MemtestReport {
    let mut total = 0u32;
    let mut errors = 0u32;

    macro_rules! check {
        (
            { $($prepare:tt)* }
            for $i:ident in ($range:expr) {
                MEMORY[$index:expr] = $data:expr
            }
        ) => ({
            $($prepare)*
            for $i in $range {
                ram.write($index as usize, $data);
                total += 1;
            }

            ram.flush();

            $($prepare)*
            for $i in $range {
                if ram.read($index as usize) != $data {
                    errors += 1;
                }
            }
        })
    }

    let data_random = config.data_random;
    let addr_random = config.addr_random;
    fn prng32(seed: &mut u32, random: bool) -> u32 { *seed = seed_to_data_32(*seed, random); *seed }
    fn prng16(seed: &mut u16, random: bool) -> u16 { *seed = seed_to_data_16(*seed, random); *seed }

    // Test data bus
    check!({} for i in (0..config.bus_words) { MEMORY[i] = ONEZERO });
    check!({} for i in (0..config.bus_words) { MEMORY[i] = ZEROONE });

    // Test counter addressing with random data
    check!({ let mut seed = 0; }
        for i in (0..config.data_size / 4) { MEMORY[i] = prng32(&mut seed, data_random) });

    // Test random addressing with counter data
    check!({ let mut seed = 0; }
        for i in (0..config.addr_size / 4) { MEMORY[prng16(&mut seed, addr_random)] = i as u32 });

    MemtestReport { errors, total }
}

pub fn memtest<M: MainRam>(ram: &mut M, config: &MemtestConfig,
                           logger: &mut Option<&mut dyn fmt::Write>) -> Result<MemtestReport, Error> {
    let report = memtest_silent(ram, config);
    if report.passed() {
        report!(logger, "Memtest OK\n");
        Ok(report)
    } else {
        report!(logger, "Memtest failed: {}/{} words incorrect\n", report.errors, report.total);
        let err = Error::DataIntegrity { errors: report.errors, total: report.total };
        error!("memtest: {}", err);
        Err(err)
    }
}
