//! Busy-wait delays. No timer is running this early, so time is counted in
//! loop iterations.

pub trait Spin {
    fn spin_cycles(&mut self, cycles: usize);
}

/// Spins on `nop` for the requested number of iterations.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cycles;

impl Spin for Cycles {
    fn spin_cycles(&mut self, mut cycles: usize) {
        while cycles > 0 {
            #[cfg(target_arch = "riscv32")]
            unsafe { riscv::asm::nop() }
            #[cfg(not(target_arch = "riscv32"))]
            core::hint::spin_loop();
            cycles -= 1;
        }
    }
}

impl<'a, S: Spin + ?Sized> Spin for &'a mut S {
    fn spin_cycles(&mut self, cycles: usize) {
        (**self).spin_cycles(cycles)
    }
}
