//! Register-level contract of the DFI injector and the DDR PHY delay lines.
//!
//! Everything above this trait only reads and writes named registers; where the
//! registers live is up to the implementation (see `csr` for the memory-mapped
//! one).

use bitflags::bitflags;

bitflags! {
    /// DFII control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u8 {
        /// Hand the DFI over to the hardware controller.
        const SEL     = 0x01;
        const CKE     = 0x02;
        const ODT     = 0x04;
        const RESET_N = 0x08;
    }
}

bitflags! {
    /// Per-phase command register of the DFI injector.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Command: u8 {
        const CS     = 0x01;
        const WE     = 0x02;
        const CAS    = 0x04;
        const RAS    = 0x08;
        const WRDATA = 0x10;
        const RDDATA = 0x20;
    }
}

pub trait Phy {
    fn control_write(&mut self, control: Control);

    fn command_write(&mut self, phase: usize, command: Command);
    fn command_issue(&mut self, phase: usize);
    fn address_write(&mut self, phase: usize, address: u16);
    fn baddress_write(&mut self, phase: usize, bank: u8);

    /// Write data register `offset` of `phase`; one byte per register.
    fn wrdata_write(&mut self, phase: usize, offset: usize, data: u8);
    /// Read data register `offset` of `phase`, as captured by the last read.
    fn rddata_read(&mut self, phase: usize, offset: usize) -> u8;

    /// Select the lanes the delay-line registers below act on, one bit per lane.
    fn dly_sel_write(&mut self, mask: u16);

    fn rdly_dq_rst(&mut self);
    fn rdly_dq_inc(&mut self);
    fn rdly_dq_bitslip(&mut self);

    // Write leveling. PHYs without the capability leave these as no-ops and
    // must not be configured with `write_leveling`.
    fn wdly_dq_rst(&mut self) {}
    fn wdly_dq_inc(&mut self) {}
    fn wdly_dqs_rst(&mut self) {}
    fn wdly_dqs_inc(&mut self) {}
    fn wlevel_en_write(&mut self, _enabled: bool) {}
    fn wlevel_strobe(&mut self) {}

    /// Voltage/temperature compensation of the delay lines.
    fn en_vtc_write(&mut self, _enabled: bool) {}
}

impl<'a, P: Phy + ?Sized> Phy for &'a mut P {
    fn control_write(&mut self, control: Control) { (**self).control_write(control) }
    fn command_write(&mut self, phase: usize, command: Command) { (**self).command_write(phase, command) }
    fn command_issue(&mut self, phase: usize) { (**self).command_issue(phase) }
    fn address_write(&mut self, phase: usize, address: u16) { (**self).address_write(phase, address) }
    fn baddress_write(&mut self, phase: usize, bank: u8) { (**self).baddress_write(phase, bank) }
    fn wrdata_write(&mut self, phase: usize, offset: usize, data: u8) { (**self).wrdata_write(phase, offset, data) }
    fn rddata_read(&mut self, phase: usize, offset: usize) -> u8 { (**self).rddata_read(phase, offset) }
    fn dly_sel_write(&mut self, mask: u16) { (**self).dly_sel_write(mask) }
    fn rdly_dq_rst(&mut self) { (**self).rdly_dq_rst() }
    fn rdly_dq_inc(&mut self) { (**self).rdly_dq_inc() }
    fn rdly_dq_bitslip(&mut self) { (**self).rdly_dq_bitslip() }
    fn wdly_dq_rst(&mut self) { (**self).wdly_dq_rst() }
    fn wdly_dq_inc(&mut self) { (**self).wdly_dq_inc() }
    fn wdly_dqs_rst(&mut self) { (**self).wdly_dqs_rst() }
    fn wdly_dqs_inc(&mut self) { (**self).wdly_dqs_inc() }
    fn wlevel_en_write(&mut self, enabled: bool) { (**self).wlevel_en_write(enabled) }
    fn wlevel_strobe(&mut self) { (**self).wlevel_strobe() }
    fn en_vtc_write(&mut self, enabled: bool) { (**self).en_vtc_write(enabled) }
}
