//! Memory-mapped `Phy` over MiSoC CSRs.
//!
//! MiSoC splits every register wider than the CSR bus into 8-bit
//! subregisters, most significant first, `stride` bytes apart.

use core::ptr::{read_volatile, write_volatile};
use byteorder::{ByteOrder, BigEndian};

use crate::config::MAX_PHASES;
use crate::phy::{Command, Control, Phy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfiiPhaseCsrs {
    pub command: usize,
    pub command_issue: usize,
    pub address: usize,
    pub baddress: usize,
    pub wrdata: usize,
    pub rddata: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WlevelCsrs {
    pub wdly_dq_rst: usize,
    pub wdly_dq_inc: usize,
    pub wdly_dqs_rst: usize,
    pub wdly_dqs_inc: usize,
    pub wlevel_en: usize,
    pub wlevel_strobe: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrMap {
    /// Bytes between consecutive subregisters.
    pub stride: usize,
    pub control: usize,
    pub phases: [DfiiPhaseCsrs; MAX_PHASES],
    /// Subregisters making up one address register.
    pub address_size: usize,
    pub dly_sel: usize,
    pub dly_sel_size: usize,
    pub rdly_dq_rst: usize,
    pub rdly_dq_inc: usize,
    pub rdly_dq_bitslip: usize,
    pub wlevel: Option<WlevelCsrs>,
    pub en_vtc: Option<usize>,
}

pub struct CsrPhy {
    map: CsrMap,
}

impl CsrPhy {
    /// # Safety
    ///
    /// Every address in `map` must be a CSR of the running gateware, and
    /// nothing else may touch the DFII or DDRPHY while the value lives.
    pub const unsafe fn new(map: CsrMap) -> CsrPhy {
        CsrPhy { map: map }
    }

    fn subregister(&self, base: usize, index: usize) -> *mut u32 {
        (base + index * self.map.stride) as *mut u32
    }

    fn write(&mut self, base: usize, size: usize, value: u32) {
        let mut bytes = [0; 4];
        BigEndian::write_u32(&mut bytes, value);
        for (index, &byte) in bytes[4 - size..].iter().enumerate() {
            unsafe { write_volatile(self.subregister(base, index), byte as u32) }
        }
    }

    fn strobe(&mut self, addr: usize) {
        self.write(addr, 1, 1)
    }
}

impl Phy for CsrPhy {
    fn control_write(&mut self, control: Control) {
        let addr = self.map.control;
        self.write(addr, 1, control.bits() as u32)
    }

    fn command_write(&mut self, phase: usize, command: Command) {
        let addr = self.map.phases[phase].command;
        self.write(addr, 1, command.bits() as u32)
    }

    fn command_issue(&mut self, phase: usize) {
        let addr = self.map.phases[phase].command_issue;
        self.strobe(addr)
    }

    fn address_write(&mut self, phase: usize, address: u16) {
        let (addr, size) = (self.map.phases[phase].address, self.map.address_size);
        self.write(addr, size, address as u32)
    }

    fn baddress_write(&mut self, phase: usize, bank: u8) {
        let addr = self.map.phases[phase].baddress;
        self.write(addr, 1, bank as u32)
    }

    fn wrdata_write(&mut self, phase: usize, offset: usize, data: u8) {
        let reg = self.subregister(self.map.phases[phase].wrdata, offset);
        unsafe { write_volatile(reg, data as u32) }
    }

    fn rddata_read(&mut self, phase: usize, offset: usize) -> u8 {
        let reg = self.subregister(self.map.phases[phase].rddata, offset);
        unsafe { read_volatile(reg) as u8 }
    }

    fn dly_sel_write(&mut self, mask: u16) {
        let (addr, size) = (self.map.dly_sel, self.map.dly_sel_size);
        self.write(addr, size, mask as u32)
    }

    fn rdly_dq_rst(&mut self) {
        let addr = self.map.rdly_dq_rst;
        self.strobe(addr)
    }

    fn rdly_dq_inc(&mut self) {
        let addr = self.map.rdly_dq_inc;
        self.strobe(addr)
    }

    fn rdly_dq_bitslip(&mut self) {
        let addr = self.map.rdly_dq_bitslip;
        self.strobe(addr)
    }

    fn wdly_dq_rst(&mut self) {
        if let Some(wlevel) = self.map.wlevel {
            self.strobe(wlevel.wdly_dq_rst)
        }
    }

    fn wdly_dq_inc(&mut self) {
        if let Some(wlevel) = self.map.wlevel {
            self.strobe(wlevel.wdly_dq_inc)
        }
    }

    fn wdly_dqs_rst(&mut self) {
        if let Some(wlevel) = self.map.wlevel {
            self.strobe(wlevel.wdly_dqs_rst)
        }
    }

    fn wdly_dqs_inc(&mut self) {
        if let Some(wlevel) = self.map.wlevel {
            self.strobe(wlevel.wdly_dqs_inc)
        }
    }

    fn wlevel_en_write(&mut self, enabled: bool) {
        if let Some(wlevel) = self.map.wlevel {
            self.write(wlevel.wlevel_en, 1, enabled as u32)
        }
    }

    fn wlevel_strobe(&mut self) {
        if let Some(wlevel) = self.map.wlevel {
            self.strobe(wlevel.wlevel_strobe)
        }
    }

    fn en_vtc_write(&mut self, enabled: bool) {
        if let Some(addr) = self.map.en_vtc {
            self.write(addr, 1, enabled as u32)
        }
    }
}
