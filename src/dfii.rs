//! The DFI injector handle and the command sequencer built on it.
//!
//! `Dfii` owns the PHY registers for as long as the SDRAM is under software
//! control; every stage of the bring-up borrows it mutably, so no two of them
//! can touch the delay lines at once.

use crate::config::PhyConfig;
use crate::error::Error;
use crate::phy::{Command, Control, Phy};
use crate::spin::Spin;

/// Wait after every command before its data registers are looked at.
pub const COMMAND_SETTLE_CYCLES: usize = 15;

/// One command driven onto one DFI phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalCommand {
    pub phase: usize,
    pub address: u16,
    pub bank: u8,
    pub flags: Command,
}

impl PhysicalCommand {
    pub fn activate(row: u16, bank: u8) -> PhysicalCommand {
        PhysicalCommand { phase: 0, address: row, bank, flags: Command::RAS | Command::CS }
    }

    pub fn precharge() -> PhysicalCommand {
        PhysicalCommand { phase: 0, address: 0, bank: 0,
                          flags: Command::RAS | Command::WE | Command::CS }
    }

    pub fn load_mode_register(register: u8, value: u16) -> PhysicalCommand {
        PhysicalCommand { phase: 0, address: value, bank: register,
                          flags: Command::RAS | Command::CAS | Command::WE | Command::CS }
    }

    pub fn zq_calibration() -> PhysicalCommand {
        PhysicalCommand { phase: 0, address: 0x400, bank: 0, flags: Command::WE | Command::CS }
    }

    pub fn read(phase: usize, column: u16) -> PhysicalCommand {
        PhysicalCommand { phase, address: column, bank: 0,
                          flags: Command::CAS | Command::CS | Command::RDDATA }
    }

    pub fn write(phase: usize, column: u16) -> PhysicalCommand {
        PhysicalCommand { phase, address: column, bank: 0,
                          flags: Command::CAS | Command::WE | Command::CS | Command::WRDATA }
    }
}

pub struct Dfii<P, S> {
    pub(crate) phy: P,
    spin: S,
    config: PhyConfig,
}

impl<P: Phy, S: Spin> Dfii<P, S> {
    pub fn new(phy: P, spin: S, config: PhyConfig) -> Result<Dfii<P, S>, Error> {
        config.validate()?;
        Ok(Dfii { phy, spin, config })
    }

    pub fn config(&self) -> &PhyConfig {
        &self.config
    }

    pub fn phy(&mut self) -> &mut P {
        &mut self.phy
    }

    pub fn into_inner(self) -> (P, S) {
        (self.phy, self.spin)
    }

    /// Stage tables hold one entry per lane of this PHY.
    pub fn check_lane_count(&self, count: usize) -> Result<(), Error> {
        if count == self.config.lanes() {
            Ok(())
        } else {
            Err(Error::InvalidConfig("lane table does not match the PHY"))
        }
    }

    pub fn spin_cycles(&mut self, cycles: usize) {
        self.spin.spin_cycles(cycles)
    }

    pub fn issue(&mut self, command: &PhysicalCommand) {
        self.phy.address_write(command.phase, command.address);
        self.phy.baddress_write(command.phase, command.bank);
        self.phy.command_write(command.phase, command.flags);
        self.phy.command_issue(command.phase);
        self.spin.spin_cycles(COMMAND_SETTLE_CYCLES);
    }

    pub fn activate(&mut self, row: u16) {
        self.issue(&PhysicalCommand::activate(row, 0))
    }

    pub fn precharge(&mut self) {
        self.issue(&PhysicalCommand::precharge())
    }

    pub fn load_mode_register(&mut self, register: u8, value: u16) {
        self.issue(&PhysicalCommand::load_mode_register(register, value))
    }

    /// Read a burst from `column` of the open row into the read data registers.
    pub fn read_burst(&mut self, column: u16) {
        let phase = self.config.rdphase;
        self.issue(&PhysicalCommand::read(phase, column))
    }

    /// Write the write data registers of every phase as one burst at `column`.
    pub fn write_burst(&mut self, column: u16) {
        let phase = self.config.wrphase;
        self.issue(&PhysicalCommand::write(phase, column))
    }

    pub fn software_control(&mut self) {
        self.phy.control_write(Control::CKE | Control::ODT | Control::RESET_N)
    }

    pub fn hardware_control(&mut self) {
        self.phy.control_write(Control::SEL)
    }

    /// DDR3 power-up and initialization, leaving the SDRAM idle under software control.
    pub fn init_sequence(&mut self) {
        let mode = self.config.mode_registers;

        // Release reset
        self.phy.address_write(0, 0);
        self.phy.baddress_write(0, 0);
        self.phy.control_write(Control::ODT | Control::RESET_N);
        self.spin_cycles(50000);

        // Bring CKE high
        self.phy.control_write(Control::CKE | Control::ODT | Control::RESET_N);
        self.spin_cycles(10000);

        self.load_mode_register(2, mode.mr2);
        self.load_mode_register(3, mode.mr3);
        self.load_mode_register(1, mode.mr1);
        self.load_mode_register(0, mode.mr0);
        self.spin_cycles(200);

        self.issue(&PhysicalCommand::zq_calibration());
        self.spin_cycles(200);
    }
}
