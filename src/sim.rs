//! Behavioural model of the DFI injector, the PHY delay lines and main RAM.

use crate::config::PhyConfig;
use crate::dfii::PhysicalCommand;
use crate::memtest::MainRam;
use crate::phy::{Command, Control, Phy};
use crate::spin::Spin;

#[derive(Debug, Default)]
pub struct Spun {
    pub cycles: usize,
}

impl Spin for Spun {
    fn spin_cycles(&mut self, cycles: usize) {
        self.cycles += cycles;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Latch {
    address: u16,
    bank: u8,
    command: Option<Command>,
}

/// Reads return the stored burst for a lane only while its read delay is
/// inside the lane's window; otherwise every bit comes back inverted.
/// Leveling feedback of a lane is 1 while its DQS delay is below
/// `ones_until` or at/after `rising_at`.
pub struct SimPhy {
    lanes: usize,
    latches: Vec<Latch>,
    wrdata: Vec<Vec<u8>>,
    burst: Vec<Vec<u8>>,
    rddata: Vec<Vec<u8>>,
    windows: Vec<Option<(u32, u32)>>,
    wlevel_profiles: Vec<(u32, u32)>,

    pub commands: Vec<PhysicalCommand>,
    pub control: Control,
    pub dly_sel: u16,
    pub rdly: Vec<u32>,
    pub rdly_incs: Vec<u32>,
    pub bitslips: Vec<u32>,
    pub wdly_dq: Vec<u32>,
    pub wdly_dqs: Vec<u32>,
    pub wlevel_enabled: bool,
    pub wlevel_strobes: u32,
    pub vtc_writes: Vec<bool>,
    pub reads: u32,
    pub open_row: Option<u16>,
}

impl SimPhy {
    pub fn new(config: &PhyConfig) -> SimPhy {
        let lanes = config.lanes();
        let registers = vec![vec![0; config.pix_data_size]; config.nphases];
        SimPhy {
            lanes,
            latches: vec![Latch::default(); config.nphases],
            wrdata: registers.clone(),
            burst: registers.clone(),
            rddata: registers,
            windows: vec![None; lanes],
            wlevel_profiles: vec![(0, u32::max_value()); lanes],

            commands: Vec::new(),
            control: Control::empty(),
            dly_sel: 0,
            rdly: vec![0; lanes],
            rdly_incs: vec![0; lanes],
            bitslips: vec![0; lanes],
            wdly_dq: vec![0; lanes],
            wdly_dqs: vec![0; lanes],
            wlevel_enabled: false,
            wlevel_strobes: 0,
            vtc_writes: Vec::new(),
            reads: 0,
            open_row: None,
        }
    }

    /// Read delays `start..=end` of `lane` return correct data.
    pub fn set_read_window(&mut self, lane: usize, start: u32, end: u32) {
        self.windows[lane] = Some((start, end));
    }

    pub fn clear_read_window(&mut self, lane: usize) {
        self.windows[lane] = None;
    }

    pub fn set_wlevel_profile(&mut self, lane: usize, ones_until: u32, rising_at: u32) {
        self.wlevel_profiles[lane] = (ones_until, rising_at);
    }

    fn selected(&self) -> Vec<usize> {
        (0..self.lanes).filter(|lane| self.dly_sel & (1 << lane) != 0).collect()
    }

    fn lane_of(&self, offset: usize) -> usize {
        self.lanes - 1 - offset % self.lanes
    }

    fn capture(&mut self) {
        self.reads += 1;
        for phase in 0..self.burst.len() {
            for offset in 0..self.burst[phase].len() {
                let lane = self.lane_of(offset);
                let delay = self.rdly[lane];
                let stored = self.burst[phase][offset];
                self.rddata[phase][offset] = match self.windows[lane] {
                    Some((start, end)) if start <= delay && delay <= end => stored,
                    _ => !stored
                };
            }
        }
    }
}

impl Phy for SimPhy {
    fn control_write(&mut self, control: Control) {
        self.control = control;
    }

    fn command_write(&mut self, phase: usize, command: Command) {
        self.latches[phase].command = Some(command);
    }

    fn command_issue(&mut self, phase: usize) {
        let latch = self.latches[phase];
        let flags = latch.command.unwrap_or(Command::empty());
        self.commands.push(PhysicalCommand {
            phase, address: latch.address, bank: latch.bank, flags
        });

        if flags.contains(Command::RAS) && !flags.contains(Command::CAS) {
            if flags.contains(Command::WE) {
                self.open_row = None;
            } else {
                self.open_row = Some(latch.address);
            }
        }
        if flags.contains(Command::WRDATA) {
            self.burst = self.wrdata.clone();
        }
        if flags.contains(Command::RDDATA) {
            self.capture();
        }
    }

    fn address_write(&mut self, phase: usize, address: u16) {
        self.latches[phase].address = address;
    }

    fn baddress_write(&mut self, phase: usize, bank: u8) {
        self.latches[phase].bank = bank;
    }

    fn wrdata_write(&mut self, phase: usize, offset: usize, data: u8) {
        self.wrdata[phase][offset] = data;
    }

    fn rddata_read(&mut self, phase: usize, offset: usize) -> u8 {
        self.rddata[phase][offset]
    }

    fn dly_sel_write(&mut self, mask: u16) {
        self.dly_sel = mask;
    }

    fn rdly_dq_rst(&mut self) {
        for lane in self.selected() {
            self.rdly[lane] = 0;
        }
    }

    fn rdly_dq_inc(&mut self) {
        for lane in self.selected() {
            self.rdly[lane] += 1;
            self.rdly_incs[lane] += 1;
        }
    }

    fn rdly_dq_bitslip(&mut self) {
        for lane in self.selected() {
            self.bitslips[lane] += 1;
        }
    }

    fn wdly_dq_rst(&mut self) {
        for lane in self.selected() {
            self.wdly_dq[lane] = 0;
        }
    }

    fn wdly_dq_inc(&mut self) {
        for lane in self.selected() {
            self.wdly_dq[lane] += 1;
        }
    }

    fn wdly_dqs_rst(&mut self) {
        for lane in self.selected() {
            self.wdly_dqs[lane] = 0;
        }
    }

    fn wdly_dqs_inc(&mut self) {
        for lane in self.selected() {
            self.wdly_dqs[lane] += 1;
        }
    }

    fn wlevel_en_write(&mut self, enabled: bool) {
        self.wlevel_enabled = enabled;
    }

    fn wlevel_strobe(&mut self) {
        self.wlevel_strobes += 1;
        for lane in 0..self.lanes {
            let (ones_until, rising_at) = self.wlevel_profiles[lane];
            let delay = self.wdly_dqs[lane];
            let high = delay < ones_until || delay >= rising_at;
            self.rddata[0][self.lanes - 1 - lane] = high as u8;
        }
    }

    fn en_vtc_write(&mut self, enabled: bool) {
        self.vtc_writes.push(enabled);
    }
}

/// Main RAM with optional stuck-at-zero bits.
pub struct SimRam {
    words: Vec<u32>,
    stuck: Vec<u32>,
    pub flushes: u32,
    pub writes: u32,
}

impl SimRam {
    pub fn new(words: usize) -> SimRam {
        SimRam { words: vec![0; words], stuck: vec![0; words], flushes: 0, writes: 0 }
    }

    pub fn stick_at_zero(&mut self, index: usize, mask: u32) {
        self.stuck[index] |= mask;
    }
}

impl MainRam for SimRam {
    fn write(&mut self, index: usize, value: u32) {
        self.writes += 1;
        self.words[index] = value & !self.stuck[index];
    }

    fn read(&mut self, index: usize) -> u32 {
        self.words[index]
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
