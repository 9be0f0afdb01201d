//! SDRAM debug commands of the boot console.

use core::fmt;

use crate::config::{MAX_LANES, MAX_PHASES};
use crate::dfii::Dfii;
use crate::error::Error;
use crate::memtest::{memtest, MainRam};
use crate::phy::Phy;
use crate::sdram;
use crate::spin::Spin;
use crate::wlevel::enable_write_leveling;

const MAX_DATA: usize = MAX_PHASES * 2 * MAX_LANES;

/// Parse an unsigned integer the way `strtoul(s, _, 0)` does: `0x` prefix for
/// hex, a leading `0` for octal, decimal otherwise. Trailing garbage is an error.
pub fn parse_u32(s: &str) -> Result<u32, Error> {
    let (digits, radix) =
        if s.starts_with("0x") || s.starts_with("0X") {
            (&s[2..], 16)
        } else if s.len() > 1 && s.starts_with('0') {
            (&s[1..], 8)
        } else {
            (s, 10)
        };
    if digits.is_empty() || digits.starts_with('+') {
        return Err(Error::ParseError)
    }
    u32::from_str_radix(digits, radix).map_err(|_| Error::ParseError)
}

/// Like `parse_u32`, for row and column addresses.
pub fn parse_u16(s: &str) -> Result<u16, Error> {
    let value = parse_u32(s)?;
    if value > u16::max_value() as u32 {
        return Err(Error::ParseError)
    }
    Ok(value as u16)
}

fn argument(arg: Option<&str>, usage: &'static str) -> Result<u32, Error> {
    match arg {
        Some(arg) => parse_u32(arg),
        None => Err(Error::MissingArgument(usage))
    }
}

fn address(arg: Option<&str>, usage: &'static str) -> Result<u16, Error> {
    match arg {
        Some(arg) => parse_u16(arg),
        None => Err(Error::MissingArgument(usage))
    }
}

fn require_write_leveling<P: Phy, S: Spin>(dfii: &Dfii<P, S>) -> Result<(), Error> {
    if dfii.config().write_leveling {
        Ok(())
    } else {
        Err(Error::InvalidConfig("PHY has no write leveling"))
    }
}

// Print the read data registers of every phase, or only those of one lane.
fn print_rddata<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                                 logger: &mut Option<&mut dyn fmt::Write>,
                                 lane: Option<usize>) {
    let size = dfii.config().pix_data_size;
    let lanes = dfii.config().lanes();
    let (first, step) = match lane {
        None => (0, 1),
        Some(lane) => (lanes - 1 - lane, lanes)
    };

    for phase in 0..dfii.config().nphases {
        for offset in (first..size).step_by(step) {
            report!(logger, "{:02x}", dfii.phy.rddata_read(phase, offset));
        }
    }
    report!(logger, "\n");
}

// Repeat reads of the first 16 bursts of the open row and collect, per data
// register, the bits that ever changed between consecutive reads.
fn read_errors<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                                logger: &mut Option<&mut dyn fmt::Write>,
                                count: u32) {
    let size = dfii.config().pix_data_size;
    let words = dfii.config().nphases * size;
    let lanes = dfii.config().lanes();

    let mut prev = [0u8; MAX_DATA];
    let mut errs = [0u8; MAX_DATA];
    for burst in 0..16 {
        dfii.read_burst(burst * 8);
        for i in 0..words {
            prev[i] = dfii.phy.rddata_read(i / size, i % size);
        }

        for _ in 0..count {
            dfii.read_burst(burst * 8);
            for i in 0..words {
                let data = dfii.phy.rddata_read(i / size, i % size);
                errs[i] |= prev[i] ^ data;
                prev[i] = data;
            }
        }
    }

    for err in &errs[..words] {
        report!(logger, "{:02x}", err);
    }
    report!(logger, "\n");
    for i in 0..words {
        report!(logger, "{:2x}", lanes - 1 - (i % size) % lanes);
    }
    report!(logger, "\n");
}

/// Run one console line. Returns `Ok(false)` when the line is not an SDRAM
/// command, so the caller can try its own.
pub fn execute<P, S, M>(dfii: &mut Dfii<P, S>, ram: &mut M, line: &str,
                        logger: &mut Option<&mut dyn fmt::Write>) -> Result<bool, Error>
        where P: Phy, S: Spin, M: MainRam {
    let mut args = line.split_whitespace();
    let command = match args.next() {
        Some(command) => command,
        None => return Ok(false)
    };

    match command {
        "sdrsw" => {
            dfii.software_control();
            report!(logger, "SDRAM now under software control\n");
        }
        "sdrhw" => {
            dfii.hardware_control();
            report!(logger, "SDRAM now under hardware control\n");
        }
        "sdrrow" => {
            match args.next() {
                None => {
                    dfii.precharge();
                    report!(logger, "Precharged\n");
                }
                Some(row) => {
                    let row = parse_u16(row)?;
                    dfii.activate(row);
                    report!(logger, "Activated row {}\n", row);
                }
            }
        }
        "sdrrd" => {
            let column = address(args.next(), "sdrrd <address> [dq]")?;
            let lane = match args.next() {
                None => None,
                Some(dq) => {
                    let dq = parse_u32(dq)? as usize;
                    if dq >= dfii.config().lanes() {
                        return Err(Error::ParseError)
                    }
                    Some(dq)
                }
            };
            dfii.read_burst(column);
            print_rddata(dfii, logger, lane);
        }
        "sdrrderr" => {
            let count = argument(args.next(), "sdrrderr <count>")?;
            read_errors(dfii, logger, count);
        }
        "sdrwr" => {
            let column = address(args.next(), "sdrwr <address>")?;
            let size = dfii.config().pix_data_size;
            for phase in 0..dfii.config().nphases {
                for offset in 0..size {
                    dfii.phy.wrdata_write(phase, offset, (0x10 * phase + offset) as u8);
                }
            }
            dfii.write_burst(column);
        }
        "sdrwlon" => {
            require_write_leveling(dfii)?;
            enable_write_leveling(dfii, true);
        }
        "sdrwloff" => {
            require_write_leveling(dfii)?;
            enable_write_leveling(dfii, false);
        }
        "sdrlevel" => {
            sdram::level(dfii, logger)?;
        }
        "sdrinit" => {
            let result = sdram::init(dfii, ram, logger);
            if let Some((_, err)) = result.error {
                return Err(err)
            }
        }
        "memtest" => {
            let config = dfii.config().memtest;
            memtest(ram, &config, logger)?;
        }
        _ => return Ok(false)
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhyConfig;
    use crate::dfii::PhysicalCommand;
    use crate::phy::Control;
    use crate::sim::{SimPhy, SimRam, Spun};

    fn run(dfii: &mut Dfii<SimPhy, Spun>, line: &str) -> (Result<bool, Error>, String) {
        let mut out = String::new();
        let mut ram = SimRam::new(16);
        let result = {
            let mut logger: Option<&mut dyn fmt::Write> = Some(&mut out);
            execute(dfii, &mut ram, line, &mut logger)
        };
        (result, out)
    }

    fn dfii(config: PhyConfig) -> Dfii<SimPhy, Spun> {
        Dfii::new(SimPhy::new(&config), Spun::default(), config).unwrap()
    }

    #[test]
    fn parses_like_strtoul() {
        assert_eq!(parse_u32("42"), Ok(42));
        assert_eq!(parse_u32("0"), Ok(0));
        assert_eq!(parse_u32("0x1F"), Ok(31));
        assert_eq!(parse_u32("0X10"), Ok(16));
        assert_eq!(parse_u32("017"), Ok(15));
        assert_eq!(parse_u32(""), Err(Error::ParseError));
        assert_eq!(parse_u32("0x"), Err(Error::ParseError));
        assert_eq!(parse_u32("12ab"), Err(Error::ParseError));
        assert_eq!(parse_u32("08"), Err(Error::ParseError));
        assert_eq!(parse_u32("0x+1"), Err(Error::ParseError));
    }

    #[test]
    fn addresses_wider_than_16_bits_are_rejected() {
        assert_eq!(parse_u16("0xffff"), Ok(0xffff));
        assert_eq!(parse_u16("65536"), Err(Error::ParseError));

        let mut dfii = dfii(PhyConfig::S7DDRPHY);
        assert_eq!(run(&mut dfii, "sdrrow 70000"), (Err(Error::ParseError), String::new()));
        assert_eq!(dfii.phy().open_row, None);
        assert_eq!(run(&mut dfii, "sdrrd 0x10000").0, Err(Error::ParseError));
        assert_eq!(run(&mut dfii, "sdrwr 70000").0, Err(Error::ParseError));
        assert!(dfii.phy().commands.is_empty());
    }

    #[test]
    fn switches_control() {
        let mut dfii = dfii(PhyConfig::S7DDRPHY);
        let (result, out) = run(&mut dfii, "sdrhw");
        assert_eq!(result, Ok(true));
        assert_eq!(out, "SDRAM now under hardware control\n");
        assert_eq!(dfii.phy().control, Control::SEL);

        run(&mut dfii, "  sdrsw ");
        assert_eq!(dfii.phy().control, Control::CKE | Control::ODT | Control::RESET_N);
    }

    #[test]
    fn row_activation_and_precharge() {
        let mut dfii = dfii(PhyConfig::S7DDRPHY);
        let (_, out) = run(&mut dfii, "sdrrow 0x20");
        assert_eq!(out, "Activated row 32\n");
        assert_eq!(dfii.phy().open_row, Some(32));

        let (_, out) = run(&mut dfii, "sdrrow");
        assert_eq!(out, "Precharged\n");
        assert_eq!(dfii.phy().open_row, None);

        assert_eq!(run(&mut dfii, "sdrrow x").0, Err(Error::ParseError));
    }

    #[test]
    fn write_then_read_back_one_lane() {
        let config = PhyConfig::S7DDRPHY;
        let mut dfii = dfii(config);
        dfii.phy().set_read_window(0, 0, 31);
        dfii.phy().set_read_window(1, 0, 31);

        run(&mut dfii, "sdrrow 0");
        run(&mut dfii, "sdrwr 0");
        assert_eq!(dfii.phy().commands.last(), Some(&PhysicalCommand::write(2, 0)));

        let (result, out) = run(&mut dfii, "sdrrd 0");
        assert_eq!(result, Ok(true));
        assert_eq!(out, "00010203101112132021222330313233\n");

        // Lane 0 lives in registers 1 and 3 of every phase.
        let (_, out) = run(&mut dfii, "sdrrd 0 0");
        assert_eq!(out, "0103111321233133\n");

        assert_eq!(run(&mut dfii, "sdrrd").0, Err(Error::MissingArgument("sdrrd <address> [dq]")));
        assert_eq!(run(&mut dfii, "sdrrd 0 2").0, Err(Error::ParseError));
    }

    #[test]
    fn read_errors_flag_unstable_bits() {
        let config = PhyConfig::S7DDRPHY;
        let mut dfii = dfii(config);
        dfii.phy().set_read_window(0, 0, 31);
        dfii.phy().set_read_window(1, 0, 31);
        let (result, out) = run(&mut dfii, "sdrrderr 3");
        assert_eq!(result, Ok(true));
        assert_eq!(dfii.phy().reads, 16 * 4);
        assert_eq!(out, "00000000000000000000000000000000\n \
                         1 0 1 0 1 0 1 0 1 0 1 0 1 0 1 0\n");
    }

    #[test]
    fn write_leveling_commands_need_the_capability() {
        let mut dfii = dfii(PhyConfig::S7DDRPHY);
        assert!(run(&mut dfii, "sdrwlon").0.is_err());

        let mut dfii = self::dfii(PhyConfig::KUSDDRPHY);
        assert_eq!(run(&mut dfii, "sdrwlon").0, Ok(true));
        assert!(dfii.phy().wlevel_enabled);
        let mr1 = dfii.phy().commands.last().map(|c| (c.bank, c.address));
        assert_eq!(mr1, Some((1, 0x6 | 0x80)));
        run(&mut dfii, "sdrwloff");
        assert!(!dfii.phy().wlevel_enabled);
    }

    #[test]
    fn unknown_lines_are_left_to_the_caller() {
        let mut dfii = dfii(PhyConfig::S7DDRPHY);
        assert_eq!(run(&mut dfii, "flash erase"), (Ok(false), String::new()));
        assert_eq!(run(&mut dfii, "   "), (Ok(false), String::new()));
    }

    #[test]
    fn memtest_uses_configured_region() {
        let config = PhyConfig {
            memtest: crate::config::MemtestConfig {
                bus_words: 16, data_size: 0, addr_size: 0, ..crate::config::MemtestConfig::DEFAULT
            },
            ..PhyConfig::S7DDRPHY
        };
        let mut dfii = dfii(config);
        let (result, out) = run(&mut dfii, "memtest");
        assert_eq!(result, Ok(true));
        assert_eq!(out, "Memtest OK\n");
    }
}
