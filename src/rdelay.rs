use core::fmt;

use crate::dfii::Dfii;
use crate::error::Error;
use crate::pattern::read_pattern;
use crate::phy::Phy;
use crate::sdram::Lane;
use crate::spin::Spin;

// Open row 0 and fill it with the read pattern, every phase in one burst.
fn write_pattern<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>) {
    let size = dfii.config().pix_data_size;
    let words = dfii.config().nphases * size;

    dfii.activate(0);
    for (index, data) in read_pattern().take(words).enumerate() {
        dfii.phy.wrdata_write(index / size, index % size, data);
    }
    dfii.write_burst(0);
}

// Reads the pattern back and checks the two data registers of one lane in every phase.
fn probe<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>, offset: usize) -> bool {
    let size = dfii.config().pix_data_size;
    let words = dfii.config().nphases * size;
    let paired = offset + dfii.config().lanes();

    let mut valid = true;
    for _ in 0..dfii.config().probe_reads {
        dfii.read_burst(0);
        for (index, expected) in read_pattern().take(words).enumerate() {
            let (phase, register) = (index / size, index % size);
            if register != offset && register != paired { continue }
            if dfii.phy.rddata_read(phase, register) != expected {
                valid = false;
            }
        }
    }
    valid
}

fn select_lane<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>, lane: usize) {
    dfii.phy.dly_sel_write(1 << lane);
    dfii.phy.rdly_dq_rst();
}

/// Print, for every lane, which read delays return the pattern intact.
pub fn read_level_scan<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                                        logger: &mut Option<&mut dyn fmt::Write>) {
    report!(logger, "Read leveling scan:\n");

    write_pattern(dfii);

    let lanes = dfii.config().lanes();
    for lane in (0..lanes).rev() {
        report!(logger, "Module {}:\n", lane);

        select_lane(dfii, lane);
        for _ in 0..dfii.config().max_delay {
            if probe(dfii, lanes - 1 - lane) {
                report!(logger, "1");
            } else {
                report!(logger, "0");
            }
            dfii.phy.rdly_dq_inc();
        }
        report!(logger, "\n");
    }

    dfii.precharge();
}

// Sweeps one lane's read delay line and leaves it centered in the working window.
fn calibrate_lane<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>, n: usize,
                                   lane: &mut Lane) -> Result<(), Error> {
    let cap = dfii.config().max_delay;
    let margin = dfii.config().read_margin;
    let offset = dfii.config().lanes() - 1 - n;

    select_lane(dfii, n);

    // Find smallest working delay
    let mut delay = 0;
    while !probe(dfii, offset) {
        dfii.phy.rdly_dq_inc();
        delay += 1;
        if delay >= cap {
            return Err(Error::CalibrationTimeout { lane: n, cap })
        }
    }
    lane.read_delay_min = delay;

    // Get a bit further into the working zone
    for _ in 0..margin {
        if delay + 1 >= cap { break }
        dfii.phy.rdly_dq_inc();
        delay += 1;
    }

    // Find largest working delay
    let mut seen_valid = delay == lane.read_delay_min;
    loop {
        if !probe(dfii, offset) {
            if !seen_valid {
                // The margin overshot the window; walk it again from its start.
                warn!("module {}: read window narrower than the {} tap margin", n, margin);
                select_lane(dfii, n);
                for _ in 0..lane.read_delay_min {
                    dfii.phy.rdly_dq_inc();
                }
                delay = lane.read_delay_min;
                seen_valid = true;
                continue
            }
            lane.read_delay_max = delay.saturating_sub(1).max(lane.read_delay_min);
            break
        }
        seen_valid = true;
        if delay + 1 >= cap {
            warn!("module {}: read window still open at the delay cap", n);
            lane.read_delay_max = delay;
            break
        }
        dfii.phy.rdly_dq_inc();
        delay += 1;
    }

    if lane.read_delay_max == lane.read_delay_min {
        warn!("module {}: read window is a single tap wide", n);
    }

    // Set delay to the middle
    lane.read_delay_final = (lane.read_delay_min + lane.read_delay_max) / 2;
    select_lane(dfii, n);
    for _ in 0..lane.read_delay_final {
        dfii.phy.rdly_dq_inc();
    }

    Ok(())
}

/// Center every lane's read delay in the window where reads return the
/// written pattern. Lanes are calibrated from the highest down; the first
/// lane without any working delay aborts the stage.
pub fn read_delays<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                                    logger: &mut Option<&mut dyn fmt::Write>,
                                    lanes: &mut [Lane]) -> Result<(), Error> {
    dfii.check_lane_count(lanes.len())?;

    report!(logger, "Read delays: ");

    write_pattern(dfii);

    let mut result = Ok(());
    for (n, lane) in lanes.iter_mut().enumerate().rev() {
        if let Err(err) = calibrate_lane(dfii, n, lane) {
            report!(logger, "{}:--  failed\n", n);
            error!("{}", err);
            result = Err(err);
            break
        }
        debug!("module {}: read window {}-{}, delay {}", n,
               lane.read_delay_min, lane.read_delay_max, lane.read_delay_final);
        report!(logger, "{}:{:02}-{:02}  ", n, lane.read_delay_min, lane.read_delay_max);
    }

    dfii.precharge();

    if result.is_ok() {
        report!(logger, "completed\n");
    }
    result
}
