use core::fmt;

use crate::dfii::Dfii;
use crate::error::Error;
use crate::phy::Phy;
use crate::sdram::Lane;
use crate::spin::Spin;

const STROBE_SETTLE_CYCLES: usize = 10;
const ENABLE_SETTLE_CYCLES: usize = 100;

/// Put the SDRAM (MR1 bit 7) and the PHY in or out of write leveling mode.
pub fn enable_write_leveling<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>, enabled: bool) {
    let mr1 = dfii.config().mode_registers.mr1 | ((enabled as u16) << 7);
    dfii.load_mode_register(1, mr1);
    dfii.phy.wlevel_en_write(enabled);
}

// Leveling feedback of a lane comes back through phase 0, in reverse lane order.
fn sense<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>, lane: usize) -> bool {
    let offset = dfii.config().lanes() - 1 - lane;
    dfii.phy.wlevel_strobe();
    dfii.spin_cycles(STROBE_SETTLE_CYCLES);
    dfii.phy.rddata_read(0, offset) != 0
}

fn reset_write_delay<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>, lane: usize) {
    dfii.phy.dly_sel_write(1 << lane);
    dfii.phy.wdly_dq_rst();
    dfii.phy.wdly_dqs_rst();
}

// Moves DQ and DQS together; false once the cap is reached.
fn increment_write_delay<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>, delay: &mut u32) -> bool {
    *delay += 1;
    if *delay >= dfii.config().max_delay {
        return false
    }
    dfii.phy.wdly_dq_inc();
    dfii.phy.wdly_dqs_inc();
    true
}

/// Print the leveling feedback of every lane across the whole delay range.
pub fn write_level_scan<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                                         logger: &mut Option<&mut dyn fmt::Write>) {
    report!(logger, "Write leveling scan:\n");

    enable_write_leveling(dfii, true);
    dfii.spin_cycles(ENABLE_SETTLE_CYCLES);

    for lane in 0..dfii.config().lanes() {
        report!(logger, "Module {}:\n", lane);

        reset_write_delay(dfii, lane);
        for _ in 0..dfii.config().max_delay {
            if sense(dfii, lane) {
                report!(logger, "1");
            } else {
                report!(logger, "0");
            }
            dfii.phy.wdly_dq_inc();
            dfii.phy.wdly_dqs_inc();
        }
        report!(logger, "\n");
    }

    enable_write_leveling(dfii, false);
}

/// Find, for every lane, the write delay at which DQS samples CK rising.
///
/// A lane that already samples 1 at zero delay has between one and two bit
/// times of skew; it is marked `high_skew` and first walked through the
/// CK=1 zone into the CK=0 zone. All lanes are measured even when one fails,
/// so the whole table can be printed.
pub fn write_level<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                                    logger: &mut Option<&mut dyn fmt::Write>,
                                    lanes: &mut [Lane]) -> Result<(), Error> {
    dfii.check_lane_count(lanes.len())?;

    report!(logger, "Write leveling: ");

    enable_write_leveling(dfii, true);
    dfii.spin_cycles(ENABLE_SETTLE_CYCLES);

    let cap = dfii.config().max_delay;
    let zero_margin = dfii.config().wlevel_zero_margin;
    let mut failure = None;
    for (n, lane) in lanes.iter_mut().enumerate() {
        lane.write_delay = 0;
        lane.high_skew = false;

        reset_write_delay(dfii, n);
        let mut dq = sense(dfii, n);

        if dq {
            lane.high_skew = true;
            while dq {
                if !increment_write_delay(dfii, &mut lane.write_delay) { break }
                dq = sense(dfii, n);
            }

            // Get a bit further into the 0 zone
            for _ in 0..zero_margin {
                if dq || !increment_write_delay(dfii, &mut lane.write_delay) { break }
            }
        }

        while !dq {
            if !increment_write_delay(dfii, &mut lane.write_delay) { break }
            dq = sense(dfii, n);
        }

        debug!("module {}: write delay {}{}", n, lane.write_delay,
               if lane.high_skew { " (high skew)" } else { "" });
        if lane.write_delay >= cap && failure.is_none() {
            failure = Some(Error::LevelingFailure { lane: n, delay: lane.write_delay });
        }
    }

    enable_write_leveling(dfii, false);

    for lane in lanes.iter().rev() {
        report!(logger, "{:2}{} ", lane.write_delay, if lane.high_skew { '*' } else { ' ' });
    }

    match failure {
        None => {
            report!(logger, "completed\n");
            Ok(())
        }
        Some(err) => {
            report!(logger, "failed\n");
            error!("{}", err);
            Err(err)
        }
    }
}
