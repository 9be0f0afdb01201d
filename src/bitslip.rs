use core::fmt;
use arrayvec::ArrayVec;

use crate::config::MAX_LANES;
use crate::dfii::Dfii;
use crate::error::Error;
use crate::phy::Phy;
use crate::sdram::Lane;
use crate::spin::Spin;

/// Half the smallest write delay among high-skew lanes, or `None` when no
/// lane showed more than one bit time of skew.
pub fn threshold(lanes: &[Lane]) -> Option<u32> {
    lanes.iter()
        .filter_map(|lane| if lane.high_skew { Some(lane.write_delay) } else { None })
        .min()
        .map(|threshold| threshold / 2)
}

/// Slip the read data of every lane whose write delay exceeds the threshold
/// by one bit time. Returns the slipped lanes, highest first.
///
/// Must run once per calibration: slips accumulate in the PHY.
pub fn read_bitslip<P: Phy, S: Spin>(dfii: &mut Dfii<P, S>,
                                     logger: &mut Option<&mut dyn fmt::Write>,
                                     lanes: &[Lane]) -> Result<ArrayVec<usize, MAX_LANES>, Error> {
    dfii.check_lane_count(lanes.len())?;

    let mut slipped = ArrayVec::new();

    let threshold = match threshold(lanes) {
        Some(threshold) => threshold,
        None => return Ok(slipped)
    };
    debug!("bitslip threshold {}", threshold);

    report!(logger, "Read bitslip: ");
    let pulses = dfii.config().bitslip_pulses;
    for (n, lane) in lanes.iter().enumerate().rev() {
        if lane.write_delay > threshold {
            dfii.phy.dly_sel_write(1 << n);
            for _ in 0..pulses {
                dfii.phy.rdly_dq_bitslip();
            }
            slipped.push(n);
            report!(logger, "{} ", n);
        }
    }
    report!(logger, "\n");

    Ok(slipped)
}
