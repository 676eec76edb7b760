//! Linear interpolation used for display smoothing and for the linear fill
//! policy of the desparsifier.

use crate::errors::{AppError, AppResult};

/// `n + 1` evenly spaced values from `start` to `finish` inclusive, where
/// `n` is the number of steps between them.
///
/// `interp_dpoints(1.0, 5.0, 4) == [1, 2, 3, 4, 5]`
pub fn interp_dpoints(start: f64, finish: f64, steps: usize) -> Vec<f64> {
    if steps == 0 {
        return vec![start, finish];
    }

    let slope = if start == finish {
        0.0
    } else {
        (finish - start) / steps as f64
    };

    let mut out = Vec::with_capacity(steps + 1);
    out.push(start);
    for i in 1..steps {
        out.push(start + slope * i as f64);
    }
    out.push(finish);
    out
}

/// Keep every `rate`-th value and linearly interpolate the ones between.
/// Values after the last anchor are interpolated towards the final value
/// so the result has the same length as the input.
///
/// ```text
/// [1, 1, 1, 1, 5]           rate 4 -> [1, 2, 3, 4, 5]
/// [1, 1, 1, 1, 5, 5, 5, 2]  rate 4 -> [1, 2, 3, 4, 5, 4, 3, 2]
/// ```
pub fn smooth_dataset(dset: &[f64], rate: u32) -> AppResult<Vec<f64>> {
    if rate < 2 {
        return Err(AppError::datastore("Invalid smoothing rate"));
    }
    let Some(&last) = dset.last() else {
        return Ok(Vec::new());
    };

    let rate = rate as usize;
    let anchors: Vec<f64> = dset.iter().step_by(rate).copied().collect();

    let mut out = Vec::with_capacity(dset.len());
    for pair in anchors.windows(2) {
        let run = interp_dpoints(pair[0], pair[1], rate);
        out.extend_from_slice(&run[..rate]);
    }
    if let Some(&tail_anchor) = anchors.last() {
        out.push(tail_anchor);
    }

    if out.len() < dset.len() {
        let len_diff = dset.len() - out.len();
        let from = out[out.len() - 1];
        let tail = interp_dpoints(from, last, len_diff);
        out.extend_from_slice(&tail[1..]);
    }

    Ok(out)
}
