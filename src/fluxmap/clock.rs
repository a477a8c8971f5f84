/*
    FluxEngine
    https://github.com/fluxengine/fluxengine-core

    Copyright 2025 FluxEngine Contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/fluxmap/clock.rs

    Clock estimation: histogram the interval durations in a fluxmap and pick the lowest
    significant bucket as the nominal flux-transition clock period.
*/

use super::Fluxmap;
use crate::SENTINEL_CLOCK_NS;
use histogram::Histogram;

/// Fraction of the most-populated bucket's count a bucket must reach to be considered
/// significant rather than noise (spec §4.1).
const SIGNIFICANCE_RATIO: f64 = 0.05;

/// `2^14 ns` (~16us) comfortably covers every interval duration we expect from a floppy
/// capture, even a badly out-of-spec one; `grouping_power` of 3 keeps relative error under
/// 1/2^3 = 12.5% per bucket, sharp enough to separate a 2us cell from a 4us cell without
/// fragmenting into spurious maxima.
const GROUPING_POWER: u8 = 3;
const MAX_VALUE_POWER: u8 = 14;

fn duration_to_u64(ns: f64) -> u64 {
    ns.round().max(0.0) as u64
}

/// Estimate the nominal clock period (in nanoseconds) for a fluxmap by histogramming interval
/// durations and returning the lowest bucket whose count exceeds 5% of the most-populated
/// bucket's count (spec §4.1: "a small fraction... of the most-populated bin").
///
/// A clean recording has its shortest, most common interval at the nominal bit-cell time, with
/// longer intervals clustering at integer multiples of it; scanning from the short end finds
/// that first cluster without needing to know the format's clock rate in advance. The threshold
/// is relative to the tallest bucket rather than the total sample count, since the correct
/// short-cell bucket is typically a minority of all samples once longer multi-cell intervals are
/// mixed in -- a total-count threshold would make it harder to clear, not easier. Empty
/// fluxmaps, and fluxmaps with only a single interval, have no usable histogram and return
/// [`SENTINEL_CLOCK_NS`] instead of guessing (spec §8, "Empty fluxmap" scenario).
pub fn estimate_clock(map: &Fluxmap) -> f64 {
    let durations_ns: Vec<f64> = map
        .interval_ticks()
        .map(|ticks| ticks as f64 * map.tick_period_ns())
        .collect();

    if durations_ns.len() < 2 {
        return SENTINEL_CLOCK_NS;
    }

    let mut histogram = match Histogram::new(GROUPING_POWER, MAX_VALUE_POWER) {
        Ok(h) => h,
        Err(_) => return SENTINEL_CLOCK_NS,
    };

    let mut any_counted = false;
    for &d in &durations_ns {
        if histogram.increment(duration_to_u64(d)).is_ok() {
            any_counted = true;
        }
    }
    if !any_counted {
        return SENTINEL_CLOCK_NS;
    }

    let buckets: Vec<_> = histogram.into_iter().collect();
    let max_count = buckets.iter().map(|b| b.count()).max().unwrap_or(0);
    let threshold = ((max_count as f64) * SIGNIFICANCE_RATIO).ceil() as u64;

    for bucket in &buckets {
        if bucket.count() >= threshold.max(1) {
            let midpoint = (bucket.start() + bucket.end()) / 2;
            return midpoint as f64;
        }
    }

    // Should not happen (the tallest bucket always exceeds its own threshold), but fall back to
    // the shortest observed interval rather than panicking.
    durations_ns.iter().cloned().fold(f64::INFINITY, f64::min)
}
