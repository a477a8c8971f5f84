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

    src/fluxmap/bitstream.rs

    Turn a fluxmap's raw intervals into a bit stream by walking a nanosecond cursor across the
    clock grid: each interval ends on a flux transition, which we treat as a 1 bit at whichever
    clock cell it falls nearest to, with 0 bits filling every clock cell in between.
*/

use super::Fluxmap;
use bit_vec::BitVec;

/// Decode a fluxmap into a bit stream at the given clock period (nanoseconds per bit cell).
///
/// Walks a running cursor in nanoseconds; for each interval, the cursor advances by the
/// interval's duration, and the number of clock cells that advance covers is computed as
/// `round(cursor / clock_period_ns) - cells_already_emitted`. All but the last of those cells
/// emit a `0` bit (no transition), and the last emits a `1` (the transition the interval ends
/// on). This keeps the bit stream's length tracking the fluxmap's total duration even as
/// rounding error accumulates interval-to-interval, rather than compounding it (spec §4.1,
/// invariant 1).
///
/// A fluxmap with zero or one interval, or a non-positive clock period, decodes to an empty bit
/// stream (spec §8, "Empty fluxmap" scenario).
pub fn decode_to_bits(map: &Fluxmap, clock_period_ns: f64) -> BitVec {
    let mut bits = BitVec::new();
    if clock_period_ns <= 0.0 {
        return bits;
    }

    let mut cursor_ns: f64 = 0.0;
    let mut cells_emitted: i64 = 0;

    for ticks in map.interval_ticks() {
        cursor_ns += ticks as f64 * map.tick_period_ns();
        let target_cell = (cursor_ns / clock_period_ns).round() as i64;
        let new_cells = target_cell - cells_emitted;
        if new_cells <= 0 {
            // The interval was shorter than half a clock cell; still record its transition so
            // we never silently drop a pulse, but don't regress the cell counter.
            bits.push(true);
            cells_emitted += 1;
            continue;
        }
        for _ in 0..new_cells - 1 {
            bits.push(false);
        }
        bits.push(true);
        cells_emitted = target_cell;
    }

    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fluxmap_decodes_to_empty_bitstream() {
        let map = Fluxmap::new();
        assert!(decode_to_bits(&map, 2000.0).is_empty());
    }

    #[test]
    fn single_interval_matches_spec_scenario() {
        // 8 ticks at 83.3ns/tick = 666.4ns; at a 2000ns clock that's round(0.333) = 0 cells,
        // clamped up to 1 so the transition is never dropped, yielding a single `true` bit.
        let map = Fluxmap::from_intervals(&[8]);
        let bits = decode_to_bits(&map, 2000.0);
        assert_eq!(bits.len(), 1);
        assert_eq!(bits.get(0), Some(true));
    }

    #[test]
    fn bitstream_length_tracks_total_duration() {
        let map = Fluxmap::from_intervals(&[24; 50]); // 50 cells at ~2000ns clock
        let clock = 24.0 * map.tick_period_ns();
        let bits = decode_to_bits(&map, clock);
        let expected_len = (map.duration_ns() / clock).round() as usize;
        assert_eq!(bits.len(), expected_len);
    }

    #[test]
    fn every_interval_ends_in_a_set_bit() {
        let map = Fluxmap::from_intervals(&[24, 48, 24, 72]);
        let clock = 24.0 * map.tick_period_ns();
        let bits = decode_to_bits(&map, clock);
        assert!(bits.len() >= 4);
        assert_eq!(bits.get(bits.len() - 1), Some(true));
    }

    #[test]
    fn non_positive_clock_period_yields_empty_bitstream() {
        let map = Fluxmap::from_intervals(&[8, 8, 8]);
        assert!(decode_to_bits(&map, 0.0).is_empty());
    }
}
