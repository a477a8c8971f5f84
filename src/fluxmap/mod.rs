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

    src/fluxmap/mod.rs

    Fluxmap: an ordered sequence of inter-pulse intervals, each a small integer count of a
    fixed hardware tick. This is the lowest-level representation the decode core works with,
    produced by the flux transport or the capture store.
*/

//! [`Fluxmap`] owns the raw interval-byte stream captured for a single track revolution and
//! the two primitive decode operations that sit directly on top of it: clock estimation
//! ([`clock`]) and bit-stream production ([`bitstream`]).

pub mod bitstream;
pub mod clock;

use crate::NOMINAL_TICK_NS;
use binrw::{binrw, BinRead, BinWrite};
use std::io::Cursor;

/// A byte value of 0 is reserved as an extension marker in both the in-memory representation
/// and the wire format (spec §6): an interval longer than 254 ticks is split into as many
/// continuation bytes as needed, each itself capped at 254, terminated by a non-zero byte.
const EXTENSION_MARKER: u8 = 0;
const EXTENSION_STEP: u32 = 254;

/// An ordered sequence of inter-pulse intervals, each an integer count of [`NOMINAL_TICK_NS`]
/// ticks since the previous flux transition (or since the start of capture).
///
/// Fluxmap intervals are append-only: individual bytes are never mutated once pushed, matching
/// spec §3's invariant. `duration_ticks` and `duration_ns` are kept in sync on every append so
/// callers never observe a stale cache.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fluxmap {
    intervals: Vec<u8>,
    duration_ticks: u64,
    tick_period_ns: f64,
}

impl Fluxmap {
    /// An empty fluxmap: zero intervals, zero duration (spec §8, "Empty fluxmap" scenario).
    pub fn new() -> Self {
        Fluxmap {
            intervals: Vec::new(),
            duration_ticks: 0,
            tick_period_ns: NOMINAL_TICK_NS,
        }
    }

    pub fn with_tick_period(tick_period_ns: f64) -> Self {
        Fluxmap {
            intervals: Vec::new(),
            duration_ticks: 0,
            tick_period_ns,
        }
    }

    /// Build a fluxmap directly from a slice of interval-tick counts, each of which must be
    /// greater than zero (spec §3 invariant). Intended for tests and for transports that
    /// already expand extension bytes.
    pub fn from_intervals(intervals: &[u8]) -> Self {
        let mut map = Fluxmap::new();
        map.append_intervals(intervals);
        map
    }

    /// Append one interval byte (1..=255 ticks). Panics on zero, per spec §3's invariant that
    /// interval bytes are always positive; callers splitting a long interval into extension
    /// bytes should use [`Fluxmap::append_long_interval`] instead.
    pub fn append_interval(&mut self, ticks: u8) {
        assert!(ticks > 0, "flux interval must be nonzero");
        self.intervals.push(ticks);
        self.duration_ticks += ticks as u64;
    }

    pub fn append_intervals(&mut self, ticks: &[u8]) {
        for &t in ticks {
            self.append_interval(t);
        }
    }

    /// Append an interval of arbitrary tick length, splitting it into extension bytes per the
    /// wire format (spec §6) if it exceeds a single byte's range.
    pub fn append_long_interval(&mut self, mut ticks: u32) {
        assert!(ticks > 0, "flux interval must be nonzero");
        while ticks > EXTENSION_STEP {
            self.intervals.push(EXTENSION_MARKER);
            self.duration_ticks += EXTENSION_STEP as u64;
            ticks -= EXTENSION_STEP;
        }
        self.append_interval(ticks as u8);
    }

    /// The number of raw interval bytes, including extension-marker bytes (spec §3: "byte
    /// size").
    pub fn byte_len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn tick_period_ns(&self) -> f64 {
        self.tick_period_ns
    }

    /// Total elapsed ticks across all intervals, with extension-byte runs already folded in.
    pub fn duration_ticks(&self) -> u64 {
        self.duration_ticks
    }

    /// Total duration in nanoseconds: `duration_ticks * tick_period_ns` (spec §3 invariant).
    pub fn duration_ns(&self) -> f64 {
        self.duration_ticks as f64 * self.tick_period_ns
    }

    /// Iterate over logical intervals (tick counts), transparently joining extension-marker
    /// runs back into a single value per spec §6's wire format.
    pub fn interval_ticks(&self) -> impl Iterator<Item = u32> + '_ {
        IntervalIter { bytes: &self.intervals, pos: 0 }
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.intervals
    }

    /// Encode this fluxmap into the wire format shared by the transport and capture store
    /// (spec §6): little-endian duration-in-ticks, little-endian byte-count, then the raw
    /// interval bytes verbatim (extension bytes included).
    pub fn to_wire(&self) -> Vec<u8> {
        let header = FluxmapWireHeader {
            duration_ticks: self.duration_ticks,
            byte_count: self.intervals.len() as u32,
        };
        let mut buf = Vec::new();
        {
            let mut cursor = Cursor::new(&mut buf);
            header.write(&mut cursor).expect("writing to an in-memory buffer cannot fail");
        }
        buf.extend_from_slice(&self.intervals);
        buf
    }

    /// Decode a fluxmap previously encoded with [`Fluxmap::to_wire`].
    pub fn from_wire(bytes: &[u8], tick_period_ns: f64) -> Result<Self, crate::FluxError> {
        let mut cursor = Cursor::new(bytes);
        let header = FluxmapWireHeader::read(&mut cursor)?;
        let start = cursor.position() as usize;
        let end = start + header.byte_count as usize;
        let intervals = bytes
            .get(start..end)
            .ok_or_else(|| crate::FluxError::Io("truncated fluxmap wire payload".into()))?
            .to_vec();

        let mut map = Fluxmap { intervals, duration_ticks: 0, tick_period_ns };
        map.duration_ticks = map.interval_ticks().map(u64::from).sum();
        Ok(map)
    }
}

#[binrw]
#[brw(little)]
struct FluxmapWireHeader {
    duration_ticks: u64,
    byte_count: u32,
}

struct IntervalIter<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Iterator for IntervalIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let mut total: u32 = 0;
        loop {
            let byte = self.bytes[self.pos];
            self.pos += 1;
            if byte == EXTENSION_MARKER {
                total += EXTENSION_STEP;
                if self.pos >= self.bytes.len() {
                    // A trailing extension byte with nothing after it is malformed, but we
                    // still return what we accumulated rather than silently dropping it.
                    return Some(total);
                }
            }
            else {
                total += byte as u32;
                return Some(total);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fluxmap_has_zero_duration_and_bytes() {
        let map = Fluxmap::new();
        assert_eq!(map.byte_len(), 0);
        assert_eq!(map.duration_ns(), 0.0);
    }

    #[test]
    fn single_interval_fluxmap_matches_spec_scenario() {
        let map = Fluxmap::from_intervals(&[8]);
        assert_eq!(map.duration_ticks(), 8);
        assert!((map.duration_ns() - 8.0 * NOMINAL_TICK_NS).abs() < 1e-9);
    }

    #[test]
    fn long_interval_splits_into_extension_bytes_and_rejoins() {
        let mut map = Fluxmap::new();
        map.append_long_interval(600);
        // 600 = 254 + 254 + 92
        assert_eq!(map.raw_bytes(), &[0, 0, 92]);
        let rejoined: Vec<u32> = map.interval_ticks().collect();
        assert_eq!(rejoined, vec![600]);
        assert_eq!(map.duration_ticks(), 600);
    }

    #[test]
    fn wire_round_trip_preserves_intervals_and_duration() {
        let mut map = Fluxmap::new();
        map.append_intervals(&[10, 20, 30]);
        map.append_long_interval(500);
        let bytes = map.to_wire();
        let decoded = Fluxmap::from_wire(&bytes, map.tick_period_ns()).unwrap();
        assert_eq!(decoded.duration_ticks(), map.duration_ticks());
        assert_eq!(decoded.raw_bytes(), map.raw_bytes());
    }

    #[test]
    fn interval_bytes_are_never_mutated_by_append() {
        let mut map = Fluxmap::new();
        map.append_interval(5);
        let before = map.raw_bytes().to_vec();
        map.append_interval(9);
        assert_eq!(&map.raw_bytes()[..before.len()], before.as_slice());
    }
}
