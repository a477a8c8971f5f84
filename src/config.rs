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

    src/config.rs

    Configuration surface for the track reader: retry limits, revolution counts, and the
    expected-sector-set rule of spec §4.4.
*/

use crate::track_address::SectorId;
use crate::{FluxError, DEFAULT_MAX_RETRIES};
use std::collections::HashSet;

/// The set of sector ids a [`crate::TrackReader`] expects to find on a track, used by the
/// EVALUATE state (spec §4.4) to decide whether a read is "good enough" to stop retrying.
///
/// If `None`, "bad" is defined only by sectors the parser actually returned with a non-OK
/// status — absence of a sector id is never treated as a failure on its own. This matches the
/// IBM reader's behavior when no caller-supplied expectations exist: IDAMs define their own
/// expectations as they're observed.
#[derive(Clone, Debug, Default)]
pub struct ExpectedSectors(Option<HashSet<u8>>);

impl ExpectedSectors {
    /// No fixed expectation: only observed `BAD_CHECKSUM`/`CONFLICT` sectors count as failures.
    pub fn none() -> Self {
        ExpectedSectors(None)
    }

    /// A fixed, caller- or format-supplied set of sector ids expected on every track.
    pub fn fixed(ids: impl IntoIterator<Item = u8>) -> Self {
        ExpectedSectors(Some(ids.into_iter().collect()))
    }

    /// A contiguous run `0..count` of expected sector ids, e.g. Brother's 0..=11.
    pub fn contiguous(count: u8) -> Self {
        ExpectedSectors::fixed(0..count)
    }

    pub fn ids(&self) -> Option<&HashSet<u8>> {
        self.0.as_ref()
    }

    pub fn is_expected(&self, sector: u8) -> bool {
        match &self.0 {
            Some(ids) => ids.contains(&sector),
            None => true,
        }
    }
}

/// Configuration for a single [`crate::TrackReader`] pass over one (drive, track, side).
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of RECALIBRATE/READ cycles before EVALUATE gives up (spec §4.4). Default 5.
    pub max_retries: u32,
    /// Number of spindle revolutions requested from the transport per READ (spec §6).
    pub revolutions_per_read: u32,
    /// Sector ids expected to be present and OK for this track.
    pub expected: ExpectedSectors,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: DEFAULT_MAX_RETRIES,
            revolutions_per_read: 1,
            expected: ExpectedSectors::none(),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, revolutions_per_read: u32, expected: ExpectedSectors) -> Result<Self, FluxError> {
        if revolutions_per_read == 0 {
            return Err(FluxError::Configuration(
                "revolutions_per_read must be at least 1".into(),
            ));
        }
        Ok(RetryConfig { max_retries, revolutions_per_read, expected })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_expected(mut self, expected: ExpectedSectors) -> Self {
        self.expected = expected;
        self
    }
}

/// Canonical geometries and expected-sector presets for the two in-scope protocol families,
/// trimmed down from fluxfox's `StandardFormat`. Callers targeting a standard disk can use
/// these instead of hand-building an [`ExpectedSectors`] set.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StandardFormat {
    /// Brother word-processor floppies: 77 tracks, 1 side, 12 sectors/track, 256-byte sectors.
    Brother,
    /// A standard IBM/PC 3.5" 1.44MB floppy: 80 tracks, 2 sides, 18 sectors/track, 512-byte
    /// sectors.
    IbmPc1440,
    /// A standard IBM/PC 5.25" 360KB floppy: 40 tracks, 2 sides, 9 sectors/track, 512-byte
    /// sectors.
    IbmPc360,
}

impl StandardFormat {
    pub fn track_count(&self) -> u16 {
        match self {
            StandardFormat::Brother => 77,
            StandardFormat::IbmPc1440 => 80,
            StandardFormat::IbmPc360 => 40,
        }
    }

    pub fn side_count(&self) -> u8 {
        match self {
            StandardFormat::Brother => 1,
            StandardFormat::IbmPc1440 | StandardFormat::IbmPc360 => 2,
        }
    }

    pub fn sectors_per_track(&self) -> u8 {
        match self {
            StandardFormat::Brother => 12,
            StandardFormat::IbmPc1440 => 18,
            StandardFormat::IbmPc360 => 9,
        }
    }

    pub fn sector_size(&self) -> usize {
        match self {
            StandardFormat::Brother => 256,
            StandardFormat::IbmPc1440 | StandardFormat::IbmPc360 => 512,
        }
    }

    /// The sector ids expected on every track of this format, starting from sector 0 (Brother)
    /// or sector 1 (IBM, which is 1-indexed per the System/34 convention).
    pub fn expected_sectors(&self) -> ExpectedSectors {
        match self {
            StandardFormat::Brother => ExpectedSectors::contiguous(self.sectors_per_track()),
            StandardFormat::IbmPc1440 | StandardFormat::IbmPc360 => {
                ExpectedSectors::fixed(1..=self.sectors_per_track())
            }
        }
    }
}

/// Check whether every expected sector id for a track is present in `ids` with `Ok` status,
/// per spec §4.4's EVALUATE transition. Sectors present but not expected are ignored.
pub fn all_expected_present(expected: &ExpectedSectors, present_ok: impl Fn(u8) -> bool, observed: &[SectorId]) -> bool {
    match expected.ids() {
        Some(ids) => ids.iter().all(|&id| present_ok(id)),
        None => observed.iter().all(|id| present_ok(id.sector)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_sectors_none_accepts_any_id() {
        let expected = ExpectedSectors::none();
        assert!(expected.is_expected(200));
    }

    #[test]
    fn expected_sectors_contiguous_covers_brother_range() {
        let expected = ExpectedSectors::contiguous(12);
        for i in 0..12 {
            assert!(expected.is_expected(i));
        }
        assert!(!expected.is_expected(12));
    }

    #[test]
    fn standard_format_brother_matches_spec_geometry() {
        let fmt = StandardFormat::Brother;
        assert_eq!(fmt.track_count(), 77);
        assert_eq!(fmt.sectors_per_track(), 12);
        assert_eq!(fmt.sector_size(), 256);
    }

    #[test]
    fn retry_config_rejects_zero_revolutions() {
        assert!(RetryConfig::new(5, 0, ExpectedSectors::none()).is_err());
    }
}
