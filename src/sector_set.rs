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

    src/sector_set.rs

    The whole-disk accumulator: a map from (track, side, sector) to the best sector observed
    across every track read, plus the componentwise-max geometry that map implies.
*/

use crate::config::ExpectedSectors;
use crate::sector::{Sector, SectorStatus};
use crate::track_address::SectorId;
use std::collections::HashMap;

/// Componentwise-max bounding box of a disk image (spec §3). Sector ids are not uniformly
/// 0-indexed across formats -- Brother uses 0..=11, IBM System/34 is 1-indexed and never uses
/// sector id 0 (spec §3) -- so geometry records `first_sector` alongside the per-track count
/// rather than assuming every valid range starts at 0.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Geometry {
    pub num_tracks: u16,
    pub num_sides: u8,
    pub first_sector: u8,
    pub sectors_per_track: u8,
    pub sector_size: usize,
}

/// Map from [`SectorId`] to the best-known [`Sector`], accumulated across every track read of a
/// session (spec §4.5). Mutated only by the single driver thread (spec §5).
#[derive(Clone, Debug, Default)]
pub struct SectorSet {
    sectors: HashMap<SectorId, Sector>,
}

impl SectorSet {
    pub fn new() -> Self {
        SectorSet { sectors: HashMap::new() }
    }

    /// Fold `sector` into the set using the same merge rule the per-track reader applies (spec
    /// §4.4, §4.5): the better-status sector wins, later inserts break ties, and two differing
    /// OK payloads for the same id become `Conflict` rather than silently picking one.
    pub fn insert(&mut self, sector: Sector) {
        let id = sector.id;
        let existing = self.sectors.remove(&id);
        self.sectors.insert(id, Sector::merge(existing, sector));
    }

    pub fn get(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.values()
    }

    /// The componentwise-max bounding box across every sector currently in the set (spec §3).
    /// Track/side counts are derived as `max observed id + 1`; `sectors_per_track` is derived
    /// from the observed sector-id *range* (`max - min + 1`) rather than `max + 1`, since a
    /// 1-indexed format (IBM) would otherwise report one sector too many and shift every slot in
    /// the flat image by one (spec §3, §6). Sector size is the longest OK payload seen
    /// (missing/bad sectors don't carry a trustworthy length).
    pub fn compute_geometry(&self) -> Geometry {
        let mut geometry = Geometry::default();
        let mut sector_range: Option<(u8, u8)> = None;
        for sector in self.sectors.values() {
            geometry.num_tracks = geometry.num_tracks.max(sector.id.track + 1);
            geometry.num_sides = geometry.num_sides.max(sector.id.side + 1);
            sector_range = Some(match sector_range {
                Some((min, max)) => (min.min(sector.id.sector), max.max(sector.id.sector)),
                None => (sector.id.sector, sector.id.sector),
            });
            if sector.status == SectorStatus::Ok {
                geometry.sector_size = geometry.sector_size.max(sector.payload.len());
            }
        }
        if let Some((min, max)) = sector_range {
            geometry.first_sector = min;
            geometry.sectors_per_track = max - min + 1;
        }
        geometry
    }

    /// Number of expected ids that are either absent or not `Ok`, for the single user-visible
    /// end-of-run warning spec §7 calls for ("a one-line warning naming the count of undecoded
    /// sectors"). Only ids actually named by `expected` are counted; with no fixed expectation,
    /// nothing here is counted as undecoded since absence alone was never a failure (spec §4.4).
    pub fn undecoded_count(&self, track: u16, side: u8, expected: &ExpectedSectors) -> usize {
        let Some(ids) = expected.ids() else { return 0 };
        ids.iter()
            .filter(|&&sector_id| {
                !matches!(
                    self.get(SectorId::new(track, side, sector_id)),
                    Some(Sector { status: SectorStatus::Ok, .. })
                )
            })
            .count()
    }
}
