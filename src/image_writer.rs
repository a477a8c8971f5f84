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

    src/image_writer.rs

    Flattens a SectorSet into a raw disk image: row-major (track, side, sector), each slot
    padded with zeros to the set's sector size (spec §6).
*/

use crate::sector_set::{Geometry, SectorSet};
use crate::track_address::SectorId;

/// Render `set` as a flat image of `geometry`'s dimensions, in (track, side, sector) row-major
/// order. A slot with no `Ok` sector -- whether missing, still bad, or conflicted -- becomes an
/// all-zero block (spec §6, §7: "the image file is still written with zeros for missing data").
/// Sector ids are enumerated starting from `geometry.first_sector`, not 0, so a 1-indexed format
/// (IBM) doesn't get a spurious slot for the nonexistent sector id 0 ahead of its real sectors
/// (spec §3, §6).
pub fn write_flat_image(set: &SectorSet, geometry: &Geometry) -> Vec<u8> {
    let mut image = Vec::with_capacity(
        geometry.num_tracks as usize * geometry.num_sides as usize * geometry.sectors_per_track as usize * geometry.sector_size,
    );

    let first = geometry.first_sector as u16;
    let last = first + geometry.sectors_per_track as u16;

    for track in 0..geometry.num_tracks {
        for side in 0..geometry.num_sides {
            for sector in first..last {
                let id = SectorId::new(track, side, sector as u8);
                match set.get(id) {
                    Some(s) if s.status == crate::sector::SectorStatus::Ok => {
                        let mut slot = s.payload.clone();
                        slot.resize(geometry.sector_size, 0);
                        image.extend_from_slice(&slot);
                    }
                    _ => image.extend(std::iter::repeat(0u8).take(geometry.sector_size)),
                }
            }
        }
    }

    image
}
