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
*/

use crate::track_address::SectorId;

/// The outcome of attempting to decode one sector (spec §3).
///
/// Ordered worst-to-best is the wrong mental model here; [`SectorStatus::rank`] instead gives
/// the ordering the merge rule (spec §4.4, §4.5) actually needs: `Ok` beats everything,
/// `BadChecksum` beats `Missing`, and `Conflict` never overwrites anything that already has a
/// payload.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SectorStatus {
    /// Payload length matched the format's sector-size rule and its checksum verified.
    Ok,
    /// A record was found and parsed but its checksum did not verify.
    BadChecksum,
    /// No record was ever observed for this id; produced only by the aggregator, never by a
    /// parser (spec §3 invariant).
    Missing,
    /// Two different OK payloads were observed for the same id and neither can be preferred.
    Conflict,
}

impl SectorStatus {
    fn rank(self) -> u8 {
        match self {
            SectorStatus::Ok => 3,
            SectorStatus::BadChecksum => 2,
            SectorStatus::Conflict => 1,
            SectorStatus::Missing => 0,
        }
    }
}

/// A single decoded (or not-yet-decoded) sector.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sector {
    pub id: SectorId,
    pub payload: Vec<u8>,
    pub status: SectorStatus,
}

impl Sector {
    pub fn ok(id: SectorId, payload: Vec<u8>) -> Self {
        Sector { id, payload, status: SectorStatus::Ok }
    }

    pub fn bad_checksum(id: SectorId, payload: Vec<u8>) -> Self {
        Sector { id, payload, status: SectorStatus::BadChecksum }
    }

    /// Produced only by [`crate::sector_set::SectorSet`] when a track read never observed this
    /// id, never by a format parser (spec §3 invariant).
    pub fn missing(id: SectorId) -> Self {
        Sector { id, payload: Vec::new(), status: SectorStatus::Missing }
    }

    fn conflict(id: SectorId, payload: Vec<u8>) -> Self {
        Sector { id, payload, status: SectorStatus::Conflict }
    }

    /// Apply the merge rule shared by the per-track map (spec §4.4) and [`crate::SectorSet`]
    /// (spec §4.5): the better-status sector wins; when both are OK with differing payloads,
    /// the result becomes `Conflict` rather than silently picking one; equal payloads are
    /// stable (testable property 5); and when ranks are tied outside that both-OK case (e.g. two
    /// different `BadChecksum` attempts), the later attempt wins.
    pub fn merge(existing: Option<Sector>, incoming: Sector) -> Sector {
        let Some(existing) = existing else { return incoming };

        if existing.status == SectorStatus::Ok && incoming.status == SectorStatus::Ok {
            return if existing.payload == incoming.payload {
                existing
            }
            else {
                Sector::conflict(existing.id, existing.payload)
            };
        }

        // Equal non-OK ranks (e.g. two different BadChecksum payloads) aren't a tie in the
        // sense the both-OK branch above treats one: there's no CONFLICT status for anything
        // short of OK, so the later attempt breaks the tie and wins (spec §4.4, §4.5).
        if incoming.status.rank() >= existing.status.rank() {
            incoming
        }
        else {
            existing
        }
    }
}
