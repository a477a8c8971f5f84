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

//! Physical and logical addressing types shared across the decode pipeline.

use std::fmt::{self, Display, Formatter};

/// A physical (drive-relative) track/side coordinate, as handed to the flux transport.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Default)]
pub struct TrackAddress {
    pub track: u16,
    pub side: u8,
}

impl TrackAddress {
    pub fn new(track: u16, side: u8) -> Self {
        Self { track, side }
    }
}

impl From<(u16, u8)> for TrackAddress {
    fn from((track, side): (u16, u8)) -> Self {
        Self { track, side }
    }
}

impl Display for TrackAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.track, self.side)
    }
}

/// The logical (track, side, sector) key under which a [`crate::Sector`] is stored in a
/// [`crate::SectorSet`]. Logical track/side need not equal the physical coordinate a track was
/// read from: some formats interleave or skew sectors, and a retry may land sectors for one
/// physical track's read into several logical addresses.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct SectorId {
    pub track: u16,
    pub side: u8,
    pub sector: u8,
}

impl SectorId {
    pub fn new(track: u16, side: u8, sector: u8) -> Self {
        Self { track, side, sector }
    }
}

impl From<(u16, u8, u8)> for SectorId {
    fn from((track, side, sector): (u16, u8, u8)) -> Self {
        Self { track, side, sector }
    }
}

impl From<(TrackAddress, u8)> for SectorId {
    fn from((addr, sector): (TrackAddress, u8)) -> Self {
        Self { track: addr.track, side: addr.side, sector }
    }
}

impl Display for SectorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[t:{} s:{} n:{}]", self.track, self.side, self.sector)
    }
}
