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

    src/codec/mod.rs

    Format-specific record extraction and sector parsing. Rather than a class hierarchy, the
    two protocol families (Brother GCR, IBM MFM) each implement the same small capability set
    on their own format struct.
*/

pub mod brother;
pub mod ibm;

use crate::sector::Sector;
use bit_vec::BitVec;

/// The kind of framed byte array a record extractor found, tagged loosely enough to cover both
/// format families without leaking their marker byte values into callers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecordKind {
    /// Brother: a sector header record naming a track/sector id.
    BrotherHeader,
    /// Brother: a sector data record.
    BrotherData,
    /// IBM: index address mark.
    IndexMark,
    /// IBM: sector id / address mark (IDAM).
    SectorHeader,
    /// IBM: sector data address mark (DAM or deleted DAM).
    SectorData { deleted: bool },
}

/// A framed byte array extracted from a bit stream between two sync markers (spec §3).
///
/// `position` is expressed in bit-stream cells and is monotonically non-decreasing across the
/// records a single extractor pass emits, so callers can recover timing without re-scanning the
/// bit stream.
#[derive(Clone, Debug)]
pub struct Record {
    pub kind: RecordKind,
    pub bytes: Vec<u8>,
    pub position: usize,
}

impl Record {
    pub fn new(kind: RecordKind, bytes: Vec<u8>, position: usize) -> Self {
        Record { kind, bytes, position }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?} @ cell {}", self.kind, self.position)?;
        write!(f, "{}", crate::util::dump_slice(&self.bytes, 0, 16))
    }
}

/// The capability set a protocol family must provide: turning a decoded bit stream into framed
/// records, and those records into validated sectors. Two structs implement this (Brother,
/// IBM); a third format is an additive implementation, not a change to this trait.
pub trait FluxFormat {
    /// The clock-cell divisor applied to the flux-transition clock the histogram estimator
    /// returns, to get this format's bit-cell clock (spec §4.1: "MFM callers halve the returned
    /// value"). Brother's bit cell equals its flux-transition cell.
    fn clock_divisor(&self) -> u32;

    /// Scan a decoded bit stream for sync markers and emit one record per marker found. An
    /// unrecognised byte following a sync abandons that sync and scanning resumes from the next
    /// bit (spec §4.2).
    fn extract_records(&self, bits: &BitVec) -> Vec<Record>;

    /// Turn records in emission order into validated sectors (spec §4.3). Implementations never
    /// raise; unverifiable or incomplete records are simply omitted or downgraded to
    /// `BAD_CHECKSUM`, leaving retry decisions to [`crate::track_reader::TrackReader`].
    fn parse_sectors(&self, records: &[Record]) -> Vec<Sector>;
}
