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

//! # fluxengine-core
//!
//! `fluxengine-core` is the flux-decoding core of FluxEngine: it turns raw magnetic flux
//! transitions captured off a floppy disk by a USB flux-capture device into logical sector
//! data.
//!
//! The pipeline is strictly leaves-first:
//!
//! 1. A [`Fluxmap`] holds the raw interval-byte stream for one track revolution.
//! 2. [`fluxmap::clock::estimate_clock`] inspects the interval histogram and returns a clock
//!    period.
//! 3. [`fluxmap::bitstream::decode_to_bits`] turns the fluxmap into a boolean bit stream.
//! 4. A format ([`codec::brother::BrotherFormat`] or [`codec::ibm::IbmFormat`]) implementing
//!    [`codec::FluxFormat`] extracts [`Record`]s from the bit stream and parses those records
//!    into [`Sector`]s.
//! 5. [`TrackReader`] drives steps 2-4 with retry and recalibration for a single (drive, track,
//!    side) coordinate.
//! 6. [`SectorSet`] aggregates the best-known sector across all tracks and reads, and computes
//!    disk [`Geometry`].
//!
//! The USB transport, a persistent capture store, the command-line surface, and the final
//! image-file encoder beyond a flat raw dump are external collaborators; this crate defines
//! their contracts ([`transport::FluxTransport`], [`transport::CaptureStore`]) but does not
//! implement them.

pub mod codec;
pub mod config;
pub mod fluxmap;
pub mod image_writer;
pub mod sector;
pub mod sector_set;
pub mod track_address;
pub mod track_reader;
pub mod transport;
pub mod util;

use thiserror::Error;

/// Fixed hardware tick period used by the reference capture device, in nanoseconds.
pub const NOMINAL_TICK_NS: f64 = 83.3;

/// Default number of retries a [`TrackReader`] will spend on a track before giving up
/// (spec §4.4).
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Sentinel clock period returned by the clock estimator when a fluxmap carries no usable
/// intervals (the "empty fluxmap" scenario).
pub const SENTINEL_CLOCK_NS: f64 = 4000.0;

/// Errors that can occur at the boundaries of the decode core: configuration problems raised
/// at setup time, and transport faults bubbled up by the caller's [`transport::FluxTransport`]
/// implementation.
///
/// The decode pipeline itself never raises one of these — it degrades instead (empty bit
/// stream, empty records, `BAD_CHECKSUM`/`MISSING` sectors), and [`TrackReader`] is the single
/// point that turns a degraded read into a retry decision. A [`transport::FluxTransport`]
/// implementation constructs `TransportFault` when a read or seek fails at the hardware level,
/// but [`TrackReader::read_track`] catches it internally and consumes a retry rather than letting
/// it escape as an `Err` — a transport fault is a per-attempt condition, not a fatal one. The
/// remaining variants are raised before a track's retry loop ever starts and do escape as `Err`.
#[derive(Debug, Error)]
pub enum FluxError {
    #[error("transport fault reading (drive {drive}, track {track}, side {side}): {detail}")]
    TransportFault { drive: u8, track: u16, side: u8, detail: String },
    #[error("invalid track specification: {0}")]
    InvalidTrackSpec(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("an IO error occurred reading or writing flux data")]
    Io(String),
}

impl From<std::io::Error> for FluxError {
    fn from(err: std::io::Error) -> Self {
        FluxError::Io(err.to_string())
    }
}

impl From<binrw::Error> for FluxError {
    fn from(err: binrw::Error) -> Self {
        FluxError::Io(err.to_string())
    }
}

pub use crate::codec::{Record, RecordKind};
pub use crate::fluxmap::Fluxmap;
pub use crate::sector::{Sector, SectorStatus};
pub use crate::sector_set::{Geometry, SectorSet};
pub use crate::track_address::{SectorId, TrackAddress};
pub use crate::track_reader::{TrackOutcome, TrackReadReport, TrackReader};
