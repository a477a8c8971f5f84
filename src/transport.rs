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

    src/transport.rs

    Contracts for the collaborators that sit outside the decode core (spec §6): the USB flux
    capture device and a persistent capture store. Neither is implemented here; a caller wires
    a concrete implementation of each into a `TrackReader`.
*/

use crate::fluxmap::Fluxmap;
use crate::FluxError;

/// A request/response channel to the flux-capture firmware.
///
/// Implementations are expected to block the calling thread for the duration of each operation
/// (spec §5: "suspension points are exactly the external I/O calls"); this crate drives them
/// from a single thread and never calls one concurrently with another.
pub trait FluxTransport {
    /// Select the physical drive (0 or 1).
    fn set_drive(&mut self, drive: u8) -> Result<(), FluxError>;

    /// Seek to `track` and block until the head has settled. Idempotent: seeking to the
    /// current track is a cheap no-op.
    fn seek(&mut self, track: u16) -> Result<(), FluxError>;

    /// Read `revolutions` spindle revolutions of flux from `side` of the currently seeked
    /// track.
    fn read(&mut self, side: u8, revolutions: u32) -> Result<Fluxmap, FluxError>;

    /// Return the head to track 0; used between retries to shake off a mis-tracking head
    /// (spec §4.4, the RECALIBRATE state).
    fn recalibrate(&mut self) -> Result<(), FluxError>;

    /// Milliseconds per spindle revolution, used to sanity-check clock estimates against the
    /// expected data rate.
    fn measure_speed(&mut self) -> Result<f64, FluxError>;
}

/// A keyed store for previously-captured fluxmaps (spec §6), so a track need not be physically
/// re-read to be re-decoded. Optional: a [`crate::TrackReader`] can be driven with no store at
/// all.
pub trait CaptureStore {
    fn put(&mut self, track: u16, side: u8, fluxmap: &Fluxmap) -> Result<(), FluxError>;
    fn get(&mut self, track: u16, side: u8) -> Result<Option<Fluxmap>, FluxError>;
}
