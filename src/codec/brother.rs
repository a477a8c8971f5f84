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

    src/codec/brother.rs

    Brother word-processor GCR: a 5-of-8 group code, where every valid code word has exactly
    five one-bits out of eight, makes an all-zero byte structurally impossible to appear in
    encoded data. A long run of zero bits is therefore a safe, unique sync pattern.
*/

use super::{FluxFormat, Record, RecordKind};
use crate::sector::Sector;
use crate::track_address::SectorId;

/// Brother's bit cell equals the clock estimator's detected flux-transition cell; no halving
/// (contrast IBM's [`super::ibm::IbmFormat::clock_divisor`]).
pub const CLOCK_DIVISOR: u32 = 1;

pub const SECTOR_SIZE: usize = 256;

/// Minimum run of zero bits that counts as a sync mark. Comfortably longer than any zero-run a
/// valid 5-of-8 group can produce on its own (at most 3 consecutive zero bits within a single
/// group), so it cannot occur by chance in encoded data.
const SYNC_ZERO_BITS: usize = 24;

const MARKER_HEADER: u8 = 0x01;
const MARKER_DATA: u8 = 0x02;

/// Sixteen 8-bit group codes, each with exactly five one-bits, indexed by the 4-bit nibble they
/// encode.
const GCR_ENCODE: [u8; 16] = [
    0xF8, 0xF4, 0xF2, 0xF1, 0xEC, 0xEA, 0xE9, 0xE6, 0xE5, 0xE3, 0xDC, 0xDA, 0xD9, 0xD6, 0xD5, 0xD3,
];

fn gcr_decode(group: u8) -> Option<u8> {
    GCR_ENCODE.iter().position(|&g| g == group).map(|nibble| nibble as u8)
}

pub struct BrotherFormat;

impl BrotherFormat {
    pub fn new() -> Self {
        BrotherFormat
    }

    fn encode_byte(byte: u8) -> [u8; 2] {
        [GCR_ENCODE[(byte >> 4) as usize], GCR_ENCODE[(byte & 0x0F) as usize]]
    }

    fn checksum(payload: &[u8]) -> u8 {
        payload.iter().fold(0u8, |acc, &b| acc ^ b)
    }

    fn read_raw_byte(bits: &bit_vec::BitVec, pos: &mut usize) -> Option<u8> {
        if *pos + 8 > bits.len() {
            return None;
        }
        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | (bits.get(*pos)? as u8);
            *pos += 1;
        }
        Some(byte)
    }

    fn read_gcr_byte(bits: &bit_vec::BitVec, pos: &mut usize) -> Option<u8> {
        let high = gcr_decode(Self::read_raw_byte(bits, pos)?)?;
        let low = gcr_decode(Self::read_raw_byte(bits, pos)?)?;
        Some((high << 4) | low)
    }

    /// Find a qualifying zero run starting at `start`, returning `(run_start, marker_index)`
    /// where `marker_index` is the first bit of the discriminator byte that follows the run.
    fn find_sync(bits: &bit_vec::BitVec, start: usize) -> Option<(usize, usize)> {
        let mut zero_run = 0usize;
        let mut run_start = start;
        let mut i = start;
        while i < bits.len() {
            if bits.get(i).unwrap_or(false) {
                if zero_run >= SYNC_ZERO_BITS {
                    return Some((run_start, i));
                }
                zero_run = 0;
                run_start = i + 1;
            }
            else {
                if zero_run == 0 {
                    run_start = i;
                }
                zero_run += 1;
            }
            i += 1;
        }
        None
    }
}

impl Default for BrotherFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl FluxFormat for BrotherFormat {
    fn clock_divisor(&self) -> u32 {
        CLOCK_DIVISOR
    }

    fn extract_records(&self, bits: &bit_vec::BitVec) -> Vec<Record> {
        let mut records = Vec::new();
        let mut search_from = 0usize;

        while let Some((sync_start, marker_index)) = Self::find_sync(bits, search_from) {
            let mut pos = marker_index;
            let Some(marker) = Self::read_raw_byte(bits, &mut pos) else { break };

            let record = match marker {
                MARKER_HEADER => {
                    let track = Self::read_gcr_byte(bits, &mut pos);
                    let sector = Self::read_gcr_byte(bits, &mut pos);
                    match (track, sector) {
                        (Some(track), Some(sector)) => {
                            Some(Record::new(RecordKind::BrotherHeader, vec![track, sector], sync_start))
                        }
                        _ => None,
                    }
                }
                MARKER_DATA => {
                    let mut payload = Vec::with_capacity(SECTOR_SIZE);
                    let mut ok = true;
                    for _ in 0..SECTOR_SIZE {
                        match Self::read_gcr_byte(bits, &mut pos) {
                            Some(b) => payload.push(b),
                            None => {
                                ok = false;
                                break;
                            }
                        }
                    }
                    let checksum = ok.then(|| Self::read_gcr_byte(bits, &mut pos)).flatten();
                    match checksum {
                        Some(checksum) => {
                            payload.push(checksum);
                            Some(Record::new(RecordKind::BrotherData, payload, sync_start))
                        }
                        None => None,
                    }
                }
                _ => None,
            };

            search_from = if record.is_some() { pos } else { marker_index + 1 };
            if let Some(record) = record {
                records.push(record);
            }
        }

        records
    }

    fn parse_sectors(&self, records: &[Record]) -> Vec<Sector> {
        let mut sectors = Vec::new();
        let mut pending_header: Option<(u16, u8)> = None;

        for record in records {
            match record.kind {
                RecordKind::BrotherHeader => {
                    if record.bytes.len() == 2 {
                        pending_header = Some((record.bytes[0] as u16, record.bytes[1]));
                    }
                }
                RecordKind::BrotherData => {
                    let Some((track, sector)) = pending_header.take() else { continue };
                    if record.bytes.len() != SECTOR_SIZE + 1 {
                        continue;
                    }
                    let payload = &record.bytes[..SECTOR_SIZE];
                    let stored_checksum = record.bytes[SECTOR_SIZE];
                    let id = SectorId::new(track, 0, sector);
                    sectors.push(if Self::checksum(payload) == stored_checksum {
                        Sector::ok(id, payload.to_vec())
                    }
                    else {
                        Sector::bad_checksum(id, payload.to_vec())
                    });
                }
                _ => {}
            }
        }

        sectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bit_vec::BitVec;

    fn push_zeros(bits: &mut Vec<bool>, count: usize) {
        bits.extend(std::iter::repeat(false).take(count));
    }

    fn push_raw_byte(bits: &mut Vec<bool>, byte: u8) {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1 == 1);
        }
    }

    fn push_gcr_byte(bits: &mut Vec<bool>, byte: u8) {
        for group in BrotherFormat::encode_byte(byte) {
            push_raw_byte(bits, group);
        }
    }

    fn build_sector(track: u8, sector: u8, payload: &[u8]) -> Vec<bool> {
        build_sector_with_checksum(track, sector, payload, BrotherFormat::checksum(payload))
    }

    fn build_sector_with_checksum(track: u8, sector: u8, payload: &[u8], checksum: u8) -> Vec<bool> {
        let mut bits = Vec::new();
        push_zeros(&mut bits, SYNC_ZERO_BITS);
        push_raw_byte(&mut bits, MARKER_HEADER);
        push_gcr_byte(&mut bits, track);
        push_gcr_byte(&mut bits, sector);

        push_zeros(&mut bits, SYNC_ZERO_BITS);
        push_raw_byte(&mut bits, MARKER_DATA);
        for &b in payload {
            push_gcr_byte(&mut bits, b);
        }
        push_gcr_byte(&mut bits, checksum);
        bits
    }

    #[test]
    fn gcr_table_round_trips_every_nibble() {
        for nibble in 0u8..16 {
            let encoded = GCR_ENCODE[nibble as usize];
            assert_eq!(gcr_decode(encoded), Some(nibble));
        }
    }

    #[test]
    fn single_sector_round_trips_to_ok() {
        let payload: Vec<u8> = (0..SECTOR_SIZE).map(|i| (i % 256) as u8).collect();
        let bits = BitVec::from_iter(build_sector(5, 3, &payload));
        let format = BrotherFormat::new();
        let records = format.extract_records(&bits);
        assert_eq!(records.len(), 2);
        let sectors = format.parse_sectors(&records);
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors[0].id, SectorId::new(5, 0, 3));
        assert_eq!(sectors[0].status, crate::sector::SectorStatus::Ok);
        assert_eq!(sectors[0].payload, payload);
    }

    #[test]
    fn twelve_sector_track_all_decode_ok() {
        let mut all_bits = Vec::new();
        for sector in 0..12u8 {
            let payload = vec![sector; SECTOR_SIZE];
            all_bits.extend(build_sector(0, sector, &payload));
        }
        let bits = BitVec::from_iter(all_bits);
        let format = BrotherFormat::new();
        let records = format.extract_records(&bits);
        let sectors = format.parse_sectors(&records);
        assert_eq!(sectors.len(), 12);
        assert!(sectors.iter().all(|s| s.status == crate::sector::SectorStatus::Ok));
    }

    #[test]
    fn corrupted_checksum_yields_bad_checksum() {
        let payload = vec![0xAAu8; SECTOR_SIZE];
        let wrong_checksum = BrotherFormat::checksum(&payload) ^ 0x01;
        let bits = BitVec::from_iter(build_sector_with_checksum(1, 0, &payload, wrong_checksum));
        let format = BrotherFormat::new();
        let records = format.extract_records(&bits);
        let sectors = format.parse_sectors(&records);
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors[0].status, crate::sector::SectorStatus::BadChecksum);
    }
}
