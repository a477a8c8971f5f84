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

//! The `util` module provides small utility functions used throughout the decode pipeline.

/// The initial seed value for CRC-16/CCITT and related checksums.
pub const CRC_CCITT_INITIAL: u16 = 0xFFFF;

/// Calculate a CRC-16/CCITT checksum over a byte slice (polynomial 0x1021).
///
/// Used by the IBM sector parser to verify IDAM and data record CRCs (spec §4.3): the CRC is
/// computed over the marker bytes, the payload, and the two stored CRC bytes; a correct record
/// yields zero.
pub fn crc_ibm_3740(data: &[u8], start: Option<u16>) -> u16 {
    const POLY: u16 = 0x1021; // Polynomial x^16 + x^12 + x^5 + 1
    let mut crc: u16 = start.unwrap_or(CRC_CCITT_INITIAL);

    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ POLY;
            }
            else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Render a byte slice as a classic hex + ASCII dump, one row of `bytes_per_row` bytes at a
/// time. Used for `--dump-records`-style diagnostics of decoded [`crate::Record`]s.
pub fn dump_slice(data_slice: &[u8], start_address: usize, bytes_per_row: usize) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for (row_idx, chunk) in data_slice.chunks(bytes_per_row).enumerate() {
        let _ = write!(out, "{:05X} | ", row_idx * bytes_per_row + start_address);
        for b in chunk {
            let _ = write!(out, "{:02X} ", b);
        }
        for _ in chunk.len()..bytes_per_row {
            out.push_str("   ");
        }
        out.push_str("| ");
        for &b in chunk {
            out.push(if (40..=126).contains(&b) { b as char } else { '.' });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_of_empty_slice_is_initial_value() {
        assert_eq!(crc_ibm_3740(&[], None), CRC_CCITT_INITIAL);
    }

    #[test]
    fn crc_round_trip_over_payload_plus_crc_is_zero() {
        let payload = [0xA1, 0xA1, 0xA1, 0xFBu8, 1, 2, 3, 4, 5];
        let crc = crc_ibm_3740(&payload, None);
        let mut framed = payload.to_vec();
        framed.push((crc >> 8) as u8);
        framed.push((crc & 0xFF) as u8);
        assert_eq!(crc_ibm_3740(&framed, None), 0);
    }

    #[test]
    fn dump_slice_pads_last_row() {
        let data = [0x41, 0x42, 0x43];
        let dump = dump_slice(&data, 0, 8);
        assert!(dump.contains("41 42 43"));
        assert!(dump.contains("ABC"));
    }
}
