// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EXIF orientation reader.
//
// Walks the JPEG segment structure directly rather than pulling in a full
// EXIF parser: only the orientation tag of IFD0 is needed, and the scan must
// be total — any malformed, truncated, or hostile buffer maps to "no
// orientation" rather than an error. Every multi-byte read is bounds-checked.

use bildwerk_core::ExifOrientation;
use tracing::trace;

/// JPEG start-of-image marker.
const SOI: u16 = 0xFFD8;
/// APP1 marker — carries the EXIF payload.
const APP1: u16 = 0xFFE1;
/// Start-of-scan marker — entropy-coded image data follows; EXIF cannot
/// appear after this point.
const SOS: u16 = 0xFFDA;
/// TIFF tag number of the orientation field.
const ORIENTATION_TAG: u16 = 0x0112;
/// Byte stride of one IFD entry: tag (2) + type (2) + count (4) + value (4).
const IFD_ENTRY_SIZE: usize = 12;

/// TIFF byte-order indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    /// "II" — Intel, little-endian.
    Little,
    /// "MM" — Motorola, big-endian.
    Big,
}

impl ByteOrder {
    fn u16_at(self, buf: &[u8], offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = buf.get(offset..offset + 2)?.try_into().ok()?;
        Some(match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(self, buf: &[u8], offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = buf.get(offset..offset + 4)?.try_into().ok()?;
        Some(match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        })
    }
}

/// JPEG markers and segment length fields are always big-endian.
fn u16_be(buf: &[u8], offset: usize) -> Option<u16> {
    ByteOrder::Big.u16_at(buf, offset)
}

/// Extract the EXIF orientation from an encoded JPEG buffer.
///
/// Returns `None` when the buffer is not a JPEG, carries no EXIF segment, the
/// segment holds no orientation tag, or the structure is malformed in any way.
/// This function never fails: a parse problem is indistinguishable from a
/// missing tag, by design.
pub fn read_orientation(buffer: &[u8]) -> Option<ExifOrientation> {
    if u16_be(buffer, 0)? != SOI {
        return None;
    }

    let mut offset = 2usize;
    loop {
        let marker = u16_be(buffer, offset)?;
        offset += 2;

        match marker {
            APP1 => {
                // Segment length (2 bytes, includes itself) then the payload.
                return parse_exif_segment(buffer, offset + 2);
            }
            SOS => {
                trace!("reached start-of-scan without an EXIF segment");
                return None;
            }
            _ => {
                let segment_len = u16_be(buffer, offset)? as usize;
                if segment_len < 2 {
                    return None;
                }
                offset += segment_len;
            }
        }
    }
}

/// Parse the APP1 payload: "Exif" signature, TIFF header, IFD0 entry scan.
fn parse_exif_segment(buf: &[u8], exif_start: usize) -> Option<ExifOrientation> {
    if buf.get(exif_start..exif_start + 4)? != b"Exif" {
        return None;
    }

    // TIFF header follows the 6-byte "Exif\0\0" signature. All offsets inside
    // the TIFF structure are relative to this position.
    let tiff_start = exif_start + 6;
    let order = match u16_be(buf, tiff_start)? {
        0x4949 => ByteOrder::Little,
        0x4D4D => ByteOrder::Big,
        _ => return None,
    };

    let ifd0_offset = order.u32_at(buf, tiff_start + 4)? as usize;
    let ifd0_start = tiff_start.checked_add(ifd0_offset)?;

    let entry_count = order.u16_at(buf, ifd0_start)? as usize;
    for i in 0..entry_count {
        let entry = ifd0_start + 2 + i * IFD_ENTRY_SIZE;
        if order.u16_at(buf, entry)? == ORIENTATION_TAG {
            // SHORT value, inlined in the first two bytes of the value field.
            let code = order.u16_at(buf, entry + 8)?;
            return ExifOrientation::from_code(code);
        }
    }

    None
}

#[cfg(test)]
pub(crate) mod testutil {
    /// Build a minimal APP1 EXIF segment (marker included) carrying a single
    /// IFD0 orientation entry, in the requested byte order.
    pub fn exif_app1_segment(orientation: u16, little_endian: bool) -> Vec<u8> {
        let u16b = |v: u16| -> [u8; 2] {
            if little_endian {
                v.to_le_bytes()
            } else {
                v.to_be_bytes()
            }
        };
        let u32b = |v: u32| -> [u8; 4] {
            if little_endian {
                v.to_le_bytes()
            } else {
                v.to_be_bytes()
            }
        };

        let mut tiff = Vec::new();
        tiff.extend_from_slice(if little_endian { b"II" } else { b"MM" });
        tiff.extend_from_slice(&u16b(42));
        tiff.extend_from_slice(&u32b(8)); // IFD0 directly after the header
        tiff.extend_from_slice(&u16b(1)); // one entry
        tiff.extend_from_slice(&u16b(0x0112)); // orientation tag
        tiff.extend_from_slice(&u16b(3)); // type SHORT
        tiff.extend_from_slice(&u32b(1)); // count
        tiff.extend_from_slice(&u16b(orientation));
        tiff.extend_from_slice(&u16b(0)); // value field padding
        tiff.extend_from_slice(&u32b(0)); // next IFD offset

        let mut segment = Vec::new();
        segment.extend_from_slice(&0xFFE1u16.to_be_bytes());
        let payload_len = 2 + 6 + tiff.len(); // length field + signature + TIFF
        segment.extend_from_slice(&(payload_len as u16).to_be_bytes());
        segment.extend_from_slice(b"Exif\0\0");
        segment.extend_from_slice(&tiff);
        segment
    }

    /// A bare JPEG: SOI, the given EXIF segment, then a start-of-scan marker.
    pub fn jpeg_with_exif(orientation: u16, little_endian: bool) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(&exif_app1_segment(orientation, little_endian));
        jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        jpeg
    }

    /// Splice an EXIF APP1 segment into a real encoded JPEG, directly after
    /// the SOI marker.
    pub fn splice_exif(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        assert!(jpeg.starts_with(&[0xFF, 0xD8]), "not a JPEG");
        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(&exif_app1_segment(orientation, true));
        out.extend_from_slice(&jpeg[2..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{exif_app1_segment, jpeg_with_exif};
    use super::*;
    use bildwerk_core::ExifOrientation;

    #[test]
    fn reads_all_codes_in_both_byte_orders() {
        for little_endian in [true, false] {
            for code in 1..=8u16 {
                let jpeg = jpeg_with_exif(code, little_endian);
                assert_eq!(
                    read_orientation(&jpeg),
                    ExifOrientation::from_code(code),
                    "code {code}, little_endian {little_endian}"
                );
            }
        }
    }

    #[test]
    fn non_jpeg_buffers_are_absent() {
        assert_eq!(read_orientation(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(read_orientation(b"GIF89a"), None);
        assert_eq!(read_orientation(b""), None);
        assert_eq!(read_orientation(&[0xFF]), None);
    }

    #[test]
    fn jpeg_without_exif_is_absent() {
        // SOI, APP0 (JFIF stub), SOS.
        let jpeg = [
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0, length 4
            0xFF, 0xDA, 0x00, 0x02, // SOS
        ];
        assert_eq!(read_orientation(&jpeg), None);
    }

    #[test]
    fn exif_after_start_of_scan_is_ignored() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02];
        jpeg.extend_from_slice(&exif_app1_segment(6, true));
        assert_eq!(read_orientation(&jpeg), None);
    }

    #[test]
    fn skips_preceding_segments() {
        let mut jpeg = vec![0xFF, 0xD8];
        // APP0 JFIF segment before the EXIF one.
        jpeg.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        jpeg.extend_from_slice(&[0u8; 14]);
        jpeg.extend_from_slice(&exif_app1_segment(3, false));
        jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        assert_eq!(read_orientation(&jpeg), Some(ExifOrientation::Rotate180));
    }

    #[test]
    fn invalid_orientation_value_is_absent() {
        for bad_code in [0u16, 9, 4711] {
            let jpeg = jpeg_with_exif(bad_code, true);
            assert_eq!(read_orientation(&jpeg), None);
        }
    }

    #[test]
    fn bad_byte_order_word_is_absent() {
        let mut jpeg = jpeg_with_exif(6, true);
        // Corrupt the "II" byte-order indicator inside the TIFF header.
        let tiff_start = 2 + 4 + 6;
        jpeg[tiff_start] = b'X';
        jpeg[tiff_start + 1] = b'X';
        assert_eq!(read_orientation(&jpeg), None);
    }

    #[test]
    fn zero_length_segment_is_absent() {
        // A segment whose length field is smaller than the field itself
        // would otherwise stall the scan.
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x00];
        assert_eq!(read_orientation(&jpeg), None);
    }

    #[test]
    fn every_truncation_is_absent_and_never_panics() {
        let full = jpeg_with_exif(6, true);
        for len in 0..full.len() {
            // Truncated buffers must degrade to "absent", not panic.
            let _ = read_orientation(&full[..len]);
        }
        assert_eq!(read_orientation(&full), Some(ExifOrientation::Rotate90Cw));
    }
}
