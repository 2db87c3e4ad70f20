//! Frame Codec Module
//!
//! Encodes and decodes the on-disk cache file as a sequence of frames:
//!
//! ```text
//! [marker: u32 BE][keyLen: u32 BE][key: UTF-8][valueLen: u32 BE][value]
//! ```
//!
//! A live frame carries marker 1; the file ends with a lone sentinel marker
//! of 0. All lengths are big-endian 32-bit, keys are UTF-8, so the format is
//! portable across implementations. The marker doubles as a reserved
//! expiration field: no TTL semantics are attached to it, it only
//! distinguishes live frames from the terminator.

use crate::error::{CacheError, Result};

/// Marker value of a live frame (reserved field, no expiration semantics).
pub const LIVE_MARKER: u32 = 1;

/// Marker value of the terminating sentinel frame.
pub const SENTINEL_MARKER: u32 = 0;

// == Decoded Frames ==
/// Result of decoding a cache file.
///
/// A file cut short by a crashed save is still useful: every frame fully
/// present before the cut is returned, and `truncated` records that the
/// sentinel was never reached so the caller can log it.
#[derive(Debug)]
pub struct DecodedFrames {
    /// Fully decoded entries, in file order
    pub entries: Vec<(String, Vec<u8>)>,
    /// True if the stream ended before the sentinel frame
    pub truncated: bool,
}

// == Encode ==
/// Encodes entries into the on-disk byte stream, in the given order,
/// followed by the sentinel frame.
pub fn encode_frames(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in entries {
        out.extend_from_slice(&LIVE_MARKER.to_be_bytes());
        out.extend_from_slice(&(key.len() as u32).to_be_bytes());
        out.extend_from_slice(key.as_bytes());
        out.extend_from_slice(&(value.len() as u32).to_be_bytes());
        out.extend_from_slice(value);
    }
    out.extend_from_slice(&SENTINEL_MARKER.to_be_bytes());
    out
}

// == Decode ==
/// Decodes a byte stream into entries.
///
/// Reads frames until the sentinel or end-of-stream. A stream that ends
/// anywhere short of the sentinel (mid-frame or at a frame boundary) is
/// tolerated truncation: the entries read so far are returned with
/// `truncated` set. Fails with [`CacheError::CorruptFrame`] only on
/// violations no partial write can produce: an unknown frame marker or a
/// key that is not valid UTF-8.
pub fn decode_frames(bytes: &[u8]) -> Result<DecodedFrames> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    loop {
        let marker = match read_u32(bytes, &mut pos) {
            Some(marker) => marker,
            None => return Ok(DecodedFrames { entries, truncated: true }),
        };

        match marker {
            SENTINEL_MARKER => return Ok(DecodedFrames { entries, truncated: false }),
            LIVE_MARKER => {}
            other => {
                return Err(CacheError::CorruptFrame(format!(
                    "unknown frame marker {} at offset {}",
                    other,
                    pos - 4
                )))
            }
        }

        let key_len = match read_u32(bytes, &mut pos) {
            Some(len) => len as usize,
            None => return Ok(DecodedFrames { entries, truncated: true }),
        };
        let key_bytes = match take(bytes, &mut pos, key_len) {
            Some(slice) => slice,
            None => return Ok(DecodedFrames { entries, truncated: true }),
        };
        let key = std::str::from_utf8(key_bytes)
            .map_err(|_| CacheError::CorruptFrame("frame key is not valid UTF-8".to_string()))?
            .to_string();

        let value_len = match read_u32(bytes, &mut pos) {
            Some(len) => len as usize,
            None => return Ok(DecodedFrames { entries, truncated: true }),
        };
        let value = match take(bytes, &mut pos, value_len) {
            Some(slice) => slice.to_vec(),
            None => return Ok(DecodedFrames { entries, truncated: true }),
        };

        entries.push((key, value));
    }
}

// == Cursor Helpers ==
/// Reads a big-endian u32 at the cursor, advancing it. None on underrun.
fn read_u32(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let slice = take(bytes, pos, 4)?;
    Some(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

/// Takes `len` bytes at the cursor, advancing it. None on underrun.
fn take<'a>(bytes: &'a [u8], pos: &mut usize, len: usize) -> Option<&'a [u8]> {
    let end = pos.checked_add(len)?;
    if end > bytes.len() {
        return None;
    }
    let slice = &bytes[*pos..end];
    *pos = end;
    Some(slice)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<(String, Vec<u8>)> {
        vec![
            ("a".to_string(), vec![0x01, 0x02]),
            ("b".to_string(), vec![]),
        ]
    }

    #[test]
    fn test_encode_exact_bytes() {
        // Frame layout is a wire contract; check it byte for byte
        let encoded = encode_frames(&sample_entries());
        let expected: Vec<u8> = vec![
            // frame "a" -> [0x01, 0x02]
            0, 0, 0, 1, // live marker
            0, 0, 0, 1, // key length
            0x61, // "a"
            0, 0, 0, 2, // value length
            0x01, 0x02, // value
            // frame "b" -> []
            0, 0, 0, 1, // live marker
            0, 0, 0, 1, // key length
            0x62, // "b"
            0, 0, 0, 0, // value length (empty)
            // sentinel
            0, 0, 0, 0,
        ];
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_decode_roundtrip_preserves_order() {
        let entries = sample_entries();
        let decoded = decode_frames(&encode_frames(&entries)).unwrap();
        assert!(!decoded.truncated);
        assert_eq!(decoded.entries, entries);
    }

    #[test]
    fn test_encode_empty_is_lone_sentinel() {
        assert_eq!(encode_frames(&[]), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_sentinel_only() {
        let decoded = decode_frames(&[0, 0, 0, 0]).unwrap();
        assert!(decoded.entries.is_empty());
        assert!(!decoded.truncated);
    }

    #[test]
    fn test_decode_empty_stream_is_truncated() {
        let decoded = decode_frames(&[]).unwrap();
        assert!(decoded.entries.is_empty());
        assert!(decoded.truncated);
    }

    #[test]
    fn test_decode_cut_mid_value() {
        // Cut after a partial value of the second frame: the first frame
        // must survive, the second is dropped
        let encoded = encode_frames(&[
            ("a".to_string(), vec![0x01, 0x02]),
            ("b".to_string(), vec![0x03, 0x04, 0x05]),
        ]);
        let cut = encoded.len() - 6; // inside "b"'s value
        let decoded = decode_frames(&encoded[..cut]).unwrap();
        assert!(decoded.truncated);
        assert_eq!(decoded.entries, vec![("a".to_string(), vec![0x01, 0x02])]);
    }

    #[test]
    fn test_decode_missing_sentinel_at_boundary() {
        let encoded = encode_frames(&sample_entries());
        // Drop the sentinel: both frames survive, stream reported truncated
        let decoded = decode_frames(&encoded[..encoded.len() - 4]).unwrap();
        assert!(decoded.truncated);
        assert_eq!(decoded.entries, sample_entries());
    }

    #[test]
    fn test_decode_unknown_marker_is_corrupt() {
        let mut bytes = 7u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(
            decode_frames(&bytes),
            Err(CacheError::CorruptFrame(_))
        ));
    }

    #[test]
    fn test_decode_invalid_utf8_key_is_corrupt() {
        let mut bytes = LIVE_MARKER.to_be_bytes().to_vec();
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]); // not UTF-8
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&SENTINEL_MARKER.to_be_bytes());
        assert!(matches!(
            decode_frames(&bytes),
            Err(CacheError::CorruptFrame(_))
        ));
    }

    #[test]
    fn test_unicode_key_roundtrip() {
        let entries = vec![("clé-🔑".to_string(), vec![9, 8, 7])];
        let decoded = decode_frames(&encode_frames(&entries)).unwrap();
        assert_eq!(decoded.entries, entries);
    }

    #[test]
    fn test_decode_length_overrun_is_truncation() {
        // A value length larger than the remaining stream is how a crashed
        // save looks; it must not be a hard error
        let mut bytes = LIVE_MARKER.to_be_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.push(b'k');
        bytes.extend_from_slice(&1000u32.to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);
        let decoded = decode_frames(&bytes).unwrap();
        assert!(decoded.truncated);
        assert!(decoded.entries.is_empty());
    }
}
