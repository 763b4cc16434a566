//! BER definite-length encoding (X.690 Section 8.1.3).

use crate::error::{DecodeErrorKind, Error, Result};

/// Largest content length accepted on decode.
///
/// A UDP datagram can never carry more than 64 KiB, so this only guards
/// against corrupt long-form lengths.
pub const MAX_LENGTH: usize = 0x200000;

/// Encode a length, returning the octets in reverse order for the
/// reverse-writing [`EncodeBuf`](super::EncodeBuf).
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];

    if len <= 127 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let mut count = 0;
    let mut rest = len;
    while rest > 0 && count < 4 {
        buf[count] = rest as u8;
        rest >>= 8;
        count += 1;
    }
    buf[count] = 0x80 | count as u8;
    (buf, count + 1)
}

/// Decode a length field, returning `(length, octets consumed)`.
///
/// `base_offset` is the decoder position of `data[0]`, used for error context.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first == 0x80 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::IndefiniteLength,
        ));
    }

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let octets = (first & 0x7F) as usize;
    if octets > 4 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthTooLong { octets },
        ));
    }
    if data.len() < 1 + octets {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    }

    let len = data[1..=octets]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);

    if len > MAX_LENGTH {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            },
        ));
    }

    Ok((len, 1 + octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(len: usize) -> Vec<u8> {
        let (buf, count) = encode_length(len);
        buf[..count].iter().rev().copied().collect()
    }

    #[test]
    fn test_short_form() {
        assert_eq!(forward(0), vec![0x00]);
        assert_eq!(forward(127), vec![0x7F]);
        assert_eq!(decode_length(&[0x7F], 0).unwrap(), (127, 1));
    }

    #[test]
    fn test_long_form() {
        assert_eq!(forward(128), vec![0x81, 0x80]);
        assert_eq!(forward(256), vec![0x82, 0x01, 0x00]);
        assert_eq!(forward(0x012345), vec![0x83, 0x01, 0x23, 0x45]);
        assert_eq!(decode_length(&[0x82, 0x01, 0x00], 0).unwrap(), (256, 3));
    }

    #[test]
    fn test_rejects_indefinite() {
        let err = decode_length(&[0x80], 7).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 7,
                kind: DecodeErrorKind::IndefiniteLength
            }
        ));
    }

    #[test]
    fn test_rejects_truncated_and_oversized() {
        assert!(decode_length(&[], 0).is_err());
        assert!(decode_length(&[0x82, 0x01], 0).is_err());
        assert!(decode_length(&[0x85, 1, 2, 3, 4, 5], 0).is_err());
        assert!(decode_length(&[0x84, 0x7F, 0xFF, 0xFF, 0xFF], 0).is_err());
    }
}
