//! Remaining-length varint and UTF-8 string framing shared by every packet encoder.
//!
//! MQTT v3.1.1 standard, section 2.2.3: the Remaining Length field uses at most
//! 4 bytes, low 7 bits payload, top bit a continuation flag, encoding values up
//! to 268,435,455.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::err::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};

pub const MAX_REMAINING_LEN: usize = 268_435_455;

/// Writes `len` as a 1-4 byte MQTT varint, returning the number of bytes written.
pub fn encode_remaining_len(bytes: &mut BytesMut, mut len: usize) -> Result<usize, EncodeError> {
    if len > MAX_REMAINING_LEN {
        return Err(EncodeError::new(
            EncodeErrorKind::OversizedPayload,
            format!("remaining length {len} exceeds the 268,435,455 byte maximum"),
        ));
    }

    let mut num_bytes = 0;
    loop {
        let mut digit = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            digit |= 0x80;
        }
        bytes.put_u8(digit);
        num_bytes += 1;
        if len == 0 {
            break;
        }
    }
    Ok(num_bytes)
}

/// Decodes a remaining-length varint from the front of `bytes` without consuming it.
///
/// Returns `(header_len, remaining_len)` where `header_len` is the number of
/// varint bytes consumed. Rejects encodings longer than 4 bytes.
pub fn decode_remaining_len(bytes: &Bytes) -> Result<(usize, usize), DecodeError> {
    let mut mult: usize = 1;
    let mut value: usize = 0;

    for i in 0..4 {
        if i >= bytes.len() {
            return Err(DecodeError::new(
                DecodeErrorKind::MalformedLength,
                "remaining length varint truncated".to_string(),
            ));
        }
        let byte = bytes[i];
        value += (byte & 0x7f) as usize * mult;
        if byte & 0x80 == 0 {
            return Ok((i + 1, value));
        }
        mult *= 128;
    }

    Err(DecodeError::new(
        DecodeErrorKind::MalformedLength,
        "remaining length varint exceeded 4 bytes".to_string(),
    ))
}

pub fn encode_utf8_str(bytes: &mut BytesMut, val: &str) -> Result<(), EncodeError> {
    encode_bytes(bytes, val.as_bytes())
}

pub fn encode_bytes(bytes: &mut BytesMut, val: &[u8]) -> Result<(), EncodeError> {
    if val.len() > u16::MAX as usize {
        return Err(EncodeError::new(
            EncodeErrorKind::OversizedPayload,
            format!("field of {} bytes exceeds the 65535 byte length prefix", val.len()),
        ));
    }
    bytes.put_u16(val.len() as u16);
    bytes.put_slice(val);
    Ok(())
}

pub fn decode_u16_len(bytes: &mut Bytes) -> Result<u16, DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::new(
            DecodeErrorKind::MalformedLength,
            "buffer too short for a 2-byte length prefix".to_string(),
        ));
    }
    let len = bytes.get_u16();
    if len as usize > bytes.len() {
        return Err(DecodeError::new(
            DecodeErrorKind::MalformedLength,
            format!(
                "declared length {len} exceeds the {} bytes remaining",
                bytes.len()
            ),
        ));
    }
    Ok(len)
}

pub fn decode_bytes(bytes: &mut Bytes) -> Result<Bytes, DecodeError> {
    let len = decode_u16_len(bytes)?;
    let slice = bytes.slice(0..len as usize);
    bytes.advance(len as usize);
    Ok(slice)
}

pub fn decode_utf8_str(bytes: &mut Bytes) -> Result<String, DecodeError> {
    let slice = decode_bytes(bytes)?;
    String::from_utf8(slice.to_vec())
        .map_err(|e| DecodeError::new(DecodeErrorKind::Utf8ParseError, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_boundary_lengths() {
        for len in [0usize, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, MAX_REMAINING_LEN] {
            let mut buf = BytesMut::new();
            let written = encode_remaining_len(&mut buf, len).unwrap();
            assert!(written <= 4);
            let frozen = buf.freeze();
            let (consumed, decoded) = decode_remaining_len(&frozen).unwrap();
            assert_eq!(consumed, written);
            assert_eq!(decoded, len);
        }
    }

    #[test]
    fn rejects_oversized_len() {
        let mut buf = BytesMut::new();
        assert!(encode_remaining_len(&mut buf, MAX_REMAINING_LEN + 1).is_err());
    }

    #[test]
    fn rejects_five_byte_varint() {
        let bytes = Bytes::from_static(&[0x80, 0x80, 0x80, 0x80]);
        assert!(decode_remaining_len(&bytes).is_err());
    }

    #[test]
    fn utf8_string_round_trips() {
        let mut buf = BytesMut::new();
        encode_utf8_str(&mut buf, "a/b/topic").unwrap();
        let mut frozen = buf.freeze();
        assert_eq!(decode_utf8_str(&mut frozen).unwrap(), "a/b/topic");
    }
}
