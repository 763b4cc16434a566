//! BER encoding.
//!
//! The buffer is written back to front: content first, then its length,
//! then its tag. Constructed types therefore never need a length pre-pass,
//! but callers must push sequence members in reverse order.

use super::length::encode_length;
use super::tag;
use bytes::Bytes;

/// Reverse-writing buffer for BER encoding.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Prepend content bytes (given in forward order).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Prepend a BER length.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, count) = encode_length(len);
        self.buf.extend_from_slice(&bytes[..count]);
    }

    /// Prepend a tag byte.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Number of bytes encoded so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU).
    ///
    /// The closure writes the contents; length and tag are added afterwards.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start_len = self.len();
        f(self);
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Fallible [`push_constructed`](Self::push_constructed).
    ///
    /// On error, the length and tag are not written and the partial
    /// contents are discarded.
    pub fn try_push_constructed<F, E>(&mut self, tag: u8, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        let start_len = self.len();
        if let Err(err) = f(self) {
            self.buf.truncate(start_len);
            return Err(err);
        }
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
        Ok(())
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Fallible [`push_sequence`](Self::push_sequence).
    pub fn try_push_sequence<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        self.try_push_constructed(tag::universal::SEQUENCE, f)
    }

    /// Encode a BOOLEAN (`0xFF` for true, DER style).
    pub fn push_boolean(&mut self, value: bool) {
        self.buf.push(if value { 0xFF } else { 0x00 });
        self.push_length(1);
        self.push_tag(tag::universal::BOOLEAN);
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i32) {
        self.push_signed32(tag::universal::INTEGER, value);
    }

    /// Encode a signed 32-bit integer under an arbitrary tag.
    pub fn push_signed32(&mut self, tag: u8, value: i32) {
        let (arr, len) = encode_integer_stack(value);
        self.push_bytes(&arr[4 - len..]);
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Encode an unsigned 32-bit integer with a specific tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let (arr, len) = encode_unsigned32_stack(value);
        self.push_bytes(&arr[5 - len..]);
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Encode a Counter64.
    pub fn push_integer64(&mut self, value: u64) {
        let (arr, len) = encode_integer64_stack(value);
        self.push_bytes(&arr[9 - len..]);
        self.push_length(len);
        self.push_tag(tag::application::COUNTER64);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &crate::oid::Oid) {
        let ber = oid.to_ber_smallvec();
        self.push_bytes(&ber);
        self.push_length(ber.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Encode an IpAddress.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Finalize and return the encoded bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal two's-complement encoding of an `i32`.
///
/// The valid bytes are the last `len` entries of the returned array.
#[inline]
fn encode_integer_stack(value: i32) -> ([u8; 4], usize) {
    let bytes = value.to_be_bytes();

    let mut start = 0;
    if value >= 0 {
        while start < 3 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        while start < 3 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }

    (bytes, 4 - start)
}

/// Minimal encoding of a `u32`, with a leading zero octet when the high bit
/// of the first significant octet is set.
#[inline]
fn encode_unsigned32_stack(value: u32) -> ([u8; 5], usize) {
    let mut result = [0u8; 5];
    result[1..].copy_from_slice(&value.to_be_bytes());
    (result, significant_len(&result))
}

/// Same as [`encode_unsigned32_stack`] for Counter64.
#[inline]
fn encode_integer64_stack(value: u64) -> ([u8; 9], usize) {
    let mut result = [0u8; 9];
    result[1..].copy_from_slice(&value.to_be_bytes());
    (result, significant_len(&result))
}

/// Length of the minimal positive encoding held at the tail of `padded`,
/// where `padded[0]` is a spare zero octet.
fn significant_len(padded: &[u8]) -> usize {
    let mut start = 1;
    while start < padded.len() - 1 && padded[start] == 0 {
        start += 1;
    }
    if padded[start] & 0x80 != 0 {
        start -= 1;
    }
    padded.len() - start
}
