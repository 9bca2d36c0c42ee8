//! Binary wire format for HL7v2 messages.
//!
//! The format is byte-exact and versionless; consumers interoperating with
//! previously encoded data must match it exactly. Field order is fixed and
//! is the compatibility contract.
//!
//! ## Encoding rules
//!
//! | Shape            | Bytes                                                    |
//! |------------------|----------------------------------------------------------|
//! | Nullable string  | presence flag (1 byte) + length (u32 BE) + UTF-8 bytes   |
//! | Dictionary       | presence flag + count (u32 BE) + (key, value) pairs      |
//! | List             | presence flag + count (u32 BE) + element encodings       |
//! | Nested record    | presence flag + the record's own encoding                |
//!
//! A presence flag is `0` (absent, nothing follows) or `1` (present); any
//! other value is malformed. Dictionary keys and values each use the
//! nullable-string encoding, but an absent key is malformed; only values
//! may be individually absent. "Absent" and "empty string" are distinct on
//! the wire (`[0]` vs. `[1, 0, 0, 0, 0]`) and must stay distinct.
//!
//! Decoding consumes exactly the bytes that encoding wrote, so concatenated
//! messages decode in sequence from a single [`ByteReader`].

use std::collections::BTreeMap;

use crate::error::CodecError;
use crate::message::{Hl7v2Message, LabelMap, ParsedData, Segment};

const ABSENT: u8 = 0;
const PRESENT: u8 = 1;

/// A cursor over an encoded byte stream.
///
/// Tracks its position so that decode errors can report where the stream
/// went wrong, and so that several messages can be decoded back to back
/// from one buffer.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset into the underlying buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32_be(&mut self) -> Result<u32, CodecError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(CodecError::UnexpectedEof {
                needed: len - remaining,
                remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

/// A value with a fixed binary encoding.
///
/// The nested-record rule in the wire format is generic over this trait:
/// the outer codec delegates to the sub-record's `encode`/`decode` without
/// knowing its internal layout.
pub trait WireCodec: Sized {
    /// Append this value's encoding to `buf`.
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Decode one value, consuming exactly the bytes its encoding wrote.
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError>;

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode a single value from `bytes`, rejecting trailing garbage.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(bytes);
        let value = Self::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(CodecError::TrailingBytes {
                remaining: reader.remaining(),
            });
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Encoding primitives
// ---------------------------------------------------------------------------

fn encode_flag(buf: &mut Vec<u8>, present: bool) {
    buf.push(if present { PRESENT } else { ABSENT });
}

fn decode_flag(reader: &mut ByteReader<'_>) -> Result<bool, CodecError> {
    let offset = reader.position();
    match reader.read_u8()? {
        ABSENT => Ok(false),
        PRESENT => Ok(true),
        value => Err(CodecError::InvalidMarker { value, offset }),
    }
}

fn encode_len(buf: &mut Vec<u8>, len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(len).map_err(|_| CodecError::FieldTooLong { len })?;
    buf.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn encode_str(buf: &mut Vec<u8>, value: &str) -> Result<(), CodecError> {
    encode_len(buf, value.len())?;
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn decode_str(reader: &mut ByteReader<'_>) -> Result<String, CodecError> {
    let len = reader.read_u32_be()? as usize;
    let offset = reader.position();
    let bytes = reader.read_bytes(len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { offset })
}

/// Encode an optional string: presence flag, then length-prefixed UTF-8.
pub fn encode_nullable_str(buf: &mut Vec<u8>, value: Option<&str>) -> Result<(), CodecError> {
    encode_flag(buf, value.is_some());
    match value {
        Some(s) => encode_str(buf, s),
        None => Ok(()),
    }
}

/// Decode an optional string, reconstructing "absent" distinctly from
/// "empty".
pub fn decode_nullable_str(reader: &mut ByteReader<'_>) -> Result<Option<String>, CodecError> {
    if decode_flag(reader)? {
        decode_str(reader).map(Some)
    } else {
        Ok(None)
    }
}

/// Encode an optional dictionary: presence flag, pair count, then
/// (key, value) pairs with nullable values.
pub fn encode_nullable_map(buf: &mut Vec<u8>, map: Option<&LabelMap>) -> Result<(), CodecError> {
    encode_flag(buf, map.is_some());
    let Some(map) = map else {
        return Ok(());
    };
    encode_len(buf, map.len())?;
    for (key, value) in map {
        encode_nullable_str(buf, Some(key))?;
        encode_nullable_str(buf, value.as_deref())?;
    }
    Ok(())
}

/// Decode an optional dictionary. An absent key is malformed.
pub fn decode_nullable_map(reader: &mut ByteReader<'_>) -> Result<Option<LabelMap>, CodecError> {
    if !decode_flag(reader)? {
        return Ok(None);
    }
    let count = reader.read_u32_be()? as usize;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let offset = reader.position();
        let key = decode_nullable_str(reader)?.ok_or(CodecError::AbsentKey { offset })?;
        let value = decode_nullable_str(reader)?;
        map.insert(key, value);
    }
    Ok(Some(map))
}

/// Encode an optional nested record by delegating to its own codec.
pub fn encode_nullable<T: WireCodec>(buf: &mut Vec<u8>, value: Option<&T>) -> Result<(), CodecError> {
    encode_flag(buf, value.is_some());
    match value {
        Some(v) => v.encode(buf),
        None => Ok(()),
    }
}

/// Decode an optional nested record by delegating to its own codec.
pub fn decode_nullable<T: WireCodec>(reader: &mut ByteReader<'_>) -> Result<Option<T>, CodecError> {
    if decode_flag(reader)? {
        T::decode(reader).map(Some)
    } else {
        Ok(None)
    }
}

/// Encode an optional list: presence flag, element count, then each
/// element's own encoding.
pub fn encode_nullable_list<T: WireCodec>(
    buf: &mut Vec<u8>,
    values: Option<&[T]>,
) -> Result<(), CodecError> {
    encode_flag(buf, values.is_some());
    let Some(values) = values else {
        return Ok(());
    };
    encode_len(buf, values.len())?;
    for value in values {
        value.encode(buf)?;
    }
    Ok(())
}

/// Decode an optional list of nested records.
pub fn decode_nullable_list<T: WireCodec>(
    reader: &mut ByteReader<'_>,
) -> Result<Option<Vec<T>>, CodecError> {
    if !decode_flag(reader)? {
        return Ok(None);
    }
    let count = reader.read_u32_be()? as usize;
    // Sized lower bound per element keeps a corrupt count from
    // over-allocating before the stream runs dry.
    let mut values = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        values.push(T::decode(reader)?);
    }
    Ok(Some(values))
}

// ---------------------------------------------------------------------------
// Message codecs
// ---------------------------------------------------------------------------

impl WireCodec for Hl7v2Message {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_nullable_str(buf, self.name.as_deref())?;
        encode_nullable_str(buf, self.message_type.as_deref())?;
        encode_nullable_str(buf, self.create_time.as_deref())?;
        encode_nullable_str(buf, self.send_time.as_deref())?;
        encode_nullable_str(buf, self.data.as_deref())?;
        encode_nullable_str(buf, self.send_facility.as_deref())?;
        encode_nullable_map(buf, self.labels.as_ref())?;
        encode_nullable(buf, self.parsed_data.as_ref())?;
        encode_nullable_str(buf, self.schematized_data.as_deref())
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Hl7v2Message {
            name: decode_nullable_str(reader)?,
            message_type: decode_nullable_str(reader)?,
            create_time: decode_nullable_str(reader)?,
            send_time: decode_nullable_str(reader)?,
            data: decode_nullable_str(reader)?,
            send_facility: decode_nullable_str(reader)?,
            labels: decode_nullable_map(reader)?,
            parsed_data: decode_nullable(reader)?,
            schematized_data: decode_nullable_str(reader)?,
        })
    }
}

impl WireCodec for ParsedData {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_nullable_list(buf, self.segments.as_deref())
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(ParsedData {
            segments: decode_nullable_list(reader)?,
        })
    }
}

impl WireCodec for Segment {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_nullable_str(buf, self.segment_id.as_deref())?;
        encode_nullable_str(buf, self.set_id.as_deref())?;
        encode_nullable_map(buf, self.fields.as_ref())
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Segment {
            segment_id: decode_nullable_str(reader)?,
            set_id: decode_nullable_str(reader)?,
            fields: decode_nullable_map(reader)?,
        })
    }
}
