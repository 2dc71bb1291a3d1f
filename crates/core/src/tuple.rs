//! Order-preserving tuple encoding for substrate keys.
//!
//! Typed tuples (strings, integers, UUIDs, position stamps) are packed
//! into byte keys such that byte-wise comparison of packed keys matches
//! element-wise comparison of the tuples, provided both tuples follow the
//! same schema. Every index subspace uses a fixed schema, so range scans
//! over packed keys come back in logical order.
//!
//! # Encoding
//!
//! Each element is a one-byte type tag followed by its body:
//!
//! | Element       | Tag  | Body                                         |
//! |---------------|------|----------------------------------------------|
//! | Bytes         | 0x01 | escaped bytes, 0x00 terminator               |
//! | Str           | 0x02 | escaped UTF-8, 0x00 terminator               |
//! | I64           | 0x10 | 8 bytes big-endian, sign bit flipped         |
//! | U64           | 0x11 | 8 bytes big-endian                           |
//! | Uuid          | 0x30 | 16 bytes                                     |
//! | Versionstamp  | 0x33 | 8 bytes commit (BE) + 4 bytes batch (BE)     |
//!
//! Byte/string bodies escape embedded 0x00 as 0x00 0xFF, which keeps
//! prefix ordering intact. No encoding starts with 0xFF, so a subspace
//! range can end at `prefix + 0xFF`.
//!
//! # Versionstamps
//!
//! A versionstamp element carries a [`Position`]. Keys built with
//! [`pack_versionstamped`] contain an incomplete stamp (commit bytes
//! zeroed) plus the byte offset of those commit bytes; the substrate
//! fills in the commit sequence when the transaction commits.

use crate::position::Position;
use thiserror::Error;
use uuid::Uuid;

const TAG_BYTES: u8 = 0x01;
const TAG_STR: u8 = 0x02;
const TAG_I64: u8 = 0x10;
const TAG_U64: u8 = 0x11;
const TAG_UUID: u8 = 0x30;
const TAG_STAMP: u8 = 0x33;

/// A single tuple element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Raw byte string.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    Str(String),
    /// Signed integer (order-preserving via sign-bit flip).
    I64(i64),
    /// Unsigned integer.
    U64(u64),
    /// UUID, stored as its 16 raw bytes.
    Uuid(Uuid),
    /// Commit position stamp.
    Versionstamp(Position),
}

impl Element {
    /// String value, if this element is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Element::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Unsigned integer value, if this element is a `U64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Element::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Signed integer value, if this element is an `I64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Element::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// UUID value, if this element is a `Uuid`.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Element::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Position value, if this element is a `Versionstamp`.
    pub fn as_position(&self) -> Option<Position> {
        match self {
            Element::Versionstamp(p) => Some(*p),
            _ => None,
        }
    }
}

/// Errors raised while decoding a packed tuple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleError {
    /// The packed bytes ended mid-element.
    #[error("packed tuple ended unexpectedly")]
    UnexpectedEnd,
    /// An unknown type tag was encountered.
    #[error("unknown tuple type tag 0x{0:02x}")]
    InvalidTag(u8),
    /// A string element contained invalid UTF-8.
    #[error("string element is not valid UTF-8")]
    InvalidUtf8,
    /// A key was unpacked against a subspace it does not belong to.
    #[error("key does not lie in the expected subspace")]
    OutsideSubspace,
}

/// A packed key containing one incomplete versionstamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionstampedKey {
    /// Packed key bytes with the stamp's commit field zeroed.
    pub bytes: Vec<u8>,
    /// Offset of the 8-byte commit field within `bytes`.
    pub offset: usize,
}

fn push_escaped(out: &mut Vec<u8>, body: &[u8]) {
    for &b in body {
        out.push(b);
        if b == 0x00 {
            out.push(0xFF);
        }
    }
    out.push(0x00);
}

fn pack_element(out: &mut Vec<u8>, element: &Element) {
    match element {
        Element::Bytes(b) => {
            out.push(TAG_BYTES);
            push_escaped(out, b);
        }
        Element::Str(s) => {
            out.push(TAG_STR);
            push_escaped(out, s.as_bytes());
        }
        Element::I64(v) => {
            out.push(TAG_I64);
            out.extend_from_slice(&((*v as u64) ^ (1u64 << 63)).to_be_bytes());
        }
        Element::U64(v) => {
            out.push(TAG_U64);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Element::Uuid(u) => {
            out.push(TAG_UUID);
            out.extend_from_slice(u.as_bytes());
        }
        Element::Versionstamp(p) => {
            out.push(TAG_STAMP);
            out.extend_from_slice(&p.to_bytes());
        }
    }
}

/// Pack a tuple into order-preserving bytes.
pub fn pack(elements: &[Element]) -> Vec<u8> {
    let mut out = Vec::with_capacity(elements.len() * 16);
    for element in elements {
        pack_element(&mut out, element);
    }
    out
}

/// Pack a tuple onto an existing prefix.
pub fn pack_onto(prefix: &[u8], elements: &[Element]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + elements.len() * 16);
    out.extend_from_slice(prefix);
    for element in elements {
        pack_element(&mut out, element);
    }
    out
}

/// Pack `prefix ++ before ++ <incomplete stamp with batch> ++ after`.
///
/// The stamp's commit bytes are zeroed; the returned offset points at
/// them so the substrate can substitute the commit sequence at commit
/// time. The batch component is fixed when the key is built.
pub fn pack_versionstamped(
    prefix: &[u8],
    before: &[Element],
    batch: u32,
    after: &[Element],
) -> VersionstampedKey {
    let mut bytes = Vec::with_capacity(prefix.len() + (before.len() + after.len() + 1) * 16);
    bytes.extend_from_slice(prefix);
    for element in before {
        pack_element(&mut bytes, element);
    }
    bytes.push(TAG_STAMP);
    let offset = bytes.len();
    bytes.extend_from_slice(&Position::new(0, batch).to_bytes());
    for element in after {
        pack_element(&mut bytes, element);
    }
    VersionstampedKey { bytes, offset }
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], TupleError> {
    if *pos + n > bytes.len() {
        return Err(TupleError::UnexpectedEnd);
    }
    let slice = &bytes[*pos..*pos + n];
    *pos += n;
    Ok(slice)
}

fn take_escaped(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>, TupleError> {
    let mut out = Vec::new();
    loop {
        if *pos >= bytes.len() {
            return Err(TupleError::UnexpectedEnd);
        }
        let b = bytes[*pos];
        *pos += 1;
        if b != 0x00 {
            out.push(b);
            continue;
        }
        // 0x00 0xFF is an escaped NUL; bare 0x00 terminates.
        if *pos < bytes.len() && bytes[*pos] == 0xFF {
            out.push(0x00);
            *pos += 1;
        } else {
            return Ok(out);
        }
    }
}

/// Decode a packed tuple back into elements.
pub fn unpack(bytes: &[u8]) -> Result<Vec<Element>, TupleError> {
    let mut elements = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let tag = bytes[pos];
        pos += 1;
        let element = match tag {
            TAG_BYTES => Element::Bytes(take_escaped(bytes, &mut pos)?),
            TAG_STR => {
                let body = take_escaped(bytes, &mut pos)?;
                Element::Str(String::from_utf8(body).map_err(|_| TupleError::InvalidUtf8)?)
            }
            TAG_I64 => {
                let body = take(bytes, &mut pos, 8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(body);
                Element::I64((u64::from_be_bytes(raw) ^ (1u64 << 63)) as i64)
            }
            TAG_U64 => {
                let body = take(bytes, &mut pos, 8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(body);
                Element::U64(u64::from_be_bytes(raw))
            }
            TAG_UUID => {
                let body = take(bytes, &mut pos, 16)?;
                let mut raw = [0u8; 16];
                raw.copy_from_slice(body);
                Element::Uuid(Uuid::from_bytes(raw))
            }
            TAG_STAMP => {
                let body = take(bytes, &mut pos, 12)?;
                let position = Position::from_bytes(body).ok_or(TupleError::UnexpectedEnd)?;
                Element::Versionstamp(position)
            }
            other => return Err(TupleError::InvalidTag(other)),
        };
        elements.push(element);
    }
    Ok(elements)
}
