//! Structural view of BER/DER values.
//!
//! Decoding is done by `asn1-rs` (re-exported through `x509-parser`); this
//! module only arranges the decoded TLVs into a tree the probes can match
//! shapes against: tags, how many children a constructed value has, small
//! INTEGERs and OBJECT IDENTIFIERs. On top of the decoder it enforces the
//! whole-buffer policy: no trailing bytes, no declared length running past
//! the input, no nesting beyond [`MAX_DEPTH`].

use std::fmt;

use thiserror::Error;
use x509_parser::der_parser::asn1_rs::{self, Any, Class, FromBer, Header, Length, Oid, Tag};
use x509_parser::objects::{oid2sn, oid_registry};

/// Maximum nesting of constructed values
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsnError {
    #[error("input ends inside a value")]
    Truncated,

    #[error("malformed encoding: {0}")]
    Malformed(String),

    #[error("declared length {declared} exceeds the {available} bytes left")]
    LengthOverflow { declared: usize, available: usize },

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("{0} trailing bytes after the top-level value")]
    TrailingData(usize),
}

impl From<asn1_rs::Err<asn1_rs::Error>> for AsnError {
    fn from(err: asn1_rs::Err<asn1_rs::Error>) -> Self {
        match err {
            asn1_rs::Err::Incomplete(_) => AsnError::Truncated,
            asn1_rs::Err::Error(asn1_rs::Error::BerMaxDepth)
            | asn1_rs::Err::Failure(asn1_rs::Error::BerMaxDepth) => AsnError::TooDeep(MAX_DEPTH),
            asn1_rs::Err::Error(e) | asn1_rs::Err::Failure(e) => AsnError::Malformed(e.to_string()),
        }
    }
}

/// One decoded TLV, with its children when constructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnValue<'a> {
    any: Any<'a>,
    raw: &'a [u8],
    children: Vec<AsnValue<'a>>,
}

/// Parse exactly one value; any trailing byte is an error
pub fn parse(bytes: &[u8]) -> Result<AsnValue<'_>, AsnError> {
    let (value, rest) = parse_prefix(bytes)?;
    if !rest.is_empty() {
        return Err(AsnError::TrailingData(rest.len()));
    }
    Ok(value)
}

/// Parse one value from the front of `bytes`, returning the unread tail
pub fn parse_prefix(bytes: &[u8]) -> Result<(AsnValue<'_>, &[u8]), AsnError> {
    read_value(bytes, 0)
}

fn read_value(input: &[u8], depth: usize) -> Result<(AsnValue<'_>, &[u8]), AsnError> {
    if depth > MAX_DEPTH {
        return Err(AsnError::TooDeep(MAX_DEPTH));
    }

    let (after_header, header) = Header::from_ber(input)?;
    if header.class() == Class::Universal && header.tag() == Tag::EndOfContent {
        return Err(AsnError::Malformed("unexpected end-of-contents marker".to_string()));
    }
    if let Length::Definite(declared) = header.length() {
        if declared > after_header.len() {
            return Err(AsnError::LengthOverflow {
                declared,
                available: after_header.len(),
            });
        }
    }

    let (rest, content) = header.parse_ber_content(after_header)?;
    let children = if header.is_constructed() {
        read_children(content, depth + 1)?
    } else {
        Vec::new()
    };

    let value = AsnValue {
        any: Any::new(header, content),
        raw: &input[..input.len() - rest.len()],
        children,
    };
    Ok((value, rest))
}

/// Content of an indefinite-length value arrives without its end-of-contents
/// octets, so both length forms read the same way here
fn read_children(mut content: &[u8], depth: usize) -> Result<Vec<AsnValue<'_>>, AsnError> {
    let mut children = Vec::new();
    while !content.is_empty() {
        let (child, rest) = read_value(content, depth)?;
        children.push(child);
        content = rest;
    }
    Ok(children)
}

impl fmt::Display for AsnValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class() {
            Class::Universal => write!(f, "{}", self.tag()),
            class => write!(f, "[{} {}]", class, self.tag().0),
        }
    }
}

impl<'a> AsnValue<'a> {
    pub fn tag(&self) -> Tag {
        self.any.tag()
    }

    pub fn class(&self) -> Class {
        self.any.class()
    }

    pub fn is_constructed(&self) -> bool {
        self.any.header.is_constructed()
    }

    /// Complete encoding of this value, identifier and length included
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Content octets (without end-of-contents for the indefinite form)
    pub fn content(&self) -> &'a [u8] {
        self.any.data
    }

    /// Children of a constructed value, empty for primitives
    pub fn children(&self) -> &[AsnValue<'a>] {
        &self.children
    }

    pub fn is_universal(&self, tag: Tag) -> bool {
        self.class() == Class::Universal && self.tag() == tag
    }

    pub fn is_context(&self, number: u32) -> bool {
        self.class() == Class::ContextSpecific && self.tag().0 == number
    }

    pub fn is_sequence(&self) -> bool {
        self.is_constructed() && self.is_universal(Tag::Sequence)
    }

    pub fn is_set(&self) -> bool {
        self.is_constructed() && self.is_universal(Tag::Set)
    }

    pub fn is_integer(&self) -> bool {
        !self.is_constructed() && self.is_universal(Tag::Integer)
    }

    pub fn is_oid(&self) -> bool {
        !self.is_constructed() && self.is_universal(Tag::Oid)
    }

    /// Primitive or BER constructed OCTET STRING
    pub fn is_octet_string(&self) -> bool {
        self.is_universal(Tag::OctetString)
    }

    pub fn is_bit_string(&self) -> bool {
        self.is_universal(Tag::BitString)
    }

    pub fn is_null(&self) -> bool {
        !self.is_constructed() && self.is_universal(Tag::Null) && self.content().is_empty()
    }

    /// Small INTEGER value, `None` for non-integers, empty encodings and
    /// values wider than 64 bits
    pub fn as_i64(&self) -> Option<i64> {
        if !self.is_integer() || self.content().is_empty() {
            return None;
        }
        self.any.as_i64().ok()
    }

    pub fn integer_equals(&self, expected: i64) -> bool {
        self.as_i64() == Some(expected)
    }

    /// OBJECT IDENTIFIER value; a dangling continuation octet is not one
    pub fn oid(&self) -> Option<Oid<'a>> {
        if !self.is_oid() || self.content().last().map_or(true, |last| last & 0x80 != 0) {
            return None;
        }
        Oid::try_from(self.any.clone()).ok()
    }

    pub fn oid_is(&self, expected: &Oid<'_>) -> bool {
        self.oid().is_some_and(|oid| oid.as_bytes() == expected.as_bytes())
    }

    /// Dotted-decimal rendering of an OBJECT IDENTIFIER
    pub fn oid_string(&self) -> Option<String> {
        self.oid().map(|oid| oid.to_id_string())
    }

    /// Text of an IA5String
    pub fn as_ia5(&self) -> Option<String> {
        if !self.is_universal(Tag::Ia5String) {
            return None;
        }
        self.any.as_ia5string().ok().map(|s| s.string())
    }
}

/// `name (oid)` when the registry knows the algorithm, the bare OID otherwise
pub fn describe_algorithm(value: &AsnValue<'_>) -> String {
    match value.oid() {
        Some(oid) => match oid2sn(&oid, oid_registry()) {
            Ok(name) => format!("{name} ({})", oid.to_id_string()),
            Err(_) => oid.to_id_string(),
        },
        None => "unknown algorithm".to_string(),
    }
}
