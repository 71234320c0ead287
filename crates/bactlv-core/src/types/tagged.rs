use crate::encoding::dispatch::{DispatchTable, VariantParser};
use crate::encoding::fields::read_simple_field;
use crate::encoding::primitives::{
    encode_payload, read_bit_string, read_boolean, read_character_string, read_date, read_double,
    read_enumerated, read_null, read_object_identifier, read_octet_string, read_real, read_signed,
    read_time, read_unsigned,
};
use crate::encoding::reader::ReadBuffer;
use crate::encoding::tag::TagHeader;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::types::{BitString, CharacterString, DataType, Date, ObjectId, Payload, Time};
use crate::{DecodeError, EncodeError};
use std::fmt;

static APPLICATION_PAYLOAD_VARIANTS: [(u8, VariantParser<Payload, TagHeader>); 13] = [
    (0, read_null),
    (1, read_boolean),
    (2, read_unsigned),
    (3, read_signed),
    (4, read_real),
    (5, read_double),
    (6, read_octet_string),
    (7, read_character_string),
    (8, read_bit_string),
    (9, read_enumerated),
    (10, read_date),
    (11, read_time),
    (12, read_object_identifier),
];

static APPLICATION_PAYLOADS: DispatchTable<u8, Payload, TagHeader> =
    DispatchTable::new("ApplicationTag", &APPLICATION_PAYLOAD_VARIANTS);

fn write_payload(
    w: &mut dyn WriteBuffer,
    payload: &Payload,
    header: &TagHeader,
) -> Result<(), EncodeError> {
    w.push_context("payload")?;
    encode_payload(w, payload, header).map_err(|e| e.in_field("payload"))?;
    w.pop_context("payload")
}

/// An application-tagged primitive value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApplicationTag {
    header: TagHeader,
    payload: Payload,
}

impl ApplicationTag {
    /// Decodes one application value, choosing the codec from the tag number.
    ///
    /// A context-class header is a parse error. Tag numbers with no
    /// application meaning are an unknown variant and consume nothing.
    pub fn decode(r: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
        let peeked = TagHeader::peek(r)?;
        if !peeked.is_application() {
            return Err(DecodeError::parse(
                r.pos().byte_offset(),
                format!(
                    "expected an application tag, found context tag {}",
                    peeked.actual_tag_number()
                ),
            ));
        }
        let parser = APPLICATION_PAYLOADS.resolve(r, peeked.actual_tag_number())?;
        let header = read_simple_field(r, "header", TagHeader::decode)?;
        let payload = read_simple_field(r, "payload", |r| parser(r, &header))?;
        Ok(Self { header, payload })
    }

    /// Wraps `payload` with its canonical header. `None` for
    /// [`Payload::Unknown`], which has no application tag.
    pub fn from_payload(payload: Payload) -> Option<Self> {
        let tag_number = payload.data_type().tag_number()?;
        let header = match payload {
            Payload::Boolean(v) => TagHeader::boolean(v),
            _ => TagHeader::application(tag_number, payload.canonical_len()),
        };
        Some(Self { header, payload })
    }

    fn canonical(payload: Payload) -> Self {
        let tag_number = payload.data_type().tag_number().unwrap_or_default();
        Self {
            header: TagHeader::application(tag_number, payload.canonical_len()),
            payload,
        }
    }

    pub fn null() -> Self {
        Self::canonical(Payload::Null)
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            header: TagHeader::boolean(value),
            payload: Payload::Boolean(value),
        }
    }

    pub fn unsigned(value: u64) -> Self {
        Self::canonical(Payload::Unsigned(value))
    }

    pub fn signed(value: i64) -> Self {
        Self::canonical(Payload::Signed(value))
    }

    pub fn real(value: f32) -> Self {
        Self::canonical(Payload::Real(value))
    }

    pub fn double(value: f64) -> Self {
        Self::canonical(Payload::Double(value))
    }

    pub fn octet_string(value: Vec<u8>) -> Self {
        Self::canonical(Payload::OctetString(value))
    }

    pub fn character_string(value: impl Into<CharacterString>) -> Self {
        Self::canonical(Payload::CharacterString(value.into()))
    }

    pub fn bit_string(value: BitString) -> Self {
        Self::canonical(Payload::BitString(value))
    }

    pub fn enumerated(value: u32) -> Self {
        Self::canonical(Payload::Enumerated(value))
    }

    pub fn date(value: Date) -> Self {
        Self::canonical(Payload::Date(value))
    }

    pub fn time(value: Time) -> Self {
        Self::canonical(Payload::Time(value))
    }

    pub fn object_identifier(value: ObjectId) -> Self {
        Self::canonical(Payload::ObjectIdentifier(value))
    }

    pub const fn header(&self) -> &TagHeader {
        &self.header
    }

    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn data_type(&self) -> DataType {
        self.payload.data_type()
    }
}

impl Encode for ApplicationTag {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("ApplicationTag")?;
        self.header.encode(w).map_err(|e| e.in_field("header"))?;
        write_payload(w, &self.payload, &self.header)?;
        w.pop_context("ApplicationTag")
    }
}

impl fmt::Display for ApplicationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.payload, f)
    }
}

/// A context-tagged primitive value.
///
/// The wire does not say what a context tag holds, so decoding needs the data
/// type from the enclosing structure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextTag {
    header: TagHeader,
    payload: Payload,
}

impl ContextTag {
    /// Decodes context tag `tag_number` holding a `data_type` payload.
    ///
    /// A header of the wrong class, a bracket marker, or a different tag
    /// number is a parse error, so optional context fields roll back cleanly.
    pub fn decode(
        r: &mut ReadBuffer<'_>,
        tag_number: u8,
        data_type: DataType,
    ) -> Result<Self, DecodeError> {
        let start = r.pos().byte_offset();
        let header = read_simple_field(r, "header", TagHeader::decode)?;
        if !header.is_context() || header.is_opening_tag() || header.is_closing_tag() {
            return Err(DecodeError::parse(
                start,
                format!("expected context tag {tag_number}, found {header:?}"),
            ));
        }
        if header.actual_tag_number() != tag_number {
            return Err(DecodeError::parse(
                start,
                format!(
                    "expected context tag {tag_number}, found {}",
                    header.actual_tag_number()
                ),
            ));
        }
        let payload = read_simple_field(r, "payload", |r| data_type.parser()(r, &header))?;
        Ok(Self { header, payload })
    }

    /// Wraps `payload` in context tag `tag_number` with the shortest header.
    pub fn new(tag_number: u8, payload: Payload) -> Self {
        Self {
            header: TagHeader::context(tag_number, payload.canonical_len()),
            payload,
        }
    }

    pub const fn header(&self) -> &TagHeader {
        &self.header
    }

    pub const fn tag_number(&self) -> u8 {
        self.header.actual_tag_number()
    }

    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

impl Encode for ContextTag {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("ContextTag")?;
        self.header.encode(w).map_err(|e| e.in_field("header"))?;
        write_payload(w, &self.payload, &self.header)?;
        w.pop_context("ContextTag")
    }
}

impl fmt::Display for ContextTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.tag_number(), self.payload)
    }
}
