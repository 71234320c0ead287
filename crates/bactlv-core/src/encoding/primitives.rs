use crate::encoding::dispatch::VariantParser;
use crate::encoding::fields::{read_count_array_field, read_simple_field, validate_field};
use crate::encoding::reader::ReadBuffer;
use crate::encoding::tag::TagHeader;
use crate::encoding::writer::WriteBuffer;
use crate::types::{BitString, CharacterEncoding, CharacterString, DataType, Date, ObjectId, Payload, Time};
use crate::{DecodeError, EncodeError};

/// Fewest octets holding `value` (at least one).
pub fn unsigned_len(value: u64) -> u32 {
    let bits = 64 - value.leading_zeros();
    bits.div_ceil(8).max(1)
}

/// Fewest octets holding `value` in two's complement (at least one).
pub fn signed_len(value: i64) -> u32 {
    (1..=8u32)
        .find(|len| {
            let bits = len * 8;
            bits == 64 || (-(1i64 << (bits - 1))..(1i64 << (bits - 1))).contains(&value)
        })
        .unwrap_or(8)
}

fn payload_len(r: &ReadBuffer<'_>, header: &TagHeader, min: u32, max: u32) -> Result<u32, DecodeError> {
    let len = header.actual_length();
    if len < min || len > max {
        return Err(DecodeError::parse(
            r.pos().byte_offset(),
            format!("payload length {len} outside {min}..={max}"),
        ));
    }
    Ok(len)
}

pub fn decode_unsigned(r: &mut ReadBuffer<'_>, len: u32) -> Result<u64, DecodeError> {
    if len == 0 || len > 8 {
        return Err(DecodeError::parse(
            r.pos().byte_offset(),
            format!("unsigned length {len} outside 1..=8"),
        ));
    }
    r.read_u64((len * 8) as u8)
}

pub fn decode_signed(r: &mut ReadBuffer<'_>, len: u32) -> Result<i64, DecodeError> {
    if len == 0 || len > 8 {
        return Err(DecodeError::parse(
            r.pos().byte_offset(),
            format!("signed length {len} outside 1..=8"),
        ));
    }
    r.read_i64((len * 8) as u8)
}

pub fn read_null(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    payload_len(r, header, 0, 0)?;
    Ok(Payload::Null)
}

/// Application booleans live in the header; context booleans take one octet.
pub fn read_boolean(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    if header.is_boolean() {
        validate_field(r, header.length_value_type() <= 1, "boolean value out of range")?;
        return Ok(Payload::Boolean(header.boolean_value()));
    }
    payload_len(r, header, 1, 1)?;
    let value = r.read_u8(8)?;
    validate_field(r, value <= 1, "boolean value out of range")?;
    Ok(Payload::Boolean(value == 1))
}

pub fn read_unsigned(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    decode_unsigned(r, header.actual_length()).map(Payload::Unsigned)
}

pub fn read_signed(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    decode_signed(r, header.actual_length()).map(Payload::Signed)
}

pub fn read_real(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    payload_len(r, header, 4, 4)?;
    Ok(Payload::Real(f32::from_bits(r.read_u32(32)?)))
}

pub fn read_double(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    payload_len(r, header, 8, 8)?;
    Ok(Payload::Double(f64::from_bits(r.read_u64(64)?)))
}

pub fn read_octet_string(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    r.read_bytes(header.actual_length() as usize).map(Payload::OctetString)
}

pub fn read_character_string(
    r: &mut ReadBuffer<'_>,
    header: &TagHeader,
) -> Result<Payload, DecodeError> {
    let len = payload_len(r, header, 1, u32::MAX)?;
    let encoding = read_simple_field(r, "encoding", |r| r.read_u8(8))?;
    let raw = read_simple_field(r, "value", |r| r.read_bytes(len as usize - 1))?;
    Ok(Payload::CharacterString(CharacterString::with_encoding(
        CharacterEncoding::from_u8(encoding),
        raw,
    )))
}

pub fn read_bit_string(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    let len = payload_len(r, header, 1, u32::MAX)? as usize;
    let unused_bits = read_simple_field(r, "unusedBits", |r| r.read_u8(8))?;
    validate_field(
        r,
        unused_bits <= 7 && (len > 1 || unused_bits == 0),
        format!("{unused_bits} unused bits in a {len}-octet bit string"),
    )?;
    let data_bits = (len - 1) * 8 - unused_bits as usize;
    let data = read_count_array_field(r, "data", data_bits, |r| r.read_bit())?;
    let unused = read_count_array_field(r, "unused", unused_bits as usize, |r| r.read_bit())?;
    Ok(Payload::BitString(BitString::from_wire(data, unused)))
}

pub fn read_enumerated(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    let len = payload_len(r, header, 1, 4)?;
    Ok(Payload::Enumerated(r.read_u32((len * 8) as u8)?))
}

fn read_octets(r: &mut ReadBuffer<'_>) -> Result<[u8; 4], DecodeError> {
    Ok([r.read_u8(8)?, r.read_u8(8)?, r.read_u8(8)?, r.read_u8(8)?])
}

pub fn read_date(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    payload_len(r, header, 4, 4)?;
    Ok(Payload::Date(Date::from_octets(read_octets(r)?)))
}

pub fn read_time(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    payload_len(r, header, 4, 4)?;
    Ok(Payload::Time(Time::from_octets(read_octets(r)?)))
}

pub fn read_object_identifier(
    r: &mut ReadBuffer<'_>,
    header: &TagHeader,
) -> Result<Payload, DecodeError> {
    payload_len(r, header, 4, 4)?;
    let object_type = read_simple_field(r, "objectType", |r| r.read_u16(10))?;
    let instance = read_simple_field(r, "instance", |r| r.read_u32(22))?;
    Ok(Payload::ObjectIdentifier(ObjectId::from_parts(object_type, instance)))
}

pub fn read_unknown(r: &mut ReadBuffer<'_>, header: &TagHeader) -> Result<Payload, DecodeError> {
    r.read_bytes(header.actual_length() as usize).map(Payload::Unknown)
}

impl DataType {
    /// The payload codec for this data type.
    pub fn parser(self) -> VariantParser<Payload, TagHeader> {
        match self {
            Self::Null => read_null,
            Self::Boolean => read_boolean,
            Self::Unsigned => read_unsigned,
            Self::Signed => read_signed,
            Self::Real => read_real,
            Self::Double => read_double,
            Self::OctetString => read_octet_string,
            Self::CharacterString => read_character_string,
            Self::BitString => read_bit_string,
            Self::Enumerated => read_enumerated,
            Self::Date => read_date,
            Self::Time => read_time,
            Self::ObjectIdentifier => read_object_identifier,
            Self::Unknown => read_unknown,
        }
    }
}

fn expect_len(actual: u32, expected: u32) -> Result<(), EncodeError> {
    if actual != expected {
        return Err(EncodeError::invalid(format!(
            "header length {actual} does not match payload length {expected}"
        )));
    }
    Ok(())
}

fn expect_range(actual: u32, max: u32) -> Result<(), EncodeError> {
    if actual == 0 || actual > max {
        return Err(EncodeError::invalid(format!(
            "header length {actual} outside 1..={max}"
        )));
    }
    Ok(())
}

/// Writes `payload` in the width announced by `header`.
///
/// Integers are written in exactly `header.actual_length()` octets, so a
/// value that was read with leading zero octets is written back the same way.
pub fn encode_payload(
    w: &mut dyn WriteBuffer,
    payload: &Payload,
    header: &TagHeader,
) -> Result<(), EncodeError> {
    let len = header.actual_length();
    match payload {
        Payload::Null => expect_len(len, 0),
        Payload::Boolean(value) if header.is_boolean() => {
            if header.boolean_value() != *value {
                return Err(EncodeError::invalid("boolean header disagrees with value"));
            }
            Ok(())
        }
        Payload::Boolean(value) => {
            expect_len(len, 1)?;
            w.write_u8("value", u8::from(*value))
        }
        Payload::Unsigned(value) => {
            expect_range(len, 8)?;
            w.write_unsigned("value", (len * 8) as u8, *value)
        }
        Payload::Signed(value) => {
            expect_range(len, 8)?;
            w.write_signed("value", (len * 8) as u8, *value)
        }
        Payload::Real(value) => {
            expect_len(len, 4)?;
            w.write_be_u32("value", value.to_bits())
        }
        Payload::Double(value) => {
            expect_len(len, 8)?;
            w.write_unsigned("value", 64, value.to_bits())
        }
        Payload::OctetString(bytes) | Payload::Unknown(bytes) => {
            expect_len(len, bytes.len() as u32)?;
            w.write_bytes("value", bytes)
        }
        Payload::CharacterString(s) => {
            expect_len(len, s.encoded_len())?;
            w.write_u8("encoding", s.encoding().to_u8())?;
            w.write_bytes("value", s.raw())
        }
        Payload::BitString(bits) => {
            expect_len(len, bits.encoded_len())?;
            w.write_u8("unusedBits", bits.unused_bits())?;
            w.push_context("data")?;
            for bit in bits.data() {
                w.write_bit("bit", *bit)?;
            }
            w.pop_context("data")?;
            w.push_context("unused")?;
            for bit in bits.unused() {
                w.write_bit("bit", *bit)?;
            }
            w.pop_context("unused")
        }
        Payload::Enumerated(value) => {
            expect_range(len, 4)?;
            w.write_unsigned("value", (len * 8) as u8, u64::from(*value))
        }
        Payload::Date(date) => {
            expect_len(len, 4)?;
            let [year, month, day, weekday] = date.to_octets();
            w.write_u8("year", year)?;
            w.write_u8("month", month)?;
            w.write_u8("day", day)?;
            w.write_u8("dayOfWeek", weekday)
        }
        Payload::Time(time) => {
            expect_len(len, 4)?;
            let [hour, minute, second, hundredths] = time.to_octets();
            w.write_u8("hour", hour)?;
            w.write_u8("minute", minute)?;
            w.write_u8("second", second)?;
            w.write_u8("fractional", hundredths)
        }
        Payload::ObjectIdentifier(id) => {
            expect_len(len, 4)?;
            w.write_unsigned("objectType", 10, u64::from(id.type_code()))?;
            w.write_unsigned("instance", 22, u64::from(id.instance()))
        }
    }
}
