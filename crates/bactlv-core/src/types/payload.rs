use crate::encoding::primitives::{signed_len, unsigned_len};
use crate::types::{BitString, CharacterString, Date, ObjectId, Time};
use std::fmt;

/// Selects the payload codec for a tagged value.
///
/// For application tags the data type is implied by the tag number; context
/// tags need it supplied by the enclosing structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    Null,
    Boolean,
    Unsigned,
    Signed,
    Real,
    Double,
    OctetString,
    CharacterString,
    BitString,
    Enumerated,
    Date,
    Time,
    ObjectIdentifier,
    /// Raw octets, used when the shape is not known.
    Unknown,
}

impl DataType {
    pub const fn from_tag_number(tag_number: u8) -> Option<Self> {
        Some(match tag_number {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::Unsigned,
            3 => Self::Signed,
            4 => Self::Real,
            5 => Self::Double,
            6 => Self::OctetString,
            7 => Self::CharacterString,
            8 => Self::BitString,
            9 => Self::Enumerated,
            10 => Self::Date,
            11 => Self::Time,
            12 => Self::ObjectIdentifier,
            _ => return None,
        })
    }

    /// Application tag number, `None` for [`DataType::Unknown`].
    pub const fn tag_number(self) -> Option<u8> {
        match self {
            Self::Null => Some(0),
            Self::Boolean => Some(1),
            Self::Unsigned => Some(2),
            Self::Signed => Some(3),
            Self::Real => Some(4),
            Self::Double => Some(5),
            Self::OctetString => Some(6),
            Self::CharacterString => Some(7),
            Self::BitString => Some(8),
            Self::Enumerated => Some(9),
            Self::Date => Some(10),
            Self::Time => Some(11),
            Self::ObjectIdentifier => Some(12),
            Self::Unknown => None,
        }
    }
}

/// A decoded primitive value, owned by the caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    Null,
    Boolean(bool),
    Unsigned(u64),
    Signed(i64),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(CharacterString),
    BitString(BitString),
    Enumerated(u32),
    Date(Date),
    Time(Time),
    ObjectIdentifier(ObjectId),
    Unknown(Vec<u8>),
}

impl Payload {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Unsigned(_) => DataType::Unsigned,
            Self::Signed(_) => DataType::Signed,
            Self::Real(_) => DataType::Real,
            Self::Double(_) => DataType::Double,
            Self::OctetString(_) => DataType::OctetString,
            Self::CharacterString(_) => DataType::CharacterString,
            Self::BitString(_) => DataType::BitString,
            Self::Enumerated(_) => DataType::Enumerated,
            Self::Date(_) => DataType::Date,
            Self::Time(_) => DataType::Time,
            Self::ObjectIdentifier(_) => DataType::ObjectIdentifier,
            Self::Unknown(_) => DataType::Unknown,
        }
    }

    /// Shortest payload length in octets.
    ///
    /// Booleans count one octet, as they do in context-tagged form; an
    /// application boolean header overrides this with zero.
    pub fn canonical_len(&self) -> u32 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Unsigned(v) => unsigned_len(*v),
            Self::Signed(v) => signed_len(*v),
            Self::Real(_) | Self::Date(_) | Self::Time(_) | Self::ObjectIdentifier(_) => 4,
            Self::Double(_) => 8,
            Self::OctetString(b) | Self::Unknown(b) => b.len() as u32,
            Self::CharacterString(s) => s.encoded_len(),
            Self::BitString(b) => b.encoded_len(),
            Self::Enumerated(v) => unsigned_len(u64::from(*v)),
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Self::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_signed(&self) -> Option<i64> {
        match self {
            Self::Signed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f32> {
        match self {
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enumerated(&self) -> Option<u32> {
        match self {
            Self::Enumerated(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_character_string(&self) -> Option<&CharacterString> {
        match self {
            Self::CharacterString(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bit_string(&self) -> Option<&BitString> {
        match self {
            Self::BitString(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_identifier(&self) -> Option<ObjectId> {
        match self {
            Self::ObjectIdentifier(v) => Some(*v),
            _ => None,
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::OctetString(b) | Self::Unknown(b) => write_hex(f, b),
            Self::CharacterString(s) => write!(f, "{:?}", s.text()),
            Self::BitString(b) => write!(f, "{b}"),
            Self::Enumerated(v) => write!(f, "enum {v}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::ObjectIdentifier(id) => write!(f, "({id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataType, Payload};
    use crate::types::{CharacterString, ObjectId, ObjectType};

    #[test]
    fn data_types_follow_application_tag_numbers() {
        for n in 0u8..=12 {
            let dt = DataType::from_tag_number(n).unwrap();
            assert_eq!(dt.tag_number(), Some(n));
        }
        assert_eq!(DataType::from_tag_number(13), None);
        assert_eq!(DataType::Unknown.tag_number(), None);
    }

    #[test]
    fn canonical_lengths() {
        assert_eq!(Payload::Unsigned(0).canonical_len(), 1);
        assert_eq!(Payload::Unsigned(256).canonical_len(), 2);
        assert_eq!(Payload::Signed(-129).canonical_len(), 2);
        assert_eq!(Payload::Enumerated(70_000).canonical_len(), 3);
        assert_eq!(
            Payload::CharacterString(CharacterString::new("hi")).canonical_len(),
            3
        );
    }

    #[test]
    fn display() {
        assert_eq!(Payload::Real(72.5).to_string(), "72.5");
        assert_eq!(
            Payload::CharacterString(CharacterString::new("hello")).to_string(),
            "\"hello\""
        );
        assert_eq!(
            Payload::ObjectIdentifier(ObjectId::new(ObjectType::Device, 1)).to_string(),
            "(device,1)"
        );
        assert_eq!(Payload::OctetString(vec![0xAB, 0x01]).to_string(), "ab01");
    }
}
