//! Constructed-data consumers.
//!
//! These are written the way generated property decoders are: a bracketed
//! envelope whose body is picked from a static dispatch table keyed on the
//! object type and property identifier supplied by the enclosing message.

pub mod element;
pub mod log_data;
pub mod property_value;

pub use element::ConstructedElement;
pub use log_data::{ErrorRecord, LogData, LogDataValue, LogRecordDatum};
pub use property_value::PropertyValue;

use crate::encoding::context_tag::{ClosingTag, OpeningTag};
use crate::encoding::decode_from_slice;
use crate::encoding::dispatch::{DispatchKey, DispatchTable, VariantParser};
use crate::encoding::fields::{
    read_optional_field, read_simple_field, read_terminated_array_field, read_virtual_field,
    validate_field, write_array_field, write_optional_field, write_simple_field,
    write_virtual_field,
};
use crate::encoding::reader::ReadBuffer;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::types::{
    ApplicationTag, BitString, CharacterString, DataType, ObjectId, ObjectType, Payload,
    PropertyId,
};
use crate::{DecodeError, EncodeError};

/// Arguments threaded in from the message that carries the constructed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseArgs {
    /// Number of the opening/closing tag pair around the value.
    pub tag_number: u8,
    pub object_type: ObjectType,
    pub property_identifier: PropertyId,
    pub array_index: Option<u32>,
}

impl ParseArgs {
    pub const fn new(tag_number: u8, object_type: ObjectType, property_identifier: PropertyId) -> Self {
        Self {
            tag_number,
            object_type,
            property_identifier,
            array_index: None,
        }
    }

    pub const fn with_array_index(mut self, array_index: u32) -> Self {
        self.array_index = Some(array_index);
        self
    }
}

/// Dispatch key for constructed values.
///
/// A key naming an object type widens to the same property on any object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyKey {
    pub object_type: Option<ObjectType>,
    pub property: PropertyId,
}

impl PropertyKey {
    pub const fn any(property: PropertyId) -> Self {
        Self {
            object_type: None,
            property,
        }
    }

    pub const fn of(object_type: ObjectType, property: PropertyId) -> Self {
        Self {
            object_type: Some(object_type),
            property,
        }
    }
}

impl DispatchKey for PropertyKey {
    fn raw(&self) -> u64 {
        u64::from(self.property.to_u32())
    }

    fn widen(&self) -> Option<Self> {
        self.object_type.map(|_| Self::any(self.property))
    }
}

/// The body of a [`ConstructedData`] envelope.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstructedValue {
    ObjectName(ApplicationTag),
    StatusFlags(ApplicationTag),
    /// Present value of an analog object (REAL).
    AnalogPresentValue(ApplicationTag),
    /// Present value of a binary object (ENUMERATED).
    BinaryPresentValue(ApplicationTag),
    /// Present value of any other object type.
    PresentValue(ApplicationTag),
    ObjectList {
        /// Present only when array index 0 was requested.
        number_of_data_elements: Option<ApplicationTag>,
        object_ids: Vec<ApplicationTag>,
    },
    /// Any property without a dedicated decoder.
    Unspecified(Vec<ConstructedElement>),
}

fn read_typed(r: &mut ReadBuffer<'_>, expected: DataType) -> Result<ApplicationTag, DecodeError> {
    let start = r.pos().byte_offset();
    let tag = ApplicationTag::decode(r)?;
    if tag.data_type() != expected {
        return Err(DecodeError::parse(
            start,
            format!("expected {expected:?}, found {:?}", tag.data_type()),
        ));
    }
    Ok(tag)
}

fn read_object_name(r: &mut ReadBuffer<'_>, _: &ParseArgs) -> Result<ConstructedValue, DecodeError> {
    let tag = read_simple_field(r, "objectName", |r| read_typed(r, DataType::CharacterString))?;
    Ok(ConstructedValue::ObjectName(tag))
}

fn read_status_flags(r: &mut ReadBuffer<'_>, _: &ParseArgs) -> Result<ConstructedValue, DecodeError> {
    let tag = read_simple_field(r, "statusFlags", |r| read_typed(r, DataType::BitString))?;
    let flags = tag.payload().as_bit_string().map_or(0, BitString::len);
    validate_field(r, flags == 4, format!("status flags carry {flags} bits, not 4"))?;
    Ok(ConstructedValue::StatusFlags(tag))
}

fn read_analog_present_value(
    r: &mut ReadBuffer<'_>,
    _: &ParseArgs,
) -> Result<ConstructedValue, DecodeError> {
    let tag = read_simple_field(r, "presentValue", |r| read_typed(r, DataType::Real))?;
    Ok(ConstructedValue::AnalogPresentValue(tag))
}

fn read_binary_present_value(
    r: &mut ReadBuffer<'_>,
    _: &ParseArgs,
) -> Result<ConstructedValue, DecodeError> {
    let tag = read_simple_field(r, "presentValue", |r| read_typed(r, DataType::Enumerated))?;
    Ok(ConstructedValue::BinaryPresentValue(tag))
}

fn read_present_value(r: &mut ReadBuffer<'_>, _: &ParseArgs) -> Result<ConstructedValue, DecodeError> {
    let tag = read_simple_field(r, "presentValue", ApplicationTag::decode)?;
    Ok(ConstructedValue::PresentValue(tag))
}

fn read_object_list(r: &mut ReadBuffer<'_>, args: &ParseArgs) -> Result<ConstructedValue, DecodeError> {
    let number_of_data_elements = read_optional_field(
        r,
        "numberOfDataElements",
        args.array_index == Some(0),
        |r| read_typed(r, DataType::Unsigned),
    )?;
    let object_ids = read_terminated_array_field(r, "data", args.tag_number, |r| {
        read_typed(r, DataType::ObjectIdentifier)
    })?;
    Ok(ConstructedValue::ObjectList {
        number_of_data_elements,
        object_ids,
    })
}

fn read_unspecified(r: &mut ReadBuffer<'_>, args: &ParseArgs) -> Result<ConstructedValue, DecodeError> {
    let elements = read_terminated_array_field(r, "data", args.tag_number, ConstructedElement::decode)?;
    Ok(ConstructedValue::Unspecified(elements))
}

static CONSTRUCTED_VARIANTS: [(PropertyKey, VariantParser<ConstructedValue, ParseArgs>); 10] = [
    (PropertyKey::any(PropertyId::ObjectName), read_object_name),
    (PropertyKey::any(PropertyId::StatusFlags), read_status_flags),
    (PropertyKey::any(PropertyId::ObjectList), read_object_list),
    (PropertyKey::of(ObjectType::AnalogInput, PropertyId::PresentValue), read_analog_present_value),
    (PropertyKey::of(ObjectType::AnalogOutput, PropertyId::PresentValue), read_analog_present_value),
    (PropertyKey::of(ObjectType::AnalogValue, PropertyId::PresentValue), read_analog_present_value),
    (PropertyKey::of(ObjectType::BinaryInput, PropertyId::PresentValue), read_binary_present_value),
    (PropertyKey::of(ObjectType::BinaryOutput, PropertyId::PresentValue), read_binary_present_value),
    (PropertyKey::of(ObjectType::BinaryValue, PropertyId::PresentValue), read_binary_present_value),
    (PropertyKey::any(PropertyId::PresentValue), read_present_value),
];

static CONSTRUCTED_DATA: DispatchTable<PropertyKey, ConstructedValue, ParseArgs> =
    DispatchTable::new("ConstructedValue", &CONSTRUCTED_VARIANTS).with_otherwise(read_unspecified);

impl ConstructedValue {
    pub fn object_name(name: &str) -> Self {
        Self::ObjectName(ApplicationTag::character_string(CharacterString::new(name)))
    }

    pub fn status_flags(in_alarm: bool, fault: bool, overridden: bool, out_of_service: bool) -> Self {
        Self::StatusFlags(ApplicationTag::bit_string(BitString::new(vec![
            in_alarm,
            fault,
            overridden,
            out_of_service,
        ])))
    }

    pub fn analog_present_value(value: f32) -> Self {
        Self::AnalogPresentValue(ApplicationTag::real(value))
    }

    pub fn binary_present_value(value: u32) -> Self {
        Self::BinaryPresentValue(ApplicationTag::enumerated(value))
    }

    pub fn object_list(count: Option<u64>, object_ids: &[ObjectId]) -> Self {
        Self::ObjectList {
            number_of_data_elements: count.map(ApplicationTag::unsigned),
            object_ids: object_ids
                .iter()
                .copied()
                .map(ApplicationTag::object_identifier)
                .collect(),
        }
    }

    /// The single primitive payload, for variants that carry one.
    pub fn actual_value(&self) -> Option<&Payload> {
        match self {
            Self::ObjectName(tag)
            | Self::StatusFlags(tag)
            | Self::AnalogPresentValue(tag)
            | Self::BinaryPresentValue(tag)
            | Self::PresentValue(tag) => Some(tag.payload()),
            Self::ObjectList { .. } | Self::Unspecified(_) => None,
        }
    }

    /// Object identifiers of an object list, empty for other variants.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        match self {
            Self::ObjectList { object_ids, .. } => object_ids
                .iter()
                .filter_map(|tag| tag.payload().as_object_identifier())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::ObjectName(_) => "ObjectName",
            Self::StatusFlags(_) => "StatusFlags",
            Self::AnalogPresentValue(_) => "AnalogPresentValue",
            Self::BinaryPresentValue(_) => "BinaryPresentValue",
            Self::PresentValue(_) => "PresentValue",
            Self::ObjectList { .. } => "ObjectList",
            Self::Unspecified(_) => "Unspecified",
        }
    }
}

impl Encode for ConstructedValue {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        let name = self.variant_name();
        w.push_context(name)?;
        match self {
            Self::ObjectName(tag) => write_simple_field(w, "objectName", tag)?,
            Self::StatusFlags(tag) => write_simple_field(w, "statusFlags", tag)?,
            Self::AnalogPresentValue(tag)
            | Self::BinaryPresentValue(tag)
            | Self::PresentValue(tag) => {
                write_simple_field(w, "presentValue", tag)?;
                write_virtual_field(w, "actualValue", tag.payload())?;
            }
            Self::ObjectList {
                number_of_data_elements,
                object_ids,
            } => {
                write_optional_field(w, "numberOfDataElements", number_of_data_elements.as_ref())?;
                write_array_field(w, "data", object_ids)?;
            }
            Self::Unspecified(elements) => write_array_field(w, "data", elements)?,
        }
        w.pop_context(name)
    }
}

/// A property value bracketed by an opening and closing tag pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstructedData {
    opening_tag: OpeningTag,
    value: ConstructedValue,
    closing_tag: ClosingTag,
}

impl ConstructedData {
    pub fn new(tag_number: u8, value: ConstructedValue) -> Self {
        Self {
            opening_tag: OpeningTag::new(tag_number),
            value,
            closing_tag: ClosingTag::new(tag_number),
        }
    }

    /// Decodes the envelope, choosing the body from the object type and
    /// property in `args`.
    pub fn decode(r: &mut ReadBuffer<'_>, args: &ParseArgs) -> Result<Self, DecodeError> {
        read_simple_field(r, "ConstructedData", |r| {
            let opening_tag =
                read_simple_field(r, "openingTag", |r| OpeningTag::decode(r, args.tag_number))?;
            let key = PropertyKey::of(args.object_type, args.property_identifier);
            let value = CONSTRUCTED_DATA.dispatch(r, key, args)?;
            let closing_tag =
                read_simple_field(r, "closingTag", |r| ClosingTag::decode(r, args.tag_number))?;
            Ok(Self {
                opening_tag,
                value,
                closing_tag,
            })
        })
    }

    /// Decodes a value that must span all of `bytes`.
    pub fn parse(bytes: &[u8], args: &ParseArgs) -> Result<Self, DecodeError> {
        decode_from_slice(bytes, |r| Self::decode(r, args))
    }

    pub fn tag_number(&self) -> u8 {
        read_virtual_field("peekedTagNumber", self.opening_tag.tag_number())
    }

    pub const fn value(&self) -> &ConstructedValue {
        &self.value
    }

    pub fn into_value(self) -> ConstructedValue {
        self.value
    }
}

impl Encode for ConstructedData {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("ConstructedData")?;
        write_simple_field(w, "openingTag", &self.opening_tag)?;
        write_virtual_field(w, "peekedTagNumber", &self.opening_tag.tag_number())?;
        self.value.encode(w)?;
        write_simple_field(w, "closingTag", &self.closing_tag)?;
        w.pop_context("ConstructedData")
    }
}
