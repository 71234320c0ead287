use crate::constructed::{ConstructedData, ConstructedValue, ParseArgs};
use crate::encoding::decode_from_slice;
use crate::encoding::fields::{
    read_optional_field, read_simple_field, write_optional_field, write_simple_field,
    write_virtual_field,
};
use crate::encoding::reader::ReadBuffer;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::types::{ContextTag, DataType, ObjectType, Payload, PropertyId};
use crate::{DecodeError, EncodeError};

/// Tag number of the constructed value inside a property value.
const VALUE_TAG: u8 = 2;

/// A property identifier, optional array index, value and optional priority,
/// as carried in write-property-multiple style lists.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyValue {
    property_identifier: ContextTag,
    property_array_index: Option<ContextTag>,
    property_value: ConstructedData,
    priority: Option<ContextTag>,
}

impl PropertyValue {
    pub fn new(
        property: PropertyId,
        array_index: Option<u32>,
        value: ConstructedValue,
        priority: Option<u8>,
    ) -> Self {
        Self {
            property_identifier: ContextTag::new(0, Payload::Enumerated(property.to_u32())),
            property_array_index: array_index
                .map(|i| ContextTag::new(1, Payload::Unsigned(u64::from(i)))),
            property_value: ConstructedData::new(VALUE_TAG, value),
            priority: priority.map(|p| ContextTag::new(3, Payload::Unsigned(u64::from(p)))),
        }
    }

    /// Decodes a property value of an `object_type` object. The value body is
    /// chosen from the decoded property identifier and array index.
    pub fn decode(r: &mut ReadBuffer<'_>, object_type: ObjectType) -> Result<Self, DecodeError> {
        read_simple_field(r, "PropertyValue", |r| {
            let property_identifier = read_simple_field(r, "propertyIdentifier", |r| {
                ContextTag::decode(r, 0, DataType::Enumerated)
            })?;
            let index_offset = r.pos().byte_offset();
            let property_array_index = read_optional_field(r, "propertyArrayIndex", true, |r| {
                ContextTag::decode(r, 1, DataType::Unsigned)
            })?;
            let array_index = property_array_index
                .as_ref()
                .map(|tag| {
                    unsigned(tag).ok_or_else(|| {
                        DecodeError::parse(index_offset, "array index does not fit in 32 bits")
                            .in_field("propertyArrayIndex")
                    })
                })
                .transpose()?;
            let mut args = ParseArgs::new(
                VALUE_TAG,
                object_type,
                PropertyId::from_u32(enumerated(&property_identifier)),
            );
            args.array_index = array_index;
            let property_value = read_simple_field(r, "propertyValue", |r| {
                ConstructedData::decode(r, &args)
            })?;
            let priority_offset = r.pos().byte_offset();
            let priority = read_optional_field(r, "priority", true, |r| {
                ContextTag::decode(r, 3, DataType::Unsigned)
            })?;
            if priority.as_ref().is_some_and(|tag| small(tag).is_none()) {
                return Err(DecodeError::parse(priority_offset, "priority does not fit in 8 bits")
                    .in_field("priority"));
            }
            Ok(Self {
                property_identifier,
                property_array_index,
                property_value,
                priority,
            })
        })
    }

    pub fn parse(bytes: &[u8], object_type: ObjectType) -> Result<Self, DecodeError> {
        decode_from_slice(bytes, |r| Self::decode(r, object_type))
    }

    pub fn property_identifier(&self) -> PropertyId {
        PropertyId::from_u32(enumerated(&self.property_identifier))
    }

    /// `None` when absent, or when a constructed index exceeds 32 bits.
    pub fn array_index(&self) -> Option<u32> {
        self.property_array_index.as_ref().and_then(unsigned)
    }

    pub fn value(&self) -> &ConstructedValue {
        self.property_value.value()
    }

    pub const fn property_value(&self) -> &ConstructedData {
        &self.property_value
    }

    pub fn priority(&self) -> Option<u8> {
        self.priority.as_ref().and_then(small)
    }
}

fn enumerated(tag: &ContextTag) -> u32 {
    tag.payload().as_enumerated().unwrap_or_default()
}

fn unsigned(tag: &ContextTag) -> Option<u32> {
    tag.payload()
        .as_unsigned()
        .and_then(|v| u32::try_from(v).ok())
}

fn small(tag: &ContextTag) -> Option<u8> {
    tag.payload()
        .as_unsigned()
        .and_then(|v| u8::try_from(v).ok())
}

impl Encode for PropertyValue {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("PropertyValue")?;
        write_simple_field(w, "propertyIdentifier", &self.property_identifier)?;
        write_virtual_field(w, "property", &self.property_identifier())?;
        write_optional_field(w, "propertyArrayIndex", self.property_array_index.as_ref())?;
        write_simple_field(w, "propertyValue", &self.property_value)?;
        write_optional_field(w, "priority", self.priority.as_ref())?;
        w.pop_context("PropertyValue")
    }
}
