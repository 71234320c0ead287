use crate::encoding::reader::ReadBuffer;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::{DecodeError, EncodeError};

/// Application tag number that carries its value in the length field.
pub const BOOLEAN_TAG_NUMBER: u8 = 1;

const EXTENDED_TAG_NUMBER: u8 = 0x0F;
const EXTENDED_LENGTH: u8 = 5;
const OPENING_TAG: u8 = 6;
const CLOSING_TAG: u8 = 7;
const EXT_LENGTH_U16: u8 = 254;
const EXT_LENGTH_U32: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagClass {
    Application,
    Context,
}

/// One BACnet tag header, stored as the raw wire fields.
///
/// Keeping the raw fields means a header re-serializes exactly as read, even
/// when the sender picked a non-minimal form (for example tag number 3 in
/// extended form, or length 4 written as `5` + `0x04`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagHeader {
    tag_number: u8,
    tag_class: TagClass,
    length_value_type: u8,
    ext_tag_number: Option<u8>,
    ext_length: Option<u8>,
    ext_ext_length: Option<u16>,
    ext_ext_ext_length: Option<u32>,
}

impl TagHeader {
    /// Canonical header for a primitive value of `length` bytes.
    pub const fn new(tag_class: TagClass, tag_number: u8, length: u32) -> Self {
        let (nibble, ext_tag_number) = split_tag_number(tag_number);
        let mut header = Self {
            tag_number: nibble,
            tag_class,
            length_value_type: 0,
            ext_tag_number,
            ext_length: None,
            ext_ext_length: None,
            ext_ext_ext_length: None,
        };
        if length < EXTENDED_LENGTH as u32 {
            header.length_value_type = length as u8;
        } else {
            header.length_value_type = EXTENDED_LENGTH;
            if length < EXT_LENGTH_U16 as u32 {
                header.ext_length = Some(length as u8);
            } else if length <= u16::MAX as u32 {
                header.ext_length = Some(EXT_LENGTH_U16);
                header.ext_ext_length = Some(length as u16);
            } else {
                header.ext_length = Some(EXT_LENGTH_U32);
                header.ext_ext_ext_length = Some(length);
            }
        }
        header
    }

    pub const fn application(tag_number: u8, length: u32) -> Self {
        Self::new(TagClass::Application, tag_number, length)
    }

    pub const fn context(tag_number: u8, length: u32) -> Self {
        Self::new(TagClass::Context, tag_number, length)
    }

    pub const fn opening(tag_number: u8) -> Self {
        Self::marker(tag_number, OPENING_TAG)
    }

    pub const fn closing(tag_number: u8) -> Self {
        Self::marker(tag_number, CLOSING_TAG)
    }

    /// Application boolean; the value lives in the length field.
    pub const fn boolean(value: bool) -> Self {
        Self {
            tag_number: BOOLEAN_TAG_NUMBER,
            tag_class: TagClass::Application,
            length_value_type: value as u8,
            ext_tag_number: None,
            ext_length: None,
            ext_ext_length: None,
            ext_ext_ext_length: None,
        }
    }

    const fn marker(tag_number: u8, length_value_type: u8) -> Self {
        let (nibble, ext_tag_number) = split_tag_number(tag_number);
        Self {
            tag_number: nibble,
            tag_class: TagClass::Context,
            length_value_type,
            ext_tag_number,
            ext_length: None,
            ext_ext_length: None,
            ext_ext_ext_length: None,
        }
    }

    pub fn decode(r: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
        let start = r.pos().byte_offset();
        let tag_number = r.read_u8(4)?;
        let tag_class = if r.read_bit()? {
            TagClass::Context
        } else {
            TagClass::Application
        };
        let length_value_type = r.read_u8(3)?;

        let ext_tag_number = if tag_number == EXTENDED_TAG_NUMBER {
            let n = r.read_u8(8)?;
            if n == 0xFF {
                return Err(DecodeError::parse(start, "extended tag number 255 is reserved"));
            }
            Some(n)
        } else {
            None
        };

        let mut header = Self {
            tag_number,
            tag_class,
            length_value_type,
            ext_tag_number,
            ext_length: None,
            ext_ext_length: None,
            ext_ext_ext_length: None,
        };

        if length_value_type == EXTENDED_LENGTH && !header.is_boolean() {
            let ext = r.read_u8(8)?;
            header.ext_length = Some(ext);
            match ext {
                EXT_LENGTH_U16 => header.ext_ext_length = Some(r.read_u16(16)?),
                EXT_LENGTH_U32 => header.ext_ext_ext_length = Some(r.read_u32(32)?),
                _ => {}
            }
        }
        Ok(header)
    }

    /// Decodes the next header without moving the cursor.
    pub fn peek(r: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
        let checkpoint = r.checkpoint();
        let result = Self::decode(r);
        r.restore(checkpoint);
        if let Ok(header) = &result {
            log::trace!(
                "peeked {:?} tag {} at byte {}",
                header.tag_class,
                header.actual_tag_number(),
                checkpoint.pos().byte_offset()
            );
        }
        result
    }

    pub const fn tag_class(&self) -> TagClass {
        self.tag_class
    }

    pub const fn tag_number_nibble(&self) -> u8 {
        self.tag_number
    }

    pub const fn length_value_type(&self) -> u8 {
        self.length_value_type
    }

    pub const fn is_context(&self) -> bool {
        matches!(self.tag_class, TagClass::Context)
    }

    pub const fn is_application(&self) -> bool {
        matches!(self.tag_class, TagClass::Application)
    }

    pub const fn actual_tag_number(&self) -> u8 {
        match self.ext_tag_number {
            Some(n) => n,
            None => self.tag_number,
        }
    }

    pub const fn is_opening_tag(&self) -> bool {
        self.is_context() && self.length_value_type == OPENING_TAG
    }

    pub const fn is_closing_tag(&self) -> bool {
        self.is_context() && self.length_value_type == CLOSING_TAG
    }

    pub const fn is_boolean(&self) -> bool {
        self.is_application() && self.actual_tag_number() == BOOLEAN_TAG_NUMBER
    }

    /// Value of an application boolean header.
    pub const fn boolean_value(&self) -> bool {
        self.length_value_type == 1
    }

    /// Payload length in bytes. Zero for booleans and bracket markers.
    pub const fn actual_length(&self) -> u32 {
        if self.is_boolean() || self.is_opening_tag() || self.is_closing_tag() {
            return 0;
        }
        if self.length_value_type != EXTENDED_LENGTH {
            return self.length_value_type as u32;
        }
        match (self.ext_length, self.ext_ext_length, self.ext_ext_ext_length) {
            (Some(EXT_LENGTH_U16), Some(len), _) => len as u32,
            (Some(EXT_LENGTH_U32), _, Some(len)) => len,
            (Some(len), _, _) => len as u32,
            _ => 0,
        }
    }
}

const fn split_tag_number(tag_number: u8) -> (u8, Option<u8>) {
    if tag_number < EXTENDED_TAG_NUMBER {
        (tag_number, None)
    } else {
        (EXTENDED_TAG_NUMBER, Some(tag_number))
    }
}

impl Encode for TagHeader {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        if self.ext_tag_number == Some(0xFF) {
            return Err(EncodeError::invalid("extended tag number 255 is reserved"));
        }

        w.push_context("TagHeader")?;
        w.write_unsigned("tagNumber", 4, u64::from(self.tag_number))?;
        w.write_bit("tagClass", self.is_context())?;
        w.write_unsigned("lengthValueType", 3, u64::from(self.length_value_type))?;
        if let Some(n) = self.ext_tag_number {
            w.write_u8("extTagNumber", n)?;
        }
        if let Some(ext) = self.ext_length {
            w.write_u8("extLength", ext)?;
        }
        if let Some(len) = self.ext_ext_length {
            w.write_be_u16("extExtLength", len)?;
        }
        if let Some(len) = self.ext_ext_ext_length {
            w.write_be_u32("extExtExtLength", len)?;
        }
        w.write_virtual("actualTagNumber", &self.actual_tag_number())?;
        w.write_virtual("actualLength", &self.actual_length())?;
        w.pop_context("TagHeader")
    }
}
