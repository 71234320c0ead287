use crate::encoding::fields::{read_simple_field, read_terminated_array_field, write_array_field};
use crate::encoding::reader::ReadBuffer;
use crate::encoding::tag::TagHeader;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::{DecodeError, EncodeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpeningTag {
    header: TagHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClosingTag {
    header: TagHeader,
}

/// Reads a bracket marker. A header of the wrong shape is a parse error so an
/// optional bracketed field can roll back; a wrong number is a framing fault.
fn decode_marker(
    r: &mut ReadBuffer<'_>,
    expected: u8,
    opening: bool,
) -> Result<TagHeader, DecodeError> {
    let start = r.pos().byte_offset();
    let header = TagHeader::decode(r)?;
    let kind = if opening { "opening" } else { "closing" };
    let shape_ok = if opening {
        header.is_opening_tag()
    } else {
        header.is_closing_tag()
    };
    if !shape_ok {
        return Err(DecodeError::parse(
            start,
            format!(
                "expected {kind} tag {expected}, found {:?} tag {} lvt {}",
                header.tag_class(),
                header.actual_tag_number(),
                header.length_value_type()
            ),
        ));
    }
    if header.actual_tag_number() != expected {
        let reason = format!(
            "{kind} tag {} does not match expected {expected}",
            header.actual_tag_number()
        );
        log::debug!("{reason} at byte {start}");
        return Err(DecodeError::framing(start, reason));
    }
    Ok(header)
}

impl OpeningTag {
    pub const fn new(tag_number: u8) -> Self {
        Self {
            header: TagHeader::opening(tag_number),
        }
    }

    pub fn decode(r: &mut ReadBuffer<'_>, expected: u8) -> Result<Self, DecodeError> {
        decode_marker(r, expected, true).map(|header| Self { header })
    }

    pub const fn header(&self) -> &TagHeader {
        &self.header
    }

    pub const fn tag_number(&self) -> u8 {
        self.header.actual_tag_number()
    }
}

impl ClosingTag {
    pub const fn new(tag_number: u8) -> Self {
        Self {
            header: TagHeader::closing(tag_number),
        }
    }

    pub fn decode(r: &mut ReadBuffer<'_>, expected: u8) -> Result<Self, DecodeError> {
        decode_marker(r, expected, false).map(|header| Self { header })
    }

    pub const fn header(&self) -> &TagHeader {
        &self.header
    }

    pub const fn tag_number(&self) -> u8 {
        self.header.actual_tag_number()
    }
}

impl Encode for OpeningTag {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("OpeningTag")?;
        self.header.encode(w)?;
        w.pop_context("OpeningTag")
    }
}

impl Encode for ClosingTag {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("ClosingTag")?;
        self.header.encode(w)?;
        w.pop_context("ClosingTag")
    }
}

/// Whether the next header is the closing tag for `expected`. Never consumes.
///
/// Running out of input or hitting an unreadable header answers `false`.
pub fn is_closing_tag(r: &mut ReadBuffer<'_>, expected: u8) -> bool {
    matches!(
        TagHeader::peek(r),
        Ok(h) if h.is_closing_tag() && h.actual_tag_number() == expected
    )
}

/// Items bracketed by a matching opening and closing tag pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Enclosed<T> {
    opening_tag: OpeningTag,
    items: Vec<T>,
    closing_tag: ClosingTag,
}

impl<T> Enclosed<T> {
    pub fn new(tag_number: u8, items: Vec<T>) -> Self {
        Self {
            opening_tag: OpeningTag::new(tag_number),
            items,
            closing_tag: ClosingTag::new(tag_number),
        }
    }

    pub fn decode(
        r: &mut ReadBuffer<'_>,
        tag_number: u8,
        mut read_item: impl FnMut(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
    ) -> Result<Self, DecodeError> {
        let opening_tag = read_simple_field(r, "openingTag", |r| OpeningTag::decode(r, tag_number))?;
        let items = read_terminated_array_field(r, "items", tag_number, &mut read_item)?;
        let closing_tag = read_simple_field(r, "closingTag", |r| ClosingTag::decode(r, tag_number))?;
        Ok(Self {
            opening_tag,
            items,
            closing_tag,
        })
    }

    pub fn tag_number(&self) -> u8 {
        self.opening_tag.tag_number()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Encode> Encode for Enclosed<T> {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        self.opening_tag.encode(w)?;
        write_array_field(w, "items", &self.items)?;
        self.closing_tag.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_closing_tag, ClosingTag, Enclosed, OpeningTag};
    use crate::encoding::reader::ReadBuffer;
    use crate::encoding::writer::Encode;
    use crate::ErrorKind;

    #[test]
    fn brackets_round_trip() {
        assert_eq!(OpeningTag::new(2).to_bytes().unwrap(), vec![0x2E]);
        assert_eq!(ClosingTag::new(2).to_bytes().unwrap(), vec![0x2F]);
        assert_eq!(OpeningTag::new(40).to_bytes().unwrap(), vec![0xFE, 40]);

        let mut r = ReadBuffer::new(&[0x2E, 0xFF, 40]);
        assert_eq!(OpeningTag::decode(&mut r, 2).unwrap().tag_number(), 2);
        assert_eq!(ClosingTag::decode(&mut r, 40).unwrap().tag_number(), 40);
    }

    #[test]
    fn wrong_marker_shape_is_a_parse_error() {
        let mut r = ReadBuffer::new(&[0x29, 0x01]);
        let err = OpeningTag::decode(&mut r, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let mut r = ReadBuffer::new(&[0x2E]);
        assert_eq!(
            ClosingTag::decode(&mut r, 2).unwrap_err().kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn mismatched_number_is_a_framing_violation() {
        let mut r = ReadBuffer::new(&[0x00, 0x3F]);
        r.read_u8(8).unwrap();
        let err = ClosingTag::decode(&mut r, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FramingViolation);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn closing_tag_peek_does_not_consume() {
        let mut r = ReadBuffer::new(&[0x1F]);
        assert!(is_closing_tag(&mut r, 1));
        assert!(!is_closing_tag(&mut r, 2));
        assert_eq!(r.pos().bits(), 0);
        r.read_u8(8).unwrap();
        assert!(!is_closing_tag(&mut r, 1));
    }

    #[test]
    fn enclosed_items() {
        let bytes = [0x1E, 0x21, 0x01, 0x21, 0x02, 0x1F];
        let mut r = ReadBuffer::new(&bytes);
        let enclosed = Enclosed::decode(&mut r, 1, |r| {
            r.read_u8(8)?;
            r.read_u8(8)
        })
        .unwrap();
        assert_eq!(enclosed.items(), &[1, 2]);
        assert_eq!(enclosed.tag_number(), 1);
        assert!(r.is_empty());
        assert_eq!(enclosed.into_items(), vec![1, 2]);
    }
}
