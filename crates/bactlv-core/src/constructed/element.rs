use crate::encoding::context_tag::Enclosed;
use crate::encoding::fields::read_simple_field;
use crate::encoding::reader::ReadBuffer;
use crate::encoding::tag::TagHeader;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::types::{ApplicationTag, ContextTag, DataType};
use crate::{DecodeError, EncodeError};

/// One element of a constructed value whose shape is not known up front.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstructedElement {
    Application(ApplicationTag),
    /// A context-tagged primitive, kept as raw octets.
    Context(ContextTag),
    /// A bracketed group of further elements.
    Constructed(Enclosed<ConstructedElement>),
}

impl ConstructedElement {
    /// Chooses the element kind from the peeked header class.
    ///
    /// Every nesting level enters a context, so the buffer's depth limit
    /// bounds recursion.
    pub fn decode(r: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
        let header = TagHeader::peek(r)?;
        if header.is_application() {
            return read_simple_field(r, "applicationValue", ApplicationTag::decode)
                .map(Self::Application);
        }
        if header.is_opening_tag() {
            let tag_number = header.actual_tag_number();
            return read_simple_field(r, "constructedValue", |r| {
                Enclosed::decode(r, tag_number, Self::decode)
            })
            .map(Self::Constructed);
        }
        if header.is_closing_tag() {
            return Err(DecodeError::framing(
                r.pos().byte_offset(),
                format!("unexpected closing tag {}", header.actual_tag_number()),
            ));
        }
        let tag_number = header.actual_tag_number();
        read_simple_field(r, "contextValue", |r| {
            ContextTag::decode(r, tag_number, DataType::Unknown)
        })
        .map(Self::Context)
    }
}

impl Encode for ConstructedElement {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        match self {
            Self::Application(tag) => tag.encode(w),
            Self::Context(tag) => tag.encode(w),
            Self::Constructed(group) => {
                w.push_context("ConstructedElement")?;
                group.encode(w)?;
                w.pop_context("ConstructedElement")
            }
        }
    }
}

impl From<ApplicationTag> for ConstructedElement {
    fn from(tag: ApplicationTag) -> Self {
        Self::Application(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::ConstructedElement;
    use crate::encoding::reader::ReadBuffer;
    use crate::encoding::writer::Encode;
    use crate::types::Payload;
    use crate::ErrorKind;

    #[test]
    fn nested_groups_round_trip() {
        let bytes = [0x0E, 0x11, 0x3E, 0x21, 0x05, 0x3F, 0x0F];
        let mut r = ReadBuffer::new(&bytes);
        let element = ConstructedElement::decode(&mut r).unwrap();
        assert!(r.is_empty());
        let ConstructedElement::Constructed(outer) = &element else {
            panic!("expected a group, got {element:?}");
        };
        assert_eq!(outer.tag_number(), 0);
        assert_eq!(outer.len(), 2);
        assert!(matches!(
            &outer.items()[1],
            ConstructedElement::Constructed(inner) if inner.tag_number() == 3
        ));
        assert_eq!(element.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn context_values_keep_raw_octets() {
        let mut r = ReadBuffer::new(&[0x1A, 0xAB, 0xCD]);
        match ConstructedElement::decode(&mut r).unwrap() {
            ConstructedElement::Context(tag) => {
                assert_eq!(tag.tag_number(), 1);
                assert_eq!(tag.payload(), &Payload::Unknown(vec![0xAB, 0xCD]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deep_nesting_hits_the_depth_limit() {
        let mut bytes = vec![0x0E; 100];
        bytes.extend(vec![0x0F; 100]);
        let mut r = ReadBuffer::new(&bytes).with_max_depth(16);
        let err = ConstructedElement::decode(&mut r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn stray_closing_tag_is_a_framing_violation() {
        let mut r = ReadBuffer::new(&[0x2F]);
        let err = ConstructedElement::decode(&mut r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FramingViolation);
    }
}
