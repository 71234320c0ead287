use crate::encoding::context_tag::Enclosed;
use crate::encoding::reader::ReadBuffer;
use crate::encoding::tag::TagHeader;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::{DecodeError, EncodeError};
use std::fmt;

fn indexed(name: &str, i: usize) -> String {
    format!("{name}[{i}]")
}

/// Reads exactly one value inside a context named after the field.
pub fn read_simple_field<T>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    read: impl FnOnce(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    r.pull_context(name).map_err(|e| e.in_field(name))?;
    let value = read(r).map_err(|e| e.in_field(name))?;
    r.close_context(name).map_err(|e| e.in_field(name))?;
    Ok(value)
}

/// Attempts a field only when `condition` holds.
///
/// A parse failure or running out of input rewinds the buffer to where the
/// attempt started and reports the field as absent. Every other failure
/// propagates.
pub fn read_optional_field<T>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    condition: bool,
    read: impl FnOnce(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<Option<T>, DecodeError> {
    if !condition {
        return Ok(None);
    }
    let checkpoint = r.checkpoint();
    match read_simple_field(r, name, read) {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_absence() => {
            log::trace!(
                "optional field {name} absent at byte {}: {err}",
                checkpoint.pos().byte_offset()
            );
            r.restore(checkpoint);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// A field derived from already-parsed siblings. Consumes nothing.
pub fn read_virtual_field<T: fmt::Debug>(name: &str, value: T) -> T {
    log::trace!("virtual field {name} = {value:?}");
    value
}

/// Reads exactly `count` elements.
pub fn read_count_array_field<T>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    count: usize,
    mut read: impl FnMut(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    read_simple_field(r, name, |r| {
        let mut items = Vec::with_capacity(count.min(r.remaining_bits()));
        for i in 0..count {
            items.push(read(r).map_err(|e| e.in_field(indexed(name, i)))?);
        }
        Ok(items)
    })
}

/// Reads elements until exactly `length` bytes have been consumed.
pub fn read_length_array_field<T>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    length: usize,
    mut read: impl FnMut(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    read_simple_field(r, name, |r| {
        let end = r.pos().bits() + length * 8;
        let mut items = Vec::new();
        while r.pos().bits() < end {
            let before = r.pos();
            let item = read(r).map_err(|e| e.in_field(indexed(name, items.len())))?;
            if r.pos() == before {
                return Err(DecodeError::parse(
                    before.byte_offset(),
                    "array element consumed no input",
                ));
            }
            items.push(item);
        }
        if r.pos().bits() != end {
            return Err(DecodeError::parse(
                r.pos().byte_offset(),
                format!(
                    "elements overran the {length}-byte array by {} bits",
                    r.pos().bits() - end
                ),
            ));
        }
        Ok(items)
    })
}

/// Reads elements until the closing tag for `tag_number` is next.
///
/// The closing tag itself is left in the buffer. A closing tag with another
/// number, or the end of input, is a framing violation.
pub fn read_terminated_array_field<T>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    tag_number: u8,
    mut read: impl FnMut(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    read_simple_field(r, name, |r| {
        let mut items = Vec::new();
        loop {
            if r.is_empty() {
                let reason = format!("missing closing tag {tag_number}");
                log::debug!("{reason} at byte {}", r.pos().byte_offset());
                return Err(DecodeError::framing(r.pos().byte_offset(), reason));
            }
            let header = TagHeader::peek(r)?;
            if header.is_closing_tag() {
                if header.actual_tag_number() == tag_number {
                    break;
                }
                let reason = format!(
                    "closing tag {} does not match expected {tag_number}",
                    header.actual_tag_number()
                );
                log::debug!("{reason} at byte {}", r.pos().byte_offset());
                return Err(DecodeError::framing(r.pos().byte_offset(), reason));
            }
            let before = r.pos();
            let item = read(r).map_err(|e| e.in_field(indexed(name, items.len())))?;
            if r.pos() == before {
                return Err(DecodeError::parse(
                    before.byte_offset(),
                    "array element consumed no input",
                ));
            }
            items.push(item);
        }
        Ok(items)
    })
}

/// Opening tag, terminated elements, closing tag.
pub fn read_enclosed_array_field<T>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    tag_number: u8,
    read: impl FnMut(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<Enclosed<T>, DecodeError> {
    read_simple_field(r, name, |r| Enclosed::decode(r, tag_number, read))
}

/// Decodes a field and rewinds, whatever the outcome.
pub fn read_peek_field<T>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    read: impl FnOnce(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let checkpoint = r.checkpoint();
    let result = read_simple_field(r, name, read);
    r.restore(checkpoint);
    result
}

/// Reads a field whose value is fixed.
pub fn read_const_field<T: PartialEq + fmt::Debug>(
    r: &mut ReadBuffer<'_>,
    name: &'static str,
    expected: T,
    read: impl FnOnce(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let start = r.pos().byte_offset();
    let value = read_simple_field(r, name, read)?;
    if value != expected {
        return Err(DecodeError::parse(
            start,
            format!("expected constant {expected:?}, found {value:?}"),
        )
        .in_field(name));
    }
    Ok(value)
}

pub fn validate_field(
    r: &ReadBuffer<'_>,
    condition: bool,
    message: impl Into<std::borrow::Cow<'static, str>>,
) -> Result<(), DecodeError> {
    if condition {
        Ok(())
    } else {
        Err(DecodeError::parse(r.pos().byte_offset(), message))
    }
}

pub fn write_simple_field<T: Encode + ?Sized>(
    w: &mut dyn WriteBuffer,
    name: &'static str,
    value: &T,
) -> Result<(), EncodeError> {
    w.push_context(name).map_err(|e| e.in_field(name))?;
    value.encode(w).map_err(|e| e.in_field(name))?;
    w.pop_context(name).map_err(|e| e.in_field(name))
}

/// Writes nothing for `None`.
pub fn write_optional_field<T: Encode>(
    w: &mut dyn WriteBuffer,
    name: &'static str,
    value: Option<&T>,
) -> Result<(), EncodeError> {
    match value {
        Some(value) => write_simple_field(w, name, value),
        None => Ok(()),
    }
}

pub fn write_array_field<T: Encode>(
    w: &mut dyn WriteBuffer,
    name: &'static str,
    items: &[T],
) -> Result<(), EncodeError> {
    w.push_context(name).map_err(|e| e.in_field(name))?;
    for (i, item) in items.iter().enumerate() {
        item.encode(w).map_err(|e| e.in_field(indexed(name, i)))?;
    }
    w.pop_context(name).map_err(|e| e.in_field(name))
}

pub fn write_virtual_field(
    w: &mut dyn WriteBuffer,
    name: &'static str,
    value: &dyn fmt::Display,
) -> Result<(), EncodeError> {
    w.write_virtual(name, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::writer::{ByteWriter, LengthCounter};
    use crate::ErrorKind;

    fn app_unsigned(r: &mut ReadBuffer<'_>) -> Result<u8, DecodeError> {
        let h = TagHeader::decode(r)?;
        if !h.is_application() || h.actual_tag_number() != 2 || h.actual_length() != 1 {
            return Err(DecodeError::parse(r.pos().byte_offset(), "not a one-byte unsigned"));
        }
        r.read_u8(8)
    }

    #[test]
    fn simple_field_errors_carry_the_field_name() {
        let mut r = ReadBuffer::new(&[0x21]);
        let err = read_simple_field(&mut r, "priority", app_unsigned).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        assert_eq!(err.breadcrumb(), vec!["priority"]);
    }

    #[test]
    fn optional_field_rolls_back_on_parse_error() {
        let mut r = ReadBuffer::new(&[0x91, 0x03, 0x21, 0x07]);
        let absent = read_optional_field(&mut r, "arrayIndex", true, app_unsigned).unwrap();
        assert_eq!(absent, None);
        assert_eq!(r.pos().bits(), 0);
        assert_eq!(r.depth(), 0);

        r.skip_bytes(2).unwrap();
        let present = read_optional_field(&mut r, "value", true, app_unsigned).unwrap();
        assert_eq!(present, Some(7));
        r.finish().unwrap();
    }

    #[test]
    fn optional_field_rolls_back_on_truncation_and_skips_when_disabled() {
        let mut r = ReadBuffer::new(&[0x21]);
        assert_eq!(
            read_optional_field(&mut r, "value", true, app_unsigned).unwrap(),
            None
        );
        assert_eq!(r.pos().bits(), 0);
        assert_eq!(
            read_optional_field(&mut r, "value", false, |_| -> Result<u8, DecodeError> {
                panic!("must not be attempted")
            })
            .unwrap(),
            None
        );
    }

    #[test]
    fn optional_field_propagates_framing_and_unknown_variant() {
        let mut r = ReadBuffer::new(&[0x00]);
        let err = read_optional_field(&mut r, "x", true, |r| -> Result<u8, DecodeError> {
            Err(DecodeError::framing(r.pos().byte_offset(), "boom"))
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FramingViolation);

        let err = read_optional_field(&mut r, "x", true, |_| -> Result<u8, DecodeError> {
            Err(DecodeError::UnknownVariant {
                choice: "Test",
                value: 9,
                offset: 0,
            })
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVariant);
    }

    #[test]
    fn count_array_reads_exactly_n() {
        let mut r = ReadBuffer::new(&[0b1011_0000]);
        let bits = read_count_array_field(&mut r, "data", 4, |r| r.read_bit()).unwrap();
        assert_eq!(bits, vec![true, false, true, true]);
        assert_eq!(r.pos().bits(), 4);

        let mut r = ReadBuffer::new(&[0x21, 0x01]);
        let err = read_count_array_field(&mut r, "values", 2, app_unsigned).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        assert_eq!(err.breadcrumb(), vec!["values", "values[1]"]);
    }

    #[test]
    fn length_array_consumes_exact_bytes() {
        let mut r = ReadBuffer::new(&[0x21, 0x01, 0x21, 0x02, 0xFF]);
        let items = read_length_array_field(&mut r, "values", 4, app_unsigned).unwrap();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(r.pos().byte_offset(), 4);

        let mut r = ReadBuffer::new(&[0x21, 0x01, 0x21, 0x02]);
        let err = read_length_array_field(&mut r, "values", 3, app_unsigned).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn terminated_array_stops_before_matching_closing_tag() {
        let bytes = [0x21, 0x01, 0x21, 0x02, 0x21, 0x03, 0x3F];
        let mut r = ReadBuffer::new(&bytes);
        let items = read_terminated_array_field(&mut r, "values", 3, app_unsigned).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(r.pos().byte_offset(), 6);
        r.finish().unwrap();
    }

    #[test]
    fn terminated_array_framing_faults() {
        let mut r = ReadBuffer::new(&[0x21, 0x01, 0x4F]);
        let err = read_terminated_array_field(&mut r, "values", 3, app_unsigned).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FramingViolation);
        assert_eq!(err.offset(), 2);

        let mut r = ReadBuffer::new(&[0x21, 0x01]);
        let err = read_terminated_array_field(&mut r, "values", 3, app_unsigned).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FramingViolation);
    }

    #[test]
    fn enclosed_array_consumes_both_brackets() {
        let mut r = ReadBuffer::new(&[0x0E, 0x21, 0x09, 0x0F]);
        let enclosed = read_enclosed_array_field(&mut r, "list", 0, app_unsigned).unwrap();
        assert_eq!(enclosed.items(), &[9]);
        assert!(r.is_empty());
    }

    #[test]
    fn peek_field_always_rewinds() {
        let mut r = ReadBuffer::new(&[0x21, 0x05]);
        assert_eq!(read_peek_field(&mut r, "peek", app_unsigned).unwrap(), 5);
        assert_eq!(r.pos().bits(), 0);
        let mut r = ReadBuffer::new(&[0x21]);
        assert!(read_peek_field(&mut r, "peek", app_unsigned).is_err());
        assert_eq!(r.pos().bits(), 0);
        assert_eq!(r.depth(), 0);
    }

    #[test]
    fn const_and_validate() {
        let mut r = ReadBuffer::new(&[0x07, 0x08]);
        assert_eq!(read_const_field(&mut r, "marker", 7, |r| r.read_u8(8)).unwrap(), 7);
        let err = read_const_field(&mut r, "marker", 7, |r| r.read_u8(8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(validate_field(&r, true, "fine").is_ok());
        assert_eq!(
            validate_field(&r, false, "bad").unwrap_err().kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn array_and_optional_writers() {
        let headers = [TagHeader::opening(1), TagHeader::closing(1)];
        let mut w = ByteWriter::new();
        write_array_field(&mut w, "markers", &headers).unwrap();
        write_optional_field::<TagHeader>(&mut w, "none", None).unwrap();
        write_optional_field(&mut w, "some", Some(&TagHeader::boolean(true))).unwrap();
        write_virtual_field(&mut w, "count", &2).unwrap();
        assert_eq!(w.into_bytes().unwrap(), vec![0x1E, 0x1F, 0x11]);

        let mut c = LengthCounter::new();
        write_simple_field(&mut c, "header", &TagHeader::context(20, 300)).unwrap();
        assert_eq!(c.bits(), 5 * 8);
    }
}
