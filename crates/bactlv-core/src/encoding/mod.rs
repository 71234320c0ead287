/// Diagnostic writer that renders values as nested boxes.
pub mod boxed;
/// Opening/closing context tags and bracketed item lists.
pub mod context_tag;
/// Static variant tables keyed by peeked discriminators.
pub mod dispatch;
/// Field combinators shared by every decoder.
pub mod fields;
#[cfg(feature = "json")]
pub mod json;
/// Payload codecs for the primitive data types.
pub mod primitives;
/// Bit-precision read buffer.
pub mod reader;
/// BACnet tag header codec.
pub mod tag;
/// The `WriteBuffer` trait, byte writer and length counter.
pub mod writer;

use crate::DecodeError;
use reader::ReadBuffer;

/// Decodes one value that must span all of `bytes`.
///
/// Trailing input or an unbalanced context stack is a framing violation.
pub fn decode_from_slice<T>(
    bytes: &[u8],
    read: impl FnOnce(&mut ReadBuffer<'_>) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let mut r = ReadBuffer::new(bytes);
    let value = read(&mut r)?;
    r.finish()?;
    if !r.is_empty() {
        return Err(DecodeError::framing(
            r.pos().byte_offset(),
            format!("{} trailing bytes after value", r.remaining_bytes()),
        ));
    }
    Ok(value)
}
