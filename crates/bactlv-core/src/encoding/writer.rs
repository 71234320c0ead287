use crate::encoding::boxed::{BoxOptions, BoxWriter};
use crate::encoding::reader::BitPosition;
use crate::EncodeError;
use std::fmt;

/// Sink for serialized fields.
///
/// Every write carries a field name. Byte-oriented sinks ignore it; the
/// diagnostic [`BoxWriter`] uses it as the box label.
pub trait WriteBuffer {
    fn pos(&self) -> BitPosition;

    fn write_bit(&mut self, name: &str, value: bool) -> Result<(), EncodeError>;

    /// Writes the low `bits` bits of `value`, most significant first.
    fn write_unsigned(&mut self, name: &str, bits: u8, value: u64) -> Result<(), EncodeError>;

    /// Writes `value` as a `bits`-wide two's-complement integer.
    fn write_signed(&mut self, name: &str, bits: u8, value: i64) -> Result<(), EncodeError>;

    fn write_bytes(&mut self, name: &str, data: &[u8]) -> Result<(), EncodeError>;

    /// Annotates a derived value. Occupies no bits on the wire.
    fn write_virtual(&mut self, name: &str, value: &dyn fmt::Display) -> Result<(), EncodeError>;

    fn push_context(&mut self, name: &str) -> Result<(), EncodeError>;

    fn pop_context(&mut self, name: &str) -> Result<(), EncodeError>;

    fn write_u8(&mut self, name: &str, value: u8) -> Result<(), EncodeError> {
        self.write_unsigned(name, 8, u64::from(value))
    }

    fn write_be_u16(&mut self, name: &str, value: u16) -> Result<(), EncodeError> {
        self.write_unsigned(name, 16, u64::from(value))
    }

    fn write_be_u32(&mut self, name: &str, value: u32) -> Result<(), EncodeError> {
        self.write_unsigned(name, 32, u64::from(value))
    }
}

pub(crate) fn check_unsigned(bits: u8, value: u64) -> Result<(), EncodeError> {
    if bits > 64 {
        return Err(EncodeError::invalid(format!(
            "cannot write {bits} bits from a 64-bit value"
        )));
    }
    if bits < 64 && value >> bits != 0 {
        return Err(EncodeError::ValueOutOfRange {
            value: i128::from(value),
            bits,
        });
    }
    Ok(())
}

/// Range-checks a signed value and returns its `bits`-wide bit pattern.
pub(crate) fn signed_bits(bits: u8, value: i64) -> Result<u64, EncodeError> {
    if bits == 0 || bits > 64 {
        return Err(EncodeError::invalid(format!(
            "cannot write a signed value in {bits} bits"
        )));
    }
    let min = -(1i128 << (bits - 1));
    let max = (1i128 << (bits - 1)) - 1;
    let wide = i128::from(value);
    if wide < min || wide > max {
        return Err(EncodeError::ValueOutOfRange { value: wide, bits });
    }
    if bits == 64 {
        Ok(value as u64)
    } else {
        Ok((value as u64) & ((1u64 << bits) - 1))
    }
}

/// Named context stack shared by the concrete writers.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContextStack(Vec<String>);

impl ContextStack {
    pub(crate) fn push(&mut self, name: &str) {
        self.0.push(name.to_owned());
    }

    pub(crate) fn pop(&mut self, name: &str) -> Result<(), EncodeError> {
        match self.0.last() {
            Some(open) if open == name => {
                self.0.pop();
                Ok(())
            }
            Some(open) => {
                let reason = format!("popping context '{name}' while '{open}' is open");
                log::debug!("{reason}");
                Err(EncodeError::framing(reason))
            }
            None => {
                let reason = format!("popping context '{name}' that was never pushed");
                log::debug!("{reason}");
                Err(EncodeError::framing(reason))
            }
        }
    }

    pub(crate) fn finish(&self) -> Result<(), EncodeError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(EncodeError::framing(format!(
                "unclosed contexts at end of write: {}",
                self.0.join("/")
            )))
        }
    }
}

/// Writes wire bytes into a growable buffer.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    bit_len: usize,
    contexts: ContextStack,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Bytes written so far. A trailing partial byte is zero-padded.
    pub fn as_written(&self) -> &[u8] {
        &self.buf
    }

    /// Finishes the write, failing if any context is still open.
    pub fn into_bytes(self) -> Result<Vec<u8>, EncodeError> {
        self.contexts.finish()?;
        Ok(self.buf)
    }

    fn push_bits(&mut self, bits: u8, value: u64) {
        for i in (0..bits).rev() {
            let offset = self.bit_len % 8;
            if offset == 0 {
                self.buf.push(0);
            }
            if (value >> i) & 1 == 1 {
                if let Some(last) = self.buf.last_mut() {
                    *last |= 0x80 >> offset;
                }
            }
            self.bit_len += 1;
        }
    }
}

impl WriteBuffer for ByteWriter {
    fn pos(&self) -> BitPosition {
        BitPosition::from_bits(self.bit_len)
    }

    fn write_bit(&mut self, _name: &str, value: bool) -> Result<(), EncodeError> {
        self.push_bits(1, u64::from(value));
        Ok(())
    }

    fn write_unsigned(&mut self, _name: &str, bits: u8, value: u64) -> Result<(), EncodeError> {
        check_unsigned(bits, value)?;
        self.push_bits(bits, value);
        Ok(())
    }

    fn write_signed(&mut self, _name: &str, bits: u8, value: i64) -> Result<(), EncodeError> {
        let raw = signed_bits(bits, value)?;
        self.push_bits(bits, raw);
        Ok(())
    }

    fn write_bytes(&mut self, _name: &str, data: &[u8]) -> Result<(), EncodeError> {
        if self.bit_len % 8 == 0 {
            self.buf.extend_from_slice(data);
            self.bit_len += data.len() * 8;
        } else {
            for b in data {
                self.push_bits(8, u64::from(*b));
            }
        }
        Ok(())
    }

    fn write_virtual(&mut self, _name: &str, _value: &dyn fmt::Display) -> Result<(), EncodeError> {
        Ok(())
    }

    fn push_context(&mut self, name: &str) -> Result<(), EncodeError> {
        self.contexts.push(name);
        Ok(())
    }

    fn pop_context(&mut self, name: &str) -> Result<(), EncodeError> {
        self.contexts.pop(name)
    }
}

/// Counts serialized bits without producing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthCounter {
    bits: usize,
}

impl LengthCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn bits(&self) -> usize {
        self.bits
    }
}

impl WriteBuffer for LengthCounter {
    fn pos(&self) -> BitPosition {
        BitPosition::from_bits(self.bits)
    }

    fn write_bit(&mut self, _name: &str, _value: bool) -> Result<(), EncodeError> {
        self.bits += 1;
        Ok(())
    }

    fn write_unsigned(&mut self, _name: &str, bits: u8, _value: u64) -> Result<(), EncodeError> {
        self.bits += bits as usize;
        Ok(())
    }

    fn write_signed(&mut self, _name: &str, bits: u8, _value: i64) -> Result<(), EncodeError> {
        self.bits += bits as usize;
        Ok(())
    }

    fn write_bytes(&mut self, _name: &str, data: &[u8]) -> Result<(), EncodeError> {
        self.bits += data.len() * 8;
        Ok(())
    }

    fn write_virtual(&mut self, _name: &str, _value: &dyn fmt::Display) -> Result<(), EncodeError> {
        Ok(())
    }

    fn push_context(&mut self, _name: &str) -> Result<(), EncodeError> {
        Ok(())
    }

    fn pop_context(&mut self, _name: &str) -> Result<(), EncodeError> {
        Ok(())
    }
}

/// A value with a wire representation.
pub trait Encode {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError>;

    /// Serialized size in bits. Virtual fields contribute nothing.
    ///
    /// For a value that fails to encode this is the size written before the
    /// failure.
    fn length_in_bits(&self) -> usize {
        let mut counter = LengthCounter::new();
        if let Err(err) = self.encode(&mut counter) {
            log::trace!("length count stopped early: {err}");
        }
        counter.bits()
    }

    fn length_in_bytes(&self) -> usize {
        self.length_in_bits().div_ceil(8)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut w = ByteWriter::with_capacity(self.length_in_bytes());
        self.encode(&mut w)?;
        w.into_bytes()
    }

    fn render_boxed(&self) -> Result<String, EncodeError> {
        self.render_boxed_with(BoxOptions::default())
    }

    fn render_boxed_with(&self, options: BoxOptions) -> Result<String, EncodeError> {
        let mut w = BoxWriter::new(options);
        self.encode(&mut w)?;
        w.into_string()
    }

    /// Field-level JSON with a bit length and data type on every leaf.
    #[cfg(feature = "json")]
    fn render_json_value(&self) -> Result<serde_json::Value, EncodeError> {
        let mut w = crate::encoding::json::JsonWriter::new();
        self.encode(&mut w)?;
        w.into_value()
    }

    #[cfg(feature = "json")]
    fn render_json(&self) -> Result<String, EncodeError> {
        let mut w = crate::encoding::json::JsonWriter::new();
        self.encode(&mut w)?;
        w.into_string()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        (**self).encode(w)
    }
}
