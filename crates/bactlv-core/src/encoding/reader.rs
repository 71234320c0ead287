use crate::DecodeError;
use std::fmt;

/// Default bound on nested context depth for a [`ReadBuffer`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Absolute cursor position in bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitPosition(usize);

impl BitPosition {
    pub const ZERO: Self = Self(0);

    pub const fn from_bits(bits: usize) -> Self {
        Self(bits)
    }

    pub const fn from_bytes(bytes: usize) -> Self {
        Self(bytes * 8)
    }

    pub const fn bits(self) -> usize {
        self.0
    }

    /// Index of the byte containing this position.
    pub const fn byte_offset(self) -> usize {
        self.0 / 8
    }

    pub const fn is_byte_aligned(self) -> bool {
        self.0 % 8 == 0
    }
}

impl fmt::Display for BitPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_byte_aligned() {
            write!(f, "{}", self.byte_offset())
        } else {
            write!(f, "{}.{}", self.byte_offset(), self.0 % 8)
        }
    }
}

/// Saved reader state used to roll back a speculative read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pos: BitPosition,
    depth: usize,
}

impl Checkpoint {
    pub const fn pos(&self) -> BitPosition {
        self.pos
    }
}

/// Bit-precision reader over a fully materialized byte slice.
///
/// Besides the cursor, the reader tracks a stack of named contexts. Contexts
/// never influence decoded values; they exist for diagnostics and to bound
/// recursion on nested constructed data.
#[derive(Debug, Clone)]
pub struct ReadBuffer<'a> {
    buf: &'a [u8],
    pos: usize,
    contexts: Vec<&'static str>,
    max_depth: usize,
}

impl<'a> ReadBuffer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            contexts: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub const fn pos(&self) -> BitPosition {
        BitPosition(self.pos)
    }

    /// Moves the cursor to a previously observed position.
    pub fn reset(&mut self, pos: BitPosition) {
        debug_assert!(pos.bits() <= self.len_bits());
        self.pos = pos.bits().min(self.len_bits());
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos(),
            depth: self.contexts.len(),
        }
    }

    /// Rewinds the cursor and drops any contexts pulled since `checkpoint`.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.reset(checkpoint.pos);
        self.contexts.truncate(checkpoint.depth);
    }

    pub fn len_bits(&self) -> usize {
        self.buf.len() * 8
    }

    pub fn remaining_bits(&self) -> usize {
        self.len_bits().saturating_sub(self.pos)
    }

    pub fn remaining_bytes(&self) -> usize {
        self.remaining_bits() / 8
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0
    }

    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    /// The open contexts joined with `/`, outermost first.
    pub fn context_path(&self) -> String {
        self.contexts.join("/")
    }

    fn ensure(&self, bits: usize) -> Result<(), DecodeError> {
        let available_bits = self.remaining_bits();
        if available_bits < bits {
            return Err(DecodeError::Truncated {
                offset: self.pos().byte_offset(),
                needed_bits: bits,
                available_bits,
            });
        }
        Ok(())
    }

    /// Reads `bits` (at most 64) most-significant-bit first.
    pub fn read_bits(&mut self, bits: u8) -> Result<u64, DecodeError> {
        if bits > 64 {
            return Err(DecodeError::parse(
                self.pos().byte_offset(),
                format!("cannot read {bits} bits into a 64-bit value"),
            ));
        }
        self.ensure(bits as usize)?;

        let mut value = 0u64;
        let mut left = bits as usize;
        while left > 0 {
            let byte = self.buf[self.pos / 8];
            let available = 8 - self.pos % 8;
            let take = available.min(left);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (byte >> (available - take)) & mask;
            value = (value << take) | u64::from(chunk);
            self.pos += take;
            left -= take;
        }
        Ok(value)
    }

    fn read_bounded(&mut self, bits: u8, width: u8) -> Result<u64, DecodeError> {
        if bits > width {
            return Err(DecodeError::parse(
                self.pos().byte_offset(),
                format!("cannot read {bits} bits into a {width}-bit value"),
            ));
        }
        self.read_bits(bits)
    }

    pub fn read_bit(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn read_u8(&mut self, bits: u8) -> Result<u8, DecodeError> {
        Ok(self.read_bounded(bits, 8)? as u8)
    }

    pub fn read_u16(&mut self, bits: u8) -> Result<u16, DecodeError> {
        Ok(self.read_bounded(bits, 16)? as u16)
    }

    pub fn read_u32(&mut self, bits: u8) -> Result<u32, DecodeError> {
        Ok(self.read_bounded(bits, 32)? as u32)
    }

    pub fn read_u64(&mut self, bits: u8) -> Result<u64, DecodeError> {
        self.read_bounded(bits, 64)
    }

    /// Reads a two's-complement value of `bits` width and sign-extends it.
    pub fn read_i64(&mut self, bits: u8) -> Result<i64, DecodeError> {
        let raw = self.read_bounded(bits, 64)?;
        if bits == 0 || bits == 64 {
            return Ok(raw as i64);
        }
        let sign = 1u64 << (bits - 1);
        if raw & sign != 0 {
            Ok((raw | !((1u64 << bits) - 1)) as i64)
        } else {
            Ok(raw as i64)
        }
    }

    fn read_signed_bounded(&mut self, bits: u8, width: u8) -> Result<i64, DecodeError> {
        if bits > width {
            return Err(DecodeError::parse(
                self.pos().byte_offset(),
                format!("cannot read {bits} bits into a {width}-bit value"),
            ));
        }
        self.read_i64(bits)
    }

    pub fn read_i8(&mut self, bits: u8) -> Result<i8, DecodeError> {
        Ok(self.read_signed_bounded(bits, 8)? as i8)
    }

    pub fn read_i16(&mut self, bits: u8) -> Result<i16, DecodeError> {
        Ok(self.read_signed_bounded(bits, 16)? as i16)
    }

    pub fn read_i32(&mut self, bits: u8) -> Result<i32, DecodeError> {
        Ok(self.read_signed_bounded(bits, 32)? as i32)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(len.saturating_mul(8))?;
        if self.pos().is_byte_aligned() {
            let start = self.pos / 8;
            self.pos += len * 8;
            return Ok(self.buf[start..start + len].to_vec());
        }
        (0..len).map(|_| self.read_u8(8)).collect()
    }

    pub fn skip_bytes(&mut self, len: usize) -> Result<(), DecodeError> {
        self.ensure(len.saturating_mul(8))?;
        self.pos += len * 8;
        Ok(())
    }

    /// Enters a named diagnostic context.
    pub fn pull_context(&mut self, name: &'static str) -> Result<(), DecodeError> {
        if self.contexts.len() >= self.max_depth {
            return Err(DecodeError::parse(
                self.pos().byte_offset(),
                format!(
                    "nesting deeper than {} contexts at '{}'",
                    self.max_depth, name
                ),
            ));
        }
        self.contexts.push(name);
        Ok(())
    }

    /// Leaves the innermost context, which must be `name`.
    pub fn close_context(&mut self, name: &'static str) -> Result<(), DecodeError> {
        match self.contexts.last() {
            Some(open) if *open == name => {
                self.contexts.pop();
                Ok(())
            }
            Some(open) => {
                let reason = format!("closing context '{name}' while '{open}' is open");
                log::debug!("{reason}");
                Err(DecodeError::framing(self.pos().byte_offset(), reason))
            }
            None => {
                let reason = format!("closing context '{name}' that was never pulled");
                log::debug!("{reason}");
                Err(DecodeError::framing(self.pos().byte_offset(), reason))
            }
        }
    }

    /// Verifies that every pulled context was closed.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.contexts.is_empty() {
            return Ok(());
        }
        let reason = format!("unclosed contexts at end of parse: {}", self.context_path());
        log::debug!("{reason}");
        Err(DecodeError::framing(self.pos().byte_offset(), reason))
    }
}

#[cfg(test)]
mod tests {
    use super::{BitPosition, ReadBuffer};
    use crate::{DecodeError, ErrorKind};

    #[test]
    fn reads_values_across_byte_boundaries() {
        let mut r = ReadBuffer::new(&[0b1010_1100, 0b0101_1111, 0xFF]);
        assert_eq!(r.read_u8(4).unwrap(), 0b1010);
        assert!(r.read_bit().unwrap());
        assert_eq!(r.read_u8(3).unwrap(), 0b100);
        assert_eq!(r.read_u16(6).unwrap(), 0b010111);
        assert_eq!(r.pos(), BitPosition::from_bits(14));
        assert_eq!(r.read_u16(10).unwrap(), 0b11_1111_1111);
        assert!(r.is_empty());
    }

    #[test]
    fn sign_extends_narrow_values() {
        let mut r = ReadBuffer::new(&[0xFF, 0x80, 0x7F]);
        assert_eq!(r.read_i64(8).unwrap(), -1);
        assert_eq!(r.read_i32(8).unwrap(), -128);
        assert_eq!(r.read_i64(8).unwrap(), 127);

        let mut r = ReadBuffer::new(&[0xF8, 0xFF, 0xFE]);
        assert_eq!(r.read_i8(4).unwrap(), -1);
        assert_eq!(r.read_i8(4).unwrap(), -8);
        assert_eq!(r.read_i16(16).unwrap(), -2);
        assert_eq!(r.read_i8(9).unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn truncation_reports_offset_and_bits() {
        let mut r = ReadBuffer::new(&[1, 2]);
        r.read_u8(8).unwrap();
        let err = r.read_u32(32).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 1,
                needed_bits: 32,
                available_bits: 8
            }
        );
        // A failed read leaves the cursor where it was.
        assert_eq!(r.pos(), BitPosition::from_bytes(1));
    }

    #[test]
    fn unaligned_byte_reads() {
        let mut r = ReadBuffer::new(&[0x0A, 0xBC, 0xD0]);
        r.read_u8(4).unwrap();
        assert_eq!(r.read_bytes(2).unwrap(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn restore_rewinds_cursor_and_contexts() {
        let mut r = ReadBuffer::new(&[1, 2, 3]);
        r.pull_context("Outer").unwrap();
        let cp = r.checkpoint();
        r.pull_context("Inner").unwrap();
        r.read_u8(8).unwrap();
        r.restore(cp);
        assert_eq!(r.pos(), BitPosition::ZERO);
        assert_eq!(r.context_path(), "Outer");
        r.close_context("Outer").unwrap();
        r.finish().unwrap();
    }

    #[test]
    fn unbalanced_contexts_are_framing_violations() {
        let mut r = ReadBuffer::new(&[]);
        assert_eq!(
            r.close_context("Ghost").unwrap_err().kind(),
            ErrorKind::FramingViolation
        );

        r.pull_context("A").unwrap();
        r.pull_context("B").unwrap();
        assert_eq!(
            r.close_context("A").unwrap_err().kind(),
            ErrorKind::FramingViolation
        );
        assert_eq!(r.finish().unwrap_err().kind(), ErrorKind::FramingViolation);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut r = ReadBuffer::new(&[]).with_max_depth(2);
        r.pull_context("a").unwrap();
        r.pull_context("b").unwrap();
        assert_eq!(r.pull_context("c").unwrap_err().kind(), ErrorKind::Parse);
    }
}
