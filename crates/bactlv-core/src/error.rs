use std::borrow::Cow;
use thiserror::Error;

/// Coarse classification of a failure, independent of where it was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Malformed bytes for the attempted shape.
    Parse,
    /// Bracket or tag-number mismatch, or unbalanced context push/pop.
    FramingViolation,
    /// A discriminator value with no mapped handler.
    UnknownVariant,
    /// The buffer ended before a mandatory field completed.
    Truncated,
    /// A value that cannot be represented on the wire.
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed input at byte {offset}: {reason}")]
    Parse {
        offset: usize,
        reason: Cow<'static, str>,
    },
    #[error("framing violation at byte {offset}: {reason}")]
    FramingViolation {
        offset: usize,
        reason: Cow<'static, str>,
    },
    #[error("unmapped {choice} discriminator {value} at byte {offset}")]
    UnknownVariant {
        choice: &'static str,
        value: u64,
        offset: usize,
    },
    #[error("input truncated at byte {offset}: needed {needed_bits} bits, {available_bits} available")]
    Truncated {
        offset: usize,
        needed_bits: usize,
        available_bits: usize,
    },
    #[error("{field}: {inner}")]
    Field {
        field: Cow<'static, str>,
        inner: Box<DecodeError>,
    },
}

impl DecodeError {
    pub fn parse(offset: usize, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Parse {
            offset,
            reason: reason.into(),
        }
    }

    pub fn framing(offset: usize, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::FramingViolation {
            offset,
            reason: reason.into(),
        }
    }

    /// Wraps this error with the name of the field being decoded.
    pub fn in_field(self, field: impl Into<Cow<'static, str>>) -> Self {
        Self::Field {
            field: field.into(),
            inner: Box::new(self),
        }
    }

    /// The innermost error, with all field breadcrumbs stripped.
    pub fn root(&self) -> &DecodeError {
        let mut err = self;
        while let Self::Field { inner, .. } = err {
            err = inner;
        }
        err
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            Self::FramingViolation { .. } => ErrorKind::FramingViolation,
            Self::UnknownVariant { .. } => ErrorKind::UnknownVariant,
            Self::Truncated { .. } => ErrorKind::Truncated,
            Self::Field { inner, .. } => inner.kind(),
        }
    }

    /// Byte offset at which the innermost error was raised.
    pub fn offset(&self) -> usize {
        match self {
            Self::Parse { offset, .. }
            | Self::FramingViolation { offset, .. }
            | Self::UnknownVariant { offset, .. }
            | Self::Truncated { offset, .. } => *offset,
            Self::Field { inner, .. } => inner.offset(),
        }
    }

    /// Field names from the outermost to the innermost wrapper.
    pub fn breadcrumb(&self) -> Vec<&str> {
        let mut trail = Vec::new();
        let mut err = self;
        while let Self::Field { field, inner } = err {
            trail.push(field.as_ref());
            err = inner;
        }
        trail
    }

    /// Whether an optional field may treat this error as "field absent".
    ///
    /// Only malformed-shape and end-of-input failures qualify; framing
    /// violations and unknown variants always propagate.
    pub fn is_absence(&self) -> bool {
        matches!(self.kind(), ErrorKind::Parse | ErrorKind::Truncated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: i128, bits: u8 },
    #[error("invalid value: {0}")]
    InvalidValue(Cow<'static, str>),
    #[error("framing violation: {0}")]
    FramingViolation(Cow<'static, str>),
    #[error("{field}: {inner}")]
    Field {
        field: Cow<'static, str>,
        inner: Box<EncodeError>,
    },
}

impl EncodeError {
    pub fn invalid(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidValue(reason.into())
    }

    pub fn framing(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::FramingViolation(reason.into())
    }

    pub fn in_field(self, field: impl Into<Cow<'static, str>>) -> Self {
        Self::Field {
            field: field.into(),
            inner: Box::new(self),
        }
    }

    pub fn root(&self) -> &EncodeError {
        let mut err = self;
        while let Self::Field { inner, .. } = err {
            err = inner;
        }
        err
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::FramingViolation(_) => ErrorKind::FramingViolation,
            _ => ErrorKind::InvalidValue,
        }
    }

    pub fn breadcrumb(&self) -> Vec<&str> {
        let mut trail = Vec::new();
        let mut err = self;
        while let Self::Field { field, inner } = err {
            trail.push(field.as_ref());
            err = inner;
        }
        trail
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeError, EncodeError, ErrorKind};

    #[test]
    fn breadcrumb_follows_field_wrappers() {
        let err = DecodeError::framing(7, "closing tag 3 does not match expected 2")
            .in_field("closingTag")
            .in_field("ConstructedData");
        assert_eq!(err.kind(), ErrorKind::FramingViolation);
        assert_eq!(err.offset(), 7);
        assert_eq!(err.breadcrumb(), vec!["ConstructedData", "closingTag"]);
        assert_eq!(
            err.to_string(),
            "ConstructedData: closingTag: framing violation at byte 7: closing tag 3 does not match expected 2"
        );
    }

    #[test]
    fn only_parse_and_truncation_count_as_absence() {
        assert!(DecodeError::parse(0, "x").in_field("a").is_absence());
        assert!(DecodeError::Truncated {
            offset: 1,
            needed_bits: 8,
            available_bits: 0
        }
        .is_absence());
        assert!(!DecodeError::framing(0, "x").is_absence());
        assert!(!DecodeError::UnknownVariant {
            choice: "LogData",
            value: 9,
            offset: 0
        }
        .is_absence());
    }

    #[test]
    fn encode_error_kind_sees_through_fields() {
        let err = EncodeError::framing("pop of 'a' without push").in_field("Outer");
        assert_eq!(err.kind(), ErrorKind::FramingViolation);
        assert_eq!(err.breadcrumb(), vec!["Outer"]);
        assert_eq!(
            EncodeError::ValueOutOfRange { value: 16, bits: 4 }.kind(),
            ErrorKind::InvalidValue
        );
    }
}
