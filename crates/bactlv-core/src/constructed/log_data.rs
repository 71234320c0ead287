use crate::constructed::ConstructedElement;
use crate::encoding::context_tag::{ClosingTag, Enclosed, OpeningTag};
use crate::encoding::decode_from_slice;
use crate::encoding::dispatch::{dispatch_on_peeked_tag, DispatchTable, VariantParser};
use crate::encoding::fields::{read_enclosed_array_field, read_simple_field, write_simple_field};
use crate::encoding::reader::ReadBuffer;
use crate::encoding::writer::{Encode, WriteBuffer};
use crate::types::{
    ApplicationTag, BitString, ContextTag, DataType, ErrorClass, ErrorCode, Payload,
};
use crate::{DecodeError, EncodeError};

/// Tag number of the failure bracket inside a log record.
const FAILURE_TAG: u8 = 7;
const ANY_VALUE_TAG: u8 = 8;
const LOG_DATA_TAG: u8 = 1;

/// Error class and code carried by a failed log record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorRecord {
    opening_tag: OpeningTag,
    error_class: ApplicationTag,
    error_code: ApplicationTag,
    closing_tag: ClosingTag,
}

impl ErrorRecord {
    pub fn new(error_class: ErrorClass, error_code: ErrorCode) -> Self {
        Self::from_raw(error_class.to_u32(), error_code.to_u32())
    }

    /// Builds a record from raw values, including proprietary ones.
    pub fn from_raw(error_class: u32, error_code: u32) -> Self {
        Self {
            opening_tag: OpeningTag::new(FAILURE_TAG),
            error_class: ApplicationTag::enumerated(error_class),
            error_code: ApplicationTag::enumerated(error_code),
            closing_tag: ClosingTag::new(FAILURE_TAG),
        }
    }

    pub fn decode(r: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
        let opening_tag = read_simple_field(r, "openingTag", |r| OpeningTag::decode(r, FAILURE_TAG))?;
        let error_class = read_simple_field(r, "errorClass", read_enumerated)?;
        let error_code = read_simple_field(r, "errorCode", read_enumerated)?;
        let closing_tag = read_simple_field(r, "closingTag", |r| ClosingTag::decode(r, FAILURE_TAG))?;
        Ok(Self {
            opening_tag,
            error_class,
            error_code,
            closing_tag,
        })
    }

    pub fn raw_error_class(&self) -> u32 {
        self.error_class.payload().as_enumerated().unwrap_or_default()
    }

    pub fn raw_error_code(&self) -> u32 {
        self.error_code.payload().as_enumerated().unwrap_or_default()
    }

    pub fn error_class(&self) -> Option<ErrorClass> {
        ErrorClass::from_u32(self.raw_error_class())
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u32(self.raw_error_code())
    }
}

fn read_enumerated(r: &mut ReadBuffer<'_>) -> Result<ApplicationTag, DecodeError> {
    let start = r.pos().byte_offset();
    let tag = ApplicationTag::decode(r)?;
    if tag.data_type() != DataType::Enumerated {
        return Err(DecodeError::parse(
            start,
            format!("expected Enumerated, found {:?}", tag.data_type()),
        ));
    }
    Ok(tag)
}

impl Encode for ErrorRecord {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("ErrorRecord")?;
        write_simple_field(w, "openingTag", &self.opening_tag)?;
        write_simple_field(w, "errorClass", &self.error_class)?;
        write_simple_field(w, "errorCode", &self.error_code)?;
        write_simple_field(w, "closingTag", &self.closing_tag)?;
        w.pop_context("ErrorRecord")
    }
}

/// One entry of a trend log record, chosen by its context tag number.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogRecordDatum {
    Boolean(ContextTag),
    Real(ContextTag),
    Enumerated(ContextTag),
    Unsigned(ContextTag),
    Signed(ContextTag),
    BitString(ContextTag),
    Null(ContextTag),
    Failure(ErrorRecord),
    AnyValue(Enclosed<ConstructedElement>),
}

macro_rules! context_datum {
    ($fn_name:ident, $variant:ident, $tag:literal, $data_type:ident) => {
        fn $fn_name(r: &mut ReadBuffer<'_>, _: &()) -> Result<LogRecordDatum, DecodeError> {
            read_simple_field(r, stringify!($variant), |r| {
                ContextTag::decode(r, $tag, DataType::$data_type)
            })
            .map(LogRecordDatum::$variant)
        }
    };
}

context_datum!(read_boolean_datum, Boolean, 0, Boolean);
context_datum!(read_real_datum, Real, 1, Real);
context_datum!(read_enumerated_datum, Enumerated, 2, Enumerated);
context_datum!(read_unsigned_datum, Unsigned, 3, Unsigned);
context_datum!(read_signed_datum, Signed, 4, Signed);
context_datum!(read_bit_string_datum, BitString, 5, BitString);
context_datum!(read_null_datum, Null, 6, Null);

fn read_failure_datum(r: &mut ReadBuffer<'_>, _: &()) -> Result<LogRecordDatum, DecodeError> {
    read_simple_field(r, "Failure", ErrorRecord::decode).map(LogRecordDatum::Failure)
}

fn read_any_value_datum(r: &mut ReadBuffer<'_>, _: &()) -> Result<LogRecordDatum, DecodeError> {
    read_enclosed_array_field(r, "AnyValue", ANY_VALUE_TAG, ConstructedElement::decode)
        .map(LogRecordDatum::AnyValue)
}

static LOG_RECORD_VARIANTS: [(u8, VariantParser<LogRecordDatum, ()>); 9] = [
    (0, read_boolean_datum),
    (1, read_real_datum),
    (2, read_enumerated_datum),
    (3, read_unsigned_datum),
    (4, read_signed_datum),
    (5, read_bit_string_datum),
    (6, read_null_datum),
    (FAILURE_TAG, read_failure_datum),
    (ANY_VALUE_TAG, read_any_value_datum),
];

static LOG_RECORD_DATA: DispatchTable<u8, LogRecordDatum, ()> =
    DispatchTable::new("LogRecordDatum", &LOG_RECORD_VARIANTS);

impl LogRecordDatum {
    pub fn decode(r: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
        dispatch_on_peeked_tag(r, &LOG_RECORD_DATA, &())
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean(ContextTag::new(0, Payload::Boolean(value)))
    }

    pub fn real(value: f32) -> Self {
        Self::Real(ContextTag::new(1, Payload::Real(value)))
    }

    pub fn enumerated(value: u32) -> Self {
        Self::Enumerated(ContextTag::new(2, Payload::Enumerated(value)))
    }

    pub fn unsigned(value: u64) -> Self {
        Self::Unsigned(ContextTag::new(3, Payload::Unsigned(value)))
    }

    pub fn signed(value: i64) -> Self {
        Self::Signed(ContextTag::new(4, Payload::Signed(value)))
    }

    pub fn bit_string(value: BitString) -> Self {
        Self::BitString(ContextTag::new(5, Payload::BitString(value)))
    }

    pub fn null() -> Self {
        Self::Null(ContextTag::new(6, Payload::Null))
    }

    pub fn failure(record: ErrorRecord) -> Self {
        Self::Failure(record)
    }

    pub fn any_value(elements: Vec<ConstructedElement>) -> Self {
        Self::AnyValue(Enclosed::new(ANY_VALUE_TAG, elements))
    }

    /// The primitive payload of the scalar variants.
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Boolean(tag)
            | Self::Real(tag)
            | Self::Enumerated(tag)
            | Self::Unsigned(tag)
            | Self::Signed(tag)
            | Self::BitString(tag)
            | Self::Null(tag) => Some(tag.payload()),
            Self::Failure(_) | Self::AnyValue(_) => None,
        }
    }
}

impl Encode for LogRecordDatum {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        match self {
            Self::Boolean(tag)
            | Self::Real(tag)
            | Self::Enumerated(tag)
            | Self::Unsigned(tag)
            | Self::Signed(tag)
            | Self::BitString(tag)
            | Self::Null(tag) => tag.encode(w),
            Self::Failure(record) => record.encode(w),
            Self::AnyValue(group) => {
                w.push_context("AnyValue")?;
                group.encode(w)?;
                w.pop_context("AnyValue")
            }
        }
    }
}

/// The body of a [`LogData`] record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogDataValue {
    /// `[0]` log status bit string.
    LogStatus(ContextTag),
    /// `[1]` bracketed list of data.
    LogData(Enclosed<LogRecordDatum>),
    /// `[2]` clock adjustment in seconds.
    TimeChange(ContextTag),
}

fn read_log_status(r: &mut ReadBuffer<'_>, _: &()) -> Result<LogDataValue, DecodeError> {
    read_simple_field(r, "logStatus", |r| ContextTag::decode(r, 0, DataType::BitString))
        .map(LogDataValue::LogStatus)
}

fn read_log_data(r: &mut ReadBuffer<'_>, _: &()) -> Result<LogDataValue, DecodeError> {
    read_enclosed_array_field(r, "logData", LOG_DATA_TAG, LogRecordDatum::decode)
        .map(LogDataValue::LogData)
}

fn read_time_change(r: &mut ReadBuffer<'_>, _: &()) -> Result<LogDataValue, DecodeError> {
    read_simple_field(r, "timeChange", |r| ContextTag::decode(r, 2, DataType::Real))
        .map(LogDataValue::TimeChange)
}

static LOG_DATA_VARIANTS: [(u8, VariantParser<LogDataValue, ()>); 3] = [
    (0, read_log_status),
    (LOG_DATA_TAG, read_log_data),
    (2, read_time_change),
];

static LOG_DATA_VALUES: DispatchTable<u8, LogDataValue, ()> =
    DispatchTable::new("LogData", &LOG_DATA_VARIANTS);

impl Encode for LogDataValue {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        match self {
            Self::LogStatus(tag) => write_simple_field(w, "logStatus", tag),
            Self::LogData(group) => write_simple_field(w, "logData", group),
            Self::TimeChange(tag) => write_simple_field(w, "timeChange", tag),
        }
    }
}

/// A trend log buffer entry's log-datum choice, bracketed by `tag_number`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogData {
    opening_tag: OpeningTag,
    value: LogDataValue,
    closing_tag: ClosingTag,
}

impl LogData {
    pub fn new(tag_number: u8, value: LogDataValue) -> Self {
        Self {
            opening_tag: OpeningTag::new(tag_number),
            value,
            closing_tag: ClosingTag::new(tag_number),
        }
    }

    pub fn log_status(tag_number: u8, status: BitString) -> Self {
        Self::new(
            tag_number,
            LogDataValue::LogStatus(ContextTag::new(0, Payload::BitString(status))),
        )
    }

    pub fn log_data(tag_number: u8, data: Vec<LogRecordDatum>) -> Self {
        Self::new(tag_number, LogDataValue::LogData(Enclosed::new(LOG_DATA_TAG, data)))
    }

    pub fn time_change(tag_number: u8, seconds: f32) -> Self {
        Self::new(
            tag_number,
            LogDataValue::TimeChange(ContextTag::new(2, Payload::Real(seconds))),
        )
    }

    pub fn decode(r: &mut ReadBuffer<'_>, tag_number: u8) -> Result<Self, DecodeError> {
        read_simple_field(r, "LogData", |r| {
            let opening_tag = read_simple_field(r, "openingTag", |r| OpeningTag::decode(r, tag_number))?;
            let value = dispatch_on_peeked_tag(r, &LOG_DATA_VALUES, &())?;
            let closing_tag = read_simple_field(r, "closingTag", |r| ClosingTag::decode(r, tag_number))?;
            Ok(Self {
                opening_tag,
                value,
                closing_tag,
            })
        })
    }

    pub fn parse(bytes: &[u8], tag_number: u8) -> Result<Self, DecodeError> {
        decode_from_slice(bytes, |r| Self::decode(r, tag_number))
    }

    pub const fn value(&self) -> &LogDataValue {
        &self.value
    }

    pub fn tag_number(&self) -> u8 {
        self.opening_tag.tag_number()
    }
}

impl Encode for LogData {
    fn encode(&self, w: &mut dyn WriteBuffer) -> Result<(), EncodeError> {
        w.push_context("LogData")?;
        write_simple_field(w, "openingTag", &self.opening_tag)?;
        self.value.encode(w)?;
        write_simple_field(w, "closingTag", &self.closing_tag)?;
        w.pop_context("LogData")
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorRecord, LogData, LogDataValue, LogRecordDatum};
    use crate::constructed::ConstructedElement;
    use crate::encoding::reader::ReadBuffer;
    use crate::encoding::writer::Encode;
    use crate::types::{ApplicationTag, BitString, ErrorClass, ErrorCode, Payload};
    use crate::{DecodeError, ErrorKind};

    #[test]
    fn log_status() {
        let bytes = [0x1E, 0x0A, 0x05, 0xA0, 0x1F];
        let log = LogData::parse(&bytes, 1).unwrap();
        assert_eq!(log, LogData::log_status(1, BitString::new(vec![true, false, true])));
        assert_eq!(log.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn log_data_list() {
        let bytes = [0x1E, 0x1E, 0x09, 0x01, 0x1C, 0x41, 0x20, 0x00, 0x00, 0x1F, 0x1F];
        let log = LogData::parse(&bytes, 1).unwrap();
        let LogDataValue::LogData(list) = log.value() else {
            panic!("expected a list, got {:?}", log.value());
        };
        assert_eq!(
            list.items(),
            &[LogRecordDatum::boolean(true), LogRecordDatum::real(10.0)]
        );
        assert_eq!(list.items()[1].payload(), Some(&Payload::Real(10.0)));
        assert_eq!(log.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn every_datum_kind_round_trips() {
        let data = vec![
            LogRecordDatum::boolean(false),
            LogRecordDatum::real(-1.5),
            LogRecordDatum::enumerated(3),
            LogRecordDatum::unsigned(70_000),
            LogRecordDatum::signed(-300),
            LogRecordDatum::bit_string(BitString::new(vec![true; 10])),
            LogRecordDatum::null(),
            LogRecordDatum::failure(ErrorRecord::new(ErrorClass::Device, ErrorCode::DeviceBusy)),
            LogRecordDatum::any_value(vec![ConstructedElement::from(ApplicationTag::unsigned(9))]),
        ];
        let log = LogData::log_data(4, data);
        let bytes = log.to_bytes().unwrap();
        assert_eq!(log.length_in_bytes(), bytes.len());
        assert_eq!(LogData::parse(&bytes, 4).unwrap(), log);
    }

    #[test]
    fn failure_record_names_class_and_code() {
        let bytes = [0x7E, 0x91, 0x05, 0x91, 0x1E, 0x7F];
        let mut r = ReadBuffer::new(&bytes);
        let LogRecordDatum::Failure(record) = LogRecordDatum::decode(&mut r).unwrap() else {
            panic!("expected a failure record");
        };
        assert_eq!(record.error_class(), Some(ErrorClass::Services));
        assert_eq!(record.error_code(), Some(ErrorCode::Timeout));
    }

    #[test]
    fn time_change() {
        let bytes = [0x1E, 0x2C, 0x3F, 0x80, 0x00, 0x00, 0x1F];
        let log = LogData::parse(&bytes, 1).unwrap();
        assert_eq!(log, LogData::time_change(1, 1.0));
    }

    #[test]
    fn unknown_choice_consumes_nothing_past_the_opening_tag() {
        let bytes = [0x1E, 0x3C, 0x3F, 0x80, 0x00, 0x00, 0x1F];
        let mut r = ReadBuffer::new(&bytes);
        let err = LogData::decode(&mut r, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVariant);
        assert_eq!(err.offset(), 1);
        assert!(matches!(
            err.root(),
            DecodeError::UnknownVariant { choice: "LogData", value: 3, .. }
        ));
        assert_eq!(r.pos().byte_offset(), 1);
    }

    #[test]
    fn log_data_list_without_its_closing_tag() {
        let bytes = [0x1E, 0x1E, 0x09, 0x01];
        let err = LogData::parse(&bytes, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FramingViolation);
    }
}
