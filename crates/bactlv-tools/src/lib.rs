use bactlv_core::constructed::{LogData, PropertyValue};
use bactlv_core::encoding::boxed::BoxOptions;
use bactlv_core::encoding::reader::ReadBuffer;
use bactlv_core::encoding::tag::TagHeader;
use bactlv_core::encoding::writer::Encode;
use bactlv_core::types::{ApplicationTag, ObjectType};
use bactlv_core::{DecodeError, EncodeError};
use clap::ValueEnum;
use std::fmt::Write as _;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid hex input: {0}")]
    Hex(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("formatting output failed: {0}")]
    Format(String),
}

/// CLI-friendly enum for selecting BACnet object types.
///
/// Maps human-readable names to [`ObjectType`] variants for use with clap argument parsing.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ObjectTypeArg {
    AnalogInput,
    AnalogOutput,
    AnalogValue,
    BinaryInput,
    BinaryOutput,
    BinaryValue,
    Calendar,
    Device,
    EventEnrollment,
    File,
    NotificationClass,
    Schedule,
    TrendLog,
    MultiStateInput,
    MultiStateOutput,
    MultiStateValue,
}

impl ObjectTypeArg {
    /// Convert to the core [`ObjectType`] representation.
    pub const fn into_object_type(self) -> ObjectType {
        match self {
            Self::AnalogInput => ObjectType::AnalogInput,
            Self::AnalogOutput => ObjectType::AnalogOutput,
            Self::AnalogValue => ObjectType::AnalogValue,
            Self::BinaryInput => ObjectType::BinaryInput,
            Self::BinaryOutput => ObjectType::BinaryOutput,
            Self::BinaryValue => ObjectType::BinaryValue,
            Self::Calendar => ObjectType::Calendar,
            Self::Device => ObjectType::Device,
            Self::EventEnrollment => ObjectType::EventEnrollment,
            Self::File => ObjectType::File,
            Self::NotificationClass => ObjectType::NotificationClass,
            Self::Schedule => ObjectType::Schedule,
            Self::TrendLog => ObjectType::TrendLog,
            Self::MultiStateInput => ObjectType::MultiStateInput,
            Self::MultiStateOutput => ObjectType::MultiStateOutput,
            Self::MultiStateValue => ObjectType::MultiStateValue,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Boxed,
    Debug,
    /// The decoded value tree.
    Json,
    /// Every wire field with its bit length and data type.
    Fields,
}

/// What the input bytes hold.
#[derive(Debug, Clone, Copy)]
pub enum DecodeTarget {
    /// Application-tagged values back to back.
    Application,
    /// A property value list entry of the given object type.
    PropertyValue(ObjectType),
    /// A log-datum choice bracketed by the given tag number.
    LogData(u8),
}

/// Parses hex text, ignoring whitespace, `0x` prefixes and `#` comments.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, ToolError> {
    let mut digits = String::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default();
        for token in line.split(|c: char| c.is_whitespace() || c == ',' || c == ':') {
            let token = token.trim_start_matches("0x").trim_start_matches("0X");
            digits.push_str(token);
        }
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ToolError::Hex(format!("'{bad}' is not a hex digit")));
    }
    if digits.len() % 2 != 0 {
        return Err(ToolError::Hex(format!("odd number of hex digits ({})", digits.len())));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| ToolError::Hex(e.to_string()))
        })
        .collect()
}

fn render<T>(value: &T, format: OutputFormat, options: &BoxOptions) -> Result<String, ToolError>
where
    T: Encode + std::fmt::Debug + serde::Serialize,
{
    Ok(match format {
        OutputFormat::Boxed => value.render_boxed_with(*options)?,
        OutputFormat::Debug => format!("{value:#?}"),
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Fields => value.render_json()?,
    })
}

/// Decodes `bytes` as `target` and renders the result.
pub fn dump(
    bytes: &[u8],
    target: DecodeTarget,
    format: OutputFormat,
    options: &BoxOptions,
) -> Result<String, ToolError> {
    log::debug!("decoding {} bytes as {target:?}", bytes.len());
    match target {
        DecodeTarget::Application => {
            let mut r = ReadBuffer::new(bytes);
            let mut values = Vec::new();
            while !r.is_empty() {
                values.push(ApplicationTag::decode(&mut r)?);
            }
            r.finish()?;
            match format {
                OutputFormat::Json => Ok(serde_json::to_string_pretty(&values)?),
                OutputFormat::Fields => {
                    let mut fields = Vec::with_capacity(values.len());
                    for value in &values {
                        fields.push(value.render_json_value()?);
                    }
                    Ok(serde_json::to_string_pretty(&fields)?)
                }
                _ => {
                    let mut out = Vec::with_capacity(values.len());
                    for value in &values {
                        out.push(render(value, format, options)?);
                    }
                    Ok(out.join("\n"))
                }
            }
        }
        DecodeTarget::PropertyValue(object_type) => {
            render(&PropertyValue::parse(bytes, object_type)?, format, options)
        }
        DecodeTarget::LogData(tag_number) => {
            render(&LogData::parse(bytes, tag_number)?, format, options)
        }
    }
}

/// Walks raw tag headers, one line per header with its byte offset.
///
/// Payload octets are skipped; opening and closing tags indent the listing.
pub fn scan(bytes: &[u8]) -> Result<String, ToolError> {
    let mut r = ReadBuffer::new(bytes);
    let mut out = String::new();
    let mut depth = 0usize;
    while !r.is_empty() {
        let offset = r.pos().byte_offset();
        let header = TagHeader::decode(&mut r)?;
        if header.is_closing_tag() {
            depth = depth.saturating_sub(1);
        }
        let class = if header.is_context() { "context" } else { "application" };
        let shape = if header.is_opening_tag() {
            "open".to_owned()
        } else if header.is_closing_tag() {
            "close".to_owned()
        } else if header.is_boolean() {
            format!("value {}", header.boolean_value())
        } else {
            format!("len {}", header.actual_length())
        };
        writeln!(
            out,
            "{offset:>5}  {:indent$}{class} [{}] {shape}",
            "",
            header.actual_tag_number(),
            indent = depth * 2
        )
        .map_err(|e| ToolError::Format(e.to_string()))?;
        if header.is_opening_tag() {
            depth += 1;
        }
        r.skip_bytes(header.actual_length() as usize)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{dump, parse_hex, scan, DecodeTarget, OutputFormat};
    use bactlv_core::encoding::boxed::BoxOptions;
    use bactlv_core::types::ObjectType;

    #[test]
    fn hex_input_tolerates_separators_and_comments() {
        assert_eq!(
            parse_hex("0x09 55, 2E:44 # present value\n42910000").unwrap(),
            vec![0x09, 0x55, 0x2E, 0x44, 0x42, 0x91, 0x00, 0x00]
        );
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn dumps_property_values_as_json() {
        let bytes = parse_hex("09 55 2E 44 42 91 00 00 2F 39 08").unwrap();
        let json = dump(
            &bytes,
            DecodeTarget::PropertyValue(ObjectType::AnalogValue),
            OutputFormat::Json,
            &BoxOptions::default(),
        )
        .unwrap();
        assert!(json.contains("AnalogPresentValue"));
    }

    #[test]
    fn dumps_wire_fields_with_bit_lengths() {
        let bytes = parse_hex("09 55 2E 44 42 91 00 00 2F 39 08").unwrap();
        let fields = dump(
            &bytes,
            DecodeTarget::PropertyValue(ObjectType::AnalogValue),
            OutputFormat::Fields,
            &BoxOptions::default(),
        )
        .unwrap();
        assert!(fields.contains("\"bitLength\""));
        assert!(fields.contains("\"PropertyValue\""));

        let app = dump(
            &parse_hex("21 05 91 01").unwrap(),
            DecodeTarget::Application,
            OutputFormat::Fields,
            &BoxOptions::default(),
        )
        .unwrap();
        assert!(app.trim_start().starts_with('['));
    }

    #[test]
    fn scan_lists_headers_with_offsets() {
        let bytes = parse_hex("1E 1E 09 01 1F 1F").unwrap();
        let listing = scan(&bytes).unwrap();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("context [1] open"));
        assert!(lines[2].starts_with("    2"));
        assert!(lines[2].contains("context [0] len 1"));
    }
}
