//! BACnet tag-length-value runtime in pure Rust.
//!
//! `bactlv-core` provides the substrate that constructed-data decoders are
//! written against: a bit-precision [`ReadBuffer`](encoding::reader::ReadBuffer),
//! the [`WriteBuffer`](encoding::writer::WriteBuffer) trait with byte, length
//! and diagnostic implementations, the tag header codec, opening/closing
//! context tags, field combinators and static variant dispatch tables.
//! Values decoded from a buffer re-serialize to the same bytes.
//!
//! A few hand-written consumers (`ConstructedData`, `LogData`,
//! `PropertyValue`) exercise the runtime end to end.
//!
//! # Feature flags
//!
//! - **`serde`**: derives `Serialize`/`Deserialize` on value types.
//! - **`json`**: adds [`JsonWriter`](encoding::json::JsonWriter), a field-level
//!   JSON rendering with bit lengths and data types.

/// Hand-written constructed-data consumers.
pub mod constructed;
/// Buffers, tag headers, field combinators and dispatch.
pub mod encoding;
/// Error types for encoding and decoding operations.
pub mod error;
/// Primitive BACnet data types and tagged values.
pub mod types;

pub use error::{DecodeError, EncodeError, ErrorKind};
