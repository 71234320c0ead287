pub mod bit_string;
pub mod character_string;
pub mod date_time;
pub mod error_code;
pub mod object_id;
pub mod object_type;
pub mod payload;
pub mod property_id;
pub mod tagged;

pub use bit_string::BitString;
pub use character_string::{CharacterEncoding, CharacterString};
pub use date_time::{Date, Time};
pub use error_code::{ErrorClass, ErrorCode};
pub use object_id::ObjectId;
pub use object_type::ObjectType;
pub use payload::{DataType, Payload};
pub use property_id::PropertyId;
pub use tagged::{ApplicationTag, ContextTag};
