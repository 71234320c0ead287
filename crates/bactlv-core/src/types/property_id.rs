use std::fmt;

/// BACnet property identifiers.
///
/// Properties the crate has dedicated decoders for, plus a few common ones,
/// are named variants; any other identifier uses
/// [`Proprietary`](Self::Proprietary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyId {
    Description,
    ObjectIdentifier,
    ObjectList,
    ObjectName,
    ObjectType,
    PresentValue,
    PriorityArray,
    StatusFlags,
    VendorName,
    LogBuffer,
    Proprietary(u32),
}

impl PropertyId {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Description => 28,
            Self::ObjectIdentifier => 75,
            Self::ObjectList => 76,
            Self::ObjectName => 77,
            Self::ObjectType => 79,
            Self::PresentValue => 85,
            Self::PriorityArray => 87,
            Self::StatusFlags => 111,
            Self::VendorName => 121,
            Self::LogBuffer => 131,
            Self::Proprietary(v) => v,
        }
    }

    pub const fn from_u32(value: u32) -> Self {
        match value {
            28 => Self::Description,
            75 => Self::ObjectIdentifier,
            76 => Self::ObjectList,
            77 => Self::ObjectName,
            79 => Self::ObjectType,
            85 => Self::PresentValue,
            87 => Self::PriorityArray,
            111 => Self::StatusFlags,
            121 => Self::VendorName,
            131 => Self::LogBuffer,
            v => Self::Proprietary(v),
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proprietary(v) => write!(f, "property-{v}"),
            named => write!(f, "{named:?}"),
        }
    }
}
