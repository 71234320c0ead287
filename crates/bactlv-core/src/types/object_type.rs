use std::fmt;

macro_rules! object_types {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// BACnet object type identifiers.
        ///
        /// Known standard types are named variants; anything else, including
        /// vendor-specific types (128 and up), is kept as
        /// [`Proprietary`](Self::Proprietary).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum ObjectType {
            $($variant,)+
            Proprietary(u16),
        }

        impl ObjectType {
            pub const fn to_u16(self) -> u16 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Proprietary(v) => v,
                }
            }

            pub const fn from_u16(value: u16) -> Self {
                match value {
                    $($code => Self::$variant,)+
                    v => Self::Proprietary(v),
                }
            }

            /// Hyphenated BACnet name, `None` for unnamed codes.
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)+
                    Self::Proprietary(_) => None,
                }
            }
        }
    };
}

object_types! {
    AnalogInput = 0 => "analog-input",
    AnalogOutput = 1 => "analog-output",
    AnalogValue = 2 => "analog-value",
    BinaryInput = 3 => "binary-input",
    BinaryOutput = 4 => "binary-output",
    BinaryValue = 5 => "binary-value",
    Calendar = 6 => "calendar",
    Command = 7 => "command",
    Device = 8 => "device",
    EventEnrollment = 9 => "event-enrollment",
    File = 10 => "file",
    Group = 11 => "group",
    Loop = 12 => "loop",
    MultiStateInput = 13 => "multi-state-input",
    MultiStateOutput = 14 => "multi-state-output",
    NotificationClass = 15 => "notification-class",
    Program = 16 => "program",
    Schedule = 17 => "schedule",
    Averaging = 18 => "averaging",
    MultiStateValue = 19 => "multi-state-value",
    TrendLog = 20 => "trend-log",
    LifeSafetyPoint = 21 => "life-safety-point",
    LifeSafetyZone = 22 => "life-safety-zone",
    Accumulator = 23 => "accumulator",
    PulseConverter = 24 => "pulse-converter",
    EventLog = 25 => "event-log",
    GlobalGroup = 26 => "global-group",
    TrendLogMultiple = 27 => "trend-log-multiple",
    LoadControl = 28 => "load-control",
    StructuredView = 29 => "structured-view",
    AccessDoor = 30 => "access-door",
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "proprietary-{}", self.to_u16()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectType;

    #[test]
    fn codes_round_trip() {
        for code in 0u16..1024 {
            assert_eq!(ObjectType::from_u16(code).to_u16(), code);
        }
        assert_eq!(ObjectType::from_u16(2), ObjectType::AnalogValue);
        assert_eq!(ObjectType::from_u16(512).to_string(), "proprietary-512");
    }
}
