use std::fmt;

/// Octet value meaning "any" in a date or time field.
pub const WILDCARD: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year_since_1900: u8,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl Date {
    pub const fn from_octets(octets: [u8; 4]) -> Self {
        Self {
            year_since_1900: octets[0],
            month: octets[1],
            day: octets[2],
            weekday: octets[3],
        }
    }

    pub const fn to_octets(self) -> [u8; 4] {
        [self.year_since_1900, self.month, self.day, self.weekday]
    }

    /// Calendar year, unless wildcarded.
    pub fn year(self) -> Option<u16> {
        (self.year_since_1900 != WILDCARD).then(|| 1900 + u16::from(self.year_since_1900))
    }
}

impl Time {
    pub const fn from_octets(octets: [u8; 4]) -> Self {
        Self {
            hour: octets[0],
            minute: octets[1],
            second: octets[2],
            hundredths: octets[3],
        }
    }

    pub const fn to_octets(self) -> [u8; 4] {
        [self.hour, self.minute, self.second, self.hundredths]
    }
}

struct Field(u8, usize);

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == WILDCARD {
            f.write_str("*")
        } else {
            write!(f, "{:0width$}", self.0, width = self.1)
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year() {
            Some(year) => write!(f, "{year}")?,
            None => f.write_str("*")?,
        }
        write!(f, "-{}-{}", Field(self.month, 2), Field(self.day, 2))?;
        if self.weekday != WILDCARD {
            write!(f, " ({})", self.weekday)?;
        }
        Ok(())
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}.{}",
            Field(self.hour, 2),
            Field(self.minute, 2),
            Field(self.second, 2),
            Field(self.hundredths, 2)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Date, Time};

    #[test]
    fn display_with_wildcards() {
        let d = Date::from_octets([124, 3, 9, 0xFF]);
        assert_eq!(d.to_string(), "2024-03-09");
        assert_eq!(Date::from_octets([0xFF, 0xFF, 1, 2]).to_string(), "*-*-01 (2)");
        assert_eq!(Time::from_octets([13, 5, 0xFF, 0]).to_string(), "13:05:*.00");
        assert_eq!(d.to_octets(), [124, 3, 9, 0xFF]);
    }
}
