use std::borrow::Cow;
use std::fmt;

/// Character set of a BACnet character string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharacterEncoding {
    Utf8,
    MicrosoftDbcs,
    JisX0208,
    Ucs4,
    Ucs2,
    Iso8859_1,
    Other(u8),
}

impl CharacterEncoding {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Utf8 => 0,
            Self::MicrosoftDbcs => 1,
            Self::JisX0208 => 2,
            Self::Ucs4 => 3,
            Self::Ucs2 => 4,
            Self::Iso8859_1 => 5,
            Self::Other(v) => v,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Utf8,
            1 => Self::MicrosoftDbcs,
            2 => Self::JisX0208,
            3 => Self::Ucs4,
            4 => Self::Ucs2,
            5 => Self::Iso8859_1,
            v => Self::Other(v),
        }
    }
}

/// Encoding byte plus the undecoded character data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterString {
    encoding: CharacterEncoding,
    raw: Vec<u8>,
}

impl CharacterString {
    /// A UTF-8 string.
    pub fn new(text: &str) -> Self {
        Self {
            encoding: CharacterEncoding::Utf8,
            raw: text.as_bytes().to_vec(),
        }
    }

    pub fn with_encoding(encoding: CharacterEncoding, raw: Vec<u8>) -> Self {
        Self { encoding, raw }
    }

    pub const fn encoding(&self) -> CharacterEncoding {
        self.encoding
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Payload length on the wire, including the encoding octet.
    pub fn encoded_len(&self) -> u32 {
        (self.raw.len() + 1) as u32
    }

    /// The text, if this is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self.encoding {
            CharacterEncoding::Utf8 => std::str::from_utf8(&self.raw).ok(),
            _ => None,
        }
    }

    /// Best-effort text for display. Unsupported character sets fall back to
    /// a lossy UTF-8 reading.
    pub fn text(&self) -> Cow<'_, str> {
        match self.encoding {
            CharacterEncoding::Iso8859_1 => {
                Cow::Owned(self.raw.iter().map(|b| char::from(*b)).collect())
            }
            CharacterEncoding::Ucs2 => {
                let units = self
                    .raw
                    .chunks(2)
                    .map(|c| u16::from_be_bytes([c[0], c.get(1).copied().unwrap_or(0)]));
                Cow::Owned(
                    char::decode_utf16(units)
                        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                        .collect(),
                )
            }
            CharacterEncoding::Ucs4 => Cow::Owned(
                self.raw
                    .chunks(4)
                    .map(|c| {
                        let mut word = [0u8; 4];
                        word[..c.len()].copy_from_slice(c);
                        char::from_u32(u32::from_be_bytes(word))
                            .unwrap_or(char::REPLACEMENT_CHARACTER)
                    })
                    .collect(),
            ),
            _ => String::from_utf8_lossy(&self.raw),
        }
    }
}

impl From<&str> for CharacterString {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for CharacterString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::{CharacterEncoding, CharacterString};

    #[test]
    fn utf8_text() {
        let s = CharacterString::new("hello");
        assert_eq!(s.as_str(), Some("hello"));
        assert_eq!(s.encoded_len(), 6);
    }

    #[test]
    fn other_character_sets() {
        let latin = CharacterString::with_encoding(CharacterEncoding::Iso8859_1, vec![0x63, 0x61, 0x66, 0xE9]);
        assert_eq!(latin.as_str(), None);
        assert_eq!(latin.text(), "café");

        let ucs2 = CharacterString::with_encoding(CharacterEncoding::Ucs2, vec![0x00, 0x41, 0x00, 0x42]);
        assert_eq!(ucs2.to_string(), "AB");
        assert_eq!(CharacterEncoding::from_u8(9), CharacterEncoding::Other(9));
    }
}
