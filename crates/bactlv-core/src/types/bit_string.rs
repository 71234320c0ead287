use std::fmt;

/// A BACnet bit string.
///
/// The trailing padding bits are kept as read so that a decoded value
/// re-serializes exactly, even when a sender left non-zero padding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitString {
    data: Vec<bool>,
    unused: Vec<bool>,
}

impl BitString {
    /// Builds a bit string, padding the last octet with zero bits.
    pub fn new(data: Vec<bool>) -> Self {
        let unused = (8 - data.len() % 8) % 8;
        Self {
            data,
            unused: vec![false; unused],
        }
    }

    pub(crate) fn from_wire(data: Vec<bool>, unused: Vec<bool>) -> Self {
        Self { data, unused }
    }

    pub fn from_bits(bits: &[bool]) -> Self {
        Self::new(bits.to_vec())
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    pub fn unused(&self) -> &[bool] {
        &self.unused
    }

    pub fn unused_bits(&self) -> u8 {
        self.unused.len() as u8
    }

    pub fn bit(&self, index: usize) -> Option<bool> {
        self.data.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload length on the wire, including the unused-bit count octet.
    pub fn encoded_len(&self) -> u32 {
        (1 + (self.data.len() + self.unused.len()).div_ceil(8)) as u32
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, bit) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(if *bit { "T" } else { "F" })?;
        }
        f.write_str("}")
    }
}
