use crate::types::ObjectType;
use std::fmt;

/// A packed BACnet object identifier combining an [`ObjectType`] and a 22-bit
/// instance number into a single `u32`.
///
/// The upper 10 bits encode the object type and the lower 22 bits encode the
/// instance number, matching the BACnet wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(u32);

impl ObjectId {
    /// Largest instance number; also the "unconfigured" sentinel.
    pub const MAX_INSTANCE: u32 = 0x3F_FFFF;

    /// Creates an `ObjectId` from a type and instance number.
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        Self::from_parts(object_type.to_u16(), instance)
    }

    /// Packs a raw 10-bit type and 22-bit instance. Excess bits are dropped.
    pub const fn from_parts(object_type: u16, instance: u32) -> Self {
        Self((((object_type as u32) & 0x03FF) << 22) | (instance & Self::MAX_INSTANCE))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw 10-bit object type field.
    pub const fn type_code(self) -> u16 {
        ((self.0 >> 22) & 0x03FF) as u16
    }

    pub const fn object_type(self) -> ObjectType {
        ObjectType::from_u16(self.type_code())
    }

    pub const fn instance(self) -> u32 {
        self.0 & Self::MAX_INSTANCE
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.object_type(), self.instance())
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectId;
    use crate::types::ObjectType;

    #[test]
    fn packs_type_and_instance() {
        let id = ObjectId::new(ObjectType::AnalogInput, 1);
        assert_eq!(id.object_type(), ObjectType::AnalogInput);
        assert_eq!(id.instance(), 1);
        assert_eq!(ObjectId::new(ObjectType::Device, 5).raw(), 0x0200_0005);
        assert_eq!(ObjectId::from_parts(8, 5).to_string(), "device,5");
    }
}
