use crate::encoding::reader::BitPosition;
use crate::encoding::writer::{check_unsigned, signed_bits, ContextStack, WriteBuffer};
use crate::EncodeError;
use serde_json::{json, Map, Value};
use std::fmt;

/// Renders every written field as JSON.
///
/// Each context becomes an object keyed by its name. Each leaf becomes
/// `{ "value", "bitLength", "dataType" }`, so the output can be checked
/// against the wire field by field. Virtual fields appear with a zero bit
/// length and the `virtual` data type. A name written twice in the same
/// context collects its entries into an array, in write order.
#[derive(Debug, Default)]
pub struct JsonWriter {
    pos: usize,
    frames: Vec<(String, Map<String, Value>)>,
    root: Map<String, Value>,
    contexts: ContextStack,
}

fn insert(map: &mut Map<String, Value>, name: &str, value: Value) {
    match map.get_mut(name) {
        None => {
            map.insert(name.to_owned(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

fn hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(2 + data.len() * 2);
    out.push_str("0x");
    for b in data {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut Map<String, Value> {
        match self.frames.last_mut() {
            Some((_, map)) => map,
            None => &mut self.root,
        }
    }

    fn leaf(&mut self, name: &str, value: Value, bits: usize, data_type: &str) {
        let entry = json!({
            "value": value,
            "bitLength": bits,
            "dataType": data_type,
        });
        insert(self.current(), name, entry);
        self.pos += bits;
    }

    /// Finishes the write, failing if any context is still open.
    pub fn into_value(self) -> Result<Value, EncodeError> {
        self.contexts.finish()?;
        Ok(Value::Object(self.root))
    }

    /// Finishes the write and pretty-prints the result.
    pub fn into_string(self) -> Result<String, EncodeError> {
        let value = self.into_value()?;
        serde_json::to_string_pretty(&value).map_err(|e| EncodeError::invalid(e.to_string()))
    }
}

impl WriteBuffer for JsonWriter {
    fn pos(&self) -> BitPosition {
        BitPosition::from_bits(self.pos)
    }

    fn write_bit(&mut self, name: &str, value: bool) -> Result<(), EncodeError> {
        self.leaf(name, Value::Bool(value), 1, "bit");
        Ok(())
    }

    fn write_unsigned(&mut self, name: &str, bits: u8, value: u64) -> Result<(), EncodeError> {
        check_unsigned(bits, value)?;
        self.leaf(name, Value::from(value), bits as usize, "uint");
        Ok(())
    }

    fn write_signed(&mut self, name: &str, bits: u8, value: i64) -> Result<(), EncodeError> {
        signed_bits(bits, value)?;
        self.leaf(name, Value::from(value), bits as usize, "int");
        Ok(())
    }

    fn write_bytes(&mut self, name: &str, data: &[u8]) -> Result<(), EncodeError> {
        self.leaf(name, Value::String(hex(data)), data.len() * 8, "byte[]");
        Ok(())
    }

    fn write_virtual(&mut self, name: &str, value: &dyn fmt::Display) -> Result<(), EncodeError> {
        let entry = json!({
            "value": value.to_string(),
            "bitLength": 0,
            "dataType": "virtual",
        });
        insert(self.current(), name, entry);
        Ok(())
    }

    fn push_context(&mut self, name: &str) -> Result<(), EncodeError> {
        self.contexts.push(name);
        self.frames.push((name.to_owned(), Map::new()));
        Ok(())
    }

    fn pop_context(&mut self, name: &str) -> Result<(), EncodeError> {
        self.contexts.pop(name)?;
        let Some((frame_name, map)) = self.frames.pop() else {
            return Err(EncodeError::framing(format!(
                "popping context '{name}' with no open object"
            )));
        };
        insert(self.current(), &frame_name, Value::Object(map));
        Ok(())
    }
}
