//! Per-view attribute storage. A key is bound to either a stored value or a
//! computed getter/setter pair; registering one kind evicts the other. Reads
//! of unregistered keys produce the type's default instead of an error.

use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Empty,
    Float(f32),
    Int(i64),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_f32(&self) -> f32 {
        match self {
            FieldValue::Float(v) => *v,
            FieldValue::Int(v) => *v as f32,
            _ => 0.0,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            FieldValue::Int(v) => *v,
            FieldValue::Float(v) => *v as i64,
            _ => 0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FieldValue::Bool(v) => *v,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Text(v) => v.as_str(),
            _ => "",
        }
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

pub type FieldGetter = Arc<dyn Fn() -> FieldValue + Send + Sync>;
pub type FieldSetter = Arc<dyn Fn(FieldValue) + Send + Sync>;

pub(crate) enum FieldSlot {
    Stored(FieldValue),
    Indirect { get: FieldGetter, set: FieldSetter },
}

#[derive(Default)]
pub(crate) struct FieldMap {
    slots: HashMap<String, FieldSlot>,
}

impl FieldMap {
    /// Binds `key` to a stored value, evicting any indirection.
    pub(crate) fn register(&mut self, key: &str, value: FieldValue) {
        self.slots.insert(key.to_string(), FieldSlot::Stored(value));
    }

    /// Binds `key` to a getter/setter pair, evicting any stored value.
    /// A missing setter becomes a no-op that discards writes.
    pub(crate) fn register_ref(&mut self, key: &str, get: FieldGetter, set: Option<FieldSetter>) {
        let set = set.unwrap_or_else(|| Arc::new(|_| {}));
        self.slots
            .insert(key.to_string(), FieldSlot::Indirect { get, set });
    }

    pub(crate) fn slot(&self, key: &str) -> Option<&FieldSlot> {
        self.slots.get(key)
    }

    pub(crate) fn slot_mut(&mut self, key: &str) -> Option<&mut FieldSlot> {
        self.slots.get_mut(key)
    }
}
