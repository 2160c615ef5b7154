//! Managed object heap inspected by the immutability verifier.
//!
//! Models the parts of the host object model that structural integrity
//! checks depend on:
//!
//! - **Property descriptors**: data slots with writable/enumerable/configurable
//! - **Object kinds**: ordinary records, arrays, maps, sets, dates
//! - **Integrity levels**: preventExtensions, seal, freeze and their queries
//!
//! Objects live in an arena and are addressed by `ObjectHandle`. A handle is
//! the object's identity: two structurally equal objects have distinct handles.
//!
//! Maps, sets and dates keep their payload in internal slots, so freezing them
//! locks their own properties but not their entries or time value.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serialize/deserialize `BTreeMap<PropertyKey, PropertyDescriptor>` as a
/// sequence of `[key, descriptor]` pairs, since JSON maps need string keys.
mod properties_as_seq {
    use super::{BTreeMap, PropertyDescriptor, PropertyKey};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<PropertyKey, PropertyDescriptor>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&PropertyKey, &PropertyDescriptor)> = map.iter().collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<PropertyKey, PropertyDescriptor>, D::Error> {
        let pairs: Vec<(PropertyKey, PropertyDescriptor)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

const LENGTH_KEY: &str = "length";

// ---------------------------------------------------------------------------
// PropertyKey — string or symbol
// ---------------------------------------------------------------------------

/// Unique symbol identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// A property key: either a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    /// String key.
    String(String),
    /// Symbol key. Never enumerated as a record field.
    Symbol(SymbolId),
}

impl PropertyKey {
    /// Canonical array index (`"0"`, `"17"`, never `"01"` or `"4294967295"`).
    pub fn as_array_index(&self) -> Option<u32> {
        let Self::String(s) = self else {
            return None;
        };
        let index = s.parse::<u32>().ok()?;
        if index == u32::MAX || index.to_string() != *s {
            return None;
        }
        Some(index)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({})", id.0),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        Self::String(index.to_string())
    }
}

// ---------------------------------------------------------------------------
// ObjectHandle — typed reference to heap objects
// ---------------------------------------------------------------------------

/// Opaque handle referencing an object on the managed heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// JsValue — runtime value
// ---------------------------------------------------------------------------

/// Runtime value stored in properties, array slots and map/set entries.
///
/// Only `Object` refers to heap state; every other variant is a primitive.
/// `Function` is an opaque callable reference and is treated as a primitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Symbol(SymbolId),
    Object(ObjectHandle),
    Function(u32),
}

impl JsValue {
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Self::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    /// SameValue comparison. Objects compare by handle.
    pub fn same_value(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({})", id.0),
            Self::Object(h) => write!(f, "[object#{}]", h.0),
            Self::Function(idx) => write!(f, "[function#{idx}]"),
        }
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for JsValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<ObjectHandle> for JsValue {
    fn from(handle: ObjectHandle) -> Self {
        Self::Object(handle)
    }
}

// ---------------------------------------------------------------------------
// PropertyDescriptor
// ---------------------------------------------------------------------------

/// Data property descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Default data descriptor (writable, enumerable, configurable).
    pub fn data(value: JsValue) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable, non-enumerable, non-configurable. Used for array `length`.
    pub fn internal(value: JsValue) -> Self {
        Self {
            value,
            writable: true,
            enumerable: false,
            configurable: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectError
// ---------------------------------------------------------------------------

/// Errors from object model operations.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ObjectError {
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("{0} not found")]
    ObjectNotFound(ObjectHandle),
}

// ---------------------------------------------------------------------------
// ObjectKind — internal slots that decide iteration semantics
// ---------------------------------------------------------------------------

/// Which built-in an object is, together with its internal slot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Plain keyed record.
    Ordinary,
    /// Elements are integer-keyed own properties plus a `length` property.
    Array,
    /// `[[MapData]]`: insertion-ordered entries with unique keys.
    Map { entries: Vec<(JsValue, JsValue)> },
    /// `[[SetData]]`: insertion-ordered unique items.
    Set { items: Vec<JsValue> },
    /// `[[DateValue]]`.
    Date { time: DateTime<Utc> },
}

// ---------------------------------------------------------------------------
// HeapObject
// ---------------------------------------------------------------------------

/// An object with its `[[Extensible]]` slot, own properties and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapObject {
    /// `[[Extensible]]` internal slot.
    pub extensible: bool,
    #[serde(with = "properties_as_seq")]
    properties: BTreeMap<PropertyKey, PropertyDescriptor>,
    /// Creation order of own keys, for enumeration.
    key_order: Vec<PropertyKey>,
    pub kind: ObjectKind,
}

impl HeapObject {
    /// Create an extensible object of the given kind with no properties.
    pub fn new(kind: ObjectKind) -> Self {
        let mut object = Self {
            extensible: true,
            properties: BTreeMap::new(),
            key_order: Vec::new(),
            kind,
        };
        if object.is_array() {
            object.define_own_property(
                LENGTH_KEY.into(),
                PropertyDescriptor::internal(JsValue::Int(0)),
            );
        }
        object
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array)
    }

    /// Own property descriptor for `key`.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    /// Number of own properties, including non-enumerable ones.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// `[[DefineOwnProperty]](P, Desc)`.
    ///
    /// Returns `false` when the definition would break a non-configurable
    /// property or add a key to a non-extensible object.
    pub fn define_own_property(&mut self, key: PropertyKey, desc: PropertyDescriptor) -> bool {
        if let Some(current) = self.properties.get(&key) {
            if !current.configurable {
                if desc.configurable || desc.enumerable != current.enumerable {
                    return false;
                }
                if !current.writable && (desc.writable || !current.value.same_value(&desc.value))
                {
                    return false;
                }
            }
            self.properties.insert(key, desc);
            true
        } else {
            if !self.extensible {
                return false;
            }
            self.key_order.push(key.clone());
            self.properties.insert(key, desc);
            true
        }
    }

    /// `[[Delete]](P)`. Returns `false` if the property is non-configurable.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.properties.get(key) {
            Some(desc) if !desc.configurable => return false,
            Some(_) => {}
            None => return true,
        }
        self.properties.remove(key);
        self.key_order.retain(|k| k != key);
        true
    }

    /// `[[OwnPropertyKeys]]()`: integer indices ascending, then string keys
    /// in creation order, then symbols in creation order.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut int_keys: Vec<(u32, PropertyKey)> = Vec::new();
        let mut str_keys: Vec<PropertyKey> = Vec::new();
        let mut sym_keys: Vec<PropertyKey> = Vec::new();

        for key in &self.key_order {
            match key {
                PropertyKey::String(_) => match key.as_array_index() {
                    Some(n) => int_keys.push((n, key.clone())),
                    None => str_keys.push(key.clone()),
                },
                PropertyKey::Symbol(_) => sym_keys.push(key.clone()),
            }
        }

        int_keys.sort_by_key(|(n, _)| *n);
        let mut result: Vec<PropertyKey> = int_keys.into_iter().map(|(_, k)| k).collect();
        result.extend(str_keys);
        result.extend(sym_keys);
        result
    }

    /// `Object.entries` view: own enumerable string-keyed data properties.
    pub fn own_enumerable_entries(&self) -> Vec<(String, JsValue)> {
        self.own_property_keys()
            .into_iter()
            .filter_map(|key| {
                let desc = self.properties.get(&key)?;
                match key {
                    PropertyKey::String(name) if desc.enumerable => {
                        Some((name, desc.value.clone()))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Current array length; zero for non-arrays.
    pub fn array_length(&self) -> u32 {
        match self.properties.get(&PropertyKey::from(LENGTH_KEY)) {
            Some(PropertyDescriptor {
                value: JsValue::Int(n),
                ..
            }) if self.is_array() => u32::try_from(*n).unwrap_or(0),
            _ => 0,
        }
    }

    /// Present array elements as `(index, value)` by ascending index.
    ///
    /// Holes are skipped, so the cost follows the number of stored elements
    /// rather than `length`.
    pub fn array_entries(&self) -> Vec<(u32, &JsValue)> {
        if !self.is_array() {
            return Vec::new();
        }
        let mut entries: Vec<(u32, &JsValue)> = self
            .properties
            .iter()
            .filter_map(|(key, desc)| Some((key.as_array_index()?, &desc.value)))
            .collect();
        entries.sort_by_key(|(index, _)| *index);
        entries
    }

    fn length_writable(&self) -> bool {
        self.properties
            .get(&PropertyKey::from(LENGTH_KEY))
            .is_some_and(|desc| desc.writable)
    }

    fn set_array_length(&mut self, len: u32) {
        if let Some(desc) = self.properties.get_mut(&PropertyKey::from(LENGTH_KEY)) {
            desc.value = JsValue::Int(i64::from(len));
        }
    }

    // -- Integrity levels ---------------------------------------------------

    /// `[[PreventExtensions]]()`.
    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    /// `Object.freeze` semantics: non-extensible, every own property
    /// non-configurable and non-writable.
    pub fn freeze(&mut self) {
        self.extensible = false;
        for desc in self.properties.values_mut() {
            desc.configurable = false;
            desc.writable = false;
        }
    }

    /// `Object.seal` semantics: non-extensible, every own property
    /// non-configurable, writability unchanged.
    pub fn seal(&mut self) {
        self.extensible = false;
        for desc in self.properties.values_mut() {
            desc.configurable = false;
        }
    }

    /// `Object.isFrozen`.
    pub fn is_frozen(&self) -> bool {
        !self.extensible
            && self
                .properties
                .values()
                .all(|d| !d.configurable && !d.writable)
    }

    /// `Object.isSealed`.
    pub fn is_sealed(&self) -> bool {
        !self.extensible && self.properties.values().all(|d| !d.configurable)
    }
}

// ---------------------------------------------------------------------------
// JsonFreeze — freeze policy for JSON loading
// ---------------------------------------------------------------------------

/// Whether objects allocated from JSON are frozen after population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonFreeze {
    None,
    Deep,
}

// ---------------------------------------------------------------------------
// ObjectHeap — the managed object store
// ---------------------------------------------------------------------------

/// The object heap: arena of objects addressed by `ObjectHandle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHeap {
    objects: Vec<HeapObject>,
}

impl ObjectHeap {
    /// Create a new empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty object of the given kind.
    pub fn alloc(&mut self, kind: ObjectKind) -> Result<ObjectHandle, ObjectError> {
        let index = u32::try_from(self.objects.len()).map_err(|_| {
            ObjectError::RangeError(format!("heap is full at {} objects", self.objects.len()))
        })?;
        self.objects.push(HeapObject::new(kind));
        Ok(ObjectHandle(index))
    }

    /// Allocate an empty plain record.
    pub fn alloc_plain(&mut self) -> Result<ObjectHandle, ObjectError> {
        self.alloc(ObjectKind::Ordinary)
    }

    /// Allocate a plain record with the given fields, in order.
    pub fn alloc_record<K, I>(&mut self, fields: I) -> Result<ObjectHandle, ObjectError>
    where
        K: Into<PropertyKey>,
        I: IntoIterator<Item = (K, JsValue)>,
    {
        let handle = self.alloc_plain()?;
        let object = self.get_mut(handle)?;
        for (key, value) in fields {
            object.define_own_property(key.into(), PropertyDescriptor::data(value));
        }
        Ok(handle)
    }

    /// Allocate an array holding `elements`.
    pub fn alloc_array(&mut self, elements: Vec<JsValue>) -> Result<ObjectHandle, ObjectError> {
        let len = u32::try_from(elements.len())
            .ok()
            .filter(|len| *len < u32::MAX)
            .ok_or_else(|| {
                ObjectError::RangeError(format!("invalid array length {}", elements.len()))
            })?;
        let handle = self.alloc(ObjectKind::Array)?;
        let object = self.get_mut(handle)?;
        for (index, value) in (0u32..).zip(elements) {
            object.define_own_property(index.into(), PropertyDescriptor::data(value));
        }
        object.set_array_length(len);
        Ok(handle)
    }

    /// Allocate a map; later duplicates of a key overwrite the earlier value
    /// in place.
    pub fn alloc_map(
        &mut self,
        entries: Vec<(JsValue, JsValue)>,
    ) -> Result<ObjectHandle, ObjectError> {
        let mut unique: Vec<(JsValue, JsValue)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            upsert_entry(&mut unique, key, value);
        }
        self.alloc(ObjectKind::Map { entries: unique })
    }

    /// Allocate a set; duplicate items are dropped.
    pub fn alloc_set(&mut self, items: Vec<JsValue>) -> Result<ObjectHandle, ObjectError> {
        let mut unique: Vec<JsValue> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|existing| existing.same_value(&item)) {
                unique.push(item);
            }
        }
        self.alloc(ObjectKind::Set { items: unique })
    }

    /// Allocate a date holding `time`.
    pub fn alloc_date(&mut self, time: DateTime<Utc>) -> Result<ObjectHandle, ObjectError> {
        self.alloc(ObjectKind::Date { time })
    }

    /// Build a value graph from JSON.
    ///
    /// Objects become plain records, arrays become arrays. Numbers must be
    /// integers representable as `i64`.
    pub fn alloc_json(
        &mut self,
        json: &serde_json::Value,
        freeze: JsonFreeze,
    ) -> Result<JsValue, ObjectError> {
        use serde_json::Value;

        let handle = match json {
            Value::Null => return Ok(JsValue::Null),
            Value::Bool(b) => return Ok(JsValue::Bool(*b)),
            Value::Number(n) => {
                return n.as_i64().map(JsValue::Int).ok_or_else(|| {
                    ObjectError::TypeError(format!("number {n} is not an i64 integer"))
                });
            }
            Value::String(s) => return Ok(JsValue::Str(s.clone())),
            Value::Array(items) => {
                let elements = items
                    .iter()
                    .map(|item| self.alloc_json(item, freeze))
                    .collect::<Result<Vec<_>, _>>()?;
                self.alloc_array(elements)?
            }
            Value::Object(map) => {
                let mut fields = Vec::with_capacity(map.len());
                for (key, value) in map {
                    fields.push((key.as_str(), self.alloc_json(value, freeze)?));
                }
                self.alloc_record(fields)?
            }
        };
        if freeze == JsonFreeze::Deep {
            self.freeze(handle)?;
        }
        Ok(JsValue::Object(handle))
    }

    /// Get a reference to an object.
    pub fn get(&self, handle: ObjectHandle) -> Result<&HeapObject, ObjectError> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    /// Get a mutable reference to an object.
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut HeapObject, ObjectError> {
        self.objects
            .get_mut(handle.0 as usize)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    /// Number of objects allocated.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Is the heap empty?
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // -- Properties ---------------------------------------------------------

    /// `[[Get]](O, P)` on own properties; missing keys read as `Undefined`.
    pub fn get_property(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<JsValue, ObjectError> {
        Ok(self
            .get(handle)?
            .get_own_property(key)
            .map_or(JsValue::Undefined, |desc| desc.value.clone()))
    }

    /// `[[Set]](O, P, V)`. Returns `Ok(false)` when the write is rejected by
    /// a non-writable property or a non-extensible object.
    pub fn set_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        value: JsValue,
    ) -> Result<bool, ObjectError> {
        let object = self.get_mut(handle)?;
        if object.is_array() && key == PropertyKey::from(LENGTH_KEY) {
            return Err(ObjectError::TypeError(
                "array length is maintained by element writes".to_string(),
            ));
        }

        if let Some(desc) = object.properties.get_mut(&key) {
            if !desc.writable {
                return Ok(false);
            }
            desc.value = value;
            return Ok(true);
        }

        let grows_to = match key.as_array_index() {
            Some(index) if object.is_array() && index >= object.array_length() => {
                if !object.length_writable() {
                    return Ok(false);
                }
                Some(index + 1)
            }
            _ => None,
        };
        if !object.define_own_property(key, PropertyDescriptor::data(value)) {
            return Ok(false);
        }
        if let Some(len) = grows_to {
            object.set_array_length(len);
        }
        Ok(true)
    }

    /// `Object.defineProperty(O, P, Desc)` without the throw.
    pub fn define_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, ObjectError> {
        Ok(self.get_mut(handle)?.define_own_property(key, desc))
    }

    /// `delete O[P]`.
    pub fn delete_property(
        &mut self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<bool, ObjectError> {
        Ok(self.get_mut(handle)?.delete(key))
    }

    // -- Built-in mutators --------------------------------------------------

    /// `Array.prototype.push` for a single value; returns the new length.
    pub fn array_push(&mut self, handle: ObjectHandle, value: JsValue) -> Result<u32, ObjectError> {
        let object = self.get_mut(handle)?;
        if !object.is_array() {
            return Err(ObjectError::TypeError(format!(
                "{handle} is not an array"
            )));
        }
        let len = object.array_length();
        if !object.extensible || !object.length_writable() {
            return Err(ObjectError::TypeError(format!(
                "cannot add property {len}, object is not extensible"
            )));
        }
        let new_len = len
            .checked_add(1)
            .ok_or_else(|| ObjectError::TypeError(format!("array length {len} cannot grow")))?;
        object.define_own_property(len.into(), PropertyDescriptor::data(value));
        object.set_array_length(new_len);
        Ok(new_len)
    }

    /// `Map.prototype.set`. Works on frozen maps: freezing does not lock
    /// `[[MapData]]`.
    pub fn map_set(
        &mut self,
        handle: ObjectHandle,
        key: JsValue,
        value: JsValue,
    ) -> Result<(), ObjectError> {
        match &mut self.get_mut(handle)?.kind {
            ObjectKind::Map { entries } => {
                upsert_entry(entries, key, value);
                Ok(())
            }
            _ => Err(ObjectError::TypeError(format!("{handle} is not a map"))),
        }
    }

    /// `Set.prototype.add`; returns `false` if the item was already present.
    pub fn set_add(&mut self, handle: ObjectHandle, item: JsValue) -> Result<bool, ObjectError> {
        match &mut self.get_mut(handle)?.kind {
            ObjectKind::Set { items } => {
                if items.iter().any(|existing| existing.same_value(&item)) {
                    return Ok(false);
                }
                items.push(item);
                Ok(true)
            }
            _ => Err(ObjectError::TypeError(format!("{handle} is not a set"))),
        }
    }

    /// `Date.prototype.setTime`. Works on frozen dates.
    pub fn set_time(&mut self, handle: ObjectHandle, time: DateTime<Utc>) -> Result<(), ObjectError> {
        match &mut self.get_mut(handle)?.kind {
            ObjectKind::Date { time: slot } => {
                *slot = time;
                Ok(())
            }
            _ => Err(ObjectError::TypeError(format!("{handle} is not a date"))),
        }
    }

    // -- Integrity levels ---------------------------------------------------

    /// `Object.preventExtensions(O)`.
    pub fn prevent_extensions(&mut self, handle: ObjectHandle) -> Result<(), ObjectError> {
        self.get_mut(handle)?.prevent_extensions();
        Ok(())
    }

    /// `Object.freeze(O)`.
    pub fn freeze(&mut self, handle: ObjectHandle) -> Result<(), ObjectError> {
        self.get_mut(handle)?.freeze();
        Ok(())
    }

    /// `Object.seal(O)`.
    pub fn seal(&mut self, handle: ObjectHandle) -> Result<(), ObjectError> {
        self.get_mut(handle)?.seal();
        Ok(())
    }

    /// `Object.isFrozen(O)`.
    pub fn is_frozen(&self, handle: ObjectHandle) -> Result<bool, ObjectError> {
        Ok(self.get(handle)?.is_frozen())
    }

    /// `Object.isSealed(O)`.
    pub fn is_sealed(&self, handle: ObjectHandle) -> Result<bool, ObjectError> {
        Ok(self.get(handle)?.is_sealed())
    }
}

fn upsert_entry(entries: &mut Vec<(JsValue, JsValue)>, key: JsValue, value: JsValue) {
    match entries.iter_mut().find(|(k, _)| k.same_value(&key)) {
        Some((_, slot)) => *slot = value,
        None => entries.push((key, value)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
