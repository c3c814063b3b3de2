use regtree_buffer::{Buffer, BufferResult};
use regtree_types::{Primitive, Value, ValueType, ENTRY_HEADER};
use serde::{Deserialize, Serialize};

/// A named leaf value inside a key.
///
/// Entries are created only through their key (`add_entry`,
/// `insert_value`) and are dropped with it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    name: String,
    value: Value,
}

impl Entry {
    pub(crate) fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// The payload as `T`, or `None` if the entry holds another type.
    pub fn get<T: Primitive>(&self) -> Option<&T> {
        T::from_value(&self.value)
    }

    pub(crate) fn typed_mut<T: Primitive>(&mut self) -> Option<EntryMut<'_, T>> {
        let Entry { name, value } = self;
        let name = name.as_str();
        T::from_value_mut(value).map(|value| EntryMut { name, value })
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append the entry's wire form: header, name, type tag, payload.
    pub fn encode(&self, buf: &mut Buffer) -> BufferResult<()> {
        buf.write_scalar(ENTRY_HEADER);
        buf.write_string(&self.name)?;
        buf.write_scalar(self.value_type().tag());
        encode_value(&self.value, buf)
    }
}

/// Append the canonical payload encoding of `value`.
pub fn encode_value(value: &Value, buf: &mut Buffer) -> BufferResult<()> {
    match value {
        Value::Int8(v) => buf.write_scalar(*v),
        Value::Int16(v) => buf.write_scalar(*v),
        Value::Int32(v) => buf.write_scalar(*v),
        Value::UInt8(v) => buf.write_scalar(*v),
        Value::UInt16(v) => buf.write_scalar(*v),
        Value::UInt32(v) => buf.write_scalar(*v),
        Value::Float32(v) => buf.write_scalar(*v),
        Value::Str(v) => buf.write_string(v)?,
    };
    Ok(())
}

/// Consume one payload of type `ty`. Returns `Ok(None)` for
/// [`ValueType::Unknown`], which has no payload.
pub fn decode_value(ty: ValueType, buf: &mut Buffer) -> BufferResult<Option<Value>> {
    let value = match ty {
        ValueType::Unknown => return Ok(None),
        ValueType::Int8 => Value::Int8(buf.read_scalar()?),
        ValueType::Int16 => Value::Int16(buf.read_scalar()?),
        ValueType::Int32 => Value::Int32(buf.read_scalar()?),
        ValueType::UInt8 => Value::UInt8(buf.read_scalar()?),
        ValueType::UInt16 => Value::UInt16(buf.read_scalar()?),
        ValueType::UInt32 => Value::UInt32(buf.read_scalar()?),
        ValueType::Float32 => Value::Float32(buf.read_scalar()?),
        ValueType::String => Value::Str(buf.read_string()?),
    };
    Ok(Some(value))
}

/// Typed, mutable view of an entry's payload.
#[derive(Debug)]
pub struct EntryMut<'a, T: Primitive> {
    name: &'a str,
    value: &'a mut T,
}

impl<'a, T: Primitive> EntryMut<'a, T> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn get(&self) -> &T {
        &*self.value
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut *self.value
    }

    pub fn set(&mut self, value: T) {
        *self.value = value;
    }

    /// Replace the payload, returning the previous one.
    pub fn replace(&mut self, value: T) -> T {
        std::mem::replace(self.value, value)
    }

    /// Give up the view, keeping the mutable borrow of the payload.
    pub fn into_mut(self) -> &'a mut T {
        self.value
    }
}
