//! The [`PropertyAccess`] trait: late-bound field access.

use arbor_types::Value;

use crate::error::ObjectResult;

/// Read and write named fields resolved at run time.
///
/// Implementations decide per field whether a read or write goes to plain
/// storage or through a registered accessor.
pub trait PropertyAccess {
    /// Read a field.
    fn get(&self, field: &str) -> ObjectResult<Value>;

    /// Write a field.
    fn set(&mut self, field: &str, value: Value) -> ObjectResult<()>;

    /// Write every `(field, value)` pair in order, stopping at the first
    /// failure. Fields written before the failure keep their new values.
    fn set_properties<I, K, V>(&mut self, properties: I) -> ObjectResult<()>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (field, value) in properties {
            self.set(field.as_ref(), value.into())?;
        }
        Ok(())
    }
}
