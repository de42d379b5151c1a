use crate::{Datum, DatumValue, Error, Result};
use std::{any::Any, borrow::Cow, collections::BTreeMap, sync::Arc};

/// Immutable row of a table, fields are associated by column name.
///
/// Changing a field produces a new record, the original is never touched:
/// ```rust
/// use quarry_core::Record;
/// let first = Record::new().with("title", "Dune".to_string());
/// let second = first.with("year", 1965i32);
/// assert!(first.get("year").is_none());
/// assert_eq!(second.value::<i32>("year").unwrap(), 1965);
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Record {
    fields: Arc<BTreeMap<Cow<'static, str>, Datum>>,
}

impl Record {
    pub fn new() -> Self {
        Default::default()
    }

    /// Copy of this record with `name` set to `value`.
    pub fn with(&self, name: impl Into<Cow<'static, str>>, value: impl DatumValue) -> Self {
        self.with_datum(name, Datum::new(value))
    }

    pub fn with_datum(&self, name: impl Into<Cow<'static, str>>, value: Datum) -> Self {
        let mut result = self.clone();
        Arc::make_mut(&mut result.fields).insert(name.into(), value);
        result
    }

    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.fields.get(name)
    }

    /// The field, NULL when the record does not have it.
    pub fn datum(&self, name: &str) -> Datum {
        self.get(name).cloned().unwrap_or_default()
    }

    pub fn value<T: Any + Clone>(&self, name: &str) -> Result<T> {
        self.get(name)
            .ok_or_else(|| Error::msg(format!("The record does not have the field `{name}`")))?
            .get()
    }

    pub fn value_opt<T: Any + Clone>(&self, name: &str) -> Result<Option<T>> {
        self.datum(name).get_opt()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.fields.iter().map(|(k, v)| (k.as_ref(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
