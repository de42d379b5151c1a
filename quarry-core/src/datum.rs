use crate::{Error, Result};
use std::{
    any::{self, Any},
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// Object safe view of a semantic value.
///
/// Implemented for every `'static` type that is comparable, printable and thread safe.
pub trait DatumValue: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_datum(&self, other: &dyn DatumValue) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Debug + PartialEq + Send + Sync> DatumValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn eq_datum(&self, other: &dyn DatumValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// In memory (semantic) value of a record field, the type is erased.
///
/// Cloning is cheap. An ordered sequence is a `Datum` holding a `Vec<Datum>`, see [`Datum::list`].
#[derive(Clone, Default)]
pub struct Datum(Option<Arc<dyn DatumValue>>);

impl Datum {
    /// Wrap a value. Wrapping a `Datum` returns it unchanged.
    pub fn new<T: DatumValue>(value: T) -> Self {
        if let Some(datum) = (&value as &dyn Any).downcast_ref::<Datum>() {
            return datum.clone();
        }
        Self(Some(Arc::new(value)))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn from_option<T: DatumValue>(value: Option<T>) -> Self {
        value.map(Datum::new).unwrap_or_default()
    }

    pub fn list<T: DatumValue>(items: impl IntoIterator<Item = T>) -> Self {
        Self::new(items.into_iter().map(Datum::new).collect::<Vec<_>>())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.as_ref().map_or("NULL", |v| v.type_name())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|v| v.as_any().downcast_ref::<T>())
    }

    /// Reference to the wrapped `T`, errors when NULL or of a different type.
    pub fn get_ref<T: Any>(&self) -> Result<&T> {
        self.downcast_ref::<T>().ok_or_else(|| {
            Error::msg(format!(
                "Expected a value of type {} but found {}",
                any::type_name::<T>(),
                self.type_name()
            ))
        })
    }

    pub fn get<T: Any + Clone>(&self) -> Result<T> {
        self.get_ref::<T>().cloned()
    }

    /// Like [`Datum::get`] but maps NULL to `None`.
    pub fn get_opt<T: Any + Clone>(&self) -> Result<Option<T>> {
        if self.is_null() {
            return Ok(None);
        }
        self.get().map(Some)
    }

    pub fn as_list(&self) -> Result<&[Datum]> {
        self.get_ref::<Vec<Datum>>().map(Vec::as_slice)
    }

    /// Collect a list datum into a vector of `T`.
    pub fn to_vec<T: Any + Clone>(&self) -> Result<Vec<T>> {
        self.as_list()?.iter().map(Datum::get).collect()
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(l), Some(r)) => l.eq_datum(r.as_ref()),
            _ => false,
        }
    }
}

impl Debug for Datum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("NULL"),
        }
    }
}
