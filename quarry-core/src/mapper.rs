use crate::{AsValue, Context, Datum, DatumValue, Error, Result, Value};
use std::{
    any::{self, Any, TypeId},
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Runtime identity of a semantic type.
#[derive(Clone, Debug)]
pub enum TypeKey {
    Type { id: TypeId, name: &'static str },
    /// Ordered sequence of the boxed type.
    List(Box<TypeKey>),
}

impl TypeKey {
    pub fn of<T: Any>() -> Self {
        TypeKey::Type {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }
    /// Key of the ordered sequence of `self`.
    pub fn list(self) -> Self {
        TypeKey::List(Box::new(self))
    }
    pub fn element(&self) -> Option<&TypeKey> {
        match self {
            TypeKey::List(element) => Some(element),
            _ => None,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeKey::Type { id: l, .. }, TypeKey::Type { id: r, .. }) => l == r,
            (TypeKey::List(l), TypeKey::List(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            TypeKey::Type { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            TypeKey::List(element) => {
                1u8.hash(state);
                element.hash(state);
            }
        }
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Type { name, .. } => f.write_str(name),
            TypeKey::List(element) => write!(f, "List<{element}>"),
        }
    }
}

type ToNative = Arc<dyn Fn(&Datum) -> Result<Value> + Send + Sync>;
type FromNative = Arc<dyn Fn(Value) -> Result<Datum> + Send + Sync>;
/// Conversion between a semantic type and its intermediate type, both directions look the same.
pub type Convert = Arc<dyn Fn(&Datum) -> Result<Datum> + Send + Sync>;

/// Bidirectional converter between a semantic type and its native [`Value`].
///
/// NULL is handled here and never reaches the conversion functions: a null [`Datum`] becomes the
/// typed NULL of [`TypeMapper::native`] and a null [`Value`] becomes a null [`Datum`].
#[derive(Clone)]
pub struct TypeMapper {
    key: TypeKey,
    native: Value,
    to: ToNative,
    from: FromNative,
}

impl TypeMapper {
    pub fn new(
        key: TypeKey,
        native: Value,
        to: impl Fn(&Datum) -> Result<Value> + Send + Sync + 'static,
        from: impl Fn(Value) -> Result<Datum> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            native: native.as_null(),
            to: Arc::new(to),
            from: Arc::new(from),
        }
    }

    /// Direct mapper of a primitive type.
    pub fn of<T: AsValue + DatumValue + Clone>() -> Self {
        Self::new(
            TypeKey::of::<T>(),
            T::as_empty_value(),
            |datum| Ok(datum.get::<T>()?.as_value()),
            |value| Ok(Datum::new(T::try_from_value(value)?)),
        )
    }

    /// Mapper whose semantic value is the native value itself.
    pub fn passthrough(native: Value) -> Self {
        let prototype = native.as_null();
        let expected = prototype.clone();
        Self::new(
            TypeKey::of::<Value>(),
            prototype,
            move |datum| {
                let value = datum.get::<Value>()?;
                if !value.same_type(&expected) {
                    return Err(Error::msg(format!(
                        "Expected a value of type {expected:?} but found {value:?}"
                    )));
                }
                Ok(value)
            },
            |value| Ok(Datum::new(value)),
        )
    }

    /// Element wise mapper of the ordered sequence of `element`.
    pub fn list(element: Arc<TypeMapper>) -> Self {
        let to = element.clone();
        let from = element.clone();
        Self::new(
            element.key.clone().list(),
            Value::list_of(element.native.clone()),
            move |datum| {
                let items = datum
                    .as_list()?
                    .iter()
                    .map(|v| to.to_native(v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::List(Some(items), Box::new(to.native.clone())))
            },
            move |value| match value {
                Value::List(Some(items), ..) => Ok(Datum::new(
                    items
                        .into_iter()
                        .map(|v| from.from_native(v))
                        .collect::<Result<Vec<_>>>()?,
                )),
                value => Err(Error::msg(format!(
                    "Expected a list of {} but found {value:?}",
                    from.key
                ))),
            },
        )
    }

    /// Mapper of `key` going through the mapper of its intermediate type.
    pub fn chain(key: TypeKey, via: Arc<TypeMapper>, to: Convert, from: Convert) -> Self {
        let native = via.native.clone();
        let to_via = via.clone();
        Self::new(
            key,
            native,
            move |datum| to_via.to_native(&to(datum)?),
            move |value| from(&via.from_native(value)?),
        )
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Database type descriptor, always a typed NULL.
    pub fn native(&self) -> &Value {
        &self.native
    }

    pub fn to_native(&self, datum: &Datum) -> Result<Value> {
        if datum.is_null() {
            return Ok(self.native.clone());
        }
        (self.to)(datum).with_context(|| format!("While converting {} to native", self.key))
    }

    pub fn from_native(&self, value: Value) -> Result<Datum> {
        if value.is_null() {
            return Ok(Datum::null());
        }
        (self.from)(value).with_context(|| format!("While converting native to {}", self.key))
    }
}

impl PartialEq for TypeMapper {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.native.same_type(&other.native)
    }
}

impl Debug for TypeMapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapper")
            .field("key", &self.key)
            .field("native", &self.native)
            .finish_non_exhaustive()
    }
}
