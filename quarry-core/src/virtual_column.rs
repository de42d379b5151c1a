use crate::{Datum, DatumValue, Error, Result, TypeKey, TypeMapper, Value};
use std::{
    any::Any,
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// Named child values of a composite value.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Parts(BTreeMap<String, Datum>);

impl Parts {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn with(mut self, name: impl Into<String>, value: impl DatumValue) -> Self {
        self.insert(name, Datum::new(value));
        self
    }
    pub fn insert(&mut self, name: impl Into<String>, value: Datum) {
        self.0.insert(name.into(), value);
    }
    pub fn datum(&self, name: &str) -> Option<&Datum> {
        self.0.get(name)
    }
    pub fn get<T: Any + Clone>(&self, name: &str) -> Result<T> {
        self.datum(name)
            .ok_or_else(|| Error::msg(format!("Missing the part `{name}`")))?
            .get()
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits a composite value into its children and joins them back.
///
/// Implementations must satisfy `join(split(v)) == v`.
pub trait VirtualCodec: Send + Sync {
    fn split(&self, value: &Datum) -> Result<Parts>;
    fn join(&self, parts: Parts) -> Result<Datum>;
}

type SplitFn<T> = Box<dyn Fn(&T) -> Result<Parts> + Send + Sync>;
type JoinFn<T> = Box<dyn Fn(&Parts) -> Result<T> + Send + Sync>;

/// Codec of the composite type `T` built from two closures.
///
/// ```rust
/// use quarry_core::{FnCodec, Parts};
/// #[derive(Debug, Clone, PartialEq)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
/// let codec = FnCodec::new(
///     |p: &Point| Ok(Parts::new().with("x", p.x).with("y", p.y)),
///     |parts| Ok(Point { x: parts.get("x")?, y: parts.get("y")? }),
/// );
/// # let _ = codec;
/// ```
pub struct FnCodec<T> {
    split: SplitFn<T>,
    join: JoinFn<T>,
}

impl<T: DatumValue> FnCodec<T> {
    pub fn new(
        split: impl Fn(&T) -> Result<Parts> + Send + Sync + 'static,
        join: impl Fn(&Parts) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            split: Box::new(split),
            join: Box::new(join),
        }
    }
}

impl<T: DatumValue> VirtualCodec for FnCodec<T> {
    fn split(&self, value: &Datum) -> Result<Parts> {
        (self.split)(value.get_ref::<T>()?)
    }
    fn join(&self, parts: Parts) -> Result<Datum> {
        Ok(Datum::new((self.join)(&parts)?))
    }
}

/// Declared child of a virtual column.
#[derive(Debug, Clone)]
pub struct VirtualChild {
    pub name: Cow<'static, str>,
    /// Name of the physical column storing this child.
    pub physical: Cow<'static, str>,
    pub ty: TypeKey,
    pub mapper: Arc<TypeMapper>,
}

/// One logical value stored across several physical columns.
#[derive(Clone)]
pub struct VirtualColumn {
    pub children: Vec<VirtualChild>,
    pub codec: Arc<dyn VirtualCodec>,
}

impl VirtualColumn {
    pub fn child(&self, name: &str) -> Option<&VirtualChild> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Native value of every child, in declaration order.
    pub fn flatten(&self, value: &Datum) -> Result<Vec<(&VirtualChild, Value)>> {
        if value.is_null() {
            return Ok(self
                .children
                .iter()
                .map(|c| (c, c.mapper.native().clone()))
                .collect());
        }
        let parts = self.codec.split(value)?;
        if let Some(unknown) = parts.names().find(|name| self.child(name).is_none()) {
            return Err(Error::msg(format!(
                "The composite value has the undeclared child `{unknown}`"
            )));
        }
        self.children
            .iter()
            .map(|child| {
                let datum = parts.datum(&child.name).ok_or_else(|| {
                    Error::msg(format!(
                        "The composite value is missing the child `{}`",
                        child.name
                    ))
                })?;
                Ok((child, child.mapper.to_native(datum)?))
            })
            .collect()
    }

    /// Rebuild the composite from the native value of every child.
    ///
    /// When all the children are NULL the result is NULL.
    pub fn assemble(
        &self,
        mut value_of: impl FnMut(&VirtualChild) -> Result<Value>,
    ) -> Result<Datum> {
        let mut parts = Parts::new();
        let mut all_null = true;
        for child in &self.children {
            let datum = child.mapper.from_native(value_of(child)?)?;
            all_null &= datum.is_null();
            parts.insert(child.name.as_ref(), datum);
        }
        if all_null {
            return Ok(Datum::null());
        }
        self.codec.join(parts)
    }
}

impl Debug for VirtualColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualColumn")
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
