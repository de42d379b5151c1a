use crate::{
    AsValue, Context, Convert, Datum, DatumValue, Error, QuarryError, Result, TypeKey, TypeMapper,
    Value,
};
use rust_decimal::Decimal;
use std::{
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::{Arc, LazyLock, PoisonError, RwLock},
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

#[derive(Clone)]
enum Entry {
    Direct(Arc<TypeMapper>),
    Intermediate {
        via: TypeKey,
        to: Convert,
        from: Convert,
    },
    /// Derived sequence, composed with the current element mapper on every lookup.
    List { element: TypeKey },
}

/// Mapping from semantic types to their [`TypeMapper`].
///
/// Registration is expected at setup time, lookups can happen concurrently from any thread.
/// Registering a type twice replaces the previous mapper: last write wins, this is not an error.
/// Sequence mappers are derived from their element on first lookup, chained mappers are resolved
/// down to the native conversion every time they are looked up.
#[derive(Default)]
pub struct TypeRegistry {
    entries: RwLock<HashMap<TypeKey, Entry>>,
}

static GLOBAL: LazyLock<Arc<TypeRegistry>> =
    LazyLock::new(|| Arc::new(TypeRegistry::with_defaults()));

impl TypeRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registry knowing every primitive that implements [`AsValue`].
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_type::<bool>();
        registry.register_type::<i8>();
        registry.register_type::<i16>();
        registry.register_type::<i32>();
        registry.register_type::<i64>();
        registry.register_type::<u8>();
        registry.register_type::<u16>();
        registry.register_type::<u32>();
        registry.register_type::<u64>();
        registry.register_type::<f32>();
        registry.register_type::<f64>();
        registry.register_type::<String>();
        registry.register_type::<Decimal>();
        registry.register_type::<Date>();
        registry.register_type::<Time>();
        registry.register_type::<PrimitiveDateTime>();
        registry.register_type::<OffsetDateTime>();
        registry.register_type::<Uuid>();
        registry.register_type::<Vec<u8>>();
        registry
    }

    /// Process wide registry, initialized with the defaults on first use.
    pub fn global() -> Arc<TypeRegistry> {
        GLOBAL.clone()
    }

    fn insert(&self, key: TypeKey, entry: Entry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.insert(key.clone(), entry).is_some() {
            log::debug!("Type mapper of `{key}` was replaced");
        }
    }

    fn entry(&self, key: &TypeKey) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entry(key).is_some()
    }

    /// Store `mapper` for its key, replacing any previous one.
    pub fn register(&self, mapper: TypeMapper) {
        self.insert(mapper.key().clone(), Entry::Direct(Arc::new(mapper)));
    }

    pub fn register_type<T: AsValue + DatumValue + Clone>(&self) {
        self.register(TypeMapper::of::<T>());
    }

    /// Register `key` as converted to and from `intermediate`, which must already resolve.
    pub fn register_via_intermediate(
        &self,
        key: TypeKey,
        intermediate: TypeKey,
        to: Convert,
        from: Convert,
    ) -> Result<()> {
        self.lookup(&intermediate).with_context(|| {
            format!("Cannot register `{key}` through the intermediate type `{intermediate}`")
        })?;
        self.insert(
            key,
            Entry::Intermediate {
                via: intermediate,
                to,
                from,
            },
        );
        Ok(())
    }

    /// Typed version of [`TypeRegistry::register_via_intermediate`].
    pub fn register_via<T, I>(
        &self,
        to: impl Fn(&T) -> Result<I> + Send + Sync + 'static,
        from: impl Fn(I) -> Result<T> + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: DatumValue,
        I: DatumValue + Clone,
    {
        self.register_via_intermediate(
            TypeKey::of::<T>(),
            TypeKey::of::<I>(),
            Arc::new(move |datum: &Datum| -> Result<Datum> {
                Ok(Datum::new(to(datum.get_ref::<T>()?)?))
            }),
            Arc::new(move |datum: &Datum| -> Result<Datum> {
                Ok(Datum::new(from(datum.get::<I>()?)?))
            }),
        )
    }

    /// Register the sequence of `element`, the element must resolve.
    pub fn derive_array(&self, element: TypeKey) -> Result<Arc<TypeMapper>> {
        let key = element.clone().list();
        let mapper = self.derive(&key, &element, &mut Vec::new())?;
        self.insert(key, Entry::List { element });
        Ok(mapper)
    }

    pub fn lookup(&self, key: &TypeKey) -> Result<Arc<TypeMapper>> {
        self.resolve(key, &mut Vec::new())
    }

    pub fn lookup_type<T: 'static>(&self) -> Result<Arc<TypeMapper>> {
        self.lookup(&TypeKey::of::<T>())
    }

    /// Mapper of the elements of a sequence mapper.
    ///
    /// Registered sequences use the element mapper of the registry, a chained type whose native
    /// value is a list gets a mapper reading the native elements as they are.
    pub fn element_of(&self, mapper: &TypeMapper) -> Result<Arc<TypeMapper>> {
        if let TypeKey::List(element) = mapper.key() {
            return self.lookup(element);
        }
        match mapper.native() {
            Value::List(.., element) => Ok(Arc::new(TypeMapper::passthrough(*element.clone()))),
            _ => Err(Error::msg(format!(
                "The type `{}` is not a sequence and cannot be indexed",
                mapper.key()
            ))),
        }
    }

    fn resolve(&self, key: &TypeKey, visiting: &mut Vec<TypeKey>) -> Result<Arc<TypeMapper>> {
        if visiting.contains(key) {
            return Err(QuarryError::CyclicMapper(key.to_string()).into());
        }
        match self.entry(key) {
            Some(Entry::Direct(mapper)) => Ok(mapper),
            Some(Entry::Intermediate { via, to, from }) => {
                visiting.push(key.clone());
                let via = self.resolve(&via, visiting).with_context(|| {
                    format!("While resolving the intermediate type of `{key}`")
                })?;
                Ok(Arc::new(TypeMapper::chain(key.clone(), via, to, from)))
            }
            Some(Entry::List { element }) => self.derive(key, &element, visiting),
            None => match key {
                TypeKey::List(element) => {
                    let mapper = self.derive(key, element, visiting)?;
                    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                    entries.entry(key.clone()).or_insert_with(|| {
                        log::debug!("Derived the type mapper of `{key}`");
                        Entry::List {
                            element: *element.clone(),
                        }
                    });
                    Ok(mapper)
                }
                _ => Err(QuarryError::MapperNotFound(key.to_string()).into()),
            },
        }
    }

    fn derive(
        &self,
        key: &TypeKey,
        element: &TypeKey,
        visiting: &mut Vec<TypeKey>,
    ) -> Result<Arc<TypeMapper>> {
        visiting.push(key.clone());
        let element = self.resolve(element, visiting)?;
        Ok(Arc::new(TypeMapper::list(element)))
    }
}

impl Debug for TypeRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_set()
            .entries(entries.keys().map(ToString::to_string))
            .finish()
    }
}
