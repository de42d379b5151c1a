use crate::{TypeKey, TypeMapper, VirtualChild, VirtualCodec, VirtualColumn};
use std::{any::Any, borrow::Cow, sync::Arc};

/// Fully qualified reference to a physical column, used when writing SQL.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef<'a> {
    /// Column name.
    pub name: &'a str,
    /// Table name or alias (may be empty).
    pub table: &'a str,
    /// Schema name (may be empty).
    pub schema: &'a str,
}

/// Indicates how (or if) a column participates in the primary key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    /// Single-column primary key.
    PrimaryKey,
    /// Member of a composite primary key.
    PartOfPrimaryKey,
    /// Not part of the primary key.
    #[default]
    None,
}

/// Column of another table whose key a reference column stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    pub table: Cow<'static, str>,
    /// Key column of the target table.
    pub column: Cow<'static, str>,
}

#[derive(Debug, Clone)]
pub enum ColumnKind {
    Scalar {
        mapper: Arc<TypeMapper>,
    },
    Reference {
        mapper: Arc<TypeMapper>,
        target: ColumnReference,
    },
    Virtual(VirtualColumn),
}

/// Resolved column of a [`Table`](crate::Table).
#[derive(Debug, Clone)]
pub struct Column {
    pub name: Cow<'static, str>,
    pub ty: TypeKey,
    pub primary_key: PrimaryKeyType,
    pub autoincrement: bool,
    pub kind: ColumnKind,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is_key(&self) -> bool {
        self.primary_key != PrimaryKeyType::None
    }
    /// Mapper of the stored value, virtual columns do not have one.
    pub fn mapper(&self) -> Option<&Arc<TypeMapper>> {
        match &self.kind {
            ColumnKind::Scalar { mapper } | ColumnKind::Reference { mapper, .. } => Some(mapper),
            ColumnKind::Virtual(..) => None,
        }
    }
    pub fn reference(&self) -> Option<&ColumnReference> {
        match &self.kind {
            ColumnKind::Reference { target, .. } => Some(target),
            _ => None,
        }
    }
    pub fn virtual_column(&self) -> Option<&VirtualColumn> {
        match &self.kind {
            ColumnKind::Virtual(v) => Some(v),
            _ => None,
        }
    }
    /// Names of the physical columns backing this column.
    pub fn physical_names(&self) -> Vec<&str> {
        match &self.kind {
            ColumnKind::Virtual(v) => v.children.iter().map(|c| c.physical.as_ref()).collect(),
            _ => vec![self.name()],
        }
    }
}

#[derive(Clone)]
pub(crate) struct ChildDef {
    pub(crate) name: Cow<'static, str>,
    pub(crate) physical: Option<Cow<'static, str>>,
    pub(crate) ty: TypeKey,
}

#[derive(Clone)]
pub(crate) enum ColumnDefKind {
    Scalar,
    Reference(ColumnReference),
    Virtual {
        children: Vec<ChildDef>,
        codec: Arc<dyn VirtualCodec>,
    },
}

/// Declarative column description, resolved against a registry when the table is built.
///
/// ```rust
/// use quarry_core::{ColumnDef, FnCodec, Parts};
/// let id = ColumnDef::new::<i64>("id").primary_key().autoincrement();
/// let author = ColumnDef::reference::<i64>("author", "authors", "id");
/// let size = ColumnDef::virtual_column::<(u32, u32)>(
///     "size",
///     FnCodec::new(
///         |v: &(u32, u32)| Ok(Parts::new().with("w", v.0).with("h", v.1)),
///         |p| Ok((p.get("w")?, p.get("h")?)),
///     ),
/// )
/// .child::<u32>("w")
/// .child_named::<u32>("h", "height");
/// # let _ = (id, author, size);
/// ```
#[derive(Clone)]
pub struct ColumnDef {
    pub(crate) name: Cow<'static, str>,
    pub(crate) ty: TypeKey,
    pub(crate) primary_key: PrimaryKeyType,
    pub(crate) autoincrement: bool,
    pub(crate) kind: ColumnDefKind,
    pub(crate) misuse: Option<String>,
}

impl ColumnDef {
    pub fn new<T: Any>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of(name, TypeKey::of::<T>())
    }

    pub fn of(name: impl Into<Cow<'static, str>>, ty: TypeKey) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: PrimaryKeyType::None,
            autoincrement: false,
            kind: ColumnDefKind::Scalar,
            misuse: None,
        }
    }

    /// Ordered sequence of `T`, the record holds it as a `Vec<Datum>`.
    pub fn list<T: Any>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of(name, TypeKey::of::<T>().list())
    }

    /// Column of type `T` storing the value of `table.column`.
    pub fn reference<T: Any>(
        name: impl Into<Cow<'static, str>>,
        table: impl Into<Cow<'static, str>>,
        column: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            kind: ColumnDefKind::Reference(ColumnReference {
                table: table.into(),
                column: column.into(),
            }),
            ..Self::new::<T>(name)
        }
    }

    /// Composite column of type `T`, declare its children with [`ColumnDef::child`].
    pub fn virtual_column<T: Any>(
        name: impl Into<Cow<'static, str>>,
        codec: impl VirtualCodec + 'static,
    ) -> Self {
        Self {
            kind: ColumnDefKind::Virtual {
                children: Vec::new(),
                codec: Arc::new(codec),
            },
            ..Self::new::<T>(name)
        }
    }

    /// Child stored in the column named by the table naming strategy.
    pub fn child<T: Any>(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.push_child(ChildDef {
            name: name.into(),
            physical: None,
            ty: TypeKey::of::<T>(),
        })
    }

    pub fn child_named<T: Any>(
        self,
        name: impl Into<Cow<'static, str>>,
        physical: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.push_child(ChildDef {
            name: name.into(),
            physical: Some(physical.into()),
            ty: TypeKey::of::<T>(),
        })
    }

    fn push_child(mut self, child: ChildDef) -> Self {
        match &mut self.kind {
            ColumnDefKind::Virtual { children, .. } => children.push(child),
            _ => {
                self.misuse = Some(format!(
                    "column `{}` is not virtual and cannot declare the child `{}`",
                    self.name, child.name
                ))
            }
        }
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = PrimaryKeyType::PrimaryKey;
        self
    }

    pub fn part_of_primary_key(mut self) -> Self {
        self.primary_key = PrimaryKeyType::PartOfPrimaryKey;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ChildDef {
    pub(crate) fn resolve(
        &self,
        parent: &str,
        naming: fn(&str, &str) -> String,
        mapper: Arc<TypeMapper>,
    ) -> VirtualChild {
        VirtualChild {
            name: self.name.clone(),
            physical: self
                .physical
                .clone()
                .unwrap_or_else(|| naming(parent, &self.name).into()),
            ty: self.ty.clone(),
            mapper,
        }
    }
}
