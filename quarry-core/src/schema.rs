use crate::{QuarryError, Repository, Result, Table, TypeRegistry};
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

/// Code level settings of a [`Schema`].
#[derive(Default, Debug, Clone)]
pub struct SchemaOptions {
    /// Functions accepted by the compiler, compared ignoring ASCII case.
    ///
    /// `None` accepts any name: function names are trusted input and written verbatim.
    pub allowed_functions: Option<HashSet<String>>,
}

impl SchemaOptions {
    pub fn allow_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_functions
            .get_or_insert_with(Default::default)
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_function_allowed(&self, name: &str) -> bool {
        self.allowed_functions
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|f| f.eq_ignore_ascii_case(name)))
    }
}

/// Catalog of tables sharing one [`TypeRegistry`].
#[derive(Debug)]
pub struct Schema {
    registry: Arc<TypeRegistry>,
    tables: BTreeMap<String, Arc<Table>>,
    options: SchemaOptions,
}

impl Schema {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            tables: Default::default(),
            options: Default::default(),
        }
    }

    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Add `table`, replacing any table with the same name.
    pub fn add(&mut self, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        if self
            .tables
            .insert(table.name().to_string(), table.clone())
            .is_some()
        {
            log::debug!("Table `{}` was replaced", table.name());
        }
        table
    }

    pub fn table(&self, name: &str) -> Result<&Arc<Table>> {
        self.tables
            .get(name)
            .ok_or_else(|| QuarryError::UnknownTable(name.to_string()).into())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<Table>> {
        self.tables.values()
    }

    /// CRUD operations on the table `name`.
    pub fn repository(&self, name: &str) -> Result<Repository<'_>> {
        Ok(Repository::new(self, self.table(name)?))
    }
}
