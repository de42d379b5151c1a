use crate::{
    BinaryOpType, Column, ColumnDef, ColumnDefKind, ColumnKind, Context, Datum, Error, Node,
    PrimaryKeyType, QuarryError, Record, Result, RowLabeled, TypeRegistry, Value, VirtualColumn,
    Where,
};
use std::{borrow::Cow, collections::HashSet, sync::Arc};

/// Name of the physical column storing the child `child` of the virtual column `parent`.
pub type NamingStrategy = fn(&str, &str) -> String;
pub type RecordFactory = Arc<dyn Fn() -> Record + Send + Sync>;

/// Default [`NamingStrategy`]: `parent_child`.
pub fn snake_case_naming(parent: &str, child: &str) -> String {
    format!("{parent}_{child}")
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: Cow<'static, str>,
    pub schema: Cow<'static, str>,
    pub alias: Cow<'static, str>,
}

impl TableRef {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn with_alias(&self, alias: impl Into<Cow<'static, str>>) -> Self {
        Self {
            alias: alias.into(),
            ..self.clone()
        }
    }
    /// Name used to qualify the columns: the alias when present.
    pub fn qualifier(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }
}

/// Physical values of a record ready to be inserted.
#[derive(Debug)]
pub struct EncodedRow<'t> {
    /// Physical column name and value, in declaration order.
    pub fields: Vec<(&'t str, Value)>,
    /// Autoincrement columns left for the database to generate.
    pub omitted: Vec<&'t Column>,
}

/// Resolved table definition: ordered, uniquely named columns.
pub struct Table {
    table_ref: TableRef,
    columns: Vec<Column>,
    factory: RecordFactory,
    naming: NamingStrategy,
}

impl Table {
    pub fn builder(
        name: impl Into<Cow<'static, str>>,
        registry: &TypeRegistry,
    ) -> TableBuilder<'_> {
        TableBuilder {
            registry,
            table_ref: TableRef::new(name),
            columns: Vec::new(),
            factory: None,
            naming: snake_case_naming,
        }
    }

    pub fn table_ref(&self) -> &TableRef {
        &self.table_ref
    }

    pub fn name(&self) -> &str {
        &self.table_ref.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn naming(&self) -> NamingStrategy {
        self.naming
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_key())
    }

    /// Default record produced by the table factory.
    pub fn new_record(&self) -> Record {
        (self.factory)()
    }

    /// Every physical column name, in declaration order.
    pub fn physical_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .flat_map(Column::physical_names)
            .collect()
    }

    /// Native values of `record`, leaving out the unset autoincrement columns.
    pub fn encode_record<'t>(&'t self, record: &Record) -> Result<EncodedRow<'t>> {
        let mut result = EncodedRow {
            fields: Vec::with_capacity(self.columns.len()),
            omitted: Vec::new(),
        };
        for column in &self.columns {
            let datum = record.datum(&column.name);
            match &column.kind {
                ColumnKind::Virtual(virtual_column) => {
                    let flattened = virtual_column
                        .flatten(&datum)
                        .with_context(|| format!("While encoding the column `{}`", column.name))?;
                    result.fields.extend(
                        flattened
                            .into_iter()
                            .map(|(child, value)| (child.physical.as_ref(), value)),
                    );
                }
                ColumnKind::Scalar { mapper } | ColumnKind::Reference { mapper, .. } => {
                    let value = mapper
                        .to_native(&datum)
                        .with_context(|| format!("While encoding the column `{}`", column.name))?;
                    if column.autoincrement && value.is_unset() {
                        result.omitted.push(column);
                    } else {
                        result.fields.push((column.name(), value));
                    }
                }
            }
        }
        Ok(result)
    }

    /// Record holding the values of `row`, every physical column must be present.
    pub fn decode_row(&self, row: &RowLabeled) -> Result<Record> {
        let mut record = self.new_record();
        for column in &self.columns {
            let datum = self
                .decode_column(column, row)
                .with_context(|| format!("While decoding the column `{}`", column.name))?;
            record = record.with_datum(column.name.clone(), datum);
        }
        Ok(record)
    }

    fn decode_column(&self, column: &Column, row: &RowLabeled) -> Result<Datum> {
        let value_of = |name: &str| {
            row.get_column(name)
                .cloned()
                .ok_or_else(|| Error::msg(format!("The row does not contain the column `{name}`")))
        };
        match &column.kind {
            ColumnKind::Virtual(virtual_column) => {
                virtual_column.assemble(|child| value_of(child.physical.as_ref()))
            }
            ColumnKind::Scalar { mapper } | ColumnKind::Reference { mapper, .. } => {
                mapper.from_native(value_of(column.name.as_ref())?)
            }
        }
    }

    /// Condition matching the row of `record`: every key column equals its value.
    pub fn identity(&self, record: &Record) -> Result<Where> {
        let mut result: Option<Where> = None;
        for column in self.primary_key() {
            let datum = record.datum(&column.name);
            if datum.is_null() {
                return Err(Error::msg(format!(
                    "The key column `{}` of table `{}` has no value",
                    column.name,
                    self.name()
                )));
            }
            let mapper = column.mapper().ok_or_else(|| {
                QuarryError::invalid_table(self.name(), "a key column cannot be virtual")
            })?;
            let condition = Where::Compare(
                BinaryOpType::Equal,
                Node::Property(column.name.clone()),
                Node::Literal(datum, mapper.clone()),
            );
            result = Some(match result {
                Some(previous) => previous & condition,
                None => condition,
            });
        }
        result.ok_or_else(|| QuarryError::MissingKey(self.table_ref.name.clone()).into())
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("table_ref", &self.table_ref)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// Builder of a [`Table`], checks the column invariants in [`TableBuilder::build`].
pub struct TableBuilder<'r> {
    registry: &'r TypeRegistry,
    table_ref: TableRef,
    columns: Vec<ColumnDef>,
    factory: Option<RecordFactory>,
    naming: NamingStrategy,
}

impl<'r> TableBuilder<'r> {
    pub fn schema(mut self, schema: impl Into<Cow<'static, str>>) -> Self {
        self.table_ref.schema = schema.into();
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn factory(mut self, factory: impl Fn() -> Record + Send + Sync + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    pub fn build(self) -> Result<Table> {
        let table = self.table_ref.name.to_string();
        let invalid = |reason: String| QuarryError::invalid_table(&table, reason);
        if self.columns.is_empty() {
            return Err(invalid("the table has no columns".into()).into());
        }
        let mut names = HashSet::new();
        let mut physical = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for def in self.columns {
            if let Some(misuse) = def.misuse {
                return Err(invalid(misuse).into());
            }
            if !names.insert(def.name.clone()) {
                return Err(invalid(format!("duplicate column `{}`", def.name)).into());
            }
            let context = || format!("While resolving the column `{}` of `{table}`", def.name);
            let kind = match def.kind {
                ColumnDefKind::Scalar => ColumnKind::Scalar {
                    mapper: self.registry.lookup(&def.ty).with_context(context)?,
                },
                ColumnDefKind::Reference(target) => ColumnKind::Reference {
                    mapper: self.registry.lookup(&def.ty).with_context(context)?,
                    target,
                },
                ColumnDefKind::Virtual { children, codec } => {
                    if def.primary_key != PrimaryKeyType::None || def.autoincrement {
                        return Err(invalid(format!(
                            "virtual column `{}` cannot be a key or autoincrement",
                            def.name
                        ))
                        .into());
                    }
                    if children.is_empty() {
                        return Err(invalid(format!(
                            "virtual column `{}` does not declare any child",
                            def.name
                        ))
                        .into());
                    }
                    let mut child_names = HashSet::new();
                    let mut resolved = Vec::with_capacity(children.len());
                    for child in &children {
                        if !child_names.insert(child.name.clone()) {
                            return Err(invalid(format!(
                                "duplicate child `{}` in virtual column `{}`",
                                child.name, def.name
                            ))
                            .into());
                        }
                        let mapper = self.registry.lookup(&child.ty).with_context(|| {
                            format!("While resolving the child `{}.{}`", def.name, child.name)
                        })?;
                        resolved.push(child.resolve(&def.name, self.naming, mapper));
                    }
                    ColumnKind::Virtual(VirtualColumn {
                        children: resolved,
                        codec,
                    })
                }
            };
            let column = Column {
                name: def.name,
                ty: def.ty,
                primary_key: def.primary_key,
                autoincrement: def.autoincrement,
                kind,
            };
            if column.autoincrement
                && !column.is_key()
                && !column.mapper().is_some_and(|m| m.native().is_integer_type())
            {
                return Err(invalid(format!(
                    "autoincrement column `{}` must be a key or have an integer type",
                    column.name
                ))
                .into());
            }
            for name in column.physical_names() {
                if !physical.insert(name.to_string()) {
                    return Err(invalid(format!("duplicate physical column `{name}`")).into());
                }
            }
            columns.push(column);
        }
        Ok(Table {
            table_ref: self.table_ref,
            columns,
            factory: self
                .factory
                .unwrap_or_else(|| Arc::new(Record::new) as RecordFactory),
            naming: self.naming,
        })
    }
}
