use crate::{
    AsValue, Context, Datum, DatumValue, Driver, Error, ExecutionResult, Executor, Node, Ordered,
    QuarryError, Query, Record, Result, RowLabeled, RowsAffected, Schema, SqlCompiler, Table,
    Value, Where,
    stream::{Stream, StreamExt, TryStreamExt},
};
use log::Level;
use std::{borrow::Cow, pin::pin};

/// Filter, ordering and limit of a select.
///
/// ```rust
/// use quarry_core::{SelectOptions, property};
/// let options = SelectOptions::new()
///     .filter(property("title").is_null())
///     .order_by(property("id").desc())
///     .limit(10);
/// assert_eq!(options.limit, Some(10));
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SelectOptions {
    pub condition: Option<Where>,
    pub order_by: Vec<Ordered>,
    pub limit: Option<u32>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }
    /// Add `condition`, combined with `&` to the existing one.
    pub fn filter(mut self, condition: impl Into<Where>) -> Self {
        let condition = condition.into();
        self.condition = Some(match self.condition.take() {
            Some(previous) => previous & condition,
            None => condition,
        });
        self
    }
    pub fn order_by(mut self, ordered: Ordered) -> Self {
        self.order_by.push(ordered);
        self
    }
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentValue {
    /// Expression evaluated by the database.
    Node(Node),
    /// Value encoded with the mapper of the assigned column.
    Datum(Datum),
}

/// `path = value` in the SET clause of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub path: Cow<'static, str>,
    pub value: AssignmentValue,
}

impl Assignment {
    pub fn value(path: impl Into<Cow<'static, str>>, value: impl DatumValue) -> Self {
        Self::datum(path, Datum::new(value))
    }
    pub fn datum(path: impl Into<Cow<'static, str>>, value: Datum) -> Self {
        Self {
            path: path.into(),
            value: AssignmentValue::Datum(value),
        }
    }
    pub fn node(path: impl Into<Cow<'static, str>>, value: Node) -> Self {
        Self {
            path: path.into(),
            value: AssignmentValue::Node(value),
        }
    }
}

/// Operations on the records of one table, every statement is compiled before anything is sent to
/// the executor.
#[derive(Debug, Clone, Copy)]
pub struct Repository<'s> {
    schema: &'s Schema,
    table: &'s Table,
}

impl<'s> Repository<'s> {
    pub fn new(schema: &'s Schema, table: &'s Table) -> Self {
        Self { schema, table }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn table(&self) -> &'s Table {
        self.table
    }

    fn compile<E: Executor, T>(
        &self,
        executor: &E,
        f: impl FnOnce(&SqlCompiler) -> Result<T>,
    ) -> Result<T> {
        let writer = executor.driver().sql_writer();
        f(&SqlCompiler::new(self.schema, &writer))
    }

    /// Insert `record`, the returned record also holds the values the database generated.
    pub async fn insert<E: Executor>(&self, executor: &mut E, record: &Record) -> Result<Record> {
        let row = self.table.encode_record(record)?;
        let query = self.compile(executor, |c| c.compile_insert(self.table, &row))?;
        let result = execute(executor, query).await?;
        let mut inserted = record.clone();
        if let Some(keys) = result.generated_keys.first().or(result.rows.first()) {
            for column in self.table.columns() {
                let (Some(mapper), Some(value)) = (column.mapper(), keys.get_column(column.name()))
                else {
                    continue;
                };
                let datum = mapper
                    .from_native(value.clone())
                    .with_context(|| format!("While decoding the generated `{}`", column.name))?;
                inserted = inserted.with_datum(column.name.clone(), datum);
            }
        } else if let ([column], Some(id)) =
            (row.omitted.as_slice(), result.rows_affected.last_affected_id)
        {
            let mapper = column.mapper().ok_or_else(|| {
                Error::msg(format!("The column `{}` cannot be generated", column.name))
            })?;
            let datum = mapper
                .from_native(Value::Int64(Some(id)))
                .with_context(|| format!("While decoding the generated `{}`", column.name))?;
            inserted = inserted.with_datum(column.name.clone(), datum);
        }
        Ok(inserted)
    }

    /// Records matching `options`, in the order the database returns them.
    pub fn select<'a, E: Executor>(
        &'a self,
        executor: &'a mut E,
        options: SelectOptions,
    ) -> Result<impl Stream<Item = Result<Record>> + Send + 'a> {
        let query = self.compile(executor, |c| c.compile_select(self.table, &options))?;
        let table = self.table;
        Ok(fetch(executor, query).map(move |row| row.and_then(|row| table.decode_row(&row))))
    }

    /// Values of `node` for the rows matching `options`, decoded with the mapper of the node.
    ///
    /// A whole virtual column selects all of its children and yields the assembled values.
    pub fn select_values<'a, E: Executor>(
        &'a self,
        executor: &'a mut E,
        node: &Node,
        options: SelectOptions,
    ) -> Result<impl Stream<Item = Result<Datum>> + Send + 'a> {
        let (query, projection) =
            self.compile(executor, |c| c.compile_select_node(self.table, node, &options))?;
        Ok(fetch(executor, query).map(move |row| row.and_then(|row| projection.decode(row))))
    }

    /// Complete records of the table targeted by the reference `node`, one for each matching row.
    pub fn select_references<'a, E: Executor>(
        &'a self,
        executor: &'a mut E,
        node: &Node,
        options: SelectOptions,
    ) -> Result<impl Stream<Item = Result<Record>> + Send + 'a> {
        let (query, target) = self.compile(executor, |c| {
            c.compile_select_references(self.table, node, &options)
        })?;
        Ok(fetch(executor, query).map(move |row| row.and_then(|row| target.decode_row(&row))))
    }

    /// Stored version of `record`, looked up by its key.
    pub async fn find<E: Executor>(
        &self,
        executor: &mut E,
        record: &Record,
    ) -> Result<Option<Record>> {
        let condition = self.table.identity(record)?;
        let stream = self.select(executor, SelectOptions::new().filter(condition).limit(1))?;
        let mut stream = pin!(stream);
        stream.try_next().await
    }

    /// Write every non key column of `record` to its row.
    ///
    /// Fails with "Nothing to update" before reaching the executor when every column of the table
    /// is part of the key.
    pub async fn update<E: Executor>(
        &self,
        executor: &mut E,
        record: &Record,
    ) -> Result<RowsAffected> {
        let condition = self.table.identity(record)?;
        let assignments = self
            .table
            .columns()
            .iter()
            .filter(|c| !c.is_key())
            .map(|c| Assignment::datum(c.name.clone(), record.datum(&c.name)))
            .collect::<Vec<_>>();
        self.update_columns(executor, &assignments, &condition).await
    }

    pub async fn update_columns<E: Executor>(
        &self,
        executor: &mut E,
        assignments: &[Assignment],
        condition: &Where,
    ) -> Result<RowsAffected> {
        let query = self.compile(executor, |c| {
            c.compile_update(self.table, assignments, condition)
        })?;
        Ok(execute(executor, query).await?.rows_affected)
    }

    /// Delete the rows matching `condition`, every row when `None`.
    pub async fn delete<E: Executor>(
        &self,
        executor: &mut E,
        condition: Option<&Where>,
    ) -> Result<RowsAffected> {
        let query = self.compile(executor, |c| c.compile_delete(self.table, condition))?;
        Ok(execute(executor, query).await?.rows_affected)
    }

    /// Delete the row of `record`, exactly one row is expected to go.
    pub async fn delete_record<E: Executor>(
        &self,
        executor: &mut E,
        record: &Record,
    ) -> Result<()> {
        let condition = self.table.identity(record)?;
        let affected = self.delete(executor, Some(&condition)).await?;
        if affected.rows_affected == 1 {
            return Ok(());
        }
        let error = Error::msg(format!(
            "The query deleted {} rows instead of the expected 1",
            affected.rows_affected
        ));
        log::log!(
            if affected.rows_affected == 0 {
                Level::Info
            } else {
                Level::Error
            },
            "{}",
            error
        );
        Err(error)
    }

    pub async fn row_count<E: Executor>(
        &self,
        executor: &mut E,
        condition: Option<&Where>,
    ) -> Result<u64> {
        let query = self.compile(executor, |c| c.compile_count(self.table, condition))?;
        let mut stream = pin!(fetch(executor, query));
        let row = stream
            .try_next()
            .await?
            .ok_or_else(|| Error::msg("The count query did not return any row"))?;
        let value = row
            .values
            .into_vec()
            .into_iter()
            .next()
            .ok_or_else(|| Error::msg("The count query returned an empty row"))?;
        u64::try_from_value(value)
    }
}

async fn execute<E: Executor>(executor: &mut E, query: Query) -> Result<ExecutionResult> {
    log::debug!("Executing on {}:\n{}", <E::Driver as Driver>::NAME, query);
    let context = QuarryError::Executor(query.to_string());
    executor.execute(query).await.context(context)
}

fn fetch<E: Executor>(
    executor: &mut E,
    query: Query,
) -> impl Stream<Item = Result<RowLabeled>> + Send {
    log::debug!("Fetching on {}:\n{}", <E::Driver as Driver>::NAME, query);
    let sql = query.to_string();
    executor
        .fetch(query)
        .map_err(move |e| e.context(QuarryError::Executor(sql.clone())))
}
