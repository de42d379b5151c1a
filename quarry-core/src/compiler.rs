use crate::{
    Assignment, AssignmentValue, Column, ColumnPath, ColumnRef, Datum, EncodedRow, Error, Node,
    PropertyPath, QuarryError, Query, Result, RowLabeled, Schema, SelectOptions, SqlWriter, Table,
    TableRef, TypeMapper, VirtualColumn, Where, possibly_parenthesized, reference::describe,
    separated_by,
    writer::{Context, Fragment},
};
use std::sync::Arc;

/// Shape of the values produced by a single node select.
#[derive(Debug, Clone)]
pub enum Projection {
    /// One value decoded with the mapper.
    Scalar(Arc<TypeMapper>),
    /// Every child of the virtual column, in declaration order.
    Composite(VirtualColumn),
}

impl Projection {
    pub fn decode(&self, row: RowLabeled) -> Result<Datum> {
        let mut values = row.values.into_vec().into_iter();
        match self {
            Projection::Scalar(mapper) => {
                mapper.from_native(values.next().ok_or_else(|| Error::msg("The row is empty"))?)
            }
            Projection::Composite(virtual_column) => virtual_column.assemble(|child| {
                values.next().ok_or_else(|| {
                    Error::msg(format!("The row is missing the child `{}`", child.name))
                })
            }),
        }
    }
}

fn column_ref<'c>(table: &'c TableRef, name: &'c str) -> ColumnRef<'c> {
    ColumnRef {
        name,
        table: table.qualifier(),
        schema: if table.alias.is_empty() {
            &table.schema
        } else {
            ""
        },
    }
}

/// Translates nodes, conditions and statements into SQL text with its parameters.
///
/// Compilation is a pure function of the tree and of the table definitions: the same input always
/// yields the same text and the same parameters, in placeholder order.
pub struct SqlCompiler<'a> {
    schema: &'a Schema,
    writer: &'a dyn SqlWriter,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(schema: &'a Schema, writer: &'a dyn SqlWriter) -> Self {
        Self { schema, writer }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn compile_node(&self, table: &Table, node: &Node) -> Result<Query> {
        let mut out = Query::default();
        self.write_node(&mut Context::default(), &mut out, table, node)?;
        Ok(out)
    }

    pub fn compile_where(&self, table: &Table, condition: &Where) -> Result<Query> {
        let mut out = Query::default();
        self.write_where(&mut Context::default(), &mut out, table, condition)?;
        Ok(out)
    }

    /// Mapper decoding the values `node` produces.
    pub fn decode_mapper(&self, table: &Table, node: &Node) -> Result<Arc<TypeMapper>> {
        match node {
            Node::Property(path) if table.column(path).is_none() => {
                let parsed = PropertyPath::parse(path, table, self.schema)?;
                self.decode_mapper(table, &parsed)
            }
            Node::Property(..) | Node::Reference(..) | Node::VirtualAccess(..) => {
                let path = ColumnPath::resolve(self.schema, table, node)?;
                path.mapper().cloned().ok_or_else(|| {
                    QuarryError::invalid_path(
                        describe(node),
                        "a whole virtual column does not have a single type",
                    )
                    .into()
                })
            }
            Node::Literal(_, mapper) => Ok(mapper.clone()),
            Node::Function {
                decode: Some(mapper),
                ..
            } => Ok(mapper.clone()),
            Node::Function { name, args, .. } => match args.first() {
                Some(arg) => self.decode_mapper(table, arg),
                None => Err(Error::msg(format!(
                    "Cannot determine the result type of `{name}()`, it has no arguments and no \
                     explicit decode type"
                ))),
            },
            Node::Concat(..) => self.schema.registry().lookup_type::<String>(),
            Node::ArrayIndex(base, ..) => {
                let mapper = self.decode_mapper(table, base)?;
                self.schema.registry().element_of(&mapper)
            }
        }
    }

    pub fn compile_select(&self, table: &Table, options: &SelectOptions) -> Result<Query> {
        let mut out = Query::default();
        let mut context = Context::new(Fragment::SqlSelect, false);
        out.sql.push_str("SELECT ");
        separated_by(
            &mut out.sql,
            table.physical_names(),
            |out, name| {
                self.writer
                    .write_column_ref(&mut context, out, &column_ref(table.table_ref(), name))
            },
            ", ",
        );
        out.sql.push_str("\nFROM ");
        self.writer.write_table_ref(
            &mut context.switch_fragment(Fragment::SqlSelectFrom).current,
            &mut out.sql,
            table.table_ref(),
        );
        self.write_filter(&mut context, &mut out, table, options)?;
        out.sql.push(';');
        Ok(out)
    }

    /// Select of a single node, a whole virtual column projects all of its children.
    pub fn compile_select_node(
        &self,
        table: &Table,
        node: &Node,
        options: &SelectOptions,
    ) -> Result<(Query, Projection)> {
        let mut out = Query::default();
        let mut context = Context::new(Fragment::SqlSelect, false);
        out.sql.push_str("SELECT ");
        let composite = match node {
            Node::Property(..) | Node::Reference(..) | Node::VirtualAccess(..) => {
                ColumnPath::resolve(self.schema, table, node).ok()
            }
            _ => None,
        }
        .filter(|path| path.child.is_none())
        .and_then(|path| {
            let column = path.column;
            column.virtual_column().map(|v| (path, v))
        });
        let projection = match composite {
            Some((path, virtual_column)) => {
                for (i, child) in virtual_column.children.iter().enumerate() {
                    if i > 0 {
                        out.sql.push_str(", ");
                    }
                    let path = ColumnPath {
                        child: Some(child),
                        ..path.clone()
                    };
                    self.write_column_path(&mut context, &mut out.sql, &path)?;
                }
                Projection::Composite(virtual_column.clone())
            }
            None => {
                self.write_node(&mut context, &mut out, table, node)?;
                Projection::Scalar(self.decode_mapper(table, node)?)
            }
        };
        out.sql.push_str("\nFROM ");
        self.writer.write_table_ref(
            &mut context.switch_fragment(Fragment::SqlSelectFrom).current,
            &mut out.sql,
            table.table_ref(),
        );
        self.write_filter(&mut context, &mut out, table, options)?;
        out.sql.push(';');
        Ok((out, projection))
    }

    /// Select of the complete records targeted by the reference `node`, joining every traversed
    /// table on its key.
    pub fn compile_select_references(
        &self,
        table: &Table,
        node: &Node,
        options: &SelectOptions,
    ) -> Result<(Query, Arc<Table>)> {
        let path = ColumnPath::resolve(self.schema, table, node)?;
        let target = match (path.child, path.column.reference()) {
            (None, Some(target)) => target,
            _ => {
                return Err(
                    QuarryError::invalid_path(describe(node), "not a reference column").into(),
                );
            }
        };
        let target_table = self.schema.table(&target.table)?;
        let links = path
            .hops
            .iter()
            .map(|hop| (hop.column, hop.target, hop.key))
            .chain([(path.column, target_table.as_ref(), target.column.as_ref())])
            .collect::<Vec<(&Column, &Table, &str)>>();
        let alias = |i: usize| format!("r{}", i + 1);
        let selected = target_table
            .table_ref()
            .with_alias(alias(links.len() - 1));
        let mut out = Query::default();
        let mut context = Context::new(Fragment::SqlSelect, true);
        out.sql.push_str("SELECT ");
        separated_by(
            &mut out.sql,
            target_table.physical_names(),
            |out, name| {
                self.writer
                    .write_column_ref(&mut context, out, &column_ref(&selected, name))
            },
            ", ",
        );
        out.sql.push_str("\nFROM ");
        self.writer.write_table_ref(
            &mut context.switch_fragment(Fragment::SqlSelectFrom).current,
            &mut out.sql,
            table.table_ref(),
        );
        {
            let mut context = context.switch_fragment(Fragment::SqlJoin);
            let mut previous = table.table_ref().clone();
            for (i, (column, target, key)) in links.into_iter().enumerate() {
                let target = target.table_ref().with_alias(alias(i));
                out.sql.push('\n');
                self.writer
                    .write_join_keyword(&mut context.current, &mut out.sql);
                out.sql.push(' ');
                self.writer
                    .write_table_ref(&mut context.current, &mut out.sql, &target);
                out.sql.push_str(" ON ");
                self.writer.write_column_ref(
                    &mut context.current,
                    &mut out.sql,
                    &column_ref(&target, key),
                );
                out.sql.push_str(" = ");
                self.writer.write_column_ref(
                    &mut context.current,
                    &mut out.sql,
                    &column_ref(&previous, column.name()),
                );
                previous = target;
            }
        }
        self.write_filter(&mut context, &mut out, table, options)?;
        out.sql.push(';');
        Ok((out, target_table.clone()))
    }

    /// Insert of one row, the omitted autoincrement columns are requested back.
    pub fn compile_insert(&self, table: &Table, row: &EncodedRow) -> Result<Query> {
        let mut out = Query {
            sql: String::with_capacity(128 + row.fields.len() * 32),
            params: Vec::with_capacity(row.fields.len()),
        };
        let mut context = Context::new(Fragment::SqlInsertInto, false);
        out.sql.push_str("INSERT INTO ");
        self.writer
            .write_table_ref(&mut context, &mut out.sql, table.table_ref());
        if row.fields.is_empty() {
            self.writer
                .write_insert_default_values(&mut context, &mut out.sql);
        } else {
            out.sql.push_str(" (");
            separated_by(
                &mut out.sql,
                &row.fields,
                |out, (name, ..)| self.writer.write_identifier_quoted(&mut context, out, name),
                ", ",
            );
            out.sql.push_str(") VALUES\n(");
            let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
            separated_by(
                &mut out.sql,
                &row.fields,
                |out, _| self.writer.write_placeholder(&mut context.current, out),
                ", ",
            );
            out.sql.push(')');
            out.params
                .extend(row.fields.iter().map(|(_, value)| value.clone()));
        }
        let returning = row.omitted.iter().map(|c| c.name()).collect::<Vec<_>>();
        self.writer
            .write_returning(&mut context, &mut out.sql, &returning);
        out.sql.push(';');
        Ok(out)
    }

    pub fn compile_update(
        &self,
        table: &Table,
        assignments: &[Assignment],
        condition: &Where,
    ) -> Result<Query> {
        if assignments.is_empty() {
            return Err(Error::msg(format!(
                "Nothing to update in table `{}`",
                table.name()
            )));
        }
        let mut out = Query::default();
        let mut context = Context::new(Fragment::SqlUpdate, false);
        out.sql.push_str("UPDATE ");
        self.writer
            .write_table_ref(&mut context, &mut out.sql, table.table_ref());
        out.sql.push_str("\nSET ");
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            let mut first = true;
            for assignment in assignments {
                self.write_assignment(
                    &mut context.current,
                    &mut out,
                    table,
                    assignment,
                    &mut first,
                )?;
            }
        }
        out.sql.push_str("\nWHERE ");
        self.write_where(
            &mut context.switch_fragment(Fragment::SqlUpdateWhere).current,
            &mut out,
            table,
            condition,
        )?;
        out.sql.push(';');
        Ok(out)
    }

    /// Delete of the rows matching `condition`, all the rows when `None`.
    pub fn compile_delete(&self, table: &Table, condition: Option<&Where>) -> Result<Query> {
        let mut out = Query::default();
        let mut context = Context::new(Fragment::SqlDeleteFrom, false);
        out.sql.push_str("DELETE FROM ");
        self.writer
            .write_table_ref(&mut context, &mut out.sql, table.table_ref());
        if let Some(condition) = condition {
            out.sql.push_str("\nWHERE ");
            self.write_where(
                &mut context.switch_fragment(Fragment::SqlDeleteFromWhere).current,
                &mut out,
                table,
                condition,
            )?;
        }
        out.sql.push(';');
        Ok(out)
    }

    pub fn compile_count(&self, table: &Table, condition: Option<&Where>) -> Result<Query> {
        let mut out = Query::default();
        let mut context = Context::new(Fragment::SqlSelect, false);
        out.sql.push_str("SELECT ");
        self.writer.write_count_all(&mut context, &mut out.sql);
        out.sql.push_str("\nFROM ");
        self.writer.write_table_ref(
            &mut context.switch_fragment(Fragment::SqlSelectFrom).current,
            &mut out.sql,
            table.table_ref(),
        );
        if let Some(condition) = condition {
            out.sql.push_str("\nWHERE ");
            self.write_where(
                &mut context.switch_fragment(Fragment::SqlSelectWhere).current,
                &mut out,
                table,
                condition,
            )?;
        }
        out.sql.push(';');
        Ok(out)
    }

    fn write_node(
        &self,
        context: &mut Context,
        out: &mut Query,
        table: &Table,
        node: &Node,
    ) -> Result<()> {
        match node {
            Node::Property(path) if table.column(path).is_none() => {
                let parsed = PropertyPath::parse(path, table, self.schema)?;
                self.write_node(context, out, table, &parsed)?;
            }
            Node::Property(..) | Node::Reference(..) | Node::VirtualAccess(..) => {
                let path = ColumnPath::resolve(self.schema, table, node)?;
                self.write_column_path(context, &mut out.sql, &path)?;
            }
            Node::Literal(datum, mapper) => {
                let value = mapper.to_native(datum)?;
                self.writer.write_placeholder(context, &mut out.sql);
                out.params.push(value);
            }
            Node::Function { name, args, .. } => {
                if !self.schema.options().is_function_allowed(name) {
                    return Err(QuarryError::FunctionNotAllowed(name.to_string()).into());
                }
                self.writer.write_function_name(context, &mut out.sql, name);
                out.sql.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.sql.push_str(", ");
                    }
                    self.write_node(context, out, table, arg)?;
                }
                out.sql.push(')');
            }
            Node::Concat(lhs, rhs) => {
                self.write_node(context, out, table, lhs)?;
                self.writer.write_concat(context, &mut out.sql);
                self.write_node(context, out, table, rhs)?;
            }
            Node::ArrayIndex(base, index) => {
                if index.checked_add(1).is_none() {
                    return Err(QuarryError::invalid_path(
                        describe(node),
                        "the index is out of range",
                    )
                    .into());
                }
                possibly_parenthesized!(
                    out.sql,
                    !matches!(
                        **base,
                        Node::Property(..)
                            | Node::Reference(..)
                            | Node::VirtualAccess(..)
                            | Node::ArrayIndex(..)
                    ),
                    self.write_node(context, out, table, base)?
                );
                self.writer
                    .write_array_subscript(context, &mut out.sql, *index);
            }
        }
        Ok(())
    }

    /// Column, possibly reached through references. Each traversal is a correlated subselect on
    /// the target table aliased `r1`, `r2`, ... by depth, unless it selects the stored key itself.
    fn write_column_path(
        &self,
        context: &mut Context,
        out: &mut String,
        path: &ColumnPath,
    ) -> Result<()> {
        let physical = path.physical().ok_or_else(|| {
            QuarryError::invalid_path(
                path.column.name.to_string(),
                "a whole virtual column cannot be used as a single value",
            )
        })?;
        let Some(first) = path.hops.first() else {
            self.writer
                .write_column_ref(context, out, &column_ref(path.table.table_ref(), physical));
            return Ok(());
        };
        let mut context = context.switch_fragment(Fragment::SqlReference);
        context.current.qualify_columns = true;
        let mut expression = String::new();
        self.writer.write_column_ref(
            &mut context.current,
            &mut expression,
            &column_ref(first.from.table_ref(), first.column.name()),
        );
        for (i, hop) in path.hops.iter().enumerate() {
            let selected = match path.hops.get(i + 1) {
                Some(next) => next.column.name(),
                None => physical,
            };
            if selected == hop.key {
                continue;
            }
            let target = hop.target.table_ref().with_alias(format!("r{}", i + 1));
            let mut sql = String::with_capacity(64 + expression.len());
            sql.push_str("(SELECT ");
            self.writer
                .write_column_ref(&mut context.current, &mut sql, &column_ref(&target, selected));
            sql.push_str(" FROM ");
            self.writer
                .write_table_ref(&mut context.current, &mut sql, &target);
            sql.push_str(" WHERE ");
            self.writer
                .write_column_ref(&mut context.current, &mut sql, &column_ref(&target, hop.key));
            sql.push_str(" = ");
            sql.push_str(&expression);
            sql.push(')');
            expression = sql;
        }
        out.push_str(&expression);
        Ok(())
    }

    fn write_where(
        &self,
        context: &mut Context,
        out: &mut Query,
        table: &Table,
        condition: &Where,
    ) -> Result<()> {
        match condition {
            Where::Compare(op, lhs, rhs) => {
                self.write_node(context, out, table, lhs)?;
                self.writer.write_binary_op(context, &mut out.sql, *op);
                self.write_node(context, out, table, rhs)?;
            }
            Where::Between(value, low, high) => {
                self.write_node(context, out, table, value)?;
                out.sql.push_str(" BETWEEN ");
                self.write_node(context, out, table, low)?;
                out.sql.push_str(" AND ");
                self.write_node(context, out, table, high)?;
            }
            Where::IsNull(node) => {
                self.write_node(context, out, table, node)?;
                out.sql.push_str(" IS NULL");
            }
            Where::And(lhs, rhs) | Where::Or(lhs, rhs) => {
                out.sql.push('(');
                self.write_where(context, out, table, lhs)?;
                out.sql.push_str(if matches!(condition, Where::And(..)) {
                    ") AND ("
                } else {
                    ") OR ("
                });
                self.write_where(context, out, table, rhs)?;
                out.sql.push(')');
            }
            Where::Not(inner) => {
                out.sql.push_str("NOT (");
                self.write_where(context, out, table, inner)?;
                out.sql.push(')');
            }
            Where::Raw(node) => self.write_node(context, out, table, node)?,
        }
        Ok(())
    }

    fn write_filter(
        &self,
        context: &mut Context,
        out: &mut Query,
        table: &Table,
        options: &SelectOptions,
    ) -> Result<()> {
        if let Some(condition) = &options.condition {
            out.sql.push_str("\nWHERE ");
            self.write_where(
                &mut context.switch_fragment(Fragment::SqlSelectWhere).current,
                out,
                table,
                condition,
            )?;
        }
        if !options.order_by.is_empty() {
            out.sql.push_str("\nORDER BY ");
            let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
            for (i, ordered) in options.order_by.iter().enumerate() {
                if i > 0 {
                    out.sql.push_str(", ");
                }
                self.write_node(&mut context.current, out, table, &ordered.node)?;
                self.writer
                    .write_order(&mut context.current, &mut out.sql, ordered.order);
            }
        }
        if let Some(limit) = options.limit {
            self.writer.write_limit(context, &mut out.sql, limit);
        }
        Ok(())
    }

    fn write_assignment(
        &self,
        context: &mut Context,
        out: &mut Query,
        table: &Table,
        assignment: &Assignment,
        first: &mut bool,
    ) -> Result<()> {
        let node = Node::Property(assignment.path.clone());
        let path = ColumnPath::resolve(self.schema, table, &node)?;
        if !path.hops.is_empty() {
            return Err(QuarryError::invalid_path(
                assignment.path.to_string(),
                "only the columns of the table can be assigned",
            )
            .into());
        }
        match (&assignment.value, path.physical(), path.mapper()) {
            (AssignmentValue::Node(value), Some(physical), ..) => {
                self.write_set_target(context, &mut out.sql, physical, first);
                self.write_node(context, out, table, value)?;
            }
            (AssignmentValue::Datum(datum), Some(physical), Some(mapper)) => {
                let value = mapper.to_native(datum)?;
                self.write_set_target(context, &mut out.sql, physical, first);
                self.writer.write_placeholder(context, &mut out.sql);
                out.params.push(value);
            }
            (AssignmentValue::Datum(datum), None, ..) => {
                let Some(virtual_column) = path.column.virtual_column() else {
                    return Err(Error::msg(format!(
                        "Column `{}` has no physical storage",
                        path.column.name
                    )));
                };
                for (child, value) in virtual_column.flatten(datum)? {
                    self.write_set_target(context, &mut out.sql, &child.physical, first);
                    self.writer.write_placeholder(context, &mut out.sql);
                    out.params.push(value);
                }
            }
            _ => {
                return Err(QuarryError::invalid_path(
                    assignment.path.to_string(),
                    "a whole virtual column can only be assigned a value",
                )
                .into());
            }
        }
        Ok(())
    }

    fn write_set_target(
        &self,
        context: &mut Context,
        out: &mut String,
        name: &str,
        first: &mut bool,
    ) {
        if !*first {
            out.push_str(", ");
        }
        *first = false;
        self.writer.write_identifier_quoted(context, out, name);
        out.push_str(" = ");
    }
}
