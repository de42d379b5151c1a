use crate::{
    BinaryOpType, ColumnRef, Order, TableRef,
    writer::{Context, Fragment},
};
use std::fmt::Write;

/// Dialect printer of the SQL tokens the compiler emits.
///
/// Every method has a default rendering close to PostgreSQL, a dialect overrides only what differs.
pub trait SqlWriter {
    /// Whether the current fragment context allows alias declaration.
    fn alias_declaration(&self, context: &mut Context) -> bool {
        matches!(
            context.fragment,
            Fragment::SqlSelectFrom | Fragment::SqlJoin | Fragment::SqlReference
        )
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render a table reference, declaring the alias where allowed.
    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if self.alias_declaration(context) || value.alias.is_empty() {
            if !value.schema.is_empty() {
                self.write_identifier_quoted(context, out, &value.schema);
                out.push('.');
            }
            self.write_identifier_quoted(context, out, &value.name);
            if !value.alias.is_empty() {
                out.push(' ');
            }
        }
        if !value.alias.is_empty() {
            self.write_identifier_quoted(context, out, &value.alias);
        }
    }

    /// Render a column reference optionally qualifying with schema/table.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, value: &ColumnRef) {
        if context.qualify_columns && !value.table.is_empty() {
            if !value.schema.is_empty() {
                self.write_identifier_quoted(context, out, value.schema);
                out.push('.');
            }
            self.write_identifier_quoted(context, out, value.table);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, value.name);
    }

    /// Positional parameter marker, `context.counter` is incremented for each one.
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        out.push('?');
    }

    fn write_binary_op(&self, _context: &mut Context, out: &mut String, value: BinaryOpType) {
        out.push_str(match value {
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " != ",
            BinaryOpType::Less => " < ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::Like => " LIKE ",
            BinaryOpType::NotLike => " NOT LIKE ",
        });
    }

    /// String concatenation operator.
    fn write_concat(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" || ");
    }

    /// Element access, `index` is zero based and SQL arrays are one based.
    fn write_array_subscript(&self, _context: &mut Context, out: &mut String, index: usize) {
        let _ = write!(out, "[{}]", index + 1);
    }

    /// Function names are trusted input and written verbatim.
    fn write_function_name(&self, _context: &mut Context, out: &mut String, name: &str) {
        out.push_str(name);
    }

    fn write_order(&self, _context: &mut Context, out: &mut String, order: Order) {
        out.push_str(match order {
            Order::ASC => " ASC",
            Order::DESC => " DESC",
        });
    }

    fn write_limit(&self, _context: &mut Context, out: &mut String, limit: u32) {
        let _ = write!(out, "\nLIMIT {}", limit);
    }

    fn write_count_all(&self, _context: &mut Context, out: &mut String) {
        out.push_str("COUNT(*)");
    }

    fn write_join_keyword(&self, _context: &mut Context, out: &mut String) {
        out.push_str("JOIN");
    }

    /// Row without explicit values, all columns take their default.
    fn write_insert_default_values(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" DEFAULT VALUES");
    }

    /// Ask the database for the values it generated.
    fn write_returning(&self, context: &mut Context, out: &mut String, columns: &[&str]) {
        if columns.is_empty() {
            return;
        }
        out.push_str("\nRETURNING ");
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoReturning);
        crate::separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(&mut context.current, out, v),
            ", ",
        );
    }
}

/// Fallback generic SQL writer (closest to PostgreSQL / DuckDB conventions).
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;
impl GenericSqlWriter {
    /// Construct a new generic writer.
    pub const fn new() -> Self {
        Self {}
    }
}
impl SqlWriter for GenericSqlWriter {}
