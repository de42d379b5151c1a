use crate::{
    Column, ColumnKind, Node, QuarryError, Result, Schema, Table, TypeMapper, consume_while,
};
use std::{borrow::Cow, sync::Arc};

/// Parser of the property paths accepted by [`Node::Property`].
///
/// Grammar: `segment ('.' segment | '->' segment | '[' integer ']')*`, a segment is made of ASCII
/// letters, digits and underscores.
/// - The first segment names a column of the table.
/// - `.child` accesses a child of a virtual column.
/// - `->column` follows a reference column into its target table.
/// - `[n]` accesses the element `n` (zero based) of a sequence.
///
/// The parser only reads the table definitions, it never touches the database.
pub struct PropertyPath;

enum Current<'a> {
    Column(&'a Column),
    Value(Arc<TypeMapper>),
}

impl PropertyPath {
    pub fn parse(path: &str, table: &Table, schema: &Schema) -> Result<Node> {
        let invalid = |reason: String| QuarryError::invalid_path(path, reason);
        let mut input = path;
        let first = segment(&mut input);
        if first.is_empty() {
            return Err(invalid(if path.is_empty() {
                "the path is empty".into()
            } else {
                "the path must start with a column name".into()
            })
            .into());
        }
        let column = table.column(first).ok_or_else(|| {
            invalid(format!(
                "`{first}` is not a column of table `{}`",
                table.name()
            ))
        })?;
        let mut node = Node::Property(first.to_string().into());
        let mut current = Current::Column(column);
        while !input.is_empty() {
            if let Some(rest) = input.strip_prefix("->") {
                input = rest;
                let name = expect_segment(&mut input, "->").map_err(&invalid)?;
                let Current::Column(Column {
                    name: reference,
                    kind: ColumnKind::Reference { target, .. },
                    ..
                }) = current
                else {
                    return Err(invalid(format!(
                        "`->{name}` follows a value that is not a reference column"
                    ))
                    .into());
                };
                let target_table = schema.table(&target.table).map_err(|_| {
                    invalid(format!(
                        "the reference `{reference}` targets the unknown table `{}`",
                        target.table
                    ))
                })?;
                let column = target_table.column(name).ok_or_else(|| {
                    invalid(format!(
                        "`{name}` is not a column of table `{}`",
                        target_table.name()
                    ))
                })?;
                node = node.reference(Cow::Owned(name.to_string()));
                current = Current::Column(column);
            } else if let Some(rest) = input.strip_prefix('.') {
                input = rest;
                let name = expect_segment(&mut input, ".").map_err(&invalid)?;
                let Current::Column(Column {
                    name: parent,
                    kind: ColumnKind::Virtual(virtual_column),
                    ..
                }) = current
                else {
                    return Err(invalid(format!(
                        "`.{name}` follows a value that is not a virtual column"
                    ))
                    .into());
                };
                let child = virtual_column.child(name).ok_or_else(|| {
                    invalid(format!(
                        "the virtual column `{parent}` does not declare the child `{name}`"
                    ))
                })?;
                node = node.child(Cow::Owned(name.to_string()));
                current = Current::Value(child.mapper.clone());
            } else if let Some(rest) = input.strip_prefix('[') {
                input = rest;
                let digits = consume_while(&mut input, char::is_ascii_digit);
                if digits.is_empty() {
                    return Err(invalid("the index must be a non negative integer".into()).into());
                }
                let Some(rest) = input.strip_prefix(']') else {
                    return Err(invalid("the index is not terminated by `]`".into()).into());
                };
                input = rest;
                let index = digits
                    .parse::<usize>()
                    .map_err(|e| invalid(format!("invalid index `{digits}`: {e}")))?;
                let mapper = match current {
                    Current::Column(column) => column.mapper().cloned().ok_or_else(|| {
                        invalid(format!(
                            "the virtual column `{}` cannot be indexed",
                            column.name
                        ))
                    })?,
                    Current::Value(mapper) => mapper,
                };
                let element = schema
                    .registry()
                    .element_of(&mapper)
                    .map_err(|e| invalid(format!("{e:#}")))?;
                node = node.index(index);
                current = Current::Value(element);
            } else {
                return Err(invalid(format!("unexpected `{input}`")).into());
            }
        }
        Ok(node)
    }
}

fn segment<'s>(input: &mut &'s str) -> &'s str {
    consume_while(input, |c| c.is_ascii_alphanumeric() || *c == '_')
}

fn expect_segment<'s>(
    input: &mut &'s str,
    after: &str,
) -> std::result::Result<&'s str, String> {
    let result = segment(input);
    if result.is_empty() {
        return Err(format!("expected a name after `{after}`"));
    }
    Ok(result)
}
