use crate::{
    Column, Node, PropertyPath, QuarryError, Result, Schema, Table, TypeMapper, VirtualChild,
};
use std::{fmt::Write, sync::Arc};

/// Traversal of a reference column into its target table.
#[derive(Debug, Clone, Copy)]
pub struct Hop<'t> {
    /// Table owning the reference column.
    pub from: &'t Table,
    /// The reference column.
    pub column: &'t Column,
    pub target: &'t Table,
    /// Key column of `target` stored by the reference.
    pub key: &'t str,
}

/// Column reached by a chain of property accesses, starting from a column of `root`.
#[derive(Debug, Clone)]
pub struct ColumnPath<'t> {
    pub root: &'t Table,
    /// Reference traversals, the first one starts from `root`.
    pub hops: Vec<Hop<'t>>,
    /// Table owning `column`.
    pub table: &'t Table,
    pub column: &'t Column,
    pub child: Option<&'t VirtualChild>,
}

impl<'t> ColumnPath<'t> {
    /// Resolve `node` against `table`, only property, reference and virtual access nodes are
    /// column paths.
    pub fn resolve(schema: &'t Schema, table: &'t Table, node: &Node) -> Result<Self> {
        match node {
            Node::Property(path) => {
                if let Some(column) = table.column(path) {
                    return Ok(ColumnPath {
                        root: table,
                        hops: Vec::new(),
                        table,
                        column,
                        child: None,
                    });
                }
                let parsed = PropertyPath::parse(path, table, schema)?;
                if matches!(parsed, Node::Property(..)) {
                    return Err(
                        QuarryError::invalid_path(path.to_string(), "unknown column").into(),
                    );
                }
                Self::resolve(schema, table, &parsed)
            }
            Node::Reference(base, name) => {
                let mut result = Self::resolve(schema, table, base)?;
                let invalid = |reason: &str| QuarryError::invalid_path(describe(node), reason);
                let target = match (result.child, result.column.reference()) {
                    (None, Some(target)) => target,
                    _ => return Err(invalid("only reference columns can be followed").into()),
                };
                let target_table: &'t Table = schema.table(&target.table)?;
                let column = target_table.column(name).ok_or_else(|| {
                    invalid(&format!(
                        "`{name}` is not a column of table `{}`",
                        target_table.name()
                    ))
                })?;
                result.hops.push(Hop {
                    from: result.table,
                    column: result.column,
                    target: target_table,
                    key: &target.column,
                });
                result.table = target_table;
                result.column = column;
                Ok(result)
            }
            Node::VirtualAccess(base, name) => {
                let mut result = Self::resolve(schema, table, base)?;
                let invalid = |reason: &str| QuarryError::invalid_path(describe(node), reason);
                let virtual_column = match (result.child, result.column.virtual_column()) {
                    (None, Some(virtual_column)) => virtual_column,
                    _ => return Err(invalid("only virtual columns have children").into()),
                };
                result.child = Some(virtual_column.child(name).ok_or_else(|| {
                    invalid(&format!(
                        "the virtual column `{}` does not declare the child `{name}`",
                        result.column.name
                    ))
                })?);
                Ok(result)
            }
            _ => Err(QuarryError::invalid_path(describe(node), "not a column path").into()),
        }
    }

    /// Physical column holding the value, `None` for a whole virtual column.
    pub fn physical(&self) -> Option<&'t str> {
        match self.child {
            Some(child) => Some(child.physical.as_ref()),
            None if self.column.virtual_column().is_some() => None,
            None => Some(self.column.name.as_ref()),
        }
    }

    /// Mapper of the value, `None` for a whole virtual column.
    pub fn mapper(&self) -> Option<&'t Arc<TypeMapper>> {
        match self.child {
            Some(child) => Some(&child.mapper),
            None => self.column.mapper(),
        }
    }
}

/// Path like rendering of a node, used in error messages.
pub(crate) fn describe(node: &Node) -> String {
    let mut out = String::new();
    describe_into(&mut out, node);
    out
}

fn describe_into(out: &mut String, node: &Node) {
    match node {
        Node::Property(path) => out.push_str(path),
        Node::Literal(datum, ..) => {
            let _ = write!(out, "{datum:?}");
        }
        Node::Function { name, args, .. } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                describe_into(out, arg);
            }
            out.push(')');
        }
        Node::Concat(lhs, rhs) => {
            describe_into(out, lhs);
            out.push_str(" || ");
            describe_into(out, rhs);
        }
        Node::ArrayIndex(base, index) => {
            describe_into(out, base);
            let _ = write!(out, "[{index}]");
        }
        Node::Reference(base, column) => {
            describe_into(out, base);
            let _ = write!(out, "->{column}");
        }
        Node::VirtualAccess(base, child) => {
            describe_into(out, base);
            let _ = write!(out, ".{child}");
        }
    }
}
