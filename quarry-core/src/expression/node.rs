use crate::{
    BinaryOpType, Datum, DatumValue, Order, Ordered, Result, TypeKey, TypeMapper, TypeRegistry,
    Where,
};
use std::{borrow::Cow, sync::Arc};

/// Expression tree element, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Column of the table, or a property path (`location.world`, `author->name`, `tags[0]`)
    /// that is parsed when compiled.
    Property(Cow<'static, str>),
    /// Value bound as a parameter through its mapper.
    Literal(Datum, Arc<TypeMapper>),
    /// Function call, the name is written verbatim. `decode` is the mapper of the result, when
    /// missing the mapper of the first argument is used.
    Function {
        name: Cow<'static, str>,
        args: Vec<Node>,
        decode: Option<Arc<TypeMapper>>,
    },
    Concat(Box<Node>, Box<Node>),
    /// Zero based element access of a sequence.
    ArrayIndex(Box<Node>, usize),
    /// Column of the table targeted by the reference `base`.
    Reference(Box<Node>, Cow<'static, str>),
    /// Child of the virtual column `base`.
    VirtualAccess(Box<Node>, Cow<'static, str>),
}

/// Column or property path of the table.
pub fn property(path: impl Into<Cow<'static, str>>) -> Node {
    Node::Property(path.into())
}

/// Literal converted by the mapper registered in the global registry.
pub fn literal<T: DatumValue>(value: T) -> Result<Node> {
    literal_in(&TypeRegistry::global(), value)
}

/// Literal converted by the mapper registered in `registry`.
pub fn literal_in<T: DatumValue>(registry: &TypeRegistry, value: T) -> Result<Node> {
    let mapper = registry.lookup(&TypeKey::of::<T>())?;
    Ok(Node::Literal(Datum::new(value), mapper))
}

pub fn function(name: impl Into<Cow<'static, str>>, args: Vec<Node>) -> Node {
    Node::Function {
        name: name.into(),
        args,
        decode: None,
    }
}

/// Function call whose result is decoded with `decode`.
pub fn function_as(
    name: impl Into<Cow<'static, str>>,
    args: Vec<Node>,
    decode: Arc<TypeMapper>,
) -> Node {
    Node::Function {
        name: name.into(),
        args,
        decode: Some(decode),
    }
}

impl Node {
    pub fn index(self, index: usize) -> Node {
        Node::ArrayIndex(self.into(), index)
    }
    pub fn reference(self, column: impl Into<Cow<'static, str>>) -> Node {
        Node::Reference(self.into(), column.into())
    }
    pub fn child(self, name: impl Into<Cow<'static, str>>) -> Node {
        Node::VirtualAccess(self.into(), name.into())
    }
    pub fn concat(self, rhs: Node) -> Node {
        Node::Concat(self.into(), rhs.into())
    }
    pub fn compare(self, op: BinaryOpType, rhs: Node) -> Where {
        Where::Compare(op, self, rhs)
    }
    pub fn equal(self, rhs: Node) -> Where {
        self.compare(BinaryOpType::Equal, rhs)
    }
    pub fn not_equal(self, rhs: Node) -> Where {
        self.compare(BinaryOpType::NotEqual, rhs)
    }
    pub fn less(self, rhs: Node) -> Where {
        self.compare(BinaryOpType::Less, rhs)
    }
    pub fn greater(self, rhs: Node) -> Where {
        self.compare(BinaryOpType::Greater, rhs)
    }
    pub fn less_equal(self, rhs: Node) -> Where {
        self.compare(BinaryOpType::LessEqual, rhs)
    }
    pub fn greater_equal(self, rhs: Node) -> Where {
        self.compare(BinaryOpType::GreaterEqual, rhs)
    }
    pub fn like(self, pattern: Node) -> Where {
        self.compare(BinaryOpType::Like, pattern)
    }
    pub fn not_like(self, pattern: Node) -> Where {
        self.compare(BinaryOpType::NotLike, pattern)
    }
    pub fn between(self, low: Node, high: Node) -> Where {
        Where::Between(self, low, high)
    }
    pub fn is_null(self) -> Where {
        Where::IsNull(self)
    }
    pub fn asc(self) -> Ordered {
        Ordered {
            order: Order::ASC,
            node: self,
        }
    }
    pub fn desc(self) -> Ordered {
        Ordered {
            order: Order::DESC,
            node: self,
        }
    }
}
