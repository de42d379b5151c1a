use crate::{BinaryOpType, Node};
use std::ops::{BitAnd, BitOr, Not};

/// Boolean condition over [`Node`]s.
///
/// `&`, `|` and `!` combine conditions:
/// ```rust
/// use quarry_core::{literal, property};
/// let adult = property("age").greater_equal(literal(18).unwrap());
/// let named = property("name").like(literal("A%".to_string()).unwrap());
/// let _condition = adult & !named;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    Compare(BinaryOpType, Node, Node),
    /// Value, low and high bounds (inclusive).
    Between(Node, Node, Node),
    IsNull(Node),
    And(Box<Where>, Box<Where>),
    Or(Box<Where>, Box<Where>),
    Not(Box<Where>),
    /// Node used directly as a boolean.
    Raw(Node),
}

impl BitAnd for Where {
    type Output = Where;
    fn bitand(self, rhs: Where) -> Where {
        Where::And(self.into(), rhs.into())
    }
}

impl BitOr for Where {
    type Output = Where;
    fn bitor(self, rhs: Where) -> Where {
        Where::Or(self.into(), rhs.into())
    }
}

impl Not for Where {
    type Output = Where;
    fn not(self) -> Where {
        Where::Not(self.into())
    }
}

impl From<Node> for Where {
    fn from(value: Node) -> Self {
        Where::Raw(value)
    }
}
