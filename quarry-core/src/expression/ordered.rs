use crate::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ASC,
    DESC,
}

/// Sorting key of a select.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered {
    pub order: Order,
    pub node: Node,
}
