/// Comparison operator of [`Where::Compare`](crate::Where::Compare).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Like,
    NotLike,
}
