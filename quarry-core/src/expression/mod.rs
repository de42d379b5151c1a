mod binary_op;
mod condition;
mod node;
mod ordered;

pub use binary_op::*;
pub use condition::*;
pub use node::*;
pub use ordered::*;
