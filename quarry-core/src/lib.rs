mod as_value;
mod column;
mod compiler;
mod datum;
mod error;
mod executor;
mod expression;
mod mapper;
mod path;
mod query;
mod record;
mod reference;
mod registry;
mod repository;
mod schema;
mod table;
mod util;
mod value;
mod virtual_column;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use column::*;
pub use compiler::*;
pub use datum::*;
pub use error::*;
pub use executor::*;
pub use expression::*;
pub use mapper::*;
pub use path::*;
pub use query::*;
pub use record::*;
pub use reference::*;
pub use registry::*;
pub use repository::*;
pub use schema::*;
pub use table::*;
pub use util::*;
pub use value::*;
pub use virtual_column::*;
pub use writer::{GenericSqlWriter, SqlWriter};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
