use std::borrow::Cow;

/// Failures raised by the mapping layer itself.
///
/// They travel inside [`crate::Error`] (an `anyhow::Error`), match them with
/// `error.downcast_ref::<QuarryError>()`.
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    #[error("No type mapper is registered for `{0}`")]
    MapperNotFound(String),
    #[error("The type mapper chain of `{0}` is cyclic")]
    CyclicMapper(String),
    #[error("Invalid property path `{path}`: {reason}")]
    InvalidPropertyPath { path: String, reason: String },
    #[error("Table `{0}` has no key columns")]
    MissingKey(Cow<'static, str>),
    #[error("Function `{0}` is not in the allowed functions list")]
    FunctionNotAllowed(String),
    #[error("Invalid definition of table `{table}`: {reason}")]
    InvalidTable { table: String, reason: String },
    #[error("Table `{0}` is not part of the schema")]
    UnknownTable(String),
    /// Context attached over the error reported by the executor, the original error is kept as
    /// the source.
    #[error("The executor failed to run the query:\n{0}")]
    Executor(String),
}

impl QuarryError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPropertyPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            table: table.into(),
            reason: reason.into(),
        }
    }
}
