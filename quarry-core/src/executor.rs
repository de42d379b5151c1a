use crate::{
    ExecutionResult, Query, QueryResult, Result, RowLabeled, SqlWriter,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Database backend, provides the dialect used to write the statements.
pub trait Driver {
    const NAME: &'static str;
    type SqlWriter: SqlWriter;

    fn sql_writer(&self) -> Self::SqlWriter;
}

/// Runs statements with their bound parameters.
///
/// Implemented outside of this crate by the connection layer. Errors are passed through as they
/// are, nothing here retries or cancels a statement.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to send any query and return any result type (rows, keys or count).
    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the query and returns the rows.
    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the query and collect everything it produced.
    fn execute(&mut self, query: Query) -> impl Future<Output = Result<ExecutionResult>> + Send {
        self.run(query).try_collect()
    }
}
