use async_stream::stream;
use quarry::{
    Driver, Error, Executor, Query, QueryResult, Result, RowLabeled, RowsAffected, SqlWriter,
    Value, stream::Stream, writer::Context,
};
use std::{collections::VecDeque, fmt::Write, mem};

/// Dialect of the mock driver, `numbered` writes `$1, $2, ...` placeholders instead of `?`.
#[derive(Default, Debug, Clone, Copy)]
pub struct MockSqlWriter {
    pub numbered: bool,
}

impl SqlWriter for MockSqlWriter {
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        if self.numbered {
            let _ = write!(out, "${}", context.counter);
        } else {
            out.push('?');
        }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MockDriver {
    pub numbered: bool,
}

impl Driver for MockDriver {
    const NAME: &'static str = "mock";
    type SqlWriter = MockSqlWriter;

    fn sql_writer(&self) -> MockSqlWriter {
        MockSqlWriter {
            numbered: self.numbered,
        }
    }
}

/// Executor that records every statement and answers with the queued responses, one response for
/// each statement in order. A statement without a queued response produces nothing.
#[derive(Default, Debug)]
pub struct MockExecutor {
    driver: MockDriver,
    pub queries: Vec<Query>,
    responses: VecDeque<Vec<Result<QueryResult>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn numbered() -> Self {
        Self {
            driver: MockDriver { numbered: true },
            ..Default::default()
        }
    }

    /// Queue the items produced by the next statement.
    pub fn respond(&mut self, items: impl IntoIterator<Item = QueryResult>) -> &mut Self {
        self.responses.push_back(items.into_iter().map(Ok).collect());
        self
    }

    pub fn respond_rows(&mut self, rows: impl IntoIterator<Item = RowLabeled>) -> &mut Self {
        self.respond(rows.into_iter().map(QueryResult::Row))
    }

    pub fn respond_affected(
        &mut self,
        rows_affected: u64,
        last_affected_id: Option<i64>,
    ) -> &mut Self {
        self.respond([QueryResult::Affected(RowsAffected {
            rows_affected,
            last_affected_id,
        })])
    }

    /// The next statement fails with `message`.
    pub fn fail(&mut self, message: &str) -> &mut Self {
        self.responses.push_back(vec![Err(Error::msg(message.to_string()))]);
        self
    }

    pub fn last_query(&self) -> Option<&Query> {
        self.queries.last()
    }

    pub fn take_queries(&mut self) -> Vec<Query> {
        mem::take(&mut self.queries)
    }
}

impl Executor for MockExecutor {
    type Driver = MockDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        log::trace!("Mock executor received:\n{}", query);
        self.queries.push(query);
        let items = self.responses.pop_front().unwrap_or_default();
        stream! {
            for item in items {
                yield item;
            }
        }
    }
}

/// Labeled row from column names and native values.
pub fn row<const N: usize>(labels: [&str; N], values: [Value; N]) -> RowLabeled {
    RowLabeled::new(
        labels
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into(),
        values.into(),
    )
}
