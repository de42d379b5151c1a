#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use indoc::indoc;
    use quarry::{
        ColumnDef, QuarryError, QueryResult, Record, RowLabeled, Schema, SelectOptions, Table,
        TypeRegistry, Value, function, literal, property,
    };
    use quarry_tests::{
        Isbn, Location, MockExecutor, book, init_logs, library_schema, row, silent_logs,
    };
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn echo(table: &Table, params: Vec<Value>) -> RowLabeled {
        RowLabeled::new(
            table
                .physical_names()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
                .into(),
            params.into(),
        )
    }

    #[tokio::test]
    async fn crud_insert_generated_keys() {
        init_logs();
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::new();
        executor.respond([QueryResult::GeneratedKeys(row(
            ["id"],
            [Value::Int64(Some(42))],
        ))]);
        let record = book("Dune", "978-0441013593", 1, &["scifi"]);
        let inserted = books.insert(&mut executor, &record).await.unwrap();
        assert_eq!(inserted.value::<i64>("id").unwrap(), 42);
        assert_eq!(inserted.with("id", 0i64), record.with("id", 0i64));
        assert_eq!(
            executor.last_query().unwrap().sql,
            indoc! {r#"
                INSERT INTO "books" ("title", "isbn", "author", "tags") VALUES
                (?, ?, ?, ?)
                RETURNING "id";
            "#}
            .trim()
        );
    }

    #[tokio::test]
    async fn crud_insert_last_affected_id() {
        let schema = library_schema().unwrap();
        let authors = schema.repository("authors").unwrap();
        let mut executor = MockExecutor::new();
        executor.respond_affected(1, Some(9));
        let record = Record::new()
            .with("name", "Ursula K. Le Guin".to_string())
            .with("location", Location::new("Berkeley", "USA"));
        let inserted = authors.insert(&mut executor, &record).await.unwrap();
        assert_eq!(inserted.value::<i64>("id").unwrap(), 9);
        assert_eq!(
            inserted.value::<Location>("location").unwrap(),
            Location::new("Berkeley", "USA")
        );

        executor.respond_affected(1, None);
        let inserted = authors.insert(&mut executor, &record).await.unwrap();
        assert_eq!(inserted, record);
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::new();
        let record = book("Emma", "978-0141439587", 2, &["classic", "romance"]).with("id", 3i64);
        let inserted = books.insert(&mut executor, &record).await.unwrap();
        assert_eq!(inserted, record);
        let params = executor.take_queries().remove(0).params;

        executor.respond_rows([echo(books.table(), params)]);
        let found = books
            .find(&mut executor, &Record::new().with("id", 3i64))
            .await
            .unwrap();
        assert_eq!(found, Some(record));
        let query = executor.last_query().unwrap();
        assert_eq!(
            query.sql,
            indoc! {r#"
                SELECT "id", "title", "isbn", "author", "tags"
                FROM "books"
                WHERE "id" = ?
                LIMIT 1;
            "#}
            .trim()
        );
        assert_eq!(query.params, [Value::Int64(Some(3))]);

        let missing = books
            .find(&mut executor, &Record::new().with("id", 4i64))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn crud_typed_columns() {
        let registry = Arc::new(TypeRegistry::with_defaults());
        let mut schema = Schema::new(registry.clone());
        schema.add(
            Table::builder("payments", &registry)
                .column(ColumnDef::new::<Uuid>("id").primary_key())
                .column(ColumnDef::new::<Decimal>("amount"))
                .column(ColumnDef::new::<time::OffsetDateTime>("paid_at"))
                .column(ColumnDef::new::<time::Date>("due"))
                .build()
                .unwrap(),
        );
        let payments = schema.repository("payments").unwrap();
        let record = Record::new()
            .with("id", Uuid::from_u128(0x5eed))
            .with("amount", Decimal::new(1999, 2))
            .with("paid_at", datetime!(2025-03-14 15:09:26 UTC))
            .with("due", date!(2025-03-31));
        let mut executor = MockExecutor::new();
        payments.insert(&mut executor, &record).await.unwrap();
        let query = executor.take_queries().remove(0);
        assert_eq!(
            query.sql,
            indoc! {r#"
                INSERT INTO "payments" ("id", "amount", "paid_at", "due") VALUES
                (?, ?, ?, ?);
            "#}
            .trim()
        );
        assert_eq!(query.params[1], Value::Decimal(Some(Decimal::new(1999, 2))));

        executor.respond_rows([echo(payments.table(), query.params)]);
        let records = payments
            .select(&mut executor, SelectOptions::new())
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(records, [record]);
    }

    #[tokio::test]
    async fn crud_update() {
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::numbered();
        executor.respond_affected(1, None);
        let record = book("Dune", "978-0441013593", 1, &[]).with("id", 7i64);
        let affected = books.update(&mut executor, &record).await.unwrap();
        assert_eq!(affected.rows_affected, 1);
        let query = executor.last_query().unwrap();
        assert_eq!(
            query.sql,
            indoc! {r#"
                UPDATE "books"
                SET "title" = $1, "isbn" = $2, "author" = $3, "tags" = $4
                WHERE "id" = $5;
            "#}
            .trim()
        );
        assert_eq!(query.params[4], Value::Int64(Some(7)));
        assert_eq!(
            query.params[3],
            Value::List(Some(vec![]), Box::new(Value::Varchar(None)))
        );

        let error = books
            .update(&mut executor, &book("Dune", "978-0441013593", 1, &[]))
            .await
            .unwrap_err();
        assert!(format!("{error:#}").contains("`id`"), "{error:#}");
        assert_eq!(executor.queries.len(), 1);
    }

    #[tokio::test]
    async fn crud_update_only_keys() {
        let registry = Arc::new(TypeRegistry::with_defaults());
        let mut schema = Schema::new(registry.clone());
        schema.add(
            Table::builder("labels", &registry)
                .column(ColumnDef::new::<String>("name").primary_key())
                .build()
                .unwrap(),
        );
        let labels = schema.repository("labels").unwrap();
        let mut executor = MockExecutor::new();
        let error = labels
            .update(&mut executor, &Record::new().with("name", "scifi".to_string()))
            .await
            .unwrap_err();
        assert!(
            format!("{error:#}").contains("Nothing to update in table `labels`"),
            "{error:#}"
        );
        assert!(executor.queries.is_empty());
    }

    #[tokio::test]
    async fn crud_delete() {
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::new();
        let record = Record::new().with("id", 5i64);

        executor.respond_affected(1, None);
        books.delete_record(&mut executor, &record).await.unwrap();
        assert_eq!(
            executor.last_query().unwrap().sql,
            indoc! {r#"
                DELETE FROM "books"
                WHERE "id" = ?;
            "#}
            .trim()
        );

        executor.respond_affected(0, None);
        silent_logs! {
            let error = books.delete_record(&mut executor, &record).await.unwrap_err();
            assert!(error.to_string().contains("deleted 0 rows"), "{error}");
        }

        executor.respond_affected(4, None);
        let affected = books.delete(&mut executor, None).await.unwrap();
        assert_eq!(affected.rows_affected, 4);
        assert_eq!(executor.last_query().unwrap().sql, r#"DELETE FROM "books";"#);
    }

    #[tokio::test]
    async fn crud_row_count() {
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::new();
        executor.respond_rows([row(["COUNT(*)"], [Value::Int64(Some(3))])]);
        let condition =
            property("author->name").equal(literal("Jane Austen".to_string()).unwrap());
        let count = books
            .row_count(&mut executor, Some(&condition))
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert!(books.row_count(&mut executor, None).await.is_err());
    }

    #[tokio::test]
    async fn crud_select_values() {
        let schema = library_schema().unwrap();
        let authors = schema.repository("authors").unwrap();
        let mut executor = MockExecutor::new();
        executor.respond_rows([
            row(
                ["location_city", "location_country"],
                [Value::from("Tacoma"), Value::from("USA")],
            ),
            row(
                ["location_city", "location_country"],
                [Value::Varchar(None), Value::Varchar(None)],
            ),
        ]);
        let locations = authors
            .select_values(&mut executor, &property("location"), SelectOptions::new())
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(
            locations[0].get::<Location>().unwrap(),
            Location::new("Tacoma", "USA")
        );
        assert!(locations[1].is_null());

        executor.respond_rows([row(["location_city"], [Value::from("Berkeley")])]);
        let cities = authors
            .select_values(&mut executor, &property("location.city"), SelectOptions::new())
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].get::<String>().unwrap(), "Berkeley");
        assert_eq!(
            executor.last_query().unwrap().sql,
            indoc! {r#"
                SELECT "location_city"
                FROM "authors";
            "#}
            .trim()
        );

        let books = schema.repository("books").unwrap();
        executor.respond_rows([
            row(["title"], [Value::from("Dune")]),
            row(["title"], [Value::from("Emma")]),
        ]);
        let titles = books
            .select_values(
                &mut executor,
                &function("upper", vec![property("title")]),
                SelectOptions::new().order_by(property("title").asc()),
            )
            .unwrap()
            .and_then(|v| async move { v.get::<String>() })
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(titles, ["Dune", "Emma"]);

        executor.respond_rows([row(["isbn"], [Value::from("978-0441013593")])]);
        let isbns = books
            .select_values(&mut executor, &property("isbn"), SelectOptions::new())
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(
            isbns[0].get::<Isbn>().unwrap(),
            Isbn("978-0441013593".into())
        );
    }

    #[tokio::test]
    async fn crud_select_references() {
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::new();
        executor.respond_rows([row(
            ["id", "name", "publisher", "location_city", "location_country"],
            [
                Value::Int64(Some(1)),
                Value::from("Frank Herbert"),
                Value::Int64(Some(2)),
                Value::from("Tacoma"),
                Value::from("USA"),
            ],
        )]);
        let authors = books
            .select_references(
                &mut executor,
                &property("author"),
                SelectOptions::new()
                    .filter(property("title").like(literal("D%".to_string()).unwrap())),
            )
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(
            authors,
            [Record::new()
                .with("id", 1i64)
                .with("name", "Frank Herbert".to_string())
                .with("publisher", 2i64)
                .with("location", Location::new("Tacoma", "USA"))]
        );
        assert!(
            executor
                .last_query()
                .unwrap()
                .sql
                .contains(r#"JOIN "authors" "r1" ON "r1"."id" = "books"."author""#)
        );
    }

    #[tokio::test]
    async fn crud_executor_failure() {
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::new();
        executor.fail("connection reset");
        let error = books
            .insert(&mut executor, &book("Dune", "978-0441013593", 1, &[]))
            .await
            .unwrap_err();
        match error.downcast_ref::<QuarryError>() {
            Some(QuarryError::Executor(sql)) => assert!(sql.contains("INSERT INTO"), "{sql}"),
            _ => panic!("Unexpected error: {error:#}"),
        }
        assert!(format!("{error:#}").contains("connection reset"), "{error:#}");

        executor.fail("timeout");
        let error = books
            .select(&mut executor, SelectOptions::new())
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<QuarryError>(),
            Some(QuarryError::Executor(..))
        ));
        assert!(format!("{error:#}").contains("timeout"), "{error:#}");
    }

    #[tokio::test]
    async fn crud_compile_error_sends_nothing() {
        let schema = library_schema().unwrap();
        let books = schema.repository("books").unwrap();
        let mut executor = MockExecutor::new();
        assert!(
            books
                .select_values(
                    &mut executor,
                    &function("pg_sleep", vec![literal(10i64).unwrap()]),
                    SelectOptions::new(),
                )
                .is_err()
        );
        assert!(
            books
                .select(
                    &mut executor,
                    SelectOptions::new().filter(property("author->pages").is_null()),
                )
                .is_err()
        );
        assert!(
            books
                .delete(
                    &mut executor,
                    Some(&property("missing").equal(literal(1i64).unwrap()))
                )
                .await
                .is_err()
        );
        assert!(executor.queries.is_empty());
    }
}
