#[cfg(test)]
mod tests {
    use quarry_core::{
        ColumnDef, Datum, FnCodec, Parts, QuarryError, Record, RowLabeled, Table, TypeRegistry,
        Value,
    };
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Size {
        width: u32,
        height: u32,
    }

    fn size_codec() -> FnCodec<Size> {
        FnCodec::new(
            |v: &Size| Ok(Parts::new().with("width", v.width).with("height", v.height)),
            |p: &Parts| {
                Ok(Size {
                    width: p.get("width")?,
                    height: p.get("height")?,
                })
            },
        )
    }

    fn pictures(registry: &TypeRegistry) -> Table {
        Table::builder("pictures", registry)
            .column(ColumnDef::new::<i64>("id").primary_key().autoincrement())
            .column(
                ColumnDef::virtual_column::<Size>("size", size_codec())
                    .child::<u32>("width")
                    .child_named::<u32>("height", "tall"),
            )
            .build()
            .expect("Could not build the pictures table")
    }

    fn invalid_table(result: quarry_core::Result<Table>) -> String {
        let error = result.expect_err("The table should not build");
        match error.downcast_ref::<QuarryError>() {
            Some(QuarryError::InvalidTable { reason, .. }) => reason.clone(),
            _ => panic!("Unexpected error: {error:#}"),
        }
    }

    #[test]
    fn virtual_children() {
        let registry = TypeRegistry::with_defaults();
        let table = pictures(&registry);
        assert_eq!(table.physical_names(), ["id", "size_width", "tall"]);
        let column = table.column("size").unwrap();
        assert!(column.mapper().is_none());
        let virtual_column = column.virtual_column().unwrap();
        assert_eq!(virtual_column.child("width").unwrap().physical, "size_width");
        assert!(virtual_column.child("depth").is_none());
    }

    #[test]
    fn virtual_round_trip() {
        let registry = TypeRegistry::with_defaults();
        let table = pictures(&registry);
        let virtual_column = table.column("size").unwrap().virtual_column().unwrap();
        let value = Datum::new(Size {
            width: 640,
            height: 480,
        });
        let flat = virtual_column.flatten(&value).unwrap();
        assert_eq!(
            flat.iter()
                .map(|(c, v)| (c.physical.as_ref(), v.clone()))
                .collect::<Vec<_>>(),
            [
                ("size_width", Value::UInt32(Some(640))),
                ("tall", Value::UInt32(Some(480))),
            ]
        );
        let mut values = flat.into_iter().map(|(_, v)| v);
        let assembled = virtual_column
            .assemble(|_| Ok(values.next().unwrap()))
            .unwrap();
        assert_eq!(assembled, value);
    }

    #[test]
    fn virtual_nulls() {
        let registry = TypeRegistry::with_defaults();
        let table = pictures(&registry);
        let virtual_column = table.column("size").unwrap().virtual_column().unwrap();
        let flat = virtual_column.flatten(&Datum::null()).unwrap();
        assert!(flat.iter().all(|(_, v)| *v == Value::UInt32(None)));
        let assembled = virtual_column
            .assemble(|_| Ok(Value::UInt32(None)))
            .unwrap();
        assert!(assembled.is_null());
    }

    #[test]
    fn virtual_undeclared_child() {
        let registry = TypeRegistry::with_defaults();
        let table = Table::builder("pictures", &registry)
            .column(ColumnDef::new::<i64>("id").primary_key())
            .column(
                ColumnDef::virtual_column::<Size>("size", size_codec()).child::<u32>("width"),
            )
            .build()
            .unwrap();
        let virtual_column = table.column("size").unwrap().virtual_column().unwrap();
        let error = virtual_column
            .flatten(&Datum::new(Size {
                width: 1,
                height: 2,
            }))
            .unwrap_err();
        assert!(format!("{error:#}").contains("height"), "{error:#}");
    }

    #[test]
    fn table_encode_decode() {
        let registry = TypeRegistry::with_defaults();
        let table = pictures(&registry);
        let record = Record::new().with(
            "size",
            Size {
                width: 3,
                height: 4,
            },
        );
        let row = table.encode_record(&record).unwrap();
        assert_eq!(
            row.fields,
            [
                ("size_width", Value::UInt32(Some(3))),
                ("tall", Value::UInt32(Some(4))),
            ]
        );
        assert_eq!(row.omitted.len(), 1);
        assert_eq!(row.omitted[0].name(), "id");

        let decoded = table
            .decode_row(&RowLabeled::new(
                Arc::from(["tall".to_string(), "id".to_string(), "size_width".to_string()]),
                [
                    Value::Int32(Some(4)),
                    Value::Int64(Some(1)),
                    Value::UInt32(Some(3)),
                ]
                .into(),
            ))
            .unwrap();
        assert_eq!(decoded.value::<i64>("id").unwrap(), 1);
        assert_eq!(
            decoded.value::<Size>("size").unwrap(),
            Size {
                width: 3,
                height: 4
            }
        );
        let missing = table.decode_row(&RowLabeled::new(
            Arc::from(["id".to_string()]),
            [Value::Int64(Some(1))].into(),
        ));
        assert!(missing.is_err());
    }

    #[test]
    fn table_identity() {
        let registry = TypeRegistry::with_defaults();
        let table = pictures(&registry);
        assert!(table.identity(&Record::new()).is_err());
        assert!(table.identity(&Record::new().with("id", 7i64)).is_ok());

        let keyless = Table::builder("notes", &registry)
            .column(ColumnDef::new::<String>("text"))
            .build()
            .unwrap();
        let error = keyless
            .identity(&Record::new().with("text", "x".to_string()))
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<QuarryError>(),
            Some(QuarryError::MissingKey(..))
        ));
    }

    #[test]
    fn table_naming_and_factory() {
        let registry = TypeRegistry::with_defaults();
        let table = Table::builder("pictures", &registry)
            .column(ColumnDef::new::<i64>("id").primary_key())
            .column(
                ColumnDef::virtual_column::<Size>("size", size_codec())
                    .child::<u32>("width")
                    .child::<u32>("height"),
            )
            .naming(|parent, child| format!("{child}_of_{parent}"))
            .factory(|| Record::new().with("source", "import".to_string()))
            .build()
            .unwrap();
        assert_eq!(
            table.physical_names(),
            ["id", "width_of_size", "height_of_size"]
        );
        assert_eq!((table.naming())("a", "b"), "b_of_a");
        let record = table
            .decode_row(&RowLabeled::new(
                Arc::from([
                    "id".to_string(),
                    "width_of_size".to_string(),
                    "height_of_size".to_string(),
                ]),
                [
                    Value::Int64(Some(2)),
                    Value::UInt32(Some(8)),
                    Value::UInt32(Some(6)),
                ]
                .into(),
            ))
            .unwrap();
        assert_eq!(record.value::<String>("source").unwrap(), "import");
        assert_eq!(
            record.value::<Size>("size").unwrap(),
            Size {
                width: 8,
                height: 6
            }
        );
    }

    #[test]
    fn table_invalid_definitions() {
        let registry = TypeRegistry::with_defaults();
        assert!(invalid_table(Table::builder("empty", &registry).build()).contains("no columns"));
        assert!(
            invalid_table(
                Table::builder("twice", &registry)
                    .column(ColumnDef::new::<i64>("id"))
                    .column(ColumnDef::new::<String>("id"))
                    .build()
            )
            .contains("duplicate column")
        );
        assert!(
            invalid_table(
                Table::builder("childless", &registry)
                    .column(ColumnDef::virtual_column::<Size>("size", size_codec()))
                    .build()
            )
            .contains("does not declare any child")
        );
        assert!(
            invalid_table(
                Table::builder("scalar_child", &registry)
                    .column(ColumnDef::new::<i64>("id").child::<u32>("width"))
                    .build()
            )
            .contains("not virtual")
        );
        assert!(
            invalid_table(
                Table::builder("clash", &registry)
                    .column(ColumnDef::new::<u32>("size_width"))
                    .column(
                        ColumnDef::virtual_column::<Size>("size", size_codec())
                            .child::<u32>("width")
                    )
                    .build()
            )
            .contains("duplicate physical column")
        );
        assert!(
            invalid_table(
                Table::builder("counter", &registry)
                    .column(ColumnDef::new::<String>("name").autoincrement())
                    .build()
            )
            .contains("autoincrement")
        );
        let unknown = Table::builder("unknown", &registry)
            .column(ColumnDef::new::<Size>("size"))
            .build()
            .unwrap_err();
        assert!(matches!(
            unknown.downcast_ref::<QuarryError>(),
            Some(QuarryError::MapperNotFound(..))
        ));
    }
}
