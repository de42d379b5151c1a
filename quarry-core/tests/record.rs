#[cfg(test)]
mod tests {
    use quarry_core::{Datum, Record};

    #[test]
    fn record_is_immutable() {
        let first = Record::new().with("title", "Dune".to_string());
        let second = first.with("title", "Emma".to_string());
        assert_eq!(first.value::<String>("title").unwrap(), "Dune");
        assert_eq!(second.value::<String>("title").unwrap(), "Emma");
        assert_ne!(first, second);
        assert_eq!(first, first.clone());
    }

    #[test]
    fn record_fields() {
        let record = Record::new()
            .with("id", 7i64)
            .with("title", "Dune".to_string())
            .with_datum("subtitle", Datum::null());
        assert_eq!(record.len(), 3);
        assert!(!record.is_empty());
        assert!(Record::new().is_empty());
        assert_eq!(
            record.fields().map(|(k, _)| k).collect::<Vec<_>>(),
            ["id", "subtitle", "title"]
        );
        assert!(record.get("subtitle").unwrap().is_null());
        assert!(record.datum("missing").is_null());
        assert_eq!(record.value_opt::<String>("subtitle").unwrap(), None);
        assert_eq!(record.value_opt::<String>("missing").unwrap(), None);
        assert_eq!(record.value_opt::<i64>("id").unwrap(), Some(7));
        assert!(record.value::<i64>("missing").is_err());
        assert!(record.value::<i32>("id").is_err());
    }

    #[test]
    fn datum_values() {
        let datum = Datum::new(5u16);
        assert_eq!(datum, Datum::new(5u16));
        assert_ne!(datum, Datum::new(5u32));
        assert_ne!(datum, Datum::null());
        assert_eq!(Datum::null(), Datum::default());
        assert_eq!(Datum::new(datum.clone()), datum);
        assert_eq!(*datum.get_ref::<u16>().unwrap(), 5);
        assert!(datum.get::<u32>().is_err());
        assert_eq!(Datum::from_option::<u16>(None), Datum::null());
        assert_eq!(Datum::from_option(Some(5u16)), datum);
        assert_eq!(format!("{:?}", datum), "5");
        assert_eq!(format!("{:?}", Datum::null()), "NULL");
        let list = Datum::list(["a".to_string(), "b".to_string()]);
        assert_eq!(list.as_list().unwrap().len(), 2);
        assert_eq!(list.to_vec::<String>().unwrap(), ["a", "b"]);
        assert!(datum.as_list().is_err());
    }
}
