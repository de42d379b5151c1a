#[cfg(test)]
mod tests {
    use quarry_core::{AsValue, Value};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};
    use uuid::Uuid;

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert!(Value::Int32(None).is_null());
        assert!(Value::List(None, Box::new(Value::Varchar(None))).is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
    }

    #[test]
    fn value_bool() {
        let val = true.as_value();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(Some(false)));
        assert_ne!(val, Value::Boolean(None));
        assert_ne!(val, Value::Varchar(Some("true".into())));
        assert_eq!(bool::try_from_value(val).unwrap(), true);
        assert_eq!(bool::try_from_value(1_i8.as_value()).unwrap(), true);
        assert_eq!(bool::try_from_value(0_i64.as_value()).unwrap(), false);
        assert_eq!(bool::try_from_value(2_u32.as_value()).unwrap(), true);
        assert!(bool::try_from_value(0.5_f32.as_value()).is_err());
        assert!(bool::try_from_value(Value::Boolean(None)).is_err());
    }

    #[test]
    fn value_integers() {
        assert_eq!(i64::try_from_value(Value::Int16(Some(-5))).unwrap(), -5);
        assert_eq!(u64::try_from_value(Value::UInt8(Some(200))).unwrap(), 200);
        assert_eq!(i32::try_from_value(Value::Int64(Some(77))).unwrap(), 77);
        assert_eq!(
            i16::try_from_value(Value::Decimal(Some(Decimal::from(1234)))).unwrap(),
            1234
        );
        let error = u8::try_from_value(Value::Int32(Some(300))).unwrap_err();
        assert!(format!("{error:#}").contains("300"), "{error:#}");
        assert!(i8::try_from_value(Value::UInt8(Some(200))).is_err());
        assert!(u32::try_from_value(Value::Int64(Some(-1))).is_err());
        let fraction = Decimal::from_str("1.5").unwrap();
        assert!(i64::try_from_value(Value::Decimal(Some(fraction))).is_err());
        assert!(i64::try_from_value(Value::Varchar(Some("1".into()))).is_err());
        assert!(i64::try_from_value(Value::Int64(None)).is_err());
        assert_eq!(i64::as_empty_value(), Value::Int64(None));
    }

    #[test]
    fn value_floats() {
        assert_eq!(f64::try_from_value(1.5_f32.as_value()).unwrap(), 1.5);
        assert_eq!(f64::try_from_value(Value::Int32(Some(3))).unwrap(), 3.0);
        assert_eq!(
            f32::try_from_value(Value::Decimal(Some(Decimal::from_str("2.25").unwrap()))).unwrap(),
            2.25
        );
        assert_eq!(
            Decimal::try_from_value(Value::Int64(Some(12))).unwrap(),
            Decimal::from(12)
        );
        assert!(f64::try_from_value(Value::Varchar(Some("1.0".into()))).is_err());
    }

    #[test]
    fn value_text_and_blob() {
        let val = "hello".to_string().as_value();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        assert_eq!(
            Vec::<u8>::try_from_value(Value::Varchar(Some("ab".into()))).unwrap(),
            b"ab".to_vec()
        );
        assert_eq!(
            vec![1u8, 2, 3].as_value(),
            Value::Blob(Some(vec![1u8, 2, 3].into_boxed_slice()))
        );
        assert!(String::try_from_value(Value::Int32(Some(1))).is_err());
    }

    #[test]
    fn value_time_and_uuid() {
        let date = Date::from_calendar_date(2025, Month::March, 14).unwrap();
        let time = Time::from_hms(10, 30, 0).unwrap();
        let timestamp = PrimitiveDateTime::new(date, time);
        assert_eq!(Date::try_from_value(date.as_value()).unwrap(), date);
        assert_eq!(
            OffsetDateTime::try_from_value(timestamp.as_value()).unwrap(),
            timestamp.assume_utc()
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(timestamp.assume_utc().as_value()).unwrap(),
            timestamp
        );
        let uuid = Uuid::from_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(uuid.to_string()))).unwrap(),
            uuid
        );
        assert!(Uuid::try_from_value(Value::Varchar(Some("not a uuid".into()))).is_err());
    }

    #[test]
    fn value_types() {
        let ints = Value::list_of(Value::Int32(Some(1)));
        assert_eq!(ints, Value::List(None, Box::new(Value::Int32(None))));
        assert!(ints.same_type(&Value::List(Some(vec![]), Box::new(Value::Int32(None)))));
        assert!(!ints.same_type(&Value::list_of(Value::Varchar(None))));
        assert_eq!(ints.element_type(), Some(&Value::Int32(None)));
        assert_eq!(Value::Int16(Some(9)).as_null(), Value::Int16(None));
        assert!(Value::UInt64(None).is_integer_type());
        assert!(!Value::Decimal(None).is_integer_type());
        assert!(Value::Int64(Some(0)).is_unset());
        assert!(Value::Int64(None).is_unset());
        assert!(!Value::Int64(Some(1)).is_unset());
        assert!(!Value::Varchar(Some("".into())).is_unset());
    }
}
