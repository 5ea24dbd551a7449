#[cfg(test)]
mod tests {
    use journal_core::{AsValue, Parse, Passive, Value, format_timestamp, truncate_str};
    use time::{Date, Month, PrimitiveDateTime, Time};

    fn timestamp(h: u8, m: u8, s: u8, milli: u16) -> PrimitiveDateTime {
        PrimitiveDateTime::new(
            Date::from_calendar_date(2025, Month::March, 7).unwrap(),
            Time::from_hms_milli(h, m, s, milli).unwrap(),
        )
    }

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float64(Some(1.0)), Value::Null);
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
    }

    #[test]
    fn value_bool() {
        let val = true.as_value();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(None));
        assert_eq!(bool::try_from_value(val).unwrap(), true);
        assert_eq!(bool::try_from_value(1_i64.as_value()).unwrap(), true);
        assert_eq!(bool::try_from_value(0_i32.as_value()).unwrap(), false);
        assert!(bool::try_from_value(2_i64.as_value()).is_err());
        assert!(bool::try_from_value(Value::Varchar(Some("true".into()))).is_err());
    }

    #[test]
    fn value_integers() {
        assert_eq!(i64::try_from_value(42_i32.as_value()).unwrap(), 42);
        assert_eq!(i32::try_from_value(42_i64.as_value()).unwrap(), 42);
        assert!(i32::try_from_value(i64::MAX.as_value()).is_err());
        assert!(i64::try_from_value(Value::Int64(None)).is_err());
        assert!(i64::try_from_value(Value::Float64(Some(1.5))).is_err());
        assert_eq!(f64::try_from_value(3_i64.as_value()).unwrap(), 3.0);
    }

    #[test]
    fn value_string() {
        let val = "risk:high".as_value();
        assert_eq!(val, Value::Varchar(Some("risk:high".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "risk:high");
        assert!(<&str>::try_from_value(Value::Varchar(Some("x".into()))).is_err());
        assert!(String::try_from_value(1_i64.as_value()).is_err());
    }

    #[test]
    fn value_option() {
        assert_eq!(None::<String>.as_value(), Value::Varchar(None));
        assert_eq!(
            Option::<String>::try_from_value(Value::Null).unwrap(),
            None
        );
        assert_eq!(
            Option::<i64>::try_from_value(Value::Int64(None)).unwrap(),
            None
        );
        assert_eq!(
            Option::<i64>::try_from_value(Value::Int64(Some(7))).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn value_passive() {
        assert_eq!(Passive::<i64>::NotSet.as_value(), Value::Int64(None));
        assert_eq!(Passive::Set(5_i64).as_value(), Value::Int64(Some(5)));
        assert_eq!(
            Passive::<i64>::try_from_value(Value::Int64(Some(5))).unwrap(),
            Passive::Set(5)
        );
        assert!(Passive::Set(1).is_set());
        assert_eq!(Passive::<i32>::default(), Passive::NotSet);
        assert_eq!(Passive::<i32>::NotSet.as_option(), None);
    }

    #[test]
    fn value_timestamp() {
        let ts = timestamp(10, 20, 30, 0);
        assert_eq!(
            PrimitiveDateTime::try_from_value(ts.as_value()).unwrap(),
            ts
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some("2025-03-07 10:20:30".into())))
                .unwrap(),
            ts
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2025-03-07T10:20:30.250".into()
            )))
            .unwrap(),
            timestamp(10, 20, 30, 250)
        );
        assert!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some("yesterday".into()))).is_err()
        );
        assert!(PrimitiveDateTime::try_from_value(1_i64.as_value()).is_err());
    }

    #[test]
    fn parse_timestamp() {
        assert_eq!(
            <PrimitiveDateTime as Parse>::parse("2025-03-07 10:20").unwrap(),
            timestamp(10, 20, 0, 0)
        );
        assert!(<PrimitiveDateTime as Parse>::parse("2025-03-07").is_err());
        assert!(<PrimitiveDateTime as Parse>::parse("2025-13-07 10:20:30").is_err());
    }

    #[test]
    fn format_timestamps() {
        assert_eq!(
            format_timestamp(&timestamp(1, 2, 3, 0)),
            "2025-03-07 01:02:03"
        );
        assert_eq!(
            format_timestamp(&timestamp(1, 2, 3, 500)),
            "2025-03-07 01:02:03.5"
        );
        assert_eq!(
            format_timestamp(&timestamp(23, 59, 59, 125)),
            "2025-03-07 23:59:59.125"
        );
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_str("abc", 10), "abc");
        assert_eq!(truncate_str("abcdef", 3), "abc");
        // 'é' takes two bytes
        assert_eq!(truncate_str("aé", 2), "a");
        assert_eq!(truncate_str("éé", 4), "éé");
    }
}
