#[cfg(test)]
mod tests {
    use journal::{
        AsValue, ColumnDef, MIGRATION_HISTORY, Migration, Migrator, TRADE_CUSTOM_FIELDS, TableDef,
        TradeCustomField, VALUE_MAX_LENGTH, Value,
    };
    use std::sync::LazyLock;

    fn id() -> ColumnDef {
        ColumnDef::new("Id", Value::Int64(None)).primary_key().generated()
    }

    #[test]
    fn journal_tables() {
        TRADE_CUSTOM_FIELDS
            .validate()
            .expect("TradeCustomFields must be valid");
        MIGRATION_HISTORY
            .validate()
            .expect("MigrationHistory must be valid");
        assert_eq!(
            TRADE_CUSTOM_FIELDS.conflict_target(),
            [TradeCustomField::TRADE_ID, TradeCustomField::FIELD_DEFINITION_ID]
        );
        let value = TRADE_CUSTOM_FIELDS
            .find_column(TradeCustomField::VALUE)
            .expect("Value column");
        assert_eq!(value.max_length, Some(VALUE_MAX_LENGTH));
        assert!(value.nullable);
        assert!(value.is_updatable());
        let created_at = TRADE_CUSTOM_FIELDS
            .find_column(TradeCustomField::CREATED_AT)
            .expect("CreatedAt column");
        assert!(!created_at.is_updatable());
        let updated_at = TRADE_CUSTOM_FIELDS
            .find_column(TradeCustomField::UPDATED_AT)
            .expect("UpdatedAt column");
        assert!(!updated_at.is_updatable());
        assert_eq!(
            TRADE_CUSTOM_FIELDS
                .primary_key()
                .map(|c| c.name)
                .collect::<Vec<_>>(),
            [TradeCustomField::ID]
        );
    }

    #[test]
    fn invalid_tables() {
        assert!(TableDef::new("").column(id()).validate().is_err());
        assert!(TableDef::new("Empty").validate().is_err());
        assert!(
            TableDef::new("Twice")
                .column(id())
                .column(ColumnDef::new("Id", Value::Int64(None)))
                .validate()
                .is_err()
        );
        assert!(
            TableDef::new("Untyped")
                .column(id())
                .column(ColumnDef::new("Anything", Value::Null))
                .validate()
                .is_err()
        );
        assert!(
            TableDef::new("Length")
                .column(id())
                .column(ColumnDef::new("Amount", Value::Int64(None)).max_length(10))
                .validate()
                .is_err()
        );
        assert!(
            TableDef::new("Generated")
                .column(ColumnDef::new("Id", Value::Int64(None)).primary_key())
                .column(ColumnDef::new("Sequence", Value::Int64(None)).generated())
                .validate()
                .is_err()
        );
        assert!(
            TableDef::new("Index")
                .column(id())
                .unique_index(&["Missing"])
                .validate()
                .is_err()
        );
        assert!(
            TableDef::new("Index")
                .column(id())
                .named_index("IX_Nothing", &[], false)
                .validate()
                .is_err()
        );
        assert!(
            TableDef::new("Fine")
                .column(id())
                .column(ColumnDef::new("Note", Value::Varchar(None)).max_length(10))
                .index(&["Note"])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn key_condition() {
        assert!(
            TRADE_CUSTOM_FIELDS
                .key_condition([Value::Int64(None)].into())
                .is_err(),
            "A missing key value must be rejected"
        );
        assert!(
            TRADE_CUSTOM_FIELDS
                .key_condition([1_i64.as_value(), 2_i64.as_value()].into())
                .is_err(),
            "Too many key values must be rejected"
        );
        assert!(
            TRADE_CUSTOM_FIELDS
                .key_condition([1_i64.as_value()].into())
                .is_ok()
        );
    }

    #[test]
    fn migrations() {
        static NOTES: LazyLock<TableDef> = LazyLock::new(|| TableDef::new("Notes").column(id()));
        static BROKEN: LazyLock<TableDef> = LazyLock::new(|| TableDef::new("Broken"));

        let journal = Migrator::journal();
        journal.validate().expect("The journal migrations must be valid");
        assert_eq!(journal.migrations().len(), 1);
        assert_eq!(journal.migrations()[0].version, 1);
        assert_eq!(journal.migrations()[0].tables[0].name(), "TradeCustomFields");

        let migration = |version, table: &'static TableDef| Migration {
            version,
            name: "Notes",
            description: None,
            tables: vec![table],
        };
        assert!(
            Migrator::new(vec![migration(1, &NOTES), migration(2, &NOTES)])
                .validate()
                .is_ok()
        );
        assert!(
            Migrator::new(vec![migration(2, &NOTES), migration(1, &NOTES)])
                .validate()
                .is_err(),
            "Versions must increase"
        );
        assert!(
            Migrator::new(vec![migration(1, &NOTES), migration(1, &NOTES)])
                .validate()
                .is_err(),
            "Versions must be unique"
        );
        assert!(
            Migrator::new(vec![migration(1, &BROKEN)]).validate().is_err(),
            "Tables must be valid"
        );
    }
}
