use journal_core::{Action, ColumnDef, DefaultValue, TableDef, Value};
use std::sync::LazyLock;

/// Longest text, in characters, a custom field value may hold.
pub const VALUE_MAX_LENGTH: u32 = 4000;

/// Values of the user defined fields attached to a trade, one row per trade and field definition.
///
/// Rows are removed together with their trade or field definition when
/// foreign keys are enforced.
pub static TRADE_CUSTOM_FIELDS: LazyLock<TableDef> = LazyLock::new(|| {
    TableDef::new("TradeCustomFields")
        .column(
            ColumnDef::new("Id", Value::Int64(None))
                .primary_key()
                .generated(),
        )
        .column(
            ColumnDef::new("TradeId", Value::Int64(None))
                .references("Trades", "Id")
                .on_delete(Action::Cascade),
        )
        .column(
            ColumnDef::new("FieldDefinitionId", Value::Int64(None))
                .references("FieldDefinitions", "Id")
                .on_delete(Action::Cascade),
        )
        .column(
            ColumnDef::new("Value", Value::Varchar(None))
                .nullable()
                .max_length(VALUE_MAX_LENGTH),
        )
        .column(
            ColumnDef::new("CreatedAt", Value::Timestamp(None))
                .default(DefaultValue::CurrentTimestamp)
                .immutable(),
        )
        .column(
            ColumnDef::new("UpdatedAt", Value::Timestamp(None))
                .nullable()
                .update_default(DefaultValue::CurrentTimestamp),
        )
        .unique_index(&["TradeId", "FieldDefinitionId"])
});

/// Versions applied by the migrator.
pub static MIGRATION_HISTORY: LazyLock<TableDef> = LazyLock::new(|| {
    TableDef::new("MigrationHistory")
        .column(
            ColumnDef::new("Id", Value::Int64(None))
                .primary_key()
                .generated(),
        )
        .column(ColumnDef::new("Version", Value::Int64(None)).immutable())
        .column(ColumnDef::new("Name", Value::Varchar(None)).max_length(200))
        .column(
            ColumnDef::new("Description", Value::Varchar(None))
                .nullable()
                .max_length(500),
        )
        .column(
            ColumnDef::new("AppliedAt", Value::Timestamp(None))
                .default(DefaultValue::CurrentTimestamp)
                .immutable(),
        )
        .column(ColumnDef::new("ExecutionTimeMs", Value::Int64(None)))
        .unique_index(&["Version"])
});
