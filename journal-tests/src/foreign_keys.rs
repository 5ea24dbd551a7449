use crate::silent_logs;
use journal::{
    ColumnDef, Connection, ConstraintError, Driver, Entity, Executor, JournalConfig, SqlWriter,
    TableDef, TradeCustomField, Value,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

static TRADES: LazyLock<TableDef> = LazyLock::new(|| {
    TableDef::new("Trades")
        .column(ColumnDef::new("Id", Value::Int64(None)).primary_key())
        .column(ColumnDef::new("Symbol", Value::Varchar(None)).max_length(20))
});

static FIELD_DEFINITIONS: LazyLock<TableDef> = LazyLock::new(|| {
    TableDef::new("FieldDefinitions")
        .column(ColumnDef::new("Id", Value::Int64(None)).primary_key())
        .column(
            ColumnDef::new("FieldName", Value::Varchar(None))
                .max_length(100)
                .unique(),
        )
});

async fn run<Exec: Executor>(executor: &mut Exec, query: String) {
    executor
        .execute(query.as_str().into())
        .await
        .unwrap_or_else(|e| panic!("Failed to execute `{}`: {:#}", query, e));
}

async fn create<Exec: Executor>(executor: &mut Exec, table: &TableDef) {
    let mut query = String::new();
    let writer = executor.driver().sql_writer();
    writer.write_drop_table(&mut query, table, true);
    query.push('\n');
    writer.write_create_table(&mut query, table, false);
    run(executor, query).await;
}

async fn drop_all<Exec: Executor>(executor: &mut Exec) {
    TradeCustomField::drop_table(executor, true)
        .await
        .expect("Failed to drop TradeCustomFields table");
    for table in [&*TRADES, &*FIELD_DEFINITIONS] {
        let mut query = String::new();
        executor
            .driver()
            .sql_writer()
            .write_drop_table(&mut query, table, true);
        run(executor, query).await;
    }
}

/// Referential integrity and cascades, `config` must enable the foreign keys.
pub async fn foreign_keys<C: Connection>(config: &JournalConfig) {
    let _lock = MUTEX.lock().await;
    assert!(config.foreign_keys);
    let mut connection: C = config
        .connect()
        .await
        .expect("Could not connect to the database");
    let connection = &mut connection;
    drop_all(connection).await;
    create(connection, &TRADES).await;
    create(connection, &FIELD_DEFINITIONS).await;
    TradeCustomField::create_table(connection, false)
        .await
        .expect("Failed to create TradeCustomFields table");
    run(
        connection,
        r#"INSERT INTO "Trades" ("Id", "Symbol") VALUES (1, 'EURUSD'), (2, 'BTCUSD');"#.into(),
    )
    .await;
    run(
        connection,
        r#"INSERT INTO "FieldDefinitions" ("Id", "FieldName") VALUES (1, 'Setup'), (2, 'Risk');"#
            .into(),
    )
    .await;

    for (trade, field) in [(1, 1), (1, 2), (2, 1)] {
        TradeCustomField::new(trade, field, Some(format!("{}:{}", trade, field)))
            .insert(connection)
            .await
            .expect("Failed to insert the custom field of an existing trade");
    }
    silent_logs! {
        let error = TradeCustomField::new(99, 1, Some("orphan".into()))
            .insert(connection)
            .await
            .expect_err("A custom field of a missing trade must be rejected");
        assert!(ConstraintError::is_foreign_key_violation(&error), "{:#}", error);
        let error = TradeCustomField::new(1, 99, Some("orphan".into()))
            .insert(connection)
            .await
            .expect_err("A custom field of a missing field definition must be rejected");
        assert!(ConstraintError::is_foreign_key_violation(&error), "{:#}", error);
    }

    // Deleting the trade removes its values
    run(connection, r#"DELETE FROM "Trades" WHERE "Id" = 1;"#.into()).await;
    assert!(
        TradeCustomField::for_trade(connection, 1)
            .await
            .expect("Failed to query the custom fields of the trade")
            .is_empty()
    );
    assert_eq!(
        TradeCustomField::for_trade(connection, 2)
            .await
            .expect("Failed to query the custom fields of the trade")
            .len(),
        1
    );

    // Deleting the field definition removes its values
    run(
        connection,
        r#"DELETE FROM "FieldDefinitions" WHERE "Id" = 1;"#.into(),
    )
    .await;
    assert!(
        TradeCustomField::for_trade(connection, 2)
            .await
            .expect("Failed to query the custom fields of the trade")
            .is_empty()
    );

    drop_all(connection).await;
}

/// Without enforcement, values can be recorded for trades and field definitions
/// that do not exist: `config` must keep the default foreign key setting.
pub async fn foreign_keys_disabled<C: Connection>(config: &JournalConfig) {
    let _lock = MUTEX.lock().await;
    assert!(!config.foreign_keys);
    let mut connection: C = config
        .connect()
        .await
        .expect("Could not connect to the database");
    let connection = &mut connection;
    drop_all(connection).await;
    TradeCustomField::create_table(connection, false)
        .await
        .expect("Failed to create TradeCustomFields table");
    let stored = TradeCustomField::new(404, 405, Some("unchecked".into()))
        .insert(connection)
        .await
        .expect("Without enforcement a missing trade must be accepted on insert");
    let upserted =
        TradeCustomField::upsert(connection, 404, 405, Some("still unchecked".into()))
            .await
            .expect("Without enforcement a missing trade must be accepted on upsert");
    assert_eq!(upserted.id, stored.id);
    assert_eq!(upserted.value.as_deref(), Some("still unchecked"));
    TradeCustomField::upsert(connection, 406, 407, None)
        .await
        .expect("Without enforcement a missing field definition must be accepted on upsert");
    drop_all(connection).await;
}
