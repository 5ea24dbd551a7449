use crate::silent_logs;
use journal::{
    ColumnDef, Connection, DefaultValue, Entity, Migration, MigrationRecord, Migrator, TableDef,
    TradeCustomField, Value,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

static PROBE: LazyLock<TableDef> = LazyLock::new(|| {
    TableDef::new("MigrationProbe")
        .column(ColumnDef::new("Id", Value::Int64(None)).primary_key().generated())
        .column(
            ColumnDef::new("CreatedAt", Value::Timestamp(None))
                .default(DefaultValue::CurrentTimestamp),
        )
});

// Column names differing only by case are rejected by the engine
static BROKEN: LazyLock<TableDef> = LazyLock::new(|| {
    TableDef::new("MigrationBroken")
        .column(ColumnDef::new("Amount", Value::Int64(None)))
        .column(ColumnDef::new("amount", Value::Int64(None)))
});

static MISSING: LazyLock<TableDef> = LazyLock::new(|| {
    TableDef::new("TradeCustomFields")
        .column(ColumnDef::new("Id", Value::Int64(None)).primary_key())
        .column(ColumnDef::new("Currency", Value::Varchar(None)).nullable())
});

pub async fn migration<C: Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().await;
    TradeCustomField::drop_table(connection, true)
        .await
        .expect("Failed to drop TradeCustomFields table");
    MigrationRecord::drop_table(connection, true)
        .await
        .expect("Failed to drop MigrationHistory table");

    let migrator = Migrator::journal();
    migrator.validate().expect("The journal migrations must be valid");
    assert_eq!(
        migrator
            .pending(connection)
            .await
            .expect("Failed to read the pending migrations")
            .iter()
            .map(|v| v.version)
            .collect::<Vec<_>>(),
        [1]
    );
    assert!(
        migrator.verify(connection).await.is_err(),
        "The tables must not exist before the migration"
    );

    // First run
    let applied = migrator
        .apply(connection)
        .await
        .expect("Failed to apply the migrations");
    assert_eq!(applied, [1]);
    migrator
        .verify(connection)
        .await
        .expect("The tables must match their definition");
    let history = Migrator::applied(connection)
        .await
        .expect("Failed to read the migration history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 1);
    assert_eq!(history[0].name, "CreateTradeCustomFields");
    assert!(history[0].description.is_some());
    assert!(history[0].applied_at.is_set());
    assert!(history[0].execution_time_ms >= 0);

    // Second run does nothing
    let applied = migrator
        .apply(connection)
        .await
        .expect("Failed to apply the migrations again");
    assert!(applied.is_empty());
    assert!(
        migrator
            .pending(connection)
            .await
            .expect("Failed to read the pending migrations")
            .is_empty()
    );
    assert_eq!(
        Migrator::applied(connection)
            .await
            .expect("Failed to read the migration history")
            .len(),
        1
    );

    // A failing migration is rolled back and stays pending
    let mut migrations = Migrator::journal().migrations().to_vec();
    migrations.push(Migration {
        version: 2,
        name: "CreateBrokenTables",
        description: None,
        tables: vec![&*PROBE, &*BROKEN],
    });
    let extended = Migrator::new(migrations);
    extended
        .validate()
        .expect("The broken migration is well defined");
    silent_logs! {
        assert!(
            extended.apply(connection).await.is_err(),
            "The broken migration must fail"
        );
    }
    assert_eq!(
        extended
            .pending(connection)
            .await
            .expect("Failed to read the pending migrations")
            .iter()
            .map(|v| v.version)
            .collect::<Vec<_>>(),
        [2]
    );
    let probe = Migrator::new(vec![Migration {
        version: 2,
        name: "CreateProbe",
        description: None,
        tables: vec![&*PROBE],
    }]);
    assert!(
        probe.verify(connection).await.is_err(),
        "The tables of the failed migration must not exist"
    );

    // The tables differ from the definition
    let missing = Migrator::new(vec![Migration {
        version: 1,
        name: "CreateTradeCustomFields",
        description: None,
        tables: vec![&*MISSING],
    }]);
    silent_logs! {
        let error = missing
            .verify(connection)
            .await
            .expect_err("A missing column must be detected");
        assert!(format!("{:#}", error).contains("TradeCustomFields"), "{:#}", error);
    }

    // Rollback
    assert_eq!(
        Migrator::current_version(connection)
            .await
            .expect("Failed to read the current version"),
        1
    );
    assert!(
        !migrator
            .needs_migration(connection)
            .await
            .expect("Failed to read the pending migrations")
    );
    silent_logs! {
        assert!(
            migrator.rollback(connection, 1).await.is_err(),
            "Rolling back to the current version must fail"
        );
        assert!(
            migrator.rollback(connection, -1).await.is_err(),
            "Rolling back to a negative version must fail"
        );
    }
    assert_eq!(
        Migrator::applied(connection)
            .await
            .expect("Failed to read the migration history")
            .len(),
        1,
        "A rejected rollback must not change the history"
    );
    let rolled_back = migrator
        .rollback(connection, 0)
        .await
        .expect("Failed to roll back the migrations");
    assert_eq!(rolled_back, [1]);
    assert_eq!(
        Migrator::current_version(connection)
            .await
            .expect("Failed to read the current version"),
        0
    );
    assert!(
        Migrator::applied(connection)
            .await
            .expect("Failed to read the migration history")
            .is_empty()
    );
    assert!(
        migrator
            .needs_migration(connection)
            .await
            .expect("Failed to read the pending migrations")
    );
    silent_logs! {
        assert!(
            migrator.verify(connection).await.is_err(),
            "The tables of the rolled back migration must be dropped"
        );
        assert!(
            migrator.rollback(connection, 0).await.is_err(),
            "Nothing is left to roll back"
        );
    }
    let applied = migrator
        .apply(connection)
        .await
        .expect("Failed to apply the migrations after the rollback");
    assert_eq!(applied, [1]);
    migrator
        .verify(connection)
        .await
        .expect("The tables must match their definition");
}
