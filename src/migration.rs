use crate::{MIGRATION_HISTORY, TRADE_CUSTOM_FIELDS};
use journal_core::{
    AsValue, Connection, Context, Driver, Entity, Error, Executor, Passive, Result, Row,
    RowLabeled, SqlWriter, TableDef, Transaction, Value, stream::TryStreamExt,
};
use std::{collections::HashSet, time::Instant};
use time::PrimitiveDateTime;

/// A versioned set of tables to create.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub tables: Vec<&'static TableDef>,
}

/// Row of `MigrationHistory`.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRecord {
    pub id: Passive<i64>,
    pub version: i64,
    pub name: String,
    pub description: Option<String>,
    pub applied_at: Passive<PrimitiveDateTime>,
    pub execution_time_ms: i64,
}

impl Entity for MigrationRecord {
    fn table_def() -> &'static TableDef {
        &MIGRATION_HISTORY
    }

    fn from_row(mut row: RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.take_as("Id")?,
            version: row.take_as("Version")?,
            name: row.take_as("Name")?,
            description: row.take_as("Description")?,
            applied_at: row.take_as("AppliedAt")?,
            execution_time_ms: row.take_as("ExecutionTimeMs")?,
        })
    }

    fn row_filtered(&self) -> Box<[(&'static str, Value)]> {
        let mut row = Vec::with_capacity(6);
        if let Passive::Set(id) = self.id {
            row.push(("Id", id.as_value()));
        }
        row.push(("Version", self.version.as_value()));
        row.push(("Name", self.name.clone().as_value()));
        row.push(("Description", self.description.clone().as_value()));
        if let Passive::Set(applied_at) = self.applied_at {
            row.push(("AppliedAt", applied_at.as_value()));
        }
        row.push(("ExecutionTimeMs", self.execution_time_ms.as_value()));
        row.into_boxed_slice()
    }

    fn primary_key(&self) -> Row {
        [self.id.as_value()].into()
    }
}

/// Applies migrations in version order, each one in its own transaction.
#[derive(Debug, Clone)]
pub struct Migrator {
    migrations: Vec<Migration>,
}

impl Migrator {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }

    /// Migrations of the trade journal schema.
    pub fn journal() -> Self {
        Self::new(vec![Migration {
            version: 1,
            name: "CreateTradeCustomFields",
            description: Some("Values of the custom fields recorded for each trade"),
            tables: vec![&TRADE_CUSTOM_FIELDS],
        }])
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Checks the versions are increasing and every table is well defined.
    pub fn validate(&self) -> Result<()> {
        MIGRATION_HISTORY.validate()?;
        let mut previous = None;
        for migration in &self.migrations {
            if previous.is_some_and(|v| v >= migration.version) {
                return Err(Error::msg(format!(
                    "Migration `{}` has version {} which does not follow version {}",
                    migration.name,
                    migration.version,
                    previous.unwrap_or_default()
                )));
            }
            previous = Some(migration.version);
            for table in &migration.tables {
                table.validate().with_context(|| {
                    format!(
                        "Invalid table in the migration {} `{}`",
                        migration.version, migration.name
                    )
                })?;
            }
        }
        Ok(())
    }

    /// Migrations recorded in the history, in version order.
    ///
    /// Creates the `MigrationHistory` table when it does not exist yet.
    pub async fn applied<Exec: Executor>(executor: &mut Exec) -> Result<Vec<MigrationRecord>> {
        MigrationRecord::create_table(executor, true)
            .await
            .context("While creating the migration history")?;
        let mut records: Vec<MigrationRecord> = MigrationRecord::find_many(executor, &true, None)
            .try_collect()
            .await?;
        records.sort_by_key(|v| v.version);
        Ok(records)
    }

    /// Highest applied version, 0 when nothing was applied.
    ///
    /// Creates the `MigrationHistory` table when it does not exist yet.
    pub async fn current_version<Exec: Executor>(executor: &mut Exec) -> Result<i64> {
        Ok(Self::applied(executor)
            .await?
            .last()
            .map(|v| v.version)
            .unwrap_or_default())
    }

    /// Migrations not recorded in the history yet.
    ///
    /// Creates the `MigrationHistory` table when it does not exist yet.
    pub async fn pending<Exec: Executor>(&self, executor: &mut Exec) -> Result<Vec<&Migration>> {
        let applied = Self::applied(executor)
            .await?
            .into_iter()
            .map(|v| v.version)
            .collect::<HashSet<_>>();
        Ok(self
            .migrations
            .iter()
            .filter(|v| !applied.contains(&v.version))
            .collect())
    }

    pub async fn needs_migration<Exec: Executor>(&self, executor: &mut Exec) -> Result<bool> {
        Ok(!self.pending(executor).await?.is_empty())
    }

    /// Applies the pending migrations and returns their versions.
    ///
    /// Stops at the first failure: that migration is rolled back and not
    /// recorded, the ones before it stay applied.
    pub async fn apply<C: Connection>(&self, connection: &mut C) -> Result<Vec<i64>> {
        self.validate()?;
        let pending = self.pending(connection).await?;
        let mut applied = Vec::with_capacity(pending.len());
        for migration in pending {
            let start = Instant::now();
            let mut transaction = connection.begin().await?;
            match Self::apply_one(&mut transaction, migration, start).await {
                Ok(()) => {
                    transaction.commit().await.with_context(|| {
                        format!(
                            "While committing the migration {} `{}`",
                            migration.version, migration.name
                        )
                    })?;
                }
                Err(error) => {
                    let error = error.context(format!(
                        "The migration {} `{}` failed",
                        migration.version, migration.name
                    ));
                    log::error!("{:#}", error);
                    if let Err(rollback) = transaction.rollback().await {
                        log::error!("{:#}", rollback);
                    }
                    return Err(error);
                }
            }
            log::info!(
                "Applied the migration {} `{}` in {} ms",
                migration.version,
                migration.name,
                start.elapsed().as_millis()
            );
            applied.push(migration.version);
        }
        Ok(applied)
    }

    async fn apply_one<Exec: Executor>(
        executor: &mut Exec,
        migration: &Migration,
        start: Instant,
    ) -> Result<()> {
        for table in &migration.tables {
            let mut query = String::with_capacity(1024);
            executor
                .driver()
                .sql_writer()
                .write_create_table(&mut query, table, true);
            executor
                .execute(query.into())
                .await
                .with_context(|| format!("While creating the table `{}`", table.name()))?;
        }
        MigrationRecord {
            id: Passive::NotSet,
            version: migration.version,
            name: migration.name.into(),
            description: migration.description.map(Into::into),
            applied_at: Passive::NotSet,
            execution_time_ms: start.elapsed().as_millis().try_into().unwrap_or(i64::MAX),
        }
        .insert_one(executor)
        .await?;
        Ok(())
    }

    /// Undoes the migrations applied after `target`, newest first, and returns their versions.
    ///
    /// Each one drops its tables and removes its history row in its own
    /// transaction. `target` must be at least 0 and lower than the current version.
    pub async fn rollback<C: Connection>(&self, connection: &mut C, target: i64) -> Result<Vec<i64>> {
        let applied = Self::applied(connection).await?;
        let current = applied.last().map(|v| v.version).unwrap_or_default();
        if target < 0 || target >= current {
            let error = Error::msg(format!(
                "Cannot roll back to the version {}, the current version is {}",
                target, current
            ));
            log::error!("{}", error);
            return Err(error);
        }
        let mut rolled_back = Vec::new();
        for record in applied.iter().rev().filter(|v| v.version > target) {
            let migration = self
                .migrations
                .iter()
                .find(|v| v.version == record.version)
                .ok_or_else(|| {
                    Error::msg(format!(
                        "The applied migration {} `{}` is not known, it cannot be rolled back",
                        record.version, record.name
                    ))
                })?;
            let mut transaction = connection.begin().await?;
            match Self::rollback_one(&mut transaction, migration, record).await {
                Ok(()) => {
                    transaction.commit().await.with_context(|| {
                        format!(
                            "While committing the rollback of the migration {} `{}`",
                            migration.version, migration.name
                        )
                    })?;
                }
                Err(error) => {
                    let error = error.context(format!(
                        "The rollback of the migration {} `{}` failed",
                        migration.version, migration.name
                    ));
                    log::error!("{:#}", error);
                    if let Err(rollback) = transaction.rollback().await {
                        log::error!("{:#}", rollback);
                    }
                    return Err(error);
                }
            }
            log::info!(
                "Rolled back the migration {} `{}`",
                migration.version,
                migration.name
            );
            rolled_back.push(migration.version);
        }
        Ok(rolled_back)
    }

    async fn rollback_one<Exec: Executor>(
        executor: &mut Exec,
        migration: &Migration,
        record: &MigrationRecord,
    ) -> Result<()> {
        for table in migration.tables.iter().rev() {
            let mut query = String::with_capacity(64);
            executor
                .driver()
                .sql_writer()
                .write_drop_table(&mut query, table, true);
            executor
                .execute(query.into())
                .await
                .with_context(|| format!("While dropping the table `{}`", table.name()))?;
        }
        record.delete(executor).await
    }

    /// Checks every table of every migration exposes all its declared columns.
    pub async fn verify<Exec: Executor>(&self, executor: &mut Exec) -> Result<()> {
        for table in self.migrations.iter().flat_map(|v| v.tables.iter()) {
            let mut query = String::with_capacity(256);
            executor
                .driver()
                .sql_writer()
                .write_select(&mut query, table, &false, Some(0));
            executor
                .fetch(query.into())
                .try_collect::<Vec<_>>()
                .await
                .with_context(|| {
                    format!(
                        "The table `{}` does not match its definition",
                        table.name()
                    )
                })?;
        }
        Ok(())
    }
}
