#[cfg(test)]
mod tests {
    use journal::{
        Connection, Executor, JournalConfig, Query, QueryResult, Transaction,
        stream::TryStreamExt,
    };
    use journal_sqlite::SqliteConnection;
    use journal_tests::{init_logs, silent_logs};

    async fn count(connection: &mut SqliteConnection) -> i64 {
        let rows = connection
            .fetch(r#"SELECT COUNT(*) AS "Total" FROM "Notes";"#.into())
            .try_collect::<Vec<_>>()
            .await
            .expect("Failed to count the notes");
        assert_eq!(rows.len(), 1);
        let mut row = rows.into_iter().next().unwrap();
        row.take_as::<i64>("Total").expect("Total must be an integer")
    }

    async fn notes() -> (tempfile::TempDir, SqliteConnection) {
        let dir = tempfile::tempdir().expect("Failed to create a temporary directory");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("notes.sqlite").display());
        let mut connection = SqliteConnection::connect(url.into())
            .await
            .expect("Could not open the database");
        connection
            .execute(
                r#"
                CREATE TABLE "Notes" ("Id" INTEGER PRIMARY KEY AUTOINCREMENT, "Body" TEXT NOT NULL);
                INSERT INTO "Notes" ("Body") VALUES ('first'), ('second');
                "#
                .into(),
            )
            .await
            .expect("Failed to create the notes");
        (dir, connection)
    }

    #[tokio::test]
    async fn create_database() {
        init_logs();
        let dir = tempfile::tempdir().expect("Failed to create a temporary directory");
        let path = dir.path().join("creation.sqlite");
        silent_logs! {
            assert!(
                SqliteConnection::connect(format!("sqlite://{}?mode=ro", path.display()).into())
                    .await
                    .is_err(),
                "Should not be able to open in read only a missing database"
            );
        }
        assert!(!path.exists(), "Database file should not exist before test");
        SqliteConnection::connect(format!("sqlite://{}?mode=rwc", path.display()).into())
            .await
            .expect("Could not create the database");
        assert!(
            path.exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(format!("sqlite://{}?mode=ro", path.display()).into())
            .await
            .expect("Could not open the existing database in read only");
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                SqliteConnection::connect("postgres://localhost/journal".into())
                    .await
                    .is_err()
            );
            assert!(
                JournalConfig::default()
                    .with_database_url("journal.sqlite")
                    .connect::<SqliteConnection>()
                    .await
                    .is_err()
            );
        };
    }

    #[tokio::test]
    async fn memory() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open an in memory database");
        let results = connection
            .run(
                r#"
                CREATE TABLE "Numbers" ("Value" INTEGER);
                INSERT INTO "Numbers" ("Value") VALUES (1), (2), (3);
                SELECT SUM("Value") AS "Total" FROM "Numbers";
                "#
                .into(),
            )
            .try_collect::<Vec<_>>()
            .await
            .expect("Failed to run the queries");
        let affected = results
            .iter()
            .filter_map(|v| match v {
                QueryResult::Affected(v) => Some(v.rows_affected),
                _ => None,
            })
            .sum::<u64>();
        assert_eq!(affected, 3);
        let total = results
            .into_iter()
            .find_map(|v| match v {
                QueryResult::Row(mut row) => Some(row.take_as::<i64>("Total")),
                _ => None,
            })
            .expect("The sum must be returned")
            .expect("The sum must be an integer");
        assert_eq!(total, 6);

        silent_logs! {
            assert!(
                connection
                    .fetch(r#"SELECT "Missing" FROM "Numbers";"#.into())
                    .try_collect::<Vec<_>>()
                    .await
                    .is_err(),
                "A quoted unknown column must be an error"
            );
            assert!(
                connection
                    .execute(r#"CREATE INDEX "IX_Numbers_Missing" ON "Numbers" ("Missing");"#.into())
                    .await
                    .is_err(),
                "An index over an unknown column must be an error"
            );
        }
    }

    #[tokio::test]
    async fn prepared() {
        init_logs();
        let (_dir, mut connection) = notes().await;
        let mut query = connection
            .prepare(r#"INSERT INTO "Notes" ("Body") VALUES (?);"#.into())
            .await
            .expect("Failed to prepare the insert");
        assert!(query.is_prepared());
        query.bind("third").expect("Failed to bind the body");
        let result = connection
            .execute(query)
            .await
            .expect("Failed to run the prepared insert");
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_affected_id, Some(3));
        assert_eq!(count(&mut connection).await, 3);

        let result = connection
            .execute(r#"UPDATE "Notes" SET "Body" = 'same' WHERE "Id" > 100;"#.into())
            .await
            .expect("Failed to run the update");
        assert_eq!(result.rows_affected, 0);
        assert_eq!(result.last_affected_id, None);

        silent_logs! {
            assert!(
                connection
                    .prepare(r#"SELECT 1; SELECT 2;"#.into())
                    .await
                    .is_err(),
                "Preparing two statements at once must fail"
            );
            assert!(
                connection.prepare("   ".into()).await.is_err(),
                "Preparing nothing must fail"
            );
            let query: Query<_> = connection
                .prepare(r#"INSERT INTO "Notes" ("Body") VALUES (?);"#.into())
                .await
                .expect("Failed to prepare the insert");
            assert!(
                connection.execute(query).await.is_err(),
                "A missing body violates NOT NULL"
            );
        }
        assert_eq!(count(&mut connection).await, 3);
    }

    #[tokio::test]
    async fn transactions() {
        init_logs();
        let (_dir, mut connection) = notes().await;
        let mut transaction = connection
            .begin()
            .await
            .expect("Failed to begin the transaction");
        transaction
            .execute(r#"INSERT INTO "Notes" ("Body") VALUES ('rolled back');"#.into())
            .await
            .expect("Failed to insert in the transaction");
        transaction
            .rollback()
            .await
            .expect("Failed to roll back the transaction");
        assert_eq!(count(&mut connection).await, 2);

        let mut transaction = connection
            .begin()
            .await
            .expect("Failed to begin the transaction");
        transaction
            .execute(r#"INSERT INTO "Notes" ("Body") VALUES ('committed');"#.into())
            .await
            .expect("Failed to insert in the transaction");
        transaction
            .commit()
            .await
            .expect("Failed to commit the transaction");
        assert_eq!(count(&mut connection).await, 3);

        silent_logs! {
            let mut transaction = connection
                .begin()
                .await
                .expect("Failed to begin the transaction");
            transaction
                .execute(r#"DELETE FROM "Notes";"#.into())
                .await
                .expect("Failed to delete in the transaction");
            drop(transaction);
        }
        assert_eq!(
            count(&mut connection).await,
            3,
            "A transaction dropped without commit must roll back"
        );
    }
}
