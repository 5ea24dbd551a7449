#[cfg(test)]
mod tests {
    use indoc::indoc;
    use journal::{
        ColumnDef, GenericSqlWriter, MIGRATION_HISTORY, SqlWriter, TRADE_CUSTOM_FIELDS, TableDef,
        Value,
    };
    use journal_sqlite::SqliteSqlWriter;
    use std::{sync::LazyLock, time::Duration};
    use time::macros::datetime;

    const WRITER: GenericSqlWriter = GenericSqlWriter {};
    const SQLITE: SqliteSqlWriter = SqliteSqlWriter {};

    const INSERTED: [&str; 4] = ["TradeId", "FieldDefinitionId", "Value", "UpdatedAt"];

    static NOTES: LazyLock<TableDef> = LazyLock::new(|| {
        TableDef::new("Notes")
            .column(ColumnDef::new("Left", Value::Int32(None)).part_of_primary_key())
            .column(ColumnDef::new("Right", Value::Int32(None)).part_of_primary_key())
            .column(
                ColumnDef::new("Body", Value::Varchar(None))
                    .nullable()
                    .comment("It's free text"),
            )
            .column(ColumnDef::new("Score", Value::Float64(None)).unique())
            .index(&["Body"])
    });

    #[test]
    fn create_table_sqlite() {
        let mut out = String::new();
        SQLITE.write_create_table(&mut out, &TRADE_CUSTOM_FIELDS, true);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "TradeCustomFields" (
                "Id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "TradeId" INTEGER NOT NULL REFERENCES "Trades"("Id") ON DELETE CASCADE,
                "FieldDefinitionId" INTEGER NOT NULL REFERENCES "FieldDefinitions"("Id") ON DELETE CASCADE,
                "Value" TEXT CHECK (length("Value") <= 4000),
                "CreatedAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                "UpdatedAt" TEXT
                );
                CREATE UNIQUE INDEX IF NOT EXISTS "IX_TradeCustomFields_TradeId_FieldDefinitionId" ON "TradeCustomFields" ("TradeId", "FieldDefinitionId");
            "#}
            .trim()
        );

        let mut out = String::new();
        SQLITE.write_create_table(&mut out, &MIGRATION_HISTORY, true);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "MigrationHistory" (
                "Id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "Version" INTEGER NOT NULL,
                "Name" TEXT NOT NULL CHECK (length("Name") <= 200),
                "Description" TEXT CHECK (length("Description") <= 500),
                "AppliedAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                "ExecutionTimeMs" INTEGER NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS "IX_MigrationHistory_Version" ON "MigrationHistory" ("Version");
            "#}
            .trim()
        );
    }

    #[test]
    fn create_table_generic() {
        let mut out = String::new();
        WRITER.write_create_table(&mut out, &TRADE_CUSTOM_FIELDS, false);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE "TradeCustomFields" (
                "Id" BIGINT PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY,
                "TradeId" BIGINT NOT NULL REFERENCES "Trades"("Id") ON DELETE CASCADE,
                "FieldDefinitionId" BIGINT NOT NULL REFERENCES "FieldDefinitions"("Id") ON DELETE CASCADE,
                "Value" VARCHAR(4000) CHECK (CHAR_LENGTH("Value") <= 4000),
                "CreatedAt" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                "UpdatedAt" TIMESTAMP
                );
                CREATE UNIQUE INDEX "IX_TradeCustomFields_TradeId_FieldDefinitionId" ON "TradeCustomFields" ("TradeId", "FieldDefinitionId");
            "#}
            .trim()
        );
    }

    #[test]
    fn create_table_composite_key() {
        let mut out = String::new();
        WRITER.write_create_table(&mut out, &NOTES, true);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "Notes" (
                "Left" INTEGER NOT NULL,
                "Right" INTEGER NOT NULL,
                "Body" VARCHAR,
                "Score" DOUBLE NOT NULL UNIQUE,
                PRIMARY KEY ("Left", "Right")
                );
                CREATE INDEX IF NOT EXISTS "IX_Notes_Body" ON "Notes" ("Body");
                COMMENT ON COLUMN "Notes"."Body" IS 'It''s free text';
            "#}
            .trim()
        );

        let mut out = String::new();
        SQLITE.write_create_table(&mut out, &NOTES, false);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE "Notes" (
                "Left" INTEGER NOT NULL,
                "Right" INTEGER NOT NULL,
                "Body" TEXT,
                "Score" REAL NOT NULL UNIQUE,
                PRIMARY KEY ("Left", "Right")
                );
                CREATE INDEX "IX_Notes_Body" ON "Notes" ("Body");
            "#}
            .trim()
        );
    }

    #[test]
    fn drop_table() {
        let mut out = String::new();
        SQLITE.write_drop_table(&mut out, &TRADE_CUSTOM_FIELDS, true);
        assert_eq!(out, r#"DROP TABLE IF EXISTS "TradeCustomFields";"#);
        let mut out = String::new();
        WRITER.write_drop_table(&mut out, &NOTES, false);
        assert_eq!(out, r#"DROP TABLE "Notes";"#);
    }

    #[test]
    fn select() {
        let table = &*TRADE_CUSTOM_FIELDS;
        let mut out = String::new();
        SQLITE.write_select(
            &mut out,
            table,
            &table
                .column_ref("TradeId")
                .equals(1_i64)
                .and(table.column_ref("FieldDefinitionId").equals(2_i64)),
            Some(1),
        );
        assert_eq!(
            out,
            indoc! {r#"
                SELECT "Id", "TradeId", "FieldDefinitionId", "Value", "CreatedAt", "UpdatedAt"
                FROM "TradeCustomFields"
                WHERE "TradeId" = 1 AND "FieldDefinitionId" = 2
                ORDER BY "Id"
                LIMIT 1;
            "#}
            .trim()
        );

        let mut out = String::new();
        WRITER.write_select(&mut out, &NOTES, &true, None);
        assert_eq!(
            out,
            indoc! {r#"
                SELECT "Left", "Right", "Body", "Score"
                FROM "Notes"
                WHERE true
                ORDER BY "Left", "Right";
            "#}
            .trim()
        );
    }

    #[test]
    fn insert() {
        let mut out = String::new();
        SQLITE.write_insert(&mut out, &TRADE_CUSTOM_FIELDS, &INSERTED);
        assert_eq!(
            out,
            indoc! {r#"
                INSERT INTO "TradeCustomFields" ("TradeId", "FieldDefinitionId", "Value", "UpdatedAt") VALUES
                (?, ?, ?, ?);
            "#}
            .trim()
        );
    }

    #[test]
    fn upsert() {
        let mut out = String::new();
        SQLITE.write_upsert(
            &mut out,
            &TRADE_CUSTOM_FIELDS,
            &INSERTED,
            &TRADE_CUSTOM_FIELDS.conflict_target(),
        );
        assert_eq!(
            out,
            indoc! {r#"
                INSERT INTO "TradeCustomFields" ("TradeId", "FieldDefinitionId", "Value", "UpdatedAt") VALUES
                (?, ?, ?, ?)
                ON CONFLICT ("TradeId", "FieldDefinitionId") DO UPDATE SET
                "Value" = EXCLUDED."Value",
                "UpdatedAt" = CURRENT_TIMESTAMP;
            "#}
            .trim()
        );

        let mut out = String::new();
        WRITER.write_upsert(&mut out, &NOTES, &["Left", "Right"], &["Left", "Right"]);
        assert_eq!(
            out,
            indoc! {r#"
                INSERT INTO "Notes" ("Left", "Right") VALUES
                (?, ?)
                ON CONFLICT ("Left", "Right") DO NOTHING;
            "#}
            .trim()
        );

        let mut out = String::new();
        SQLITE.write_upsert(
            &mut out,
            &TRADE_CUSTOM_FIELDS,
            &["TradeId", "FieldDefinitionId"],
            &TRADE_CUSTOM_FIELDS.conflict_target(),
        );
        assert_eq!(
            out,
            indoc! {r#"
                INSERT INTO "TradeCustomFields" ("TradeId", "FieldDefinitionId") VALUES
                (?, ?)
                ON CONFLICT ("TradeId", "FieldDefinitionId") DO UPDATE SET
                "UpdatedAt" = CURRENT_TIMESTAMP;
            "#}
            .trim()
        );
    }

    #[test]
    fn update() {
        let table = &*TRADE_CUSTOM_FIELDS;
        let mut out = String::new();
        SQLITE.write_update(
            &mut out,
            table,
            &["TradeId", "FieldDefinitionId", "Value"],
            &table.column_ref("Id").equals(5_i64),
        );
        assert_eq!(
            out,
            indoc! {r#"
                UPDATE "TradeCustomFields"
                SET "TradeId" = ?, "FieldDefinitionId" = ?, "Value" = ?, "UpdatedAt" = CURRENT_TIMESTAMP
                WHERE "Id" = 5;
            "#}
            .trim()
        );

        let mut out = String::new();
        SQLITE.write_update(&mut out, table, &[], &table.column_ref("Id").equals(5_i64));
        assert_eq!(
            out,
            indoc! {r#"
                UPDATE "TradeCustomFields"
                SET "UpdatedAt" = CURRENT_TIMESTAMP
                WHERE "Id" = 5;
            "#}
            .trim()
        );
    }

    #[test]
    fn delete() {
        let table = &*TRADE_CUSTOM_FIELDS;
        let mut out = String::new();
        WRITER.write_delete(&mut out, table, &table.column_ref("TradeId").equals(7_i64));
        assert_eq!(
            out,
            indoc! {r#"
                DELETE FROM "TradeCustomFields"
                WHERE "TradeId" = 7;
            "#}
            .trim()
        );
    }

    #[test]
    fn values() {
        let mut out = String::new();
        WRITER.write_value(
            &mut out,
            &Value::Timestamp(Some(datetime!(2024-01-02 03:04:05.5))),
        );
        assert_eq!(out, "'2024-01-02 03:04:05.5'");
        let mut out = String::new();
        WRITER.write_value(&mut out, &Value::Varchar(Some("risk:'high'".into())));
        assert_eq!(out, "'risk:''high'''");
        let mut out = String::new();
        WRITER.write_value(&mut out, &Value::Float64(Some(f64::NAN)));
        assert_eq!(out, "'NaN'");
        let mut out = String::new();
        WRITER.write_value(&mut out, &Value::Varchar(None));
        assert_eq!(out, "NULL");
    }

    #[test]
    fn session() {
        let mut out = String::new();
        SQLITE.write_busy_timeout(&mut out, Duration::from_secs(5));
        out.push('\n');
        SQLITE.write_foreign_keys(&mut out, true);
        assert_eq!(
            out,
            indoc! {"
                PRAGMA busy_timeout = 5000;
                PRAGMA foreign_keys = ON;
            "}
            .trim()
        );
        let mut out = String::new();
        SQLITE.write_foreign_keys(&mut out, false);
        assert_eq!(out, "PRAGMA foreign_keys = OFF;");

        let mut out = String::new();
        WRITER.write_busy_timeout(&mut out, Duration::from_secs(5));
        WRITER.write_foreign_keys(&mut out, true);
        assert!(out.is_empty());

        let mut out = String::new();
        SQLITE.write_transaction_begin(&mut out);
        WRITER.write_transaction_begin(&mut out);
        WRITER.write_transaction_commit(&mut out);
        WRITER.write_transaction_rollback(&mut out);
        assert_eq!(out, "BEGIN IMMEDIATE;BEGIN;COMMIT;ROLLBACK;");
    }
}
