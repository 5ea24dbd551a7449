use crate::silent_logs;
use journal::{ConstraintError, Entity, Executor, Passive, TradeCustomField, VALUE_MAX_LENGTH};
use std::{
    collections::{BTreeMap, HashSet},
    sync::LazyLock,
};
use time::{Duration, OffsetDateTime, PrimitiveDateTime, macros::datetime};
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

async fn recreate<Exec: Executor>(executor: &mut Exec) {
    TradeCustomField::drop_table(executor, true)
        .await
        .expect("Failed to drop TradeCustomFields table");
    TradeCustomField::create_table(executor, false)
        .await
        .expect("Failed to create TradeCustomFields table");
}

pub async fn custom_fields<Exec: Executor>(executor: &mut Exec) {
    let _lock = MUTEX.lock().await;
    recreate(executor).await;

    // Insert
    let stored = TradeCustomField::new(1, 2, Some("risk:high".into()))
        .insert(executor)
        .await
        .expect("Failed to insert the custom field");
    assert!(stored.id.is_set());
    assert_eq!(stored.trade_id, 1);
    assert_eq!(stored.field_definition_id, 2);
    assert_eq!(stored.value.as_deref(), Some("risk:high"));
    assert_eq!(stored.updated_at, None);
    let Passive::Set(created_at) = stored.created_at else {
        panic!("CreatedAt was not assigned by the database");
    };
    assert!(
        (now() - created_at).abs() <= Duration::seconds(2),
        "CreatedAt {} is not close to the current time",
        created_at
    );

    // Same pair again
    silent_logs! {
        let error = TradeCustomField::new(1, 2, Some("risk:low".into()))
            .insert(executor)
            .await
            .expect_err("The same trade and field definition must be rejected");
        assert!(ConstraintError::is_unique_violation(&error), "{:#}", error);
    }
    let found = TradeCustomField::find_by_pair(executor, 1, 2)
        .await
        .expect("Failed to query the custom field")
        .expect("The custom field must exist");
    assert_eq!(found, stored);
    assert_eq!(found.value.as_deref(), Some("risk:high"));

    // Length limit, counted in characters
    let limit = VALUE_MAX_LENGTH as usize;
    TradeCustomField::new(2, 1, Some("a".repeat(limit)))
        .insert(executor)
        .await
        .expect("A value of the maximum length must be accepted");
    TradeCustomField::new(2, 2, Some("é".repeat(limit)))
        .insert(executor)
        .await
        .expect("A multibyte value of the maximum length must be accepted");
    TradeCustomField::new(2, 3, None)
        .insert(executor)
        .await
        .expect("A missing value must be accepted");
    silent_logs! {
        let error = TradeCustomField::new(2, 4, Some("a".repeat(limit + 1)))
            .insert(executor)
            .await
            .expect_err("A value longer than the maximum length must be rejected");
        assert!(ConstraintError::is_constraint_violation(&error), "{:#}", error);
        assert!(!ConstraintError::is_unique_violation(&error), "{:#}", error);
        let error = TradeCustomField::new(2, 5, Some("é".repeat(limit + 1)))
            .insert(executor)
            .await
            .expect_err("A multibyte value longer than the maximum length must be rejected");
        assert!(ConstraintError::is_constraint_violation(&error), "{:#}", error);
    }
    let values = TradeCustomField::values_for_trade(executor, 2)
        .await
        .expect("Failed to query the values of the trade");
    assert_eq!(values.len(), 3);
    assert_eq!(values[&1].as_ref().map(|v| v.chars().count()), Some(limit));
    assert_eq!(values[&2].as_ref().map(|v| v.chars().count()), Some(limit));
    assert_eq!(values[&3], None);

    // Identity
    let mut ids = HashSet::new();
    for field in 1..=5 {
        let stored = TradeCustomField::new(3, field, Some(format!("value {}", field)))
            .insert(executor)
            .await
            .expect("Failed to insert the custom field");
        assert!(ids.insert(*stored.id.as_option().expect("Id must be assigned")));
    }
    assert_eq!(ids.len(), 5);
    let fields = TradeCustomField::for_trade(executor, 3)
        .await
        .expect("Failed to query the custom fields of the trade");
    assert_eq!(fields.len(), 5);
    assert!(fields.windows(2).all(|v| v[0].id.as_option() < v[1].id.as_option()));

    // Explicit creation time
    let explicit = TradeCustomField {
        created_at: datetime!(2024-01-02 03:04:05).into(),
        ..TradeCustomField::new(4, 1, Some("backfilled".into()))
    };
    let stored = explicit
        .insert(executor)
        .await
        .expect("Failed to insert the custom field with an explicit creation time");
    assert_eq!(stored.created_at, Passive::Set(datetime!(2024-01-02 03:04:05)));

    // Update
    let mut field = TradeCustomField::find_by_pair(executor, 1, 2)
        .await
        .expect("Failed to query the custom field")
        .expect("The custom field must exist");
    let (id, created_at) = (field.id, field.created_at);
    field
        .update_value(executor, Some("risk:medium".into()))
        .await
        .expect("Failed to update the value");
    assert_eq!(field.id, id);
    assert_eq!(field.created_at, created_at);
    assert_eq!(field.value.as_deref(), Some("risk:medium"));
    let updated_at = field.updated_at.expect("UpdatedAt must be assigned by the update");
    assert!((now() - updated_at).abs() <= Duration::seconds(2));
    field
        .update_value(executor, None)
        .await
        .expect("Failed to clear the value");
    assert_eq!(field.value, None);
    silent_logs! {
        let error = field
            .update_value(executor, Some("b".repeat(limit + 1)))
            .await
            .expect_err("An update longer than the maximum length must be rejected");
        assert!(ConstraintError::is_constraint_violation(&error), "{:#}", error);
    }
    assert_eq!(field.value, None, "The previous value must be kept");

    // Moving a record onto an existing pair
    let mut moved = TradeCustomField::find_by_pair(executor, 3, 2)
        .await
        .expect("Failed to query the custom field")
        .expect("The custom field must exist");
    moved.field_definition_id = 1;
    silent_logs! {
        let error = moved
            .save(executor)
            .await
            .expect_err("Saving onto an existing pair must be rejected");
        assert!(ConstraintError::is_unique_violation(&error), "{:#}", error);
    }
    assert_eq!(
        TradeCustomField::values_for_trade(executor, 3)
            .await
            .expect("Failed to query the values of the trade")
            .get(&2)
            .cloned(),
        Some(Some("value 2".into()))
    );

    // Upsert
    let first = TradeCustomField::upsert(executor, 20, 1, Some("a".into()))
        .await
        .expect("Failed to upsert the new custom field");
    assert_eq!(first.value.as_deref(), Some("a"));
    assert_eq!(first.updated_at, None);
    let second = TradeCustomField::upsert(executor, 20, 1, Some("b".into()))
        .await
        .expect("Failed to upsert the existing custom field");
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.value.as_deref(), Some("b"));
    assert!(second.updated_at.is_some());
    assert_eq!(
        TradeCustomField::for_trade(executor, 20)
            .await
            .expect("Failed to query the custom fields of the trade")
            .len(),
        1
    );

    // Delete
    let missing = TradeCustomField::find(executor, i64::MAX)
        .await
        .expect("Failed to query the custom field");
    assert_eq!(missing, None);
    second
        .delete(executor)
        .await
        .expect("Failed to delete the custom field");
    assert_eq!(
        TradeCustomField::find_by_pair(executor, 20, 1)
            .await
            .expect("Failed to query the custom field"),
        None
    );
    silent_logs! {
        assert!(
            second.delete(executor).await.is_err(),
            "Deleting a missing record must fail"
        );
    }
    let removed = TradeCustomField::delete_for_trade(executor, 3)
        .await
        .expect("Failed to delete the custom fields of the trade");
    assert_eq!(removed, 5);
    assert!(
        TradeCustomField::for_trade(executor, 3)
            .await
            .expect("Failed to query the custom fields of the trade")
            .is_empty()
    );
    assert_eq!(
        TradeCustomField::delete_for_trade(executor, 3)
            .await
            .expect("Failed to delete the custom fields of the trade"),
        0
    );
}

pub async fn custom_fields_transactions<C: journal::Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().await;
    recreate(connection).await;

    TradeCustomField::new(30, 9, Some("stale".into()))
        .insert(connection)
        .await
        .expect("Failed to insert the custom field");
    let replaced = TradeCustomField::replace_for_trade(
        connection,
        30,
        [
            (1, Some("x".to_string())),
            (2, None),
            (3, Some("z".to_string())),
        ],
    )
    .await
    .expect("Failed to replace the custom fields of the trade");
    assert_eq!(replaced.len(), 2);
    let expected = BTreeMap::from([(1, Some("x".to_string())), (3, Some("z".to_string()))]);
    assert_eq!(
        TradeCustomField::values_for_trade(connection, 30)
            .await
            .expect("Failed to query the values of the trade"),
        expected
    );

    // A failing value leaves the trade untouched
    silent_logs! {
        let error = TradeCustomField::replace_for_trade(
            connection,
            30,
            [
                (4, Some("fine".to_string())),
                (5, Some("c".repeat(VALUE_MAX_LENGTH as usize + 1))),
            ],
        )
        .await
        .expect_err("Replacing with a value too long must fail");
        assert!(ConstraintError::is_constraint_violation(&error), "{:#}", error);
    }
    assert_eq!(
        TradeCustomField::values_for_trade(connection, 30)
            .await
            .expect("Failed to query the values of the trade"),
        expected
    );

    // Replacing with nothing clears the trade
    let replaced = TradeCustomField::replace_for_trade(connection, 30, [(1, None)])
        .await
        .expect("Failed to clear the custom fields of the trade");
    assert!(replaced.is_empty());
}
