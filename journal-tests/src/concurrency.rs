use journal::{Connection, ConstraintError, Entity, JournalConfig, TradeCustomField};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

const WRITERS: usize = 8;

/// Writers on separate connections racing for the same trade and field definition.
pub async fn concurrency<C: Connection + 'static>(config: &JournalConfig) {
    let _lock = MUTEX.lock().await;
    let mut connection: C = config
        .connect()
        .await
        .expect("Could not connect to the database");
    TradeCustomField::drop_table(&mut connection, true)
        .await
        .expect("Failed to drop TradeCustomFields table");
    TradeCustomField::create_table(&mut connection, false)
        .await
        .expect("Failed to create TradeCustomFields table");

    // Plain inserts: one wins, the others see the duplicate
    let level = log::max_level();
    log::set_max_level(log::LevelFilter::Off);
    let handles = (0..WRITERS)
        .map(|i| {
            let config = config.clone();
            tokio::spawn(async move {
                let mut connection: C = config.connect().await?;
                TradeCustomField::new(77, 5, Some(format!("writer {}", i)))
                    .insert(&mut connection)
                    .await
            })
        })
        .collect::<Vec<_>>();
    let mut inserted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("The writer task panicked") {
            Ok(..) => inserted += 1,
            Err(error) => {
                assert!(ConstraintError::is_unique_violation(&error), "{:#}", error);
                rejected += 1;
            }
        }
    }
    log::set_max_level(level);
    assert_eq!(inserted, 1);
    assert_eq!(rejected, WRITERS - 1);
    assert_eq!(
        TradeCustomField::for_trade(&mut connection, 77)
            .await
            .expect("Failed to query the custom fields of the trade")
            .len(),
        1
    );

    // Upserts: all succeed on a single row
    let handles = (0..WRITERS)
        .map(|i| {
            let config = config.clone();
            tokio::spawn(async move {
                let mut connection: C = config.connect().await?;
                TradeCustomField::upsert(&mut connection, 78, 5, Some(format!("writer {}", i)))
                    .await
            })
        })
        .collect::<Vec<_>>();
    let mut ids = Vec::with_capacity(WRITERS);
    for handle in handles {
        let stored = handle
            .await
            .expect("The writer task panicked")
            .expect("Concurrent upserts must not fail");
        ids.push(stored.id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1, "Every upsert must land on the same row");
    let fields = TradeCustomField::for_trade(&mut connection, 78)
        .await
        .expect("Failed to query the custom fields of the trade");
    assert_eq!(fields.len(), 1);
    assert!(
        fields[0]
            .value
            .as_deref()
            .is_some_and(|v| v.starts_with("writer "))
    );
}
