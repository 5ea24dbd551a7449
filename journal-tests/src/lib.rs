mod concurrency;
mod custom_fields;
mod foreign_keys;
mod migration;

use crate::{
    concurrency::concurrency,
    custom_fields::{custom_fields, custom_fields_transactions},
    foreign_keys::{foreign_keys, foreign_keys_disabled},
    migration::migration,
};
use journal::{Connection, JournalConfig};
use log::LevelFilter;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole suite against the database `config` points to.
///
/// The database must be shared by every connection opened from `config`
/// (a file, not `:memory:`). Tables are dropped and recreated by the tests.
pub async fn execute_tests<C: Connection + 'static>(config: &JournalConfig) {
    let unchecked = config.clone().with_foreign_keys(false);
    let mut connection: C = unchecked
        .connect()
        .await
        .expect("Could not connect to the database");
    migration(&mut connection).await;
    custom_fields(&mut connection).await;
    custom_fields_transactions(&mut connection).await;
    foreign_keys_disabled::<C>(
        &JournalConfig::default()
            .with_database_url(config.database_url.clone())
            .with_busy_timeout(config.busy_timeout),
    )
    .await;
    foreign_keys::<C>(&config.clone().with_foreign_keys(true)).await;
    concurrency::<C>(&unchecked).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
