use journal_core::{Connection, Context, Driver, Error, Result, SqlWriter};
use std::{env, time::Duration};

/// Settings of the connection to the journal database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    /// Location of the database, `sqlite://<path>[?<params>]` for SQLite.
    pub database_url: String,
    /// Enforce the references to trades and field definitions.
    pub foreign_keys: bool,
    /// How long a writer waits for the database lock held by another connection.
    pub busy_timeout: Duration,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://journal.sqlite".into(),
            foreign_keys: false,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl JournalConfig {
    pub const DATABASE_URL: &'static str = "JOURNAL_DATABASE_URL";
    pub const FOREIGN_KEYS: &'static str = "JOURNAL_FOREIGN_KEYS";
    pub const BUSY_TIMEOUT_MS: &'static str = "JOURNAL_BUSY_TIMEOUT_MS";

    /// Defaults overridden by the `JOURNAL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overridden by the values `lookup` returns for the `JOURNAL_*` names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(Self::DATABASE_URL) {
            log::info!("Overriding {} from environment", Self::DATABASE_URL);
            config.database_url = url;
        }
        if let Some(value) = lookup(Self::FOREIGN_KEYS) {
            config.foreign_keys = parse_flag(&value)
                .with_context(|| format!("Invalid value for {}", Self::FOREIGN_KEYS))?;
            log::info!(
                "Overriding {} to {} from environment",
                Self::FOREIGN_KEYS,
                config.foreign_keys
            );
        }
        if let Some(value) = lookup(Self::BUSY_TIMEOUT_MS) {
            let millis = value.trim().parse::<u64>().with_context(|| {
                format!("Invalid value `{}` for {}", value, Self::BUSY_TIMEOUT_MS)
            })?;
            config.busy_timeout = Duration::from_millis(millis);
            log::info!(
                "Overriding {} to {} from environment",
                Self::BUSY_TIMEOUT_MS,
                millis
            );
        }
        Ok(config)
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens a connection and applies the session settings.
    pub async fn connect<C: Connection>(&self) -> Result<C> {
        let mut connection = C::connect(self.database_url.clone().into()).await?;
        let mut query = String::with_capacity(64);
        {
            let writer = connection.driver().sql_writer();
            writer.write_busy_timeout(&mut query, self.busy_timeout);
            writer.write_foreign_keys(&mut query, self.foreign_keys);
        }
        if !query.trim().is_empty() {
            connection.execute(query.into()).await.with_context(|| {
                format!(
                    "While configuring the {} connection",
                    <C::Driver as Driver>::NAME
                )
            })?;
        }
        Ok(connection)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(Error::msg(format!(
            "Expected one of true, false, 1, 0, on, off, yes, no but found `{}`",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::JournalConfig;
    use std::{collections::HashMap, time::Duration};

    fn lookup(values: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = JournalConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, JournalConfig::default());
        assert_eq!(config.database_url, "sqlite://journal.sqlite");
        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn overrides() {
        let config = JournalConfig::from_lookup(lookup(&[
            ("JOURNAL_DATABASE_URL", "sqlite://:memory:"),
            ("JOURNAL_FOREIGN_KEYS", "On"),
            ("JOURNAL_BUSY_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite://:memory:");
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        let config = JournalConfig::from_lookup(lookup(&[("JOURNAL_FOREIGN_KEYS", "0")])).unwrap();
        assert!(!config.foreign_keys);
    }

    #[test]
    fn invalid_values() {
        assert!(JournalConfig::from_lookup(lookup(&[("JOURNAL_FOREIGN_KEYS", "maybe")])).is_err());
        assert!(JournalConfig::from_lookup(lookup(&[("JOURNAL_BUSY_TIMEOUT_MS", "-1")])).is_err());
        assert!(JournalConfig::from_lookup(lookup(&[("JOURNAL_BUSY_TIMEOUT_MS", "soon")])).is_err());
    }

    #[test]
    fn builders() {
        let config = JournalConfig::default()
            .with_database_url("sqlite://trades.sqlite")
            .with_foreign_keys(true)
            .with_busy_timeout(Duration::from_millis(10));
        assert_eq!(config.database_url, "sqlite://trades.sqlite");
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout, Duration::from_millis(10));
    }
}
