//! Runtime configuration: server settings and the chart-of-accounts conventions
//! the reports and the sales journal rely on.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::*;
use crate::utils::DatabaseConfig;

/// Account codes with a fixed role in the books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConventions {
    /// Cash account debited by sales receipts
    pub cash_account: String,
    /// Sales revenue account
    pub revenue_account: String,
    /// Cost of goods sold (HPP) account
    pub cogs_account: String,
    /// Merchandise inventory account
    pub inventory_account: String,
    /// Owner's capital account
    pub capital_account: String,
    /// Owner's drawings account
    pub drawings_account: String,
    /// Income summary account used by closing entries
    pub income_summary_account: String,
    /// Comma-separated codes counted as cash by the cash flow statement
    pub cash_accounts: String,
}

impl Default for AccountConventions {
    fn default() -> Self {
        Self {
            cash_account: "1-1100".to_string(),
            revenue_account: "4-1100".to_string(),
            cogs_account: "5-1100".to_string(),
            inventory_account: "1-1300".to_string(),
            capital_account: "3-1100".to_string(),
            drawings_account: DEFAULT_DRAWINGS_ACCOUNT.to_string(),
            income_summary_account: "3-1300".to_string(),
            cash_accounts: "1-1100".to_string(),
        }
    }
}

impl AccountConventions {
    /// Codes counted as cash; falls back to the sales cash account
    pub fn cash_account_codes(&self) -> Vec<String> {
        let codes: Vec<String> = self
            .cash_accounts
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect();
        if codes.is_empty() {
            vec![self.cash_account.clone()]
        } else {
            codes
        }
    }

    pub fn is_cash(&self, code: &str) -> bool {
        self.cash_account_codes().iter().any(|c| c == code)
    }

    /// Classify a code honoring the configured drawings account
    pub fn classify(&self, code: &str) -> (AccountType, EntryType) {
        classify_account_code(code, &self.drawings_account)
    }

    /// Build an account from code and name with the configured classification
    pub fn account(&self, code: &str, name: &str) -> Account {
        let (account_type, normal_balance) = self.classify(code);
        Account::with_classification(code.to_string(), name.to_string(), account_type, normal_balance)
    }
}

/// Books configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// How long a loaded ledger snapshot is reused, in seconds
    pub cache_ttl_secs: u64,
    /// Books database, e.g. "sqlite://lobster-ledger.db"; `None` keeps the
    /// books in memory for the life of the process
    pub database_url: Option<String>,
    /// Connection pool size for the books database
    pub database_max_connections: u32,
    /// Account roles
    pub accounts: AccountConventions,
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            cache_ttl_secs: 60,
            database_url: Some("sqlite://lobster-ledger.db".to_string()),
            database_max_connections: 5,
            accounts: AccountConventions::default(),
        }
    }
}

impl BooksConfig {
    /// Loads configuration from `BOOKS_*` environment variables.
    /// Nested keys use a double underscore, e.g. `BOOKS_ACCOUNTS__CASH_ACCOUNT`.
    pub fn from_env() -> LedgerResult<Self> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("BOOKS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Database settings, unless the books are configured to live in memory.
    /// An empty URL or "memory" selects in-memory books.
    pub fn database(&self) -> Option<DatabaseConfig> {
        let url = self.database_url.as_deref().map(str::trim)?;
        if url.is_empty() || url.eq_ignore_ascii_case("memory") {
            return None;
        }
        Some(DatabaseConfig::new(url).max_connections(self.database_max_connections.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_account_codes() {
        let mut conventions = AccountConventions::default();
        assert_eq!(conventions.cash_account_codes(), vec!["1-1100".to_string()]);

        conventions.cash_accounts = " 1-1100, 1-1150 ,".to_string();
        assert_eq!(
            conventions.cash_account_codes(),
            vec!["1-1100".to_string(), "1-1150".to_string()]
        );
        assert!(conventions.is_cash("1-1150"));
        assert!(!conventions.is_cash("1-1300"));

        conventions.cash_accounts = String::new();
        assert_eq!(conventions.cash_account_codes(), vec!["1-1100".to_string()]);
    }

    #[test]
    fn test_custom_drawings_account() {
        let conventions = AccountConventions {
            drawings_account: "3-9000".to_string(),
            ..Default::default()
        };
        let drawings = conventions.account("3-9000", "Prive");
        assert_eq!(drawings.normal_balance, EntryType::Debit);
        let capital = conventions.account("3-1200", "Modal Tambahan");
        assert_eq!(capital.normal_balance, EntryType::Credit);
    }

    #[test]
    fn test_defaults() {
        let config = BooksConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8000");
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(
            config.database().map(|db| db.url),
            Some("sqlite://lobster-ledger.db".to_string())
        );
    }

    #[test]
    fn test_in_memory_books() {
        for url in [None, Some(""), Some("memory"), Some(" MEMORY ")] {
            let config = BooksConfig {
                database_url: url.map(str::to_string),
                ..Default::default()
            };
            assert!(config.database().is_none());
        }

        let config = BooksConfig {
            database_url: Some("sqlite:///var/lib/books.db".to_string()),
            database_max_connections: 0,
            ..Default::default()
        };
        let database = config.database().unwrap();
        assert_eq!(database.url, "sqlite:///var/lib/books.db");
        assert_eq!(database.max_connections, 1);
    }
}
