//! Chart of accounts management

use crate::config::AccountConventions;
use crate::traits::*;
use crate::types::*;

/// Chart manager for handling chart of accounts operations
pub struct ChartManager<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
    conventions: AccountConventions,
}

impl<S: LedgerStorage> ChartManager<S> {
    /// Create a new chart manager
    pub fn new(storage: S, conventions: AccountConventions) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
            conventions,
        }
    }

    /// Create a new chart manager with custom validator
    pub fn with_validator(
        storage: S,
        conventions: AccountConventions,
        validator: Box<dyn AccountValidator>,
    ) -> Self {
        Self {
            storage,
            validator,
            conventions,
        }
    }

    /// Create a new account, inferring its type and normal balance from the code
    pub async fn create_account(&mut self, code: &str, name: &str) -> LedgerResult<Account> {
        let account = self.conventions.account(code, name);
        self.seed_accounts(vec![account.clone()]).await?;
        Ok(account)
    }

    /// Seed a batch of accounts. Codes already in the chart are rejected;
    /// accounts are immutable once seeded.
    pub async fn seed_accounts(&mut self, accounts: Vec<Account>) -> LedgerResult<usize> {
        let mut seen = std::collections::HashSet::new();
        for account in &accounts {
            self.validator.validate_account(account)?;

            if !seen.insert(account.code.as_str()) {
                return Err(LedgerError::Validation(format!(
                    "Account code '{}' appears more than once in the batch",
                    account.code
                )));
            }

            if self.storage.get_account(&account.code).await?.is_some() {
                return Err(LedgerError::Validation(format!(
                    "Account with code '{}' already exists",
                    account.code
                )));
            }
        }

        self.storage.save_accounts(&accounts).await?;
        Ok(accounts.len())
    }

    /// Get an account by code
    pub async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(code).await
    }

    /// Get an account by code, returning an error if not found
    pub async fn get_account_required(&self, code: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(code)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(None).await
    }

    /// List accounts by type
    pub async fn list_accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(Some(account_type)).await
    }
}

/// Utility functions for working with the chart
pub mod utils {
    use super::*;

    /// Code and name of every account in the storefront's default chart
    pub const STOREFRONT_CHART: &[(&str, &str)] = &[
        ("1-1100", "Kas"),
        ("1-1200", "Piutang Usaha"),
        ("1-1300", "Persediaan Lobster"),
        ("1-1400", "Perlengkapan"),
        ("1-2100", "Peralatan"),
        ("1-2200", "Akumulasi Penyusutan Peralatan"),
        ("2-1100", "Utang Usaha"),
        ("2-1200", "Utang Gaji"),
        ("2-2100", "Utang Bank"),
        ("3-1100", "Modal Pemilik"),
        ("3-1200", "Prive Pemilik"),
        ("3-1300", "Ikhtisar Laba Rugi"),
        ("4-1100", "Penjualan"),
        ("5-1100", "Harga Pokok Penjualan"),
        ("6-1100", "Beban Gaji"),
        ("6-1200", "Beban Listrik dan Air"),
        ("6-1300", "Beban Perlengkapan"),
        ("6-1400", "Beban Penyusutan Peralatan"),
        ("8-1100", "Pendapatan Lain-lain"),
        ("9-1100", "Beban Lain-lain"),
    ];

    /// Create the storefront's default chart of accounts
    pub async fn create_storefront_chart<S: LedgerStorage>(
        chart: &mut ChartManager<S>,
    ) -> LedgerResult<Vec<Account>> {
        let accounts: Vec<Account> = STOREFRONT_CHART
            .iter()
            .map(|(code, name)| chart.conventions.account(code, name))
            .collect();
        chart.seed_accounts(accounts.clone()).await?;
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{EnhancedAccountValidator, MemoryStorage};

    #[tokio::test]
    async fn test_create_account_infers_classification() {
        let mut chart = ChartManager::new(MemoryStorage::new(), AccountConventions::default());
        let prive = chart.create_account("3-1200", "Prive Pemilik").await.unwrap();
        assert_eq!(prive.account_type, AccountType::Equity);
        assert_eq!(prive.normal_balance, EntryType::Debit);

        let duplicate = chart.create_account("3-1200", "Prive").await;
        assert!(matches!(duplicate, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_batch_with_invalid_code_saves_nothing() {
        let mut chart = ChartManager::with_validator(
            MemoryStorage::new(),
            AccountConventions::default(),
            Box::new(EnhancedAccountValidator),
        );
        let batch = vec![
            Account::new("1-1100".to_string(), "Kas".to_string()),
            Account::new("KAS".to_string(), "Kas Kecil".to_string()),
        ];
        assert!(chart.seed_accounts(batch).await.is_err());
        assert!(chart.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storefront_chart() {
        let mut chart = ChartManager::new(MemoryStorage::new(), AccountConventions::default());
        let accounts = utils::create_storefront_chart(&mut chart).await.unwrap();
        assert_eq!(accounts.len(), utils::STOREFRONT_CHART.len());

        let revenue = chart
            .list_accounts_by_type(AccountType::Revenue)
            .await
            .unwrap();
        assert_eq!(revenue.len(), 2);
        assert!(chart.get_account_required("9-9999").await.is_err());
    }
}
