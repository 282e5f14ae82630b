//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(LedgerError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an account code looks like "1-1100": digit groups joined by dashes
pub fn validate_account_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account code cannot be empty".to_string(),
        ));
    }

    if code.len() > 20 {
        return Err(LedgerError::Validation(
            "Account code cannot exceed 20 characters".to_string(),
        ));
    }

    if !code.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(LedgerError::Validation(format!(
            "Account code '{}' must start with a digit",
            code
        )));
    }

    if !code.chars().all(|c| c.is_ascii_digit() || c == '-') || code.contains("--") || code.ends_with('-') {
        return Err(LedgerError::Validation(format!(
            "Account code '{}' can only contain digit groups separated by single dashes",
            code
        )));
    }

    Ok(())
}

/// Validate that an account name is valid
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a journal description is valid
pub fn validate_journal_description(description: &str) -> LedgerResult<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Journal description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Journal description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Enhanced journal validator with detailed checks
pub struct EnhancedJournalValidator;

impl JournalValidator for EnhancedJournalValidator {
    fn validate_journal(&self, draft: &JournalDraft) -> LedgerResult<()> {
        DefaultJournalValidator.validate_journal(draft)?;

        validate_journal_description(&draft.description)?;

        for line in &draft.lines {
            validate_account_code(&line.account_code)?;
        }

        // The same account may not appear twice on the same side
        let mut seen = std::collections::HashSet::new();
        for line in &draft.lines {
            if let Some(side) = line.side() {
                if !seen.insert((line.account_code.as_str(), side)) {
                    return Err(LedgerError::Validation(format!(
                        "Account '{}' appears multiple times on the same side in journal",
                        line.account_code
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Enhanced account validator with detailed checks
pub struct EnhancedAccountValidator;

impl AccountValidator for EnhancedAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        validate_account_code(&account.code)?;
        validate_account_name(&account.name)?;
        Ok(())
    }
}
