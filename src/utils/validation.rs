//! Validation utilities

use bigdecimal::BigDecimal;

use crate::spreadsheet::{CheckRow, ColumnRole};
use crate::traits::*;
use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> Result<(), RowError> {
    if *amount <= BigDecimal::from(0) {
        Err(RowError::InvalidCell {
            column: ColumnRole::Amount,
            message: format!("amount must be positive, got {amount}"),
        })
    } else {
        Ok(())
    }
}

/// Validate that a check number is usable
pub fn validate_check_number(check_number: &str) -> Result<(), RowError> {
    let invalid = |message: &str| RowError::InvalidCell {
        column: ColumnRole::CheckNumber,
        message: message.to_string(),
    };

    if check_number.trim().is_empty() {
        return Err(invalid("check number cannot be empty"));
    }

    if check_number.len() > 20 {
        return Err(invalid("check number cannot exceed 20 characters"));
    }

    // Alphanumeric, dashes and slashes, as printed on check forms
    if !check_number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '/')
    {
        return Err(invalid(
            "check number can only contain alphanumeric characters, dashes and slashes",
        ));
    }

    Ok(())
}

/// Validate that a currency code looks like an ISO 4217 code
pub fn validate_currency_code(code: &str) -> Result<(), RowError> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RowError::InvalidCell {
            column: ColumnRole::CurrencyCode,
            message: format!("'{code}' is not a three letter currency code"),
        });
    }
    Ok(())
}

/// Check validator that also requires a well-formed check number and currency code
pub struct EnhancedCheckValidator;

impl CheckValidator for EnhancedCheckValidator {
    fn validate_check(&self, check: &CheckRow) -> Result<(), RowError> {
        // Rows without amount are skipped later, not rejected
        let amount = match &check.amount {
            Some(amount) if *amount != BigDecimal::from(0) => amount,
            _ => return Ok(()),
        };
        validate_positive_amount(amount)?;

        match &check.check_number {
            Some(number) => validate_check_number(number)?,
            None => {
                return Err(RowError::InvalidCell {
                    column: ColumnRole::CheckNumber,
                    message: "check number is required".to_string(),
                })
            }
        }

        if let Some(code) = &check.currency_code {
            validate_currency_code(code)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(amount: Option<i64>, number: Option<&str>) -> CheckRow {
        CheckRow {
            row_number: 2,
            partner_name: Some("Acme".to_string()),
            amount: amount.map(BigDecimal::from),
            currency_code: Some("USD".to_string()),
            reference: None,
            check_number: number.map(str::to_string),
            check_payment_date: None,
            bank_name: None,
        }
    }

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(&BigDecimal::from(1)).is_ok());
        assert!(validate_positive_amount(&BigDecimal::from(-5)).is_err());
    }

    #[test]
    fn test_check_number_rules() {
        assert!(validate_check_number("00012345").is_ok());
        assert!(validate_check_number("A-12/3").is_ok());
        assert!(validate_check_number(" ").is_err());
        assert!(validate_check_number("12 34").is_err());
        assert!(validate_check_number(&"9".repeat(21)).is_err());
    }

    #[test]
    fn test_validators() {
        assert!(DefaultCheckValidator.validate_check(&check(Some(10), None)).is_ok());
        assert!(DefaultCheckValidator.validate_check(&check(Some(-10), None)).is_err());

        assert!(EnhancedCheckValidator
            .validate_check(&check(Some(10), Some("123")))
            .is_ok());
        assert!(EnhancedCheckValidator
            .validate_check(&check(Some(10), None))
            .is_err());
        assert!(EnhancedCheckValidator.validate_check(&check(None, None)).is_ok());
        assert!(EnhancedCheckValidator.validate_check(&check(Some(0), None)).is_ok());

        let mut bad_currency = check(Some(10), Some("123"));
        bad_currency.currency_code = Some("DOLLARS".to_string());
        assert!(EnhancedCheckValidator.validate_check(&bad_currency).is_err());
    }
}
