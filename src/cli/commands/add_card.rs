//! `keeper add-card` — store a bank card in the local cache.

use crate::cli::output;
use crate::cli::{prompt_hidden, store_secret, Cli};
use crate::errors::{KeeperError, Result};
use crate::secrets::BankCard;

/// Execute the `add-card` command.
pub fn execute(
    cli: &Cli,
    name: &str,
    number: &str,
    holder: &str,
    expiry: &str,
    cvv: Option<&str>,
    meta: Option<&str>,
) -> Result<()> {
    let cvv = match cvv {
        Some(v) => {
            output::warning("CVV provided on command line — it may appear in shell history.");
            v.to_string()
        }
        None => prompt_hidden("CVV")?.to_string(),
    };

    let card = BankCard {
        number: normalize_number(number)?,
        card_holder: holder.trim().to_string(),
        expiry: validate_expiry(expiry)?,
        cvv: validate_cvv(&cvv)?,
    };

    store_secret(cli, name, card, meta)
}

/// Strip spaces and dashes; require 12 to 19 digits.
fn normalize_number(number: &str) -> Result<String> {
    let digits: String = number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if (12..=19).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) {
        Ok(digits)
    } else {
        Err(KeeperError::CommandFailed(
            "card number must be 12 to 19 digits".into(),
        ))
    }
}

/// Accept `MM/YY` or `MM/YYYY`.
fn validate_expiry(expiry: &str) -> Result<String> {
    let expiry = expiry.trim();
    let valid = match expiry.split_once('/') {
        Some((month, year)) => {
            let month_ok = month.len() == 2
                && month
                    .parse::<u8>()
                    .is_ok_and(|m| (1..=12).contains(&m));
            let year_ok =
                matches!(year.len(), 2 | 4) && year.bytes().all(|b| b.is_ascii_digit());
            month_ok && year_ok
        }
        None => false,
    };
    if valid {
        Ok(expiry.to_string())
    } else {
        Err(KeeperError::CommandFailed(format!(
            "expiry '{expiry}' must look like MM/YY"
        )))
    }
}

fn validate_cvv(cvv: &str) -> Result<String> {
    let cvv = cvv.trim();
    if matches!(cvv.len(), 3 | 4) && cvv.bytes().all(|b| b.is_ascii_digit()) {
        Ok(cvv.to_string())
    } else {
        Err(KeeperError::CommandFailed("CVV must be 3 or 4 digits".into()))
    }
}
