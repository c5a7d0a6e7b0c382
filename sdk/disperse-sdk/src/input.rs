//! Recipient list parsing.
//!
//! One recipient per line: `<address> <amount>`, where the separator is any
//! run of spaces, commas or `=`. Amounts are decimal display units and are
//! scaled to base units exactly.

use disperse_interface::RecipientRecord;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::{DisperseError, Result};
use crate::utils;

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | ',' | '=')
}

/// Parse a recipient list. Blank lines are skipped.
pub fn parse_recipients(text: &str, decimals: u8) -> Result<Vec<RecipientRecord>> {
    let mut records = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let fields: Vec<&str> = raw
            .trim()
            .split(is_separator)
            .filter(|f| !f.is_empty())
            .collect();

        match fields.as_slice() {
            [] => continue,
            [address, amount] => {
                let recipient = Pubkey::from_str(address)
                    .map_err(|e| invalid(line, format!("bad address {:?}: {}", address, e)))?;
                let amount =
                    parse_amount(amount, decimals).map_err(|reason| invalid(line, reason))?;
                records.push(utils::record_for(&recipient, amount));
            },
            other => {
                return Err(invalid(
                    line,
                    format!("expected 2 fields, found {}", other.len()),
                ))
            },
        }
    }

    Ok(records)
}

/// `"1.5"` with 9 decimals is `1_500_000_000`.
pub fn parse_amount(text: &str, decimals: u8) -> std::result::Result<u64, String> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(format!("bad amount {:?}", text));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(format!("bad amount {:?}", text));
    }
    if fraction.len() > decimals as usize {
        return Err(format!(
            "amount {:?} has more than {} decimal places",
            text, decimals
        ));
    }

    let scale = 10u64
        .checked_pow(decimals as u32)
        .ok_or_else(|| format!("unsupported decimals {}", decimals))?;
    let overflow = || format!("amount {:?} overflows", text);

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    // Right-pad the fraction to `decimals` digits.
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(overflow)
}

fn invalid(line: usize, reason: String) -> DisperseError {
    DisperseError::InvalidInput { line, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1", 9).unwrap(), 1_000_000_000);
        assert_eq!(parse_amount("1.5", 9).unwrap(), 1_500_000_000);
        assert_eq!(parse_amount("0.000000001", 9).unwrap(), 1);
        assert_eq!(parse_amount(".25", 2).unwrap(), 25);
        assert_eq!(parse_amount("3.", 2).unwrap(), 300);
        assert_eq!(parse_amount("42", 0).unwrap(), 42);

        assert!(parse_amount("0.0000000001", 9).is_err());
        assert!(parse_amount("-1", 9).is_err());
        assert!(parse_amount("1e3", 9).is_err());
        assert!(parse_amount(".", 9).is_err());
        assert!(parse_amount("18446744073709551616", 0).is_err());
        assert!(parse_amount("18446744074", 9).is_err());
    }

    #[test]
    fn test_parse_recipients_separators() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();
        let text = format!("{} 1\n\n{},0.5\n  {} = 2.25  \n", a, b, c);

        let records = parse_recipients(&text, 9).unwrap();
        assert_eq!(
            records,
            vec![
                utils::record_for(&a, 1_000_000_000),
                utils::record_for(&b, 500_000_000),
                utils::record_for(&c, 2_250_000_000),
            ]
        );
    }

    #[test]
    fn test_parse_recipients_reports_line() {
        let a = Pubkey::new_unique();
        let text = format!("{} 1\n\nnot-a-key 2\n", a);

        match parse_recipients(&text, 9) {
            Err(DisperseError::InvalidInput { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other),
        }

        let text = format!("{} 1 2\n", a);
        assert!(matches!(
            parse_recipients(&text, 9),
            Err(DisperseError::InvalidInput { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_recipients("", 9).unwrap().is_empty());
        assert!(parse_recipients("\n  \n", 9).unwrap().is_empty());
    }
}
