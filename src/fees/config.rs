//! Parsing helpers for fee-table configuration documents.

use crate::definitions::{Money, Rational};
use serde_json::Value;
use thiserror::Error;

/// Errors loading a fee-table configuration.
#[derive(Debug, Error)]
pub enum FeeConfigError {
    /// A required section, row or rate is absent.
    #[error("fee configuration missing entry: {path}")]
    MissingEntry {
        /// Dotted path of the missing entry.
        path: String,
    },

    /// An entry is present but not parseable.
    #[error("invalid fee configuration value at {path}: {message}")]
    InvalidValue {
        /// Dotted path of the bad entry.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The designated-securities list could not be loaded.
    #[error("designated securities list error: {0}")]
    DesignatedSecurities(String),
}

pub(crate) fn entry<'a>(value: &'a Value, key: &str, path: &str) -> Result<&'a Value, FeeConfigError> {
    value.get(key).ok_or_else(|| FeeConfigError::MissingEntry {
        path: join(path, key),
    })
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

pub(crate) fn parse_money_value(value: &Value, path: &str) -> Result<Money, FeeConfigError> {
    serde_json::from_value(value.clone()).map_err(|error| FeeConfigError::InvalidValue {
        path: path.to_string(),
        message: error.to_string(),
    })
}

pub(crate) fn parse_rational_value(value: &Value, path: &str) -> Result<Rational, FeeConfigError> {
    serde_json::from_value(value.clone()).map_err(|error| FeeConfigError::InvalidValue {
        path: path.to_string(),
        message: error.to_string(),
    })
}

/// Parses a scalar money value.
pub(crate) fn parse_money(config: &Value, key: &str) -> Result<Money, FeeConfigError> {
    parse_money_value(entry(config, key, "")?, key)
}

/// Parses a scalar `[numerator, denominator]` rate.
pub(crate) fn parse_rational(config: &Value, key: &str) -> Result<Rational, FeeConfigError> {
    parse_rational_value(entry(config, key, "")?, key)
}

/// Parses a keyed 2-D grid of per-share fees: `rows` name the outer keys,
/// `columns` the inner. Every cell must be present.
pub(crate) fn parse_money_grid<const R: usize, const C: usize>(
    config: &Value,
    key: &str,
    rows: [&str; R],
    columns: [&str; C],
) -> Result<[[Money; C]; R], FeeConfigError> {
    let grid = entry(config, key, "")?;
    let mut table = [[Money::ZERO; C]; R];
    for (row_index, row) in rows.iter().enumerate() {
        let row_value = entry(grid, row, key)?;
        let row_path = join(key, row);
        for (column_index, column) in columns.iter().enumerate() {
            let cell = entry(row_value, column, &row_path)?;
            table[row_index][column_index] = parse_money_value(cell, &join(&row_path, column))?;
        }
    }
    Ok(table)
}

/// Parses a keyed row of rational rates.
pub(crate) fn parse_rational_row<const C: usize>(
    config: &Value,
    key: &str,
    columns: [&str; C],
) -> Result<[Rational; C], FeeConfigError> {
    let row_value = entry(config, key, "")?;
    let mut row = [Rational::ZERO; C];
    for (column_index, column) in columns.iter().enumerate() {
        let cell = entry(row_value, column, key)?;
        row[column_index] = parse_rational_value(cell, &join(key, column))?;
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_money_grid() {
        let config = json!({
            "fee_table": {
                "default": {"active": "0.0027", "passive": "-0.0012"},
                "on_open": {"active": "0.0010", "passive": "0"}
            }
        });
        let grid = parse_money_grid(
            &config,
            "fee_table",
            ["default", "on_open"],
            ["active", "passive"],
        )
        .expect("parses");
        assert_eq!(grid[0][0], Money::new(dec!(0.0027)));
        assert_eq!(grid[0][1], Money::new(dec!(-0.0012)));
        assert_eq!(grid[1][0], Money::new(dec!(0.0010)));
        assert_eq!(grid[1][1], Money::ZERO);
    }

    #[test]
    fn test_missing_grid_is_rejected() {
        let config = json!({});
        let result = parse_money_grid(&config, "fee_table", ["default"], ["active"]);
        assert!(matches!(
            result,
            Err(FeeConfigError::MissingEntry { path }) if path == "fee_table"
        ));
    }

    #[test]
    fn test_missing_cell_is_rejected() {
        let config = json!({
            "fee_table": {"default": {"active": "0.0027"}}
        });
        let result = parse_money_grid(&config, "fee_table", ["default"], ["active", "passive"]);
        assert!(matches!(
            result,
            Err(FeeConfigError::MissingEntry { path }) if path == "fee_table.default.passive"
        ));
    }

    #[test]
    fn test_parse_rational_row() {
        let config = json!({
            "sub_dollar_table": {"active": [3, 1000], "passive": [1, 1000]}
        });
        let row =
            parse_rational_row(&config, "sub_dollar_table", ["active", "passive"]).expect("parses");
        assert_eq!(row[0], Rational::new(3, 1000));
        assert_eq!(row[1], Rational::new(1, 1000));
    }

    #[test]
    fn test_bad_value_reports_path() {
        let config = json!({"platform": {"fee": true}});
        let result = parse_money(entry(&config, "platform", "").unwrap(), "fee");
        assert!(matches!(
            result,
            Err(FeeConfigError::InvalidValue { path, .. }) if path == "fee"
        ));
    }
}
