//! Conversion parameters and options

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Flat, string-keyed parameter bag consulted per sheet
///
/// Recognized keys:
/// - `"<sheet>.<column>"`: rename a content column
/// - `"<sheet>.headerRows"`: number of header rows (default 0)
/// - `"<sheet>.autoColumns"`: name content columns after their header text
///
/// Anything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionParameters {
    values: HashMap<String, String>,
}

/// On-disk layout of a parameters file
#[derive(Debug, Deserialize)]
struct ParametersFile {
    #[serde(default)]
    parameters: toml::Table,
}

impl ConversionParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load parameters from the `[parameters]` table of a TOML file
    ///
    /// Both `"Sheet1.headerRows" = 2` and a nested `[parameters.Sheet1]`
    /// table are accepted; nested keys are joined with `.`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ParametersFile = toml::from_str(content)?;
        let mut params = Self::new();
        flatten_table(&mut params, None, &file.parameters);
        Ok(params)
    }

    /// Build from `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        params.extend(pairs);
        params
    }

    pub fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.values
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renamed column for a sheet, if one is configured
    pub fn column_name(&self, sheet: &str, column: &str) -> Option<&str> {
        self.get(&format!("{}.{}", sheet, column))
    }

    /// Number of header rows for a sheet (default 0)
    pub fn header_rows(&self, sheet: &str) -> Result<i64> {
        let key = format!("{}.headerRows", sheet);
        match self.get(&key) {
            None => Ok(0),
            Some(value) => value.trim().parse().map_err(|_| Error::InvalidParameter {
                key,
                value: value.to_string(),
            }),
        }
    }

    /// Whether content columns are named after header text (default false)
    pub fn auto_columns(&self, sheet: &str) -> bool {
        self.get(&format!("{}.autoColumns", sheet))
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

fn flatten_table(params: &mut ConversionParameters, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            toml::Value::String(s) => params.insert(key, s.clone()),
            toml::Value::Integer(i) => params.insert(key, i.to_string()),
            toml::Value::Float(f) => params.insert(key, f.to_string()),
            toml::Value::Boolean(b) => params.insert(key, b.to_string()),
            toml::Value::Table(nested) => flatten_table(params, Some(&key), nested),
            other => log::warn!("Ignoring parameter '{}' of type {}", key, other.type_str()),
        }
    }
}

/// Parse a `KEY=VALUE` assignment
pub fn parse_assignment(assignment: &str) -> std::result::Result<(String, String), String> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", assignment)),
    }
}

/// Options for the spreadsheet -> JSON direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Emit integers, floats and booleans instead of strings where possible
    pub autodetect_types: bool,
    /// Indent the JSON output
    pub pretty_printing: bool,
}

/// Options for the JSON -> spreadsheet direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Use constant-memory worksheets, flushing each row once it is complete
    pub streaming: bool,
    /// 0: off, n > 0: autofit after the first n rows, n < 0: autofit at sheet end
    pub auto_size_columns: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_settings() {
        let params = ConversionParameters::from_pairs([
            ("Sheet1.headerRows", "2"),
            ("Sheet1.autoColumns", "TRUE"),
            ("Sheet1.C", "Quantity"),
            ("Other.autoColumns", "yes"),
        ]);

        assert_eq!(params.header_rows("Sheet1").unwrap(), 2);
        assert_eq!(params.header_rows("Other").unwrap(), 0);
        assert!(params.auto_columns("Sheet1"));
        assert!(!params.auto_columns("Other"));
        assert!(!params.auto_columns("Missing"));
        assert_eq!(params.column_name("Sheet1", "C"), Some("Quantity"));
        assert_eq!(params.column_name("Sheet1", "D"), None);
    }

    #[test]
    fn test_invalid_header_rows() {
        let params = ConversionParameters::from_pairs([("Sheet1.headerRows", "two")]);
        let err = params.header_rows("Sheet1").unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref key, .. } if key == "Sheet1.headerRows"));
    }

    #[test]
    fn test_toml_parameters() {
        let params = ConversionParameters::from_toml_str(
            r#"
            [parameters]
            "Sheet1.headerRows" = 1
            "Sheet1.A" = "Name"

            [parameters.Totals]
            autoColumns = true
            headerRows = "3"
            "#,
        )
        .unwrap();

        assert_eq!(params.len(), 4);
        assert_eq!(params.header_rows("Sheet1").unwrap(), 1);
        assert_eq!(params.column_name("Sheet1", "A"), Some("Name"));
        assert!(params.auto_columns("Totals"));
        assert_eq!(params.header_rows("Totals").unwrap(), 3);
    }

    #[test]
    fn test_empty_toml() {
        let params = ConversionParameters::from_toml_str("").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Sheet1.C=Quantity"),
            Ok(("Sheet1.C".to_string(), "Quantity".to_string()))
        );
        assert_eq!(
            parse_assignment("Sheet1.B=a=b"),
            Ok(("Sheet1.B".to_string(), "a=b".to_string()))
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
