// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Conversion of textual cell values into typed values
//!
//! The query service returns every cell as text. The declared column type
//! decides the target type; date and timestamp columns stay text.

use bda_common::{BdaError, CoercionMode, Result};

use crate::result::Value;

/// Declared column types understood by the coercer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Varchar,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Double,
    Boolean,
    Date,
    Timestamp,
    /// Anything else is passed through as text
    Other,
}

impl ColumnType {
    pub fn parse(declared: &str) -> Self {
        match declared.trim().to_ascii_lowercase().as_str() {
            "varchar" => ColumnType::Varchar,
            "tinyint" => ColumnType::TinyInt,
            "smallint" => ColumnType::SmallInt,
            "integer" => ColumnType::Integer,
            "bigint" => ColumnType::BigInt,
            "double" => ColumnType::Double,
            "boolean" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "timestamp" => ColumnType::Timestamp,
            _ => ColumnType::Other,
        }
    }

    /// Value used in lenient mode when the text does not parse
    pub fn zero_value(&self) -> Value {
        match self {
            ColumnType::TinyInt => Value::TinyInt(0),
            ColumnType::SmallInt => Value::SmallInt(0),
            ColumnType::Integer => Value::Int(0),
            ColumnType::BigInt => Value::BigInt(0),
            ColumnType::Double => Value::Double(0.0),
            ColumnType::Boolean => Value::Boolean(false),
            ColumnType::Varchar | ColumnType::Date | ColumnType::Timestamp | ColumnType::Other => {
                Value::Text(String::new())
            }
        }
    }
}

/// Convert `text` per `column_type`; `None` when it does not parse
pub fn parse_value(column_type: ColumnType, text: &str) -> Option<Value> {
    let value = match column_type {
        ColumnType::TinyInt => Value::TinyInt(text.parse().ok()?),
        ColumnType::SmallInt => Value::SmallInt(text.parse().ok()?),
        ColumnType::Integer => Value::Int(text.parse().ok()?),
        ColumnType::BigInt => Value::BigInt(text.parse().ok()?),
        ColumnType::Double => Value::Double(text.parse().ok()?),
        ColumnType::Boolean => Value::Boolean(parse_bool(text)?),
        ColumnType::Varchar | ColumnType::Date | ColumnType::Timestamp | ColumnType::Other => {
            Value::Text(text.to_string())
        }
    };
    Some(value)
}

/// Coerce one cell; an absent cell is `Null` whatever the declared type
pub fn coerce(
    column: &str,
    declared_type: &str,
    column_type: ColumnType,
    text: Option<&str>,
    mode: CoercionMode,
) -> Result<Value> {
    let Some(text) = text else {
        return Ok(Value::Null);
    };

    match parse_value(column_type, text) {
        Some(value) => Ok(value),
        None => match mode {
            CoercionMode::Lenient => {
                log::warn!(
                    "Column {}: cannot read {:?} as {}, using zero value",
                    column,
                    text,
                    declared_type
                );
                Ok(column_type.zero_value())
            }
            CoercionMode::Strict => Err(BdaError::Conversion {
                column: column.to_string(),
                declared_type: declared_type.to_string(),
                value: text.to_string(),
            }),
        },
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(declared: &str, text: &str) -> Value {
        coerce("c", declared, ColumnType::parse(declared), Some(text), CoercionMode::Lenient).unwrap()
    }

    #[test]
    fn test_valid_literals() {
        assert_eq!(lenient("varchar", "hello"), Value::Text("hello".to_string()));
        assert_eq!(lenient("tinyint", "-128"), Value::TinyInt(-128));
        assert_eq!(lenient("smallint", "32767"), Value::SmallInt(32767));
        assert_eq!(lenient("integer", "42"), Value::Int(42));
        assert_eq!(lenient("bigint", "9007199254740993"), Value::BigInt(9_007_199_254_740_993));
        assert_eq!(lenient("double", "3.25"), Value::Double(3.25));
        assert_eq!(lenient("boolean", "true"), Value::Boolean(true));
        assert_eq!(lenient("boolean", "false"), Value::Boolean(false));
        assert_eq!(lenient("date", "2024-01-31"), Value::Text("2024-01-31".to_string()));
        assert_eq!(
            lenient("timestamp", "2024-01-31 10:00:00.000"),
            Value::Text("2024-01-31 10:00:00.000".to_string())
        );
        assert_eq!(lenient("array<int>", "[1, 2]"), Value::Text("[1, 2]".to_string()));
    }

    #[test]
    fn test_declared_type_is_case_insensitive() {
        assert_eq!(ColumnType::parse("BIGINT"), ColumnType::BigInt);
        assert_eq!(ColumnType::parse(" Integer "), ColumnType::Integer);
        assert_eq!(ColumnType::parse("decimal(10,2)"), ColumnType::Other);
    }

    #[test]
    fn test_boolean_spellings() {
        for text in ["1", "t", "T", "TRUE", "True"] {
            assert_eq!(lenient("boolean", text), Value::Boolean(true), "{}", text);
        }
        for text in ["0", "f", "F", "FALSE", "False"] {
            assert_eq!(lenient("boolean", text), Value::Boolean(false), "{}", text);
        }
    }

    #[test]
    fn test_absent_cell_is_null_for_every_type() {
        for declared in [
            "varchar", "tinyint", "smallint", "integer", "bigint", "double", "boolean", "date",
            "timestamp", "json",
        ] {
            let value = coerce("c", declared, ColumnType::parse(declared), None, CoercionMode::Strict)
                .unwrap();
            assert_eq!(value, Value::Null, "{}", declared);
        }
    }

    #[test]
    fn test_lenient_falls_back_to_zero() {
        assert_eq!(lenient("integer", "abc"), Value::Int(0));
        assert_eq!(lenient("tinyint", "300"), Value::TinyInt(0));
        assert_eq!(lenient("double", ""), Value::Double(0.0));
        assert_eq!(lenient("boolean", "yes"), Value::Boolean(false));
    }

    #[test]
    fn test_strict_reports_conversion_error() {
        let err = coerce(
            "qty",
            "smallint",
            ColumnType::SmallInt,
            Some("70000"),
            CoercionMode::Strict,
        )
        .unwrap_err();

        match err {
            BdaError::Conversion {
                column,
                declared_type,
                value,
            } => {
                assert_eq!(column, "qty");
                assert_eq!(declared_type, "smallint");
                assert_eq!(value, "70000");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
