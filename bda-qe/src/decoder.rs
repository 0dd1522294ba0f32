// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Raw row to typed row decoding

use bda_common::{CoercionMode, ColumnDescriptor, RawRow, Result};

use crate::coerce::{coerce, ColumnType};
use crate::result::ResultRow;

/// Decodes the rows of one result set.
///
/// Column types are resolved once and shared by every row.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    columns: Vec<ColumnDescriptor>,
    types: Vec<ColumnType>,
    mode: CoercionMode,
}

impl RowDecoder {
    pub fn new(columns: Vec<ColumnDescriptor>, mode: CoercionMode) -> Self {
        let types = columns
            .iter()
            .map(|c| ColumnType::parse(&c.data_type))
            .collect();
        Self {
            columns,
            types,
            mode,
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Cells past the end of a short row decode as `Null`; extra cells are ignored
    pub fn decode(&self, row: &RawRow) -> Result<ResultRow> {
        let mut decoded = ResultRow::with_capacity(self.columns.len());
        for (idx, (column, column_type)) in self.columns.iter().zip(&self.types).enumerate() {
            let value = coerce(
                &column.name,
                &column.data_type,
                *column_type,
                row.cell(idx),
                self.mode,
            )?;
            decoded.insert(column.name.clone(), value);
        }
        Ok(decoded)
    }
}

/// Decode a single row without keeping a decoder around
pub fn decode_row(row: &RawRow, columns: &[ColumnDescriptor], mode: CoercionMode) -> Result<ResultRow> {
    RowDecoder::new(columns.to_vec(), mode).decode(row)
}
