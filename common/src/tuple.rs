//! Row and schema definitions.

use crate::value::{SType, SValue};

/// One materialized row: a value per output column.
pub type Row = Vec<SValue>;

/// One column of a batch.
pub type SVector = Vec<SValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: SType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: SType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn column_type(&self, index: usize) -> Option<SType> {
        self.columns.get(index).map(|col| col.column_type)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// A row of default values matching this schema.
    pub fn empty_row(&self) -> Row {
        self.columns
            .iter()
            .map(|col| SValue::new(col.column_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::new(vec![
            Column::new("id", SType::Int64),
            Column::new("created_at", SType::Timestamp64),
        ]);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column_index("created_at"), Some(1));
        assert_eq!(schema.column_index("missing"), None);
        assert_eq!(schema.column_type(0), Some(SType::Int64));
        assert_eq!(schema.column_type(2), None);
        assert_eq!(
            schema.empty_row(),
            vec![SValue::Int64(0), SValue::Timestamp64(0)]
        );
    }
}
