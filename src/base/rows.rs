use crate::{base::Row, ResultSetMetadata};
use std::sync::Arc;

/// A fully materialized set of rows.
#[derive(Debug)]
pub struct Rows {
    metadata: Arc<ResultSetMetadata>,
    rows: Vec<Row>,
}

impl Rows {
    pub(crate) fn new(metadata: Arc<ResultSetMetadata>, rows: Vec<Row>) -> Self {
        Self { metadata, rows }
    }

    /// The number of contained rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows are contained.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the metadata.
    pub fn metadata(&self) -> &ResultSetMetadata {
        &self.metadata
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl std::fmt::Display for Rows {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(fmt, "{}", &self.metadata)?;
        for row in &self.rows {
            writeln!(fmt, "{}", &row)?;
        }
        Ok(())
    }
}
