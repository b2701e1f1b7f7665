use crate::{
    base::{RsCore, OAM},
    conn::AmConnCore,
    protocol::{
        parts::{HdbValue, ResultSetMetadata},
        FieldTypeContext,
    },
    usage_err, HdbError, HdbResult,
};
use std::sync::Arc;

/// A single line of a result set, consisting of the contained `HdbValue`s and
/// a reference to the metadata.
///
/// Individual values can be accessed with `row[idx]`, or by iterating
/// (`for value in row {...}`) or popping (`next_value()`).
pub struct Row {
    metadata: Arc<ResultSetMetadata>,
    value_iter: <Vec<HdbValue<'static>> as IntoIterator>::IntoIter,
}

impl Row {
    pub(crate) fn new(metadata: Arc<ResultSetMetadata>, values: Vec<HdbValue<'static>>) -> Self {
        Self {
            metadata,
            value_iter: values.into_iter(),
        }
    }

    /// Removes and returns the next value.
    pub fn next_value(&mut self) -> Option<HdbValue<'static>> {
        self.value_iter.next()
    }

    /// Returns the length of the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.value_iter.len()
    }

    /// Returns true if the row contains no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value_iter.as_slice().is_empty()
    }

    /// Converts itself into the single contained value.
    ///
    /// # Errors
    ///
    /// `HdbError::Usage` if the row is empty or has more than one value.
    pub fn into_single_value(mut self) -> HdbResult<HdbValue<'static>> {
        if self.len() > 1 {
            Err(HdbError::Usage("Row has more than one field"))
        } else {
            self.next_value()
                .ok_or_else(|| usage_err!("Row is empty"))
        }
    }

    /// Returns the metadata.
    #[must_use]
    pub fn metadata(&self) -> &ResultSetMetadata {
        &(self.metadata)
    }

    #[allow(clippy::ref_option)]
    pub(crate) fn parse(
        md: Arc<ResultSetMetadata>,
        o_am_rscore: &OAM<RsCore>,
        am_conn_core: &AmConnCore,
        ctx: FieldTypeContext,
        rdr: &mut dyn std::io::Read,
    ) -> HdbResult<Self> {
        let mut values = Vec::<HdbValue>::with_capacity(md.len());
        for col_md in &**md {
            if col_md.is_array_type() {
                return Err(HdbError::Impl("array type values are not supported"));
            }
            let value = HdbValue::parse(
                col_md.type_id(),
                col_md.scale(),
                col_md.is_nullable(),
                ctx,
                am_conn_core,
                o_am_rscore,
                rdr,
            )?;
            values.push(value);
        }
        Ok(Self::new(md, values))
    }
}

/// Support indexing.
impl std::ops::Index<usize> for Row {
    type Output = HdbValue<'static>;
    fn index(&self, idx: usize) -> &HdbValue<'static> {
        &self.value_iter.as_slice()[idx]
    }
}

/// Row is an iterator with item `HdbValue`.
impl Iterator for Row {
    type Item = HdbValue<'static>;
    fn next(&mut self) -> Option<HdbValue<'static>> {
        self.next_value()
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        for v in self.value_iter.as_slice() {
            write!(fmt, "{v}, ")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (v, md) in self.value_iter.as_slice().iter().zip(self.metadata.iter()) {
            write!(fmt, "{v:?}:[{}], ", md.type_id())?;
        }
        Ok(())
    }
}
