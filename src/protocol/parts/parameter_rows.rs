use crate::protocol::parts::parameter_descriptor::ParameterDescriptors;
use crate::protocol::{util, FieldTypeContext};
use crate::{usage_err, HdbResult, HdbValue};

// Implementation of the PARAMETERS part.
//
// Contains rows of input parameters; the argument count of the part defines
// how many rows are included.
#[derive(Debug, Default)]
pub(crate) struct ParameterRows<'a>(Vec<ParameterRow<'a>>);
impl<'a> ParameterRows<'a> {
    pub fn new() -> ParameterRows<'a> {
        ParameterRows(Vec::<ParameterRow>::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn push_hdb_values(
        &mut self,
        hdb_parameters: Vec<HdbValue<'a>>,
        descriptors: &ParameterDescriptors,
    ) -> HdbResult<()> {
        self.0.push(ParameterRow::new(hdb_parameters, descriptors)?);
        Ok(())
    }

    pub(crate) fn push_row(&mut self, row: ParameterRow<'a>) {
        self.0.push(row);
    }

    pub(crate) fn emit(
        &self,
        descriptors: &ParameterDescriptors,
        ctx: FieldTypeContext,
        w: &mut dyn std::io::Write,
    ) -> std::io::Result<()> {
        for row in &self.0 {
            row.emit(descriptors, ctx, w)?;
        }
        Ok(())
    }

    pub(crate) fn size(&self, descriptors: &ParameterDescriptors) -> std::io::Result<usize> {
        let mut size = 0;
        for row in &self.0 {
            size += row.size(descriptors)?;
        }
        Ok(size)
    }

    // Splits the rows into batches for the bulk execution.
    //
    // Each batch holds at most `bulk_size` rows. The server accepts
    // streamed LOB data only for the last row of an EXECUTE, so every row
    // that carries a LOB stream becomes a batch of its own.
    pub(crate) fn into_batches(self, bulk_size: usize) -> Vec<RowBatch<'a>> {
        let bulk_size = bulk_size.max(1);
        let mut batches = Vec::<RowBatch<'a>>::new();
        let mut current = ParameterRows::new();
        for row in self.0 {
            if row.has_lob_stream() {
                if !current.is_empty() {
                    batches.push(RowBatch::Plain(std::mem::take(&mut current)));
                }
                batches.push(RowBatch::Streaming(row));
            } else {
                current.push_row(row);
                if current.count() == bulk_size {
                    batches.push(RowBatch::Plain(std::mem::take(&mut current)));
                }
            }
        }
        if !current.is_empty() {
            batches.push(RowBatch::Plain(current));
        }
        batches
    }
}

// One batch of a bulk execution: either complete rows that go out in a
// single roundtrip, or a single row whose LOB data follow via the
// write-lob protocol.
#[derive(Debug)]
pub(crate) enum RowBatch<'a> {
    Plain(ParameterRows<'a>),
    Streaming(ParameterRow<'a>),
}

// A single row of parameters.
#[derive(Debug, Default)]
pub(crate) struct ParameterRow<'a>(Vec<HdbValue<'a>>);

impl<'a> ParameterRow<'a> {
    // Constructor; fails if the provided values do not match the
    // in-descriptors in number or type.
    pub(crate) fn new(
        hdb_parameters: Vec<HdbValue<'a>>,
        descriptors: &ParameterDescriptors,
    ) -> HdbResult<ParameterRow<'a>> {
        let in_count = descriptors.iter_in().count();
        if hdb_parameters.len() != in_count {
            return Err(usage_err!(
                "wrong number of parameter values: got {}, statement has {in_count} input parameter(s)",
                hdb_parameters.len()
            ));
        }
        for (hdb_value, descriptor) in hdb_parameters.iter().zip(descriptors.iter_in()) {
            if !hdb_value.is_null() {
                descriptor
                    .type_id()
                    .matches_value_type(hdb_value.type_id_for_emit(descriptor.type_id())?)?;
            }
        }
        Ok(ParameterRow(hdb_parameters))
    }

    pub(crate) fn has_lob_stream(&self) -> bool {
        self.0.iter().any(HdbValue::is_lob_stream)
    }

    pub(crate) fn into_values(self) -> Vec<HdbValue<'a>> {
        self.0
    }

    fn size(&self, descriptors: &ParameterDescriptors) -> std::io::Result<usize> {
        let mut size = 0;
        let mut in_descriptors = descriptors.iter_in();
        for value in &(self.0) {
            if let Some(descriptor) = in_descriptors.next() {
                size += value
                    .size(descriptor.type_id())
                    .map_err(|e| util::io_error(e.to_string()))?;
            } else {
                return Err(util::io_error("ParameterRow::size(): not enough metadata"));
            }
        }
        Ok(size)
    }

    fn emit(
        &self,
        descriptors: &ParameterDescriptors,
        ctx: FieldTypeContext,
        w: &mut dyn std::io::Write,
    ) -> std::io::Result<()> {
        let mut data_pos = 0_i32;
        let mut in_descriptors = descriptors.iter_in();
        for value in &(self.0) {
            if let Some(descriptor) = in_descriptors.next() {
                value
                    .emit(&mut data_pos, descriptor, ctx, w)
                    .map_err(|e| util::io_error(e.to_string()))?;
            } else {
                return Err(util::io_error("ParameterRow::emit(): not enough metadata"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{ParameterRow, ParameterRows, RowBatch};
    use crate::HdbValue;

    fn plain_row(i: i32) -> ParameterRow<'static> {
        ParameterRow(vec![HdbValue::INT(i)])
    }
    fn streaming_row() -> ParameterRow<'static> {
        ParameterRow(vec![HdbValue::LOBSTREAM(Some(std::sync::Arc::new(
            std::sync::Mutex::new(std::io::Cursor::new(b"lob data".to_vec())),
        )))])
    }

    fn batch_shape(batches: &[RowBatch]) -> Vec<(bool, usize)> {
        batches
            .iter()
            .map(|b| match b {
                RowBatch::Plain(rows) => (false, rows.count()),
                RowBatch::Streaming(_) => (true, 1),
            })
            .collect()
    }

    #[test]
    fn test_plain_chunking() {
        let mut rows = ParameterRows::new();
        for i in 0..7 {
            rows.push_row(plain_row(i));
        }
        let batches = rows.into_batches(3);
        assert_eq!(batch_shape(&batches), vec![(false, 3), (false, 3), (false, 1)]);
    }

    #[test]
    fn test_exact_multiple() {
        let mut rows = ParameterRows::new();
        for i in 0..6 {
            rows.push_row(plain_row(i));
        }
        let batches = rows.into_batches(3);
        assert_eq!(batch_shape(&batches), vec![(false, 3), (false, 3)]);
    }

    #[test]
    fn test_lob_rows_are_isolated() {
        let mut rows = ParameterRows::new();
        rows.push_row(plain_row(1));
        rows.push_row(plain_row(2));
        rows.push_row(streaming_row());
        rows.push_row(plain_row(3));
        let batches = rows.into_batches(10);
        assert_eq!(
            batch_shape(&batches),
            vec![(false, 2), (true, 1), (false, 1)]
        );
    }

    #[test]
    fn test_terminal_lob_row() {
        let mut rows = ParameterRows::new();
        rows.push_row(plain_row(1));
        rows.push_row(streaming_row());
        let batches = rows.into_batches(1);
        assert_eq!(batch_shape(&batches), vec![(false, 1), (true, 1)]);
    }
}
