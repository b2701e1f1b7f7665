use crate::{usage_err, HdbResult, ServerError};
use byteorder::{LittleEndian, ReadBytesExt};

/// Describes the success of a single command or of a single row of a bulk
/// execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Number of rows that were affected by the successful execution.
    RowsAffected(usize),
    /// Command was successful, but the number of affected rows cannot be
    /// determined (e.g. for DDL).
    SuccessNoInfo, // -2
    /// Execution failed with the given `ServerError`.
    Failure(Option<ServerError>), // -3
}
impl ExecutionResult {
    /// True if the execution failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
    /// True if the execution reported affected rows.
    pub fn is_rows_affected(&self) -> bool {
        matches!(self, Self::RowsAffected(_))
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Self::RowsAffected(count) => writeln!(fmt, "Number of affected rows: {count}, ")?,
            Self::SuccessNoInfo => writeln!(
                fmt,
                "Command successfully executed but number of affected rows cannot be determined"
            )?,
            Self::Failure(Some(ref server_error)) => writeln!(
                fmt,
                "Execution of statement or processing of row has failed with {server_error:?}",
            )?,
            Self::Failure(None) => writeln!(
                fmt,
                "Execution of statement or processing of row has failed"
            )?,
        }
        Ok(())
    }
}

/// The execution outcomes of a command, one entry per executed statement or
/// bulk row.
///
/// A bulk execution is *not* atomic: when some rows fail, the others are
/// still applied, and this type tells apart the failed row numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResults(Vec<ExecutionResult>);

impl ExecutionResults {
    pub(crate) fn parse(count: usize, rdr: &mut dyn std::io::Read) -> HdbResult<Self> {
        let mut vec = Vec::<ExecutionResult>::with_capacity(count);
        for _ in 0..count {
            match rdr.read_i32::<LittleEndian>()? {
                -2 => vec.push(ExecutionResult::SuccessNoInfo),
                -3 => vec.push(ExecutionResult::Failure(None)),
                #[allow(clippy::cast_sign_loss)]
                i => vec.push(ExecutionResult::RowsAffected(i as usize)),
            }
        }
        Ok(Self(vec))
    }

    pub(crate) fn append(&mut self, mut other: Self) {
        self.0.append(&mut other.0);
    }

    pub(crate) fn mix_in_server_errors<I: Iterator<Item = ServerError>>(&mut self, mut errs: I) {
        for er in &mut self.0 {
            if let ExecutionResult::Failure(_) = *er {
                *er = ExecutionResult::Failure(errs.next());
            }
        }
        for e in errs {
            warn!("found more server errors than failed statements");
            self.0.push(ExecutionResult::Failure(Some(e)));
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if no entry is a failure.
    pub fn is_success(&self) -> bool {
        !self.0.iter().any(ExecutionResult::is_failure)
    }

    /// The number of failed statements.
    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|er| er.is_failure()).count()
    }

    /// Iterates over the failed statements as pairs of
    /// (statement number, server error).
    pub fn errors(&self) -> impl Iterator<Item = (usize, Option<&ServerError>)> {
        self.0.iter().enumerate().filter_map(|(i, er)| match er {
            ExecutionResult::Failure(o_se) => Some((i, o_se.as_ref())),
            _ => None,
        })
    }

    /// The total number of affected rows, summed over all successful entries.
    pub fn total_rows_affected(&self) -> usize {
        self.0
            .iter()
            .map(|er| match er {
                ExecutionResult::RowsAffected(n) => *n,
                _ => 0,
            })
            .sum()
    }

    /// Converts into a list of numbers of affected rows.
    ///
    /// Fails if any of the entries is a failure.
    pub fn into_affected_rows(self) -> HdbResult<Vec<usize>> {
        if self.is_success() {
            Ok(self
                .0
                .into_iter()
                .map(|er| match er {
                    ExecutionResult::RowsAffected(n) => n,
                    _ => 0,
                })
                .collect())
        } else {
            Err(usage_err!("at least one statement failed: {self}"))
        }
    }
}

impl std::ops::Index<usize> for ExecutionResults {
    type Output = ExecutionResult;
    fn index(&self, index: usize) -> &Self::Output {
        self.0.index(index)
    }
}

impl std::fmt::Display for ExecutionResults {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        for er in &self.0 {
            std::fmt::Display::fmt(er, fmt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{ExecutionResult, ExecutionResults};
    use byteorder::{LittleEndian, WriteBytesExt};

    fn parse(values: &[i32]) -> ExecutionResults {
        let mut buf = Vec::<u8>::new();
        for v in values {
            buf.write_i32::<LittleEndian>(*v).unwrap();
        }
        ExecutionResults::parse(values.len(), &mut std::io::Cursor::new(buf)).unwrap()
    }

    #[test]
    fn test_parse_and_accessors() {
        let execution_results = parse(&[1, 1, 1, -3, 1]);
        assert_eq!(execution_results.len(), 5);
        assert_eq!(execution_results.error_count(), 1);
        assert!(!execution_results.is_success());
        assert_eq!(execution_results.total_rows_affected(), 4);
        let failed: Vec<usize> = execution_results.errors().map(|(i, _)| i).collect();
        assert_eq!(failed, vec![3]);
        assert_eq!(execution_results[3], ExecutionResult::Failure(None));
    }

    #[test]
    fn test_success() {
        let execution_results = parse(&[1, -2, 7]);
        assert!(execution_results.is_success());
        assert_eq!(execution_results.total_rows_affected(), 8);
        assert_eq!(
            execution_results.into_affected_rows().unwrap(),
            vec![1, 0, 7]
        );
    }
}
