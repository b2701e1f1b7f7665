use crate::{ExecutionResults, HdbError, HdbResult, OutputParameters, ResultSet};

/// An enum that describes a single database return value.
#[derive(Debug)]
pub enum HdbReturnValue {
    /// A result set of a query.
    ResultSet(ResultSet),
    /// A list of execution outcomes (number of affected rows etc.).
    ExecutionResults(ExecutionResults),
    /// Output parameters of a procedure call.
    OutputParameters(OutputParameters),
    /// Indication that a db call was successful.
    Success,
}

impl HdbReturnValue {
    /// Turns this into a result set, or fails.
    pub fn into_result_set(self) -> HdbResult<ResultSet> {
        match self {
            Self::ResultSet(rs) => Ok(rs),
            _ => Err(HdbError::Usage("this return value is not a result set")),
        }
    }

    /// Turns this into a list of numbers of affected rows, or fails.
    pub fn into_affected_rows(self) -> HdbResult<Vec<usize>> {
        match self {
            Self::ExecutionResults(execution_results) => execution_results.into_affected_rows(),
            Self::Success => Ok(vec![0]),
            _ => Err(HdbError::Usage(
                "this return value is not a list of affected rows",
            )),
        }
    }

    /// Turns this into output parameters, or fails.
    pub fn into_output_parameters(self) -> HdbResult<OutputParameters> {
        match self {
            Self::OutputParameters(op) => Ok(op),
            _ => Err(HdbError::Usage(
                "this return value is not a set of output parameters",
            )),
        }
    }

    /// Verifies that this is a plain success.
    pub fn into_success(self) -> HdbResult<()> {
        match self {
            Self::Success => Ok(()),
            Self::ExecutionResults(execution_results) => {
                if execution_results.is_success() {
                    Ok(())
                } else {
                    Err(HdbError::ExecutionResults(execution_results))
                }
            }
            _ => Err(HdbError::Usage("this return value is not a plain success")),
        }
    }

    /// Returns true if this is a plain success or a list of execution
    /// outcomes without failures.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Success => true,
            Self::ExecutionResults(execution_results) => execution_results.is_success(),
            _ => false,
        }
    }
}

impl std::fmt::Display for HdbReturnValue {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Self::ResultSet(_) => writeln!(fmt, "ResultSet, "),
            Self::ExecutionResults(ref execution_results) => {
                writeln!(fmt, "ExecutionResults {execution_results}, ")
            }
            Self::OutputParameters(ref op) => writeln!(fmt, "OutputParameters {op}, "),
            Self::Success => writeln!(fmt, "Success, "),
        }
    }
}
