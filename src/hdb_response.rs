use crate::{
    base::InternalReturnValue,
    protocol::ReplyType,
    result_set::ResultSet,
    usage_err, ExecutionResults, HdbError, HdbResult, HdbReturnValue, OutputParameters,
};

/// The return value of a database call.
///
/// Most calls return a single value; procedure calls can return an arbitrary
/// mixture of result sets, output parameters, and execution outcomes, in the
/// order in which the server delivered them.
#[derive(Debug)]
pub struct HdbResponse {
    return_values: Vec<HdbReturnValue>,
}

impl HdbResponse {
    pub(crate) fn try_new(
        internal_return_values: Vec<InternalReturnValue>,
        replytype: ReplyType,
    ) -> HdbResult<Self> {
        let mut return_values = Vec::<HdbReturnValue>::with_capacity(internal_return_values.len());
        for irv in internal_return_values {
            match irv {
                InternalReturnValue::RsState((rs_state, a_rsmd)) => {
                    return_values.push(HdbReturnValue::ResultSet(ResultSet::new(rs_state, a_rsmd)));
                }
                InternalReturnValue::ExecutionResults(execution_results) => {
                    // a successful DDL (or commit/rollback) carries no row
                    // count worth reporting
                    if matches!(
                        replytype,
                        ReplyType::Ddl | ReplyType::Commit | ReplyType::Rollback
                    ) && execution_results.is_success()
                    {
                        return_values.push(HdbReturnValue::Success);
                    } else {
                        return_values.push(HdbReturnValue::ExecutionResults(execution_results));
                    }
                }
                InternalReturnValue::OutputParameters(output_parameters) => {
                    return_values.push(HdbReturnValue::OutputParameters(output_parameters));
                }
                InternalReturnValue::ParameterMetadata(_) | InternalReturnValue::WriteLobReply(_) => {
                    // evaluated elsewhere
                }
            }
        }
        if return_values.is_empty() {
            return_values.push(HdbReturnValue::Success);
        }
        Ok(Self { return_values })
    }

    pub(crate) fn from_execution_results(execution_results: ExecutionResults) -> Self {
        Self {
            return_values: vec![HdbReturnValue::ExecutionResults(execution_results)],
        }
    }

    /// Returns the number of contained return values.
    pub fn count(&self) -> usize {
        self.return_values.len()
    }

    /// Removes and returns the next return value, in server order.
    pub fn pop(&mut self) -> Option<HdbReturnValue> {
        if self.return_values.is_empty() {
            None
        } else {
            Some(self.return_values.remove(0))
        }
    }

    /// Turns the response into a single result set, or fails.
    pub fn into_result_set(self) -> HdbResult<ResultSet> {
        self.into_single_return_value()?.into_result_set()
    }

    /// Turns the response into a list of numbers of affected rows, or fails.
    pub fn into_affected_rows(self) -> HdbResult<Vec<usize>> {
        self.into_single_return_value()?.into_affected_rows()
    }

    /// Turns the response into a set of output parameters, or fails.
    pub fn into_output_parameters(self) -> HdbResult<OutputParameters> {
        for rv in self.return_values {
            if let HdbReturnValue::OutputParameters(op) = rv {
                return Ok(op);
            }
        }
        Err(HdbError::Usage("no output parameters found in the response"))
    }

    /// Verifies that the response is a plain success.
    pub fn into_success(self) -> HdbResult<()> {
        self.into_single_return_value()?.into_success()
    }

    /// Returns the contained result sets, in server order.
    pub fn into_result_sets(self) -> Vec<ResultSet> {
        self.return_values
            .into_iter()
            .filter_map(|rv| match rv {
                HdbReturnValue::ResultSet(rs) => Some(rs),
                _ => None,
            })
            .collect()
    }

    // Concatenates all contained execution outcomes.
    pub(crate) fn into_execution_results(self) -> HdbResult<ExecutionResults> {
        let mut accumulated = ExecutionResults::default();
        for rv in self.return_values {
            match rv {
                HdbReturnValue::ExecutionResults(execution_results) => {
                    accumulated.append(execution_results);
                }
                HdbReturnValue::Success => {}
                rv => {
                    return Err(usage_err!(
                        "unexpected return value in a bulk response: {rv}"
                    ))
                }
            }
        }
        Ok(accumulated)
    }

    fn into_single_return_value(mut self) -> HdbResult<HdbReturnValue> {
        if self.return_values.len() == 1 {
            Ok(self.return_values.remove(0))
        } else {
            Err(usage_err!(
                "response contains {} return values, expected a single one",
                self.return_values.len()
            ))
        }
    }
}

impl IntoIterator for HdbResponse {
    type Item = HdbReturnValue;
    type IntoIter = std::vec::IntoIter<HdbReturnValue>;
    fn into_iter(self) -> Self::IntoIter {
        self.return_values.into_iter()
    }
}

impl std::fmt::Display for HdbResponse {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "HdbResponse [")?;
        for dbretval in &self.return_values {
            write!(fmt, "{dbretval}")?;
        }
        write!(fmt, "]")
    }
}
