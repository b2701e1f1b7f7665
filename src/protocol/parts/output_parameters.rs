use crate::{
    conn::AmConnCore,
    protocol::{
        parts::{
            hdb_value::HdbValue,
            parameter_descriptor::{ParameterDescriptor, ParameterDescriptors},
        },
        util, FieldTypeContext,
    },
    HdbResult,
};

/// A set of output parameters, as they can be returned by procedure calls.
///
/// Contains metadata (the descriptors) and the values.
#[derive(Debug)]
pub struct OutputParameters {
    descriptors: Vec<ParameterDescriptor>,
    values: Vec<HdbValue<'static>>,
}

impl OutputParameters {
    /// Returns the descriptors.
    pub fn descriptors(&self) -> &Vec<ParameterDescriptor> {
        &(self.descriptors)
    }

    /// Converts into an iterator of the contained values.
    pub fn into_values(self) -> Vec<HdbValue<'static>> {
        self.values
    }

    /// Converts into a vec of the parameter descriptors and a vec of the
    /// contained values.
    pub fn into_descriptors_and_values(self) -> (Vec<ParameterDescriptor>, Vec<HdbValue<'static>>) {
        (self.descriptors, self.values)
    }

    /// Exposes the parameter descriptors and the contained values.
    pub fn as_descriptors_and_values(
        &self,
    ) -> (&Vec<ParameterDescriptor>, &Vec<HdbValue<'static>>) {
        (&self.descriptors, &self.values)
    }

    /// Returns the value of the output parameter with the given name.
    pub fn value_of(&self, name: &str) -> Option<&HdbValue<'static>> {
        self.descriptors
            .iter()
            .position(|d| d.name() == Some(name))
            .map(|i| &self.values[i])
    }

    pub(crate) fn parse(
        o_am_conn_core: Option<&AmConnCore>,
        parameter_descriptors: &ParameterDescriptors,
        ctx: FieldTypeContext,
        rdr: &mut dyn std::io::Read,
    ) -> HdbResult<Self> {
        trace!("OutputParameters::parse()");
        let am_conn_core = o_am_conn_core
            .ok_or_else(|| util::io_error("cannot parse output parameters without connection"))?;

        let mut descriptors = Vec::<ParameterDescriptor>::new();
        let mut values = Vec::<HdbValue<'static>>::new();

        for descriptor in parameter_descriptors.iter_out() {
            trace!("parsing value with descriptor {descriptor}");
            let value = HdbValue::parse(
                descriptor.type_id(),
                descriptor.scale(),
                descriptor.is_nullable(),
                ctx,
                am_conn_core,
                &None,
                rdr,
            )?;
            trace!("found value {value:?}");
            descriptors.push(descriptor.clone());
            values.push(value);
        }
        Ok(Self {
            descriptors,
            values,
        })
    }
}

impl std::fmt::Display for OutputParameters {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        // write a header
        writeln!(fmt)?;
        for parameter_descriptor in &self.descriptors {
            write!(fmt, "{}, ", parameter_descriptor.name().unwrap_or(""))?;
        }
        writeln!(fmt)?;

        // write the data
        for value in &self.values {
            write!(fmt, "{value}, ")?;
        }
        writeln!(fmt)?;
        Ok(())
    }
}
