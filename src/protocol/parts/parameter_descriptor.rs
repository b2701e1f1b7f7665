use crate::{
    impl_err,
    protocol::{util, util_sync},
    usage_err, HdbResult, HdbValue, TypeId,
};
use byteorder::{LittleEndian, ReadBytesExt};

/// Describes a set of IN, INOUT, and OUT parameters. Can be empty.
#[derive(Debug, Default)]
pub struct ParameterDescriptors(Vec<ParameterDescriptor>);
impl ParameterDescriptors {
    /// Produces an iterator that returns the IN and INOUT parameters.
    pub fn iter_in(&self) -> impl std::iter::Iterator<Item = &ParameterDescriptor> {
        self.0.iter().filter(|ms| {
            (ms.direction == ParameterDirection::IN) | (ms.direction == ParameterDirection::INOUT)
        })
    }
    /// Produces an iterator that returns the INOUT and OUT parameters.
    pub fn iter_out(&self) -> impl std::iter::Iterator<Item = &ParameterDescriptor> {
        self.0.iter().filter(|ms| {
            (ms.direction == ParameterDirection::OUT) | (ms.direction == ParameterDirection::INOUT)
        })
    }

    /// Returns true if at least one IN or INOUT parameter is contained.
    pub fn has_in(&self) -> bool {
        self.iter_in().next().is_some()
    }

    /// Returns true if at least one OUT or INOUT parameter is contained.
    pub fn has_out(&self) -> bool {
        self.iter_out().next().is_some()
    }

    /// Number of IN and INOUT parameters.
    pub fn count_in(&self) -> usize {
        self.iter_in().count()
    }

    /// Returns the number of contained descriptors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true exactly if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // Brings named arguments into the declared order of the IN parameters.
    //
    // Every IN parameter must be matched by name; an unknown name is a usage
    // error that carries the closest declared name as a suggestion.
    pub(crate) fn sort_in_by_name<'a>(
        &self,
        named_values: Vec<(String, HdbValue<'a>)>,
    ) -> HdbResult<Vec<HdbValue<'a>>> {
        let declared: Vec<&str> = self
            .iter_in()
            .map(|d| d.name().unwrap_or_default())
            .collect();
        if named_values.len() != declared.len() {
            return Err(usage_err!(
                "wrong number of parameter values: got {}, statement has {} input parameter(s)",
                named_values.len(),
                declared.len()
            ));
        }
        for (name, _) in &named_values {
            if !declared.contains(&name.as_str()) {
                return Err(match closest_name(name, &declared) {
                    Some(suggestion) => usage_err!(
                        "unknown parameter name \"{name}\"; did you mean \"{suggestion}\"?"
                    ),
                    None => usage_err!("unknown parameter name \"{name}\""),
                });
            }
        }

        let mut named_values: Vec<(String, Option<HdbValue<'a>>)> = named_values
            .into_iter()
            .map(|(name, value)| (name, Some(value)))
            .collect();
        let mut sorted = Vec::<HdbValue<'a>>::with_capacity(declared.len());
        for declared_name in declared {
            let value = named_values
                .iter_mut()
                .find(|(name, value)| name == declared_name && value.is_some())
                .and_then(|(_, value)| value.take())
                .ok_or_else(|| usage_err!("no value provided for parameter \"{declared_name}\""))?;
            sorted.push(value);
        }
        Ok(sorted)
    }

    pub(crate) fn parse(count: usize, rdr: &mut dyn std::io::Read) -> HdbResult<Self> {
        let mut vec_pd = Vec::<ParameterDescriptor>::new();
        let mut name_offsets = Vec::<u32>::new();
        for _ in 0..count {
            // 16 bytes each
            let option = rdr.read_u8()?;
            let value_type = rdr.read_u8()?;
            let mode = ParameterDescriptor::direction_from_u8(rdr.read_u8()?)?;
            rdr.read_u8()?;
            name_offsets.push(rdr.read_u32::<LittleEndian>()?);
            let length = rdr.read_i16::<LittleEndian>()?;
            let fraction = rdr.read_i16::<LittleEndian>()?;
            rdr.read_u32::<LittleEndian>()?;
            vec_pd.push(ParameterDescriptor::try_new(
                option, value_type, mode, length, fraction,
            )?);
        }
        // read the parameter names
        for (descriptor, name_offset) in vec_pd.iter_mut().zip(name_offsets.iter()) {
            if name_offset != &u32::MAX {
                let length = rdr.read_u8()?;
                let name = util::string_from_cesu8(util_sync::parse_bytes(length as usize, rdr)?)?;
                descriptor.set_name(name);
            }
        }
        Ok(Self(vec_pd))
    }
}

impl std::ops::Index<usize> for ParameterDescriptors {
    type Output = ParameterDescriptor;
    fn index(&self, index: usize) -> &Self::Output {
        self.0.index(index)
    }
}

// Finds the declared name with the smallest edit distance, to help out with
// typos and wrong casing in named arguments.
fn closest_name<'a>(wanted: &str, declared: &[&'a str]) -> Option<&'a str> {
    declared
        .iter()
        .filter(|d| !d.is_empty())
        .map(|d| (levenshtein(wanted, d), *d))
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut distances: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut previous_diagonal = distances[0];
        distances[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = if ca == cb {
                previous_diagonal
            } else {
                previous_diagonal + 1
            };
            previous_diagonal = distances[j + 1];
            distances[j + 1] = substitution
                .min(distances[j + 1] + 1) // deletion
                .min(distances[j] + 1); // insertion
        }
    }
    distances[b.len()]
}

/// Metadata for a parameter.
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    name: Option<String>,
    type_id: TypeId,
    binding: ParameterBinding,
    scale: i16,
    precision: i16,
    direction: ParameterDirection,
    auto_incremented: bool,
    array_type: bool,
}
impl ParameterDescriptor {
    fn try_new(
        parameter_option: u8,
        type_code: u8,
        direction: ParameterDirection,
        precision: i16,
        scale: i16,
    ) -> HdbResult<Self> {
        let type_id = TypeId::try_new(type_code)?;
        let (binding, auto_incremented, array_type) = evaluate_option(parameter_option);
        Ok(Self {
            binding,
            type_id,
            direction,
            precision,
            scale,
            name: None,
            auto_incremented,
            array_type,
        })
    }

    /// Describes whether a parameter can be NULL or not, or if it has a default value.
    pub fn binding(&self) -> ParameterBinding {
        self.binding
    }

    /// Returns true if the column can contain NULL values.
    pub fn is_nullable(&self) -> bool {
        matches!(self.binding, ParameterBinding::Optional)
    }

    /// Returns true if the column has a default value.
    pub fn has_default(&self) -> bool {
        matches!(self.binding, ParameterBinding::HasDefault)
    }

    /// Returns true if the column is auto-incremented.
    pub fn is_auto_incremented(&self) -> bool {
        self.auto_incremented
    }

    /// Returns true if the parameter is of array type.
    pub fn is_array_type(&self) -> bool {
        self.array_type
    }

    /// Returns the type id of the parameter.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Scale.
    pub fn scale(&self) -> i16 {
        self.scale
    }
    /// Precision.
    pub fn precision(&self) -> i16 {
        self.precision
    }
    /// Describes whether a parameter is used for input, output, or both.
    pub fn direction(&self) -> ParameterDirection {
        self.direction.clone()
    }

    /// Returns the name of the parameter.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn direction_from_u8(v: u8) -> HdbResult<ParameterDirection> {
        // it's done with three bits where always exactly one is 1 and the
        // others are 0, so no bit fiddling is needed
        match v {
            1 => Ok(ParameterDirection::IN),
            2 => Ok(ParameterDirection::INOUT),
            4 => Ok(ParameterDirection::OUT),
            _ => Err(impl_err!("invalid value for ParameterDirection: {v}")),
        }
    }
}

fn evaluate_option(parameter_option: u8) -> (ParameterBinding, bool, bool) {
    (
        // documented are only: bit 0: mandatory; 1: optional, 2: has_default
        if parameter_option & 0b_0000_0001_u8 > 0 {
            ParameterBinding::Mandatory
        } else if parameter_option & 0b_0000_0010_u8 > 0 {
            ParameterBinding::Optional
        } else {
            if parameter_option & 0b_0000_0100_u8 == 0 {
                warn!("ParameterDescriptor got invalid parameter_option, assuming HasDefault");
            }
            ParameterBinding::HasDefault
        },
        (parameter_option & 0b_0010_0000_u8) != 0,
        (parameter_option & 0b_0100_0000_u8) != 0,
    )
}

impl std::fmt::Display for ParameterDescriptor {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(ref s) = self.name {
            write!(fmt, "{s} ")?;
        }
        write!(
            fmt,
            "{:?} {:?} {:?},  Scale({}), Precision({})",
            self.type_id,
            self.binding(),
            self.direction(),
            self.precision(),
            self.scale()
        )?;
        Ok(())
    }
}

/// Describes whether a parameter is nullable or if it has a default value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParameterBinding {
    /// Parameter is nullable (can be set to NULL).
    Optional,
    /// Parameter is not nullable (must not be set to NULL).
    Mandatory,
    /// Parameter has a defined DEFAULT value.
    HasDefault,
}

/// Describes whether a parameter is used for input, output, or both.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParameterDirection {
    /// input parameter
    IN,
    /// input and output parameter
    INOUT,
    /// output parameter
    OUT,
}

#[cfg(test)]
mod test {
    use super::levenshtein;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "A"), 1);
        assert_eq!(levenshtein("a", "A"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("IVALUE", "IVALUE"), 0);
        assert_eq!(levenshtein("IVALU", "IVALUE"), 1);
    }

    #[test]
    fn test_closest_name() {
        assert_eq!(super::closest_name("a", &["A", "B"]), Some("A"));
        assert_eq!(super::closest_name("OVALUE", &["A", "OVAL"]), Some("OVAL"));
        assert_eq!(super::closest_name("x", &[]), None);
    }
}
