use std::fmt;

use crate::descriptor::{FieldType, MethodType};

/// A method signature: name plus proto. Dispatch matches on this pair, never
/// on the holder, so it gets its own type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor(String, MethodType);

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, ty: MethodType) -> Self {
        Self(name.into(), ty)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn descriptor(&self) -> &MethodType {
        &self.1
    }

    /// A copy with `suffix` appended to the name, leaving the proto alone.
    pub fn with_name_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix), self.1.clone())
    }

    /// Undoes `with_name_suffix`. None when the name does not carry `suffix`.
    pub fn strip_name_suffix(&self, suffix: &str) -> Option<Self> {
        self.0
            .strip_suffix(suffix)
            .map(|name| Self(name.to_string(), self.1.clone()))
    }

    /// A copy with `parameter` inserted as parameter zero.
    pub fn prepend_parameter(&self, parameter: FieldType) -> Self {
        let mut parameters = Vec::with_capacity(self.1.parameters.len() + 1);
        parameters.push(parameter);
        parameters.extend(self.1.parameters.iter().cloned());

        Self(
            self.0.clone(),
            MethodType::new(parameters, self.1.return_type.clone()),
        )
    }

    /// Undoes `prepend_parameter`. None when parameter zero is not `parameter`.
    pub fn drop_leading_parameter(&self, parameter: &FieldType) -> Option<Self> {
        match self.1.parameters.split_first() {
            Some((first, rest)) if first == parameter => Some(Self(
                self.0.clone(),
                MethodType::new(rest.to_vec(), self.1.return_type.clone()),
            )),
            _ => None,
        }
    }
}

impl<T, U> TryFrom<(T, U)> for MethodDescriptor
where
    T: Into<String>,
    U: Into<String>,
{
    type Error = anyhow::Error;

    fn try_from(value: (T, U)) -> Result<Self, Self::Error> {
        Ok(Self(value.0.into(), MethodType::parse(value.1.into())?))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

/// A field signature: name plus field type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor(String, FieldType);

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self(name.into(), ty)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn descriptor(&self) -> &FieldType {
        &self.1
    }
}

impl<T, U> TryFrom<(T, U)> for FieldDescriptor
where
    T: Into<String>,
    U: Into<String>,
{
    type Error = anyhow::Error;

    fn try_from(value: (T, U)) -> Result<Self, Self::Error> {
        Ok(Self(value.0.into(), FieldType::parse(value.1.into())?))
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.1)
    }
}
