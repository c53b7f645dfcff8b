use std::{fmt, iter::Peekable, str::Chars};

use anyhow::{anyhow, Result};
use enum_as_inner::EnumAsInner;

/// <BaseType> ::= 'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'V'
#[derive(EnumAsInner, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Boolean, // Z
    Char,    // C
    Float,   // F
    Double,  // D
    Byte,    // B
    Short,   // S
    Int,     // I
    Long,    // J
    Void,    // V
}

impl BaseType {
    fn letter(&self) -> char {
        match self {
            BaseType::Boolean => 'Z',
            BaseType::Char => 'C',
            BaseType::Float => 'F',
            BaseType::Double => 'D',
            BaseType::Byte => 'B',
            BaseType::Short => 'S',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Void => 'V',
        }
    }

    /// Longs and doubles occupy two local variable slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, BaseType::Long | BaseType::Double)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A field descriptor. Class names are in internal (slash separated) form.
#[derive(EnumAsInner, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Base(BaseType),
    /// 'L' <ClassName> ';'
    Object(String),
    /// '[' <FieldType>
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn object(class_name: impl Into<String>) -> Self {
        FieldType::Object(class_name.into())
    }

    pub fn array(component: FieldType) -> Self {
        FieldType::Array(Box::new(component))
    }

    /// The internal class name, for class types only.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            FieldType::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_class(&self) -> bool {
        self.is_object()
    }

    pub fn slot_width(&self) -> u16 {
        match self {
            FieldType::Base(base) if base.is_wide() => 2,
            _ => 1,
        }
    }

    fn parse_from_iterator(chars: &mut Peekable<Chars>) -> Result<Self> {
        let first = chars.next().ok_or(anyhow!("no more chars"))?;

        Ok(match first {
            'B' => FieldType::Base(BaseType::Byte),
            'C' => FieldType::Base(BaseType::Char),
            'D' => FieldType::Base(BaseType::Double),
            'F' => FieldType::Base(BaseType::Float),
            'I' => FieldType::Base(BaseType::Int),
            'J' => FieldType::Base(BaseType::Long),
            'S' => FieldType::Base(BaseType::Short),
            'Z' => FieldType::Base(BaseType::Boolean),
            'V' => FieldType::Base(BaseType::Void),
            '[' => FieldType::Array(Box::new(FieldType::parse_from_iterator(chars)?)),
            'L' => FieldType::Object(chars.take_while(|c| *c != ';').collect::<String>()),
            _ => return Err(anyhow!("unknown type {first}")),
        })
    }

    pub fn parse(str: impl AsRef<str>) -> Result<Self> {
        let chars = str.as_ref().chars();
        FieldType::parse_from_iterator(&mut chars.peekable())
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => write!(f, "{}", base),
            FieldType::Object(name) => write!(f, "L{};", name),
            FieldType::Array(component) => write!(f, "[{}", component),
        }
    }
}

/// <MethodType> ::= '(' { <FieldType> } ')' <FieldType>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub parameters: Vec<FieldType>,
    pub return_type: FieldType,
}

impl MethodType {
    pub fn new(parameters: Vec<FieldType>, return_type: FieldType) -> Self {
        Self {
            parameters,
            return_type,
        }
    }

    pub fn parse(str: impl AsRef<str>) -> Result<Self> {
        let mut chars = str.as_ref().chars().peekable();
        if chars.next() != Some('(') {
            return Err(anyhow!("descriptor did not start with ("));
        }

        let mut parameters = Vec::new();

        while chars.peek() != Some(&')') {
            if chars.peek().is_none() {
                return Err(anyhow!("descriptor did not close its parameter list"));
            }

            parameters.push(FieldType::parse_from_iterator(&mut chars)?);
        }

        // Skip )
        chars.next();

        let return_type = FieldType::parse_from_iterator(&mut chars)?;

        Ok(MethodType {
            parameters,
            return_type,
        })
    }

    pub fn returns_void(&self) -> bool {
        self.return_type == FieldType::Base(BaseType::Void)
    }

    /// Local variable slots taken by the parameters alone.
    pub fn parameter_slots(&self) -> u16 {
        self.parameters.iter().map(|p| p.slot_width()).sum()
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for parameter in &self.parameters {
            write!(f, "{}", parameter)?;
        }
        write!(f, "){}", self.return_type)
    }
}
