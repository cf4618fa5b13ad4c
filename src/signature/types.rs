//! Core declaration types
//!
//! This module defines the data structures a handler uses to declare its
//! parameters, and the normalized argument specifications derived from them.

use std::fmt;

/// A parsed or returned value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// The scalar type of this value, if it has one
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Int(_) => Some(ValueType::Int),
            Value::Float(_) => Some(ValueType::Float),
            Value::Str(_) => Some(ValueType::Str),
            Value::None | Value::List(_) => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, with integers widened
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// Scalar value types an argument can be coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Str,
    Int,
    Float,
    Bool,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Str => "str",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Declared type of a handler parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    /// A closed set of literal values
    Literal(Vec<Value>),
}

impl ParamType {
    /// Build a literal type from anything convertible to values
    pub fn literal<I, T>(members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        ParamType::Literal(members.into_iter().map(Into::into).collect())
    }
}

/// Explicit per-parameter metadata overriding what the analyzer infers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// Replaces the parameter's declared type
    pub ty: Option<ParamType>,

    /// Command-line switches, e.g. `["-v", "--verbose"]`
    pub flags: Vec<String>,

    pub help: Option<String>,

    pub metavar: Option<String>,

    pub choices: Option<Vec<Value>>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ty(mut self, ty: ParamType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn choices<I, T>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }
}

/// One declared handler parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<Value>,
    pub help: Option<String>,
    pub annotation: Option<Annotation>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Param {
            name: name.into(),
            ty,
            default: None,
            help: None,
            annotation: None,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }
}

/// Ordered parameter list of a handler, with an optional keyword-only marker
///
/// Parameters pushed before [`Signature::keyword_only`] are positional;
/// parameters pushed after it become options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Indices into `params` where a keyword-only marker was placed
    pub markers: Vec<usize>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Shorthand for a positional parameter without a default
    pub fn positional(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.param(Param::new(name, ty))
    }

    /// Place the keyword-only marker after the parameters declared so far
    pub fn keyword_only(mut self) -> Self {
        self.markers.push(self.params.len());
        self
    }

    /// Shorthand for a keyword-only parameter with a default
    pub fn keyword(self, name: impl Into<String>, ty: ParamType, default: impl Into<Value>) -> Self {
        let has_marker = !self.markers.is_empty();
        let signature = if has_marker { self } else { self.keyword_only() };
        signature.param(Param::new(name, ty).default(default))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// How an argument is consumed from the token list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Positional,
    Optional,
    /// Presence toggles the default boolean
    BoolFlag,
}

/// Normalized argument specification produced by the analyzer
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSpec {
    pub identifier: String,
    pub kind: ArgKind,
    pub value_type: ValueType,
    pub default: Option<Value>,
    pub required: bool,
    pub flags: Vec<String>,
    pub choices: Option<Vec<Value>>,
    pub help_text: Option<String>,
    pub metavar: Option<String>,
}

impl ArgumentSpec {
    /// Display name for the argument's value
    pub fn value_name(&self) -> String {
        self.metavar
            .clone()
            .unwrap_or_else(|| self.identifier.to_uppercase())
    }

    /// Value written to the namespace when the argument is absent
    pub fn absent_value(&self) -> Value {
        match (&self.default, self.kind) {
            (Some(default), _) => default.clone(),
            (None, ArgKind::BoolFlag) => Value::Bool(false),
            (None, _) => Value::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(7.0).to_string(), "7");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::from("v1.0").to_string(), "v1.0");
        assert_eq!(Value::None.to_string(), "");
        assert_eq!(Value::from(vec![1i64, 2, 3]).to_string(), "1 2 3");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::None.is_none());
        assert_eq!(Value::None.value_type(), None);
        assert_eq!(Value::Int(1).value_type(), Some(ValueType::Int));
    }

    #[test]
    fn test_keyword_shorthand_places_single_marker() {
        let sig = Signature::new()
            .positional("x", ParamType::Float)
            .keyword("verbose", ParamType::Bool, false)
            .keyword("count", ParamType::Int, 1i64);
        assert_eq!(sig.markers, vec![1]);
        assert_eq!(sig.params.len(), 3);
    }

    #[test]
    fn test_absent_value() {
        let spec = ArgumentSpec {
            identifier: "verbose".to_string(),
            kind: ArgKind::BoolFlag,
            value_type: ValueType::Bool,
            default: None,
            required: false,
            flags: vec!["--verbose".to_string()],
            choices: None,
            help_text: None,
            metavar: None,
        };
        assert_eq!(spec.absent_value(), Value::Bool(false));
        assert_eq!(spec.value_name(), "VERBOSE");
    }
}
