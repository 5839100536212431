//! Data types shared by the parser, the inference engine and the server.
//!
//! These are the "host" model: classes, methods, parameters and constants
//! as extracted from PHP source, plus the identifiers, locations and
//! union types that flow through the engine.  All data is owned so that
//! nothing depends on the parser's arena lifetime.

use std::fmt;

use serde::Serialize;

use crate::names::ResolvedClassName;

/// Fully-qualified method identifier, e.g. `\App\ServiceLocator::instance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MethodId(String);

impl MethodId {
    pub fn new(class: &ResolvedClassName, method: &str) -> Self {
        Self(format!("{}::{}", class, method))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MethodId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Where something is in the analysed sources.
///
/// `file` is whatever key the file was registered under (a relative path
/// in the CLI, a `file://` URI in the language server).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file: String,
    /// 1-based line of `start`.
    pub line: u32,
    /// Byte offset where the node starts.
    pub start: u32,
    /// Byte offset where the node ends.
    pub end: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, start: u32, end: u32) -> Self {
        Self {
            file: file.into(),
            line,
            start,
            end,
        }
    }

    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset <= self.end
    }
}

/// A (possibly single-member) union of type names, e.g. `\Foo|null`.
///
/// Members are kept as written; the engine only ever produces single-class
/// unions, everything else comes from declarations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct UnionType {
    types: Vec<String>,
}

impl UnionType {
    /// Parse a `|`-separated type string.  Empty input yields `mixed`.
    pub fn parse(raw: &str) -> Self {
        let types: Vec<String> = raw
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if types.is_empty() {
            Self::mixed()
        } else {
            Self { types }
        }
    }

    pub fn mixed() -> Self {
        Self {
            types: vec!["mixed".to_string()],
        }
    }

    pub fn from_class(class: &ResolvedClassName) -> Self {
        Self {
            types: vec![class.to_string()],
        }
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_mixed(&self) -> bool {
        self.types.len() == 1 && self.types[0].eq_ignore_ascii_case("mixed")
    }
}

impl fmt::Display for UnionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.types.join("|"))
    }
}

impl From<UnionType> for String {
    fn from(value: UnionType) -> Self {
        value.to_string()
    }
}

/// Stores extracted parameter information from a parsed PHP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// The parameter name including the `$` prefix (e.g. "$type").
    pub name: String,
    /// Whether this parameter is required (no default value and not variadic).
    pub is_required: bool,
    /// Optional type hint string (e.g. "string", "?Foo").
    pub type_hint: Option<String>,
    /// Whether this parameter is variadic (has `...`).
    pub is_variadic: bool,
}

impl ParameterInfo {
    /// The name without its `$` sigil, as written in `@returnTypeArg`.
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix('$').unwrap_or(&self.name)
    }
}

/// A method declaration known to the host.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub id: MethodId,
    /// The method name as declared (e.g. "instance").
    pub name: String,
    /// Declared parameters, in declaration order.
    pub parameters: Vec<ParameterInfo>,
    /// Raw `/** ... */` text preceding the declaration, if any.
    pub docblock: Option<String>,
    /// Declared return type: `@return` if present, else the native hint,
    /// else `mixed`.
    pub return_type: UnionType,
    pub is_static: bool,
    pub location: Location,
}

/// The statically known value of a class constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantValue {
    String(String),
    Integer(String),
    Float(String),
    Boolean(bool),
    Null,
    /// Anything that is not a plain literal; carries the expression kind.
    Expression(&'static str),
}

impl ConstantValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantValue::String(_) => "string",
            ConstantValue::Integer(_) => "int",
            ConstantValue::Float(_) => "float",
            ConstantValue::Boolean(_) => "bool",
            ConstantValue::Null => "null",
            ConstantValue::Expression(kind) => kind,
        }
    }
}

/// Stores extracted class constant (or enum case) information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantInfo {
    /// The constant name (e.g. "TYPE").  Case-sensitive.
    pub name: String,
    pub value: ConstantValue,
}

/// The kind of class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLikeKind {
    Class,
    Interface,
    Trait,
    Enum,
}

/// Stores extracted class information from a parsed PHP file.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub kind: ClassLikeKind,
    /// The short name of the class (e.g. "ServiceLocator").
    pub name: String,
    /// Namespace-qualified name.
    pub fqn: ResolvedClassName,
    /// The resolved `extends` target of a class.
    pub parent_class: Option<ResolvedClassName>,
    /// Implemented interfaces, or the parents of an interface.
    pub interfaces: Vec<ResolvedClassName>,
    /// The methods defined directly in this class.
    pub methods: Vec<MethodInfo>,
    /// The constants (and enum cases) defined directly in this class.
    pub constants: Vec<ConstantInfo>,
    /// Byte offset where the class body starts (left brace).
    pub start_offset: u32,
    /// Byte offset where the class body ends (right brace).
    pub end_offset: u32,
}

impl ClassInfo {
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantInfo> {
        self.constants.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_type_parsing() {
        let ty = UnionType::parse(" \\Foo | null ");
        assert_eq!(ty.types(), ["\\Foo".to_string(), "null".to_string()]);
        assert_eq!(ty.to_string(), "\\Foo|null");
        assert!(UnionType::parse("").is_mixed());
        assert!(UnionType::parse("MIXED").is_mixed());
    }

    #[test]
    fn method_ids_are_fully_qualified() {
        let class = ResolvedClassName::new("App\\ServiceLocator");
        assert_eq!(
            MethodId::new(&class, "instance").as_str(),
            "\\App\\ServiceLocator::instance"
        );
    }

    #[test]
    fn bare_parameter_names() {
        let param = ParameterInfo {
            name: "$type".to_string(),
            is_required: true,
            type_hint: None,
            is_variadic: false,
        };
        assert_eq!(param.bare_name(), "type");
    }
}
