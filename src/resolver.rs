//! Static evaluation of a call-site argument to a class name.
//!
//! Only two argument shapes are understood:
//!
//! - a string literal, `'\App\Mailer'`, taken verbatim;
//! - a class constant reference, `Services::MAILER`, whose declared value
//!   is itself a string literal.
//!
//! Everything else fails with [`InferenceFailure::UnsupportedExpressionShape`].
//! Constant values are followed one level only: a constant whose value is
//! another constant reference is reported as not string-typed.

use thiserror::Error;

use crate::names::{ResolutionContext, ResolvedClassName};
use crate::types::ConstantValue;

/// The designated argument of a call, lowered from the host AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentExpr {
    /// `'\App\Mailer'` / `"App\\Mailer"`, already unquoted.
    StringLiteral(String),
    /// `Services::MAILER`; `class` is the name token as written
    /// (`Services`, `\Lib\Services`, `self`, ...).
    ClassConstant { class: String, constant: String },
    /// Any other expression, tagged with its kind for diagnostics.
    Unsupported { kind: &'static str },
}

impl ArgumentExpr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgumentExpr::StringLiteral(_) => "string literal",
            ArgumentExpr::ClassConstant { .. } => "class constant",
            ArgumentExpr::Unsupported { kind } => kind,
        }
    }
}

/// One argument as passed at a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgument {
    /// The name of a PHP 8 named argument (without `$`), `None` when
    /// positional.
    pub name: Option<String>,
    pub value: ArgumentExpr,
}

impl CallArgument {
    pub fn positional(value: ArgumentExpr) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: &str, value: ArgumentExpr) -> Self {
        Self {
            name: Some(name.to_string()),
            value,
        }
    }
}

/// Why a call site's return type could not be inferred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceFailure {
    #[error("unsupported argument: {kind}, a string literal or class constant is expected")]
    UnsupportedExpressionShape { kind: String },
    #[error("class {class} does not exist")]
    ClassNotFound { class: String },
    #[error("constant {constant} does not exist")]
    ConstantNotFound { constant: String },
    #[error("value of {constant} is not a {expected}")]
    ConstantNotStringTyped {
        constant: String,
        expected: &'static str,
    },
}

/// The reason tag of an [`InferenceFailure`], without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    UnsupportedExpressionShape,
    ClassNotFound,
    ConstantNotFound,
    ConstantNotStringTyped,
}

impl InferenceFailure {
    pub fn reason(&self) -> FailureReason {
        match self {
            InferenceFailure::UnsupportedExpressionShape { .. } => {
                FailureReason::UnsupportedExpressionShape
            }
            InferenceFailure::ClassNotFound { .. } => FailureReason::ClassNotFound,
            InferenceFailure::ConstantNotFound { .. } => FailureReason::ConstantNotFound,
            InferenceFailure::ConstantNotStringTyped { .. } => {
                FailureReason::ConstantNotStringTyped
            }
        }
    }

    /// The structured message arguments, in template order.
    pub fn arguments(&self) -> Vec<String> {
        match self {
            InferenceFailure::UnsupportedExpressionShape { kind } => vec![kind.clone()],
            InferenceFailure::ClassNotFound { class } => vec![class.clone()],
            InferenceFailure::ConstantNotFound { constant } => vec![constant.clone()],
            InferenceFailure::ConstantNotStringTyped { constant, expected } => {
                vec![constant.clone(), expected.to_string()]
            }
        }
    }

    pub(crate) fn unsupported(kind: &str) -> Self {
        InferenceFailure::UnsupportedExpressionShape {
            kind: kind.to_string(),
        }
    }
}

/// Read access to the host's classes and class constants.
pub trait SymbolTable {
    /// Whether a class, interface, trait or enum with this name is known.
    fn has_class(&self, class: &ResolvedClassName) -> bool;

    /// The statically known value of `class::name`, including constants
    /// inherited from parents.  `None` when the constant does not exist.
    fn class_constant(&self, class: &ResolvedClassName, name: &str) -> Option<&ConstantValue>;
}

/// Evaluate `expr` to a fully-qualified class name.
///
/// For string literals no existence check happens here; the engine checks
/// the final name uniformly.
pub fn resolve_argument_to_class_name<S: SymbolTable + ?Sized>(
    expr: &ArgumentExpr,
    context: &ResolutionContext,
    symbols: &S,
) -> Result<ResolvedClassName, InferenceFailure> {
    match expr {
        ArgumentExpr::StringLiteral(text) => Ok(ResolvedClassName::new(text)),
        ArgumentExpr::ClassConstant { class, constant } => {
            resolve_class_constant(class, constant, context, symbols)
        }
        ArgumentExpr::Unsupported { kind } => Err(InferenceFailure::unsupported(kind)),
    }
}

fn resolve_class_constant<S: SymbolTable + ?Sized>(
    class_token: &str,
    constant: &str,
    context: &ResolutionContext,
    symbols: &S,
) -> Result<ResolvedClassName, InferenceFailure> {
    let class = context
        .resolve_class_name(class_token)
        .ok_or_else(|| InferenceFailure::ClassNotFound {
            class: class_token.to_string(),
        })?;

    if !symbols.has_class(&class) {
        return Err(InferenceFailure::ClassNotFound {
            class: class.to_string(),
        });
    }

    let constant_ref = format!("{}::{}", class, constant);
    match symbols.class_constant(&class, constant) {
        None => Err(InferenceFailure::ConstantNotFound {
            constant: constant_ref,
        }),
        Some(ConstantValue::String(value)) => Ok(ResolvedClassName::new(value)),
        Some(other) => {
            tracing::debug!(
                constant = %constant_ref,
                kind = other.kind_name(),
                "class constant is not a string literal"
            );
            Err(InferenceFailure::ConstantNotStringTyped {
                constant: constant_ref,
                expected: "string",
            })
        }
    }
}
