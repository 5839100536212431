/// PHP parsing and AST extraction.
///
/// This module parses PHP source text with the mago_syntax parser and
/// lowers the parts the return-type override cares about into owned data:
/// class-like declarations (methods, parameters, docblocks, constant
/// values) and method call sites together with the namespace and `use`
/// imports in effect where they appear.
///
/// Sub-modules:
/// - [`classes`]: Class, interface, trait, and enum extraction
/// - [`calls`]: Call-site collection and argument lowering
/// - [`use_statements`]: `use` statement extraction into a [`ResolutionContext`]
mod calls;
mod classes;
mod use_statements;

use std::sync::Arc;

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use crate::docblock;
use crate::names::ResolutionContext;
use crate::types::*;
use crate::util::line_number;

pub use calls::RawCall;
pub(crate) use calls::expression_kind;

/// Source text and trivia for one file, shared by the extractors.
pub(crate) struct SourceCtx<'a> {
    pub file: &'a str,
    pub content: &'a str,
    pub trivias: &'a [Trivia<'a>],
}

impl<'a> SourceCtx<'a> {
    pub fn location(&self, span: Span) -> Location {
        Location::new(
            self.file,
            line_number(self.content, span.start.offset),
            span.start.offset,
            span.end.offset,
        )
    }

    pub fn docblock(&self, node: &impl HasSpan) -> Option<&'a str> {
        docblock::get_docblock_text_for_node(self.trivias, self.content, node)
    }
}

/// Everything extracted from one PHP file.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// The first namespace declared in the file, if any.
    pub namespace: Option<String>,
    pub classes: Vec<ClassInfo>,
    /// Static and `$this->` method calls, in source order.
    pub calls: Vec<RawCall>,
}

/// Parse PHP source text registered under `file`.
///
/// The parser recovers from syntax errors on its own; should it panic,
/// the file is treated as empty.
pub fn parse_php(file: &str, content: &str) -> ParsedFile {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let arena = bumpalo::Bump::new();
        let file_id = mago_database::file::FileId::new(file);
        let program = mago_syntax::parser::parse_file_content(&arena, file_id, content);

        let src = SourceCtx {
            file,
            content,
            trivias: program.trivia.as_slice(),
        };

        let mut parsed = ParsedFile::default();
        extract_block(program.statements.iter(), None, &src, &mut parsed);
        parsed
    }));

    match result {
        Ok(parsed) => {
            tracing::debug!(
                file,
                classes = parsed.classes.len(),
                calls = parsed.calls.len(),
                "parsed file"
            );
            parsed
        }
        Err(_) => {
            tracing::error!(file, "parser panicked, treating file as empty");
            ParsedFile::default()
        }
    }
}

/// Extract one namespace block (or the global scope).
///
/// The `use` imports of a block apply to every class and call inside it,
/// wherever they appear in the block.
fn extract_block<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>> + std::clone::Clone,
    namespace: Option<&str>,
    src: &SourceCtx<'a>,
    parsed: &mut ParsedFile,
) {
    let mut context = ResolutionContext::new(namespace);
    use_statements::extract_use_statements(statements.clone(), &mut context);
    let context = Arc::new(context);

    for statement in statements {
        match statement {
            Statement::Namespace(ns) => {
                let name = ns.name.as_ref().map(|ident| ident.value());
                if parsed.namespace.is_none()
                    && let Some(name) = name.filter(|n| !n.is_empty())
                {
                    parsed.namespace = Some(name.to_string());
                }
                extract_block(ns.statements().iter(), name, src, parsed);
            }
            Statement::Class(_)
            | Statement::Interface(_)
            | Statement::Trait(_)
            | Statement::Enum(_) => {
                classes::extract_class_like(statement, &context, src, parsed);
            }
            other => {
                calls::collect_calls(std::iter::once(other), &context, src, &mut parsed.calls);
            }
        }
    }
}

/// Extract a string representation of a type hint from the AST.
pub(crate) fn extract_hint_string(hint: &Hint) -> String {
    match hint {
        Hint::Identifier(ident) => ident.value().to_string(),
        Hint::Nullable(nullable) => format!("?{}", extract_hint_string(nullable.hint)),
        Hint::Union(union) => format!(
            "{}|{}",
            extract_hint_string(union.left),
            extract_hint_string(union.right)
        ),
        Hint::Intersection(intersection) => format!(
            "{}&{}",
            extract_hint_string(intersection.left),
            extract_hint_string(intersection.right)
        ),
        Hint::Void(ident)
        | Hint::Never(ident)
        | Hint::Float(ident)
        | Hint::Bool(ident)
        | Hint::Integer(ident)
        | Hint::String(ident)
        | Hint::Object(ident)
        | Hint::Mixed(ident)
        | Hint::Iterable(ident) => ident.value.to_string(),
        Hint::Null(keyword)
        | Hint::True(keyword)
        | Hint::False(keyword)
        | Hint::Array(keyword)
        | Hint::Callable(keyword)
        | Hint::Static(keyword)
        | Hint::Self_(keyword)
        | Hint::Parent(keyword) => keyword.value.to_string(),
        Hint::Parenthesized(paren) => format!("({})", extract_hint_string(paren.hint)),
    }
}

/// Extract parameter information from a method's parameter list.
pub(crate) fn extract_parameters(parameter_list: &FunctionLikeParameterList) -> Vec<ParameterInfo> {
    parameter_list
        .parameters
        .iter()
        .map(|param| {
            let is_variadic = param.ellipsis.is_some();
            ParameterInfo {
                name: param.variable.name.to_string(),
                is_required: param.default_value.is_none() && !is_variadic,
                type_hint: param.hint.as_ref().map(|h| extract_hint_string(h)),
                is_variadic,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_code_has_no_namespace() {
        let parsed = parse_php("a.php", "<?php\nclass Foo {}\n");
        assert_eq!(parsed.namespace, None);
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].fqn.as_str(), "\\Foo");
    }

    #[test]
    fn first_namespace_is_recorded() {
        let php = "<?php\nnamespace App\\One;\nclass A {}\nnamespace App\\Two;\nclass B {}\n";
        let parsed = parse_php("a.php", php);
        assert_eq!(parsed.namespace.as_deref(), Some("App\\One"));
        let fqns: Vec<&str> = parsed.classes.iter().map(|c| c.fqn.as_str()).collect();
        assert_eq!(fqns, ["\\App\\One\\A", "\\App\\Two\\B"]);
    }

    #[test]
    fn broken_source_does_not_panic() {
        let parsed = parse_php("a.php", "<?php\nclass { function (");
        assert!(parsed.calls.is_empty());
    }
}
