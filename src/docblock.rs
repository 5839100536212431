//! PHPDoc helpers.
//!
//! Locates the `/** ... */` comment attached to an AST node and reads the
//! declared `@return` type from it.  The `@returnTypeArg` marker itself is
//! handled by [`crate::annotation`].

use mago_span::HasSpan;
use mago_syntax::ast::*;

/// Find the docblock comment that immediately precedes `node`.
///
/// Walks the trivia backwards from the node's start; whitespace and plain
/// comments between the docblock and the node are allowed, any other
/// source text in between means the docblock belongs to something else.
pub fn get_docblock_text_for_node<'a>(
    trivia: &'a [Trivia<'a>],
    content: &str,
    node: &impl HasSpan,
) -> Option<&'a str> {
    let node_start = node.span().start.offset;
    let candidate_idx = trivia.partition_point(|t| t.span.start.offset < node_start);
    if candidate_idx == 0 {
        return None;
    }

    let content_bytes = content.as_bytes();
    let mut covered_from = node_start;

    for t in trivia[..candidate_idx].iter().rev() {
        let gap = content_bytes
            .get(t.span.end.offset as usize..covered_from as usize)
            .unwrap_or(&[]);
        if !gap.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        match t.kind {
            TriviaKind::DocBlockComment => return Some(t.value),
            TriviaKind::WhiteSpace
            | TriviaKind::SingleLineComment
            | TriviaKind::MultiLineComment
            | TriviaKind::HashComment => {
                covered_from = t.span.start.offset;
            }
        }
    }

    None
}

/// Extract the raw type from the first `@return` tag.
///
/// The type token is returned as written, so `@return \Foo|null` yields
/// `\Foo|null`.  Generic and callable types (`Collection<int, User>`,
/// `Closure(int): void`) are kept whole.  Tags that merely start with
/// `@return`, such as `@returnTypeArg`, are not matched.
pub fn extract_return_type(docblock: &str) -> Option<String> {
    let inner = docblock
        .trim()
        .strip_prefix("/**")
        .unwrap_or(docblock)
        .strip_suffix("*/")
        .unwrap_or(docblock);

    for line in inner.lines() {
        let trimmed = line.trim().trim_start_matches('*').trim();

        let Some(rest) = trimmed.strip_prefix("@return") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let rest = rest.trim_start();
        if rest.is_empty() {
            continue;
        }

        let type_str = split_type_token(rest);
        if !type_str.is_empty() {
            return Some(type_str.to_string());
        }
    }
    None
}

/// The leading type token of `s`, respecting `<>` and `()` nesting.
fn split_type_token(s: &str) -> &str {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '{' => depth += 1,
            '>' | ')' | '}' => depth -= 1,
            c if c.is_whitespace() && depth <= 0 => {
                // `Closure(int): void` keeps its return type.
                if s[..i].ends_with(':') {
                    continue;
                }
                return &s[..i];
            }
            _ => {}
        }
    }
    s
}
