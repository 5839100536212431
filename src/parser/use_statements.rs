/// `use` statement extraction.
///
/// Registers every class import of a namespace block into its
/// [`ResolutionContext`].  Function and constant imports are skipped: only
/// class names are ever resolved.
use mago_syntax::ast::*;

use crate::names::ResolutionContext;
use crate::util::short_name;

/// Register the `use` statements directly inside `statements`.
///
/// Nested namespace blocks are not entered; they get their own context.
pub(super) fn extract_use_statements<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>>,
    context: &mut ResolutionContext,
) {
    for statement in statements {
        if let Statement::Use(use_stmt) = statement {
            extract_use_items(&use_stmt.items, context);
        }
    }
}

fn extract_use_items(items: &UseItems, context: &mut ResolutionContext) {
    match items {
        UseItems::Sequence(seq) => {
            for item in seq.items.iter() {
                register_use_item(item, None, context);
            }
        }
        UseItems::TypedSequence(seq) => {
            if seq.r#type.is_function() || seq.r#type.is_const() {
                return;
            }
            for item in seq.items.iter() {
                register_use_item(item, None, context);
            }
        }
        UseItems::TypedList(list) => {
            if list.r#type.is_function() || list.r#type.is_const() {
                return;
            }
            let prefix = list.namespace.value();
            for item in list.items.iter() {
                register_use_item(item, Some(prefix), context);
            }
        }
        UseItems::MixedList(list) => {
            let prefix = list.namespace.value();
            for maybe_typed in list.items.iter() {
                if let Some(ref t) = maybe_typed.r#type
                    && (t.is_function() || t.is_const())
                {
                    continue;
                }
                register_use_item(&maybe_typed.item, Some(prefix), context);
            }
        }
    }
}

/// `use Foo\{Bar}` has prefix `Foo` and item `Bar`.
fn register_use_item(item: &UseItem, group_prefix: Option<&str>, context: &mut ResolutionContext) {
    let item_name = item.name.value();
    let fqn = match group_prefix {
        Some(prefix) => format!("{}\\{}", prefix.trim_end_matches('\\'), item_name),
        None => item_name.to_string(),
    };

    let alias = match item.alias {
        Some(ref alias) => alias.identifier.value.to_string(),
        None => short_name(&fqn).to_string(),
    };

    context.add_import(&alias, &fqn);
}

#[cfg(test)]
mod tests {
    use super::super::parse_php;

    fn first_call_context(php: &str) -> crate::names::ResolutionContext {
        let parsed = parse_php("t.php", php);
        (*parsed.calls[0].context).clone()
    }

    #[test]
    fn simple_aliased_and_grouped_imports() {
        let ctx = first_call_context(
            "<?php\nnamespace App;\nuse Lib\\Types;\nuse Lib\\Real as Alias;\nuse Vendor\\{One, Two as Deux};\nuse function Lib\\helper;\nFoo::bar();\n",
        );
        assert_eq!(ctx.namespace(), Some("App"));
        assert_eq!(ctx.import_for("Types"), Some("Lib\\Types"));
        assert_eq!(ctx.import_for("alias"), Some("Lib\\Real"));
        assert_eq!(ctx.import_for("One"), Some("Vendor\\One"));
        assert_eq!(ctx.import_for("Deux"), Some("Vendor\\Two"));
        assert_eq!(ctx.import_for("helper"), None);
    }

    #[test]
    fn imports_do_not_leak_between_namespace_blocks() {
        let parsed = parse_php(
            "t.php",
            "<?php\nnamespace A {\n    use Lib\\Thing;\n    X::a();\n}\nnamespace B {\n    X::b();\n}\n",
        );
        assert_eq!(parsed.calls.len(), 2);
        assert_eq!(parsed.calls[0].context.import_for("Thing"), Some("Lib\\Thing"));
        assert_eq!(parsed.calls[1].context.import_for("Thing"), None);
        assert_eq!(parsed.calls[1].context.namespace(), Some("B"));
    }
}
