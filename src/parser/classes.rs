/// Class, interface, trait, and enum extraction.
///
/// Each class-like declaration becomes a [`ClassInfo`] holding its
/// methods (with parameters, docblock and declared return type) and its
/// constants with their statically known values.  Method bodies are
/// handed to the call collector with a context that knows the enclosing
/// class, so that `self::`, `static::`, `parent::` and `$this->` resolve.
use std::sync::Arc;

use mago_span::HasSpan;
use mago_syntax::ast::*;

use crate::docblock;
use crate::names::{ResolutionContext, ResolvedClassName};
use crate::types::*;

use super::{ParsedFile, SourceCtx, calls, expression_kind, extract_hint_string, extract_parameters};

/// The parts shared by every class-like declaration.
struct ClassLikeHeader<'a> {
    kind: ClassLikeKind,
    name: &'a str,
    parent: Option<&'a str>,
    interfaces: Vec<&'a str>,
    members: Vec<&'a ClassLikeMember<'a>>,
    start_offset: u32,
    end_offset: u32,
}

fn header<'a>(statement: &'a Statement<'a>) -> Option<ClassLikeHeader<'a>> {
    let header = match statement {
        Statement::Class(class) => ClassLikeHeader {
            kind: ClassLikeKind::Class,
            name: class.name.value,
            parent: class
                .extends
                .as_ref()
                .and_then(|ext| ext.types.first().map(|ident| ident.value())),
            interfaces: class
                .implements
                .as_ref()
                .map(|imp| imp.types.iter().map(|ident| ident.value()).collect())
                .unwrap_or_default(),
            members: class.members.iter().collect(),
            start_offset: class.left_brace.start.offset,
            end_offset: class.right_brace.end.offset,
        },
        Statement::Interface(iface) => ClassLikeHeader {
            kind: ClassLikeKind::Interface,
            name: iface.name.value,
            parent: None,
            interfaces: iface
                .extends
                .as_ref()
                .map(|ext| ext.types.iter().map(|ident| ident.value()).collect())
                .unwrap_or_default(),
            members: iface.members.iter().collect(),
            start_offset: iface.left_brace.start.offset,
            end_offset: iface.right_brace.end.offset,
        },
        Statement::Trait(trait_def) => ClassLikeHeader {
            kind: ClassLikeKind::Trait,
            name: trait_def.name.value,
            parent: None,
            interfaces: Vec::new(),
            members: trait_def.members.iter().collect(),
            start_offset: trait_def.left_brace.start.offset,
            end_offset: trait_def.right_brace.end.offset,
        },
        Statement::Enum(enum_def) => ClassLikeHeader {
            kind: ClassLikeKind::Enum,
            name: enum_def.name.value,
            parent: None,
            interfaces: enum_def
                .implements
                .as_ref()
                .map(|imp| imp.types.iter().map(|ident| ident.value()).collect())
                .unwrap_or_default(),
            members: enum_def.members.iter().collect(),
            start_offset: enum_def.left_brace.start.offset,
            end_offset: enum_def.right_brace.end.offset,
        },
        _ => return None,
    };
    Some(header)
}

/// Extract a class-like declaration and the calls inside its methods.
pub(super) fn extract_class_like<'a>(
    statement: &'a Statement<'a>,
    context: &ResolutionContext,
    src: &SourceCtx<'a>,
    parsed: &mut ParsedFile,
) {
    let Some(header) = header(statement) else {
        return;
    };

    let fqn = ResolvedClassName::from_parts(context.namespace(), header.name);
    let parent_class = header
        .parent
        .and_then(|token| context.resolve_class_name(token));
    let interfaces: Vec<ResolvedClassName> = header
        .interfaces
        .iter()
        .filter_map(|token| context.resolve_class_name(token))
        .collect();
    let class_context = Arc::new(context.with_enclosing_class(fqn.clone(), parent_class.clone()));

    let mut methods = Vec::new();
    let mut constants = Vec::new();

    for member in header.members {
        match member {
            ClassLikeMember::Method(method) => {
                methods.push(extract_method(method, &fqn, src));
                if let MethodBody::Concrete(block) = &method.body {
                    calls::collect_calls(
                        block.statements.iter(),
                        &class_context,
                        src,
                        &mut parsed.calls,
                    );
                }
            }
            ClassLikeMember::Constant(constant) => {
                for item in constant.items.iter() {
                    constants.push(ConstantInfo {
                        name: item.name.value.to_string(),
                        value: constant_value(&item.value),
                    });
                }
            }
            ClassLikeMember::EnumCase(enum_case) => {
                // An enum case is an object, never a class-name string.
                constants.push(ConstantInfo {
                    name: enum_case.item.name().value.to_string(),
                    value: ConstantValue::Expression("enum case"),
                });
            }
            _ => {}
        }
    }

    tracing::debug!(
        class = %fqn,
        methods = methods.len(),
        constants = constants.len(),
        "extracted class"
    );

    parsed.classes.push(ClassInfo {
        kind: header.kind,
        name: header.name.to_string(),
        fqn,
        parent_class,
        interfaces,
        methods,
        constants,
        start_offset: header.start_offset,
        end_offset: header.end_offset,
    });
}

fn extract_method(method: &Method, class: &ResolvedClassName, src: &SourceCtx) -> MethodInfo {
    let name = method.name.value.to_string();
    let docblock_text = src.docblock(method);

    // `@return` wins over the native hint.
    let return_type = docblock_text
        .and_then(docblock::extract_return_type)
        .or_else(|| {
            method
                .return_type_hint
                .as_ref()
                .map(|rth| extract_hint_string(&rth.hint))
        })
        .map(|raw| UnionType::parse(&raw))
        .unwrap_or_else(UnionType::mixed);

    MethodInfo {
        id: MethodId::new(class, &name),
        parameters: extract_parameters(&method.parameter_list),
        docblock: docblock_text.map(str::to_string),
        return_type,
        is_static: method.modifiers.iter().any(|m| m.is_static()),
        location: src.location(method.span()),
        name,
    }
}

/// Lower a constant initializer to the value the resolver can use.
fn constant_value(expr: &Expression) -> ConstantValue {
    match expr {
        Expression::Parenthesized(p) => constant_value(p.expression),
        Expression::Literal(Literal::String(lit)) => ConstantValue::String(
            lit.value
                .map(str::to_string)
                .unwrap_or_else(|| calls::unquote(lit.raw).to_string()),
        ),
        Expression::Literal(Literal::Integer(lit)) => ConstantValue::Integer(lit.raw.to_string()),
        Expression::Literal(Literal::Float(lit)) => ConstantValue::Float(lit.raw.to_string()),
        Expression::Literal(Literal::True(_)) => ConstantValue::Boolean(true),
        Expression::Literal(Literal::False(_)) => ConstantValue::Boolean(false),
        Expression::Literal(Literal::Null(_)) => ConstantValue::Null,
        other => ConstantValue::Expression(expression_kind(other)),
    }
}
