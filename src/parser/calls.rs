/// Call-site collection.
///
/// Walks statement and expression trees and records every method call
/// whose target class is known statically:
///
/// - `Foo::bar(...)`, `\Lib\Foo::bar(...)`
/// - `self::bar(...)`, `static::bar(...)`, `parent::bar(...)` inside a class
/// - `$this->bar(...)` inside a class
///
/// Arguments are lowered to [`ArgumentExpr`] right away so that nothing
/// borrows from the parser arena once parsing is done.
use std::sync::Arc;

use mago_span::HasSpan;
use mago_syntax::ast::sequence::TokenSeparatedSequence;
use mago_syntax::ast::*;

use crate::names::{ResolutionContext, ResolvedClassName};
use crate::resolver::{ArgumentExpr, CallArgument};
use crate::types::Location;

use super::SourceCtx;

/// A method call found in source, before it is matched to a declaration.
#[derive(Debug, Clone)]
pub struct RawCall {
    /// The class the method is looked up on.
    pub class: ResolvedClassName,
    pub method: String,
    pub arguments: Vec<CallArgument>,
    /// Namespace, imports and enclosing class at the call site.
    pub context: Arc<ResolutionContext>,
    /// Span of the whole call expression.
    pub location: Location,
}

pub(super) fn collect_calls<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>>,
    context: &Arc<ResolutionContext>,
    src: &SourceCtx<'a>,
    calls: &mut Vec<RawCall>,
) {
    let mut collector = Collector {
        context,
        src,
        calls,
    };
    collector.statements(statements);
}

struct Collector<'c, 'a> {
    context: &'c Arc<ResolutionContext>,
    src: &'c SourceCtx<'a>,
    calls: &'c mut Vec<RawCall>,
}

impl<'c, 'a> Collector<'c, 'a> {
    fn statements<'b>(&mut self, statements: impl Iterator<Item = &'b Statement<'b>>) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn statement<'b>(&mut self, statement: &'b Statement<'b>) {
        match statement {
            Statement::Expression(expr_stmt) => self.expression(expr_stmt.expression),
            Statement::Return(ret) => {
                if let Some(value) = ret.value {
                    self.expression(value);
                }
            }
            Statement::Echo(echo) => {
                for value in echo.values.iter() {
                    self.expression(value);
                }
            }
            Statement::EchoTag(echo) => {
                for value in echo.values.iter() {
                    self.expression(value);
                }
            }
            Statement::Static(stmt) => {
                for item in stmt.items.iter() {
                    if let Some(value) = item.value() {
                        self.expression(value);
                    }
                }
            }
            Statement::Unset(unset) => {
                for value in unset.values.iter() {
                    self.expression(value);
                }
            }
            Statement::Block(block) => self.statements(block.statements.iter()),
            Statement::If(if_stmt) => {
                self.expression(if_stmt.condition);
                match &if_stmt.body {
                    IfBody::Statement(body) => {
                        self.statement(body.statement);
                        for else_if in body.else_if_clauses.iter() {
                            self.expression(else_if.condition);
                            self.statement(else_if.statement);
                        }
                        if let Some(else_clause) = &body.else_clause {
                            self.statement(else_clause.statement);
                        }
                    }
                    IfBody::ColonDelimited(body) => {
                        self.statements(body.statements.iter());
                        for else_if in body.else_if_clauses.iter() {
                            self.expression(else_if.condition);
                            self.statements(else_if.statements.iter());
                        }
                        if let Some(else_clause) = &body.else_clause {
                            self.statements(else_clause.statements.iter());
                        }
                    }
                }
            }
            Statement::Foreach(foreach) => {
                self.expression(foreach.expression);
                self.statements(foreach.body.statements().iter());
            }
            Statement::For(for_stmt) => {
                let header = for_stmt
                    .initializations
                    .iter()
                    .chain(for_stmt.conditions.iter())
                    .chain(for_stmt.increments.iter());
                for expr in header {
                    self.expression(expr);
                }
                match &for_stmt.body {
                    ForBody::Statement(inner) => self.statement(inner),
                    ForBody::ColonDelimited(body) => self.statements(body.statements.iter()),
                }
            }
            Statement::While(while_stmt) => {
                self.expression(while_stmt.condition);
                match &while_stmt.body {
                    WhileBody::Statement(inner) => self.statement(inner),
                    WhileBody::ColonDelimited(body) => self.statements(body.statements.iter()),
                }
            }
            Statement::DoWhile(dw) => {
                self.statement(dw.statement);
                self.expression(dw.condition);
            }
            Statement::Try(try_stmt) => {
                self.statements(try_stmt.block.statements.iter());
                for catch in try_stmt.catch_clauses.iter() {
                    self.statements(catch.block.statements.iter());
                }
                if let Some(finally) = &try_stmt.finally_clause {
                    self.statements(finally.block.statements.iter());
                }
            }
            Statement::Switch(switch) => {
                self.expression(switch.expression);
                match &switch.body {
                    SwitchBody::BraceDelimited(body) => {
                        for case in body.cases.iter() {
                            self.statements(case.statements().iter());
                        }
                    }
                    SwitchBody::ColonDelimited(body) => {
                        for case in body.cases.iter() {
                            self.statements(case.statements().iter());
                        }
                    }
                }
            }
            Statement::Function(func) => self.statements(func.body.statements.iter()),
            _ => {}
        }
    }

    fn expression<'b>(&mut self, expr: &'b Expression<'b>) {
        match expr {
            Expression::Call(call) => {
                self.record_call(call, expr.span());
                match call {
                    Call::Function(fc) => {
                        self.expression(fc.function);
                        self.arguments(&fc.argument_list.arguments);
                    }
                    Call::Method(mc) => {
                        self.expression(mc.object);
                        self.arguments(&mc.argument_list.arguments);
                    }
                    Call::NullSafeMethod(mc) => {
                        self.expression(mc.object);
                        self.arguments(&mc.argument_list.arguments);
                    }
                    Call::StaticMethod(sc) => {
                        self.expression(sc.class);
                        self.arguments(&sc.argument_list.arguments);
                    }
                }
            }
            Expression::Parenthesized(p) => self.expression(p.expression),
            Expression::Assignment(a) => {
                self.expression(a.lhs);
                self.expression(a.rhs);
            }
            Expression::Binary(bin) => {
                self.expression(bin.lhs);
                self.expression(bin.rhs);
            }
            Expression::Conditional(cond) => {
                self.expression(cond.condition);
                if let Some(then) = cond.then {
                    self.expression(then);
                }
                self.expression(cond.r#else);
            }
            Expression::Array(arr) => {
                for element in arr.elements.iter() {
                    self.array_element(element);
                }
            }
            Expression::LegacyArray(arr) => {
                for element in arr.elements.iter() {
                    self.array_element(element);
                }
            }
            Expression::Match(m) => {
                self.expression(m.expression);
                for arm in m.arms.iter() {
                    self.expression(arm.expression());
                }
            }
            Expression::Access(access) => match access {
                Access::Property(pa) => self.expression(pa.object),
                Access::NullSafeProperty(pa) => self.expression(pa.object),
                Access::StaticProperty(pa) => self.expression(pa.class),
                Access::ClassConstant(pa) => self.expression(pa.class),
            },
            Expression::ArrayAccess(aa) => {
                self.expression(aa.array);
                self.expression(aa.index);
            }
            Expression::Instantiation(inst) => {
                self.expression(inst.class);
                if let Some(ref args) = inst.argument_list {
                    self.arguments(&args.arguments);
                }
            }
            Expression::UnaryPrefix(u) => self.expression(u.operand),
            Expression::UnaryPostfix(u) => self.expression(u.operand),
            Expression::Yield(y) => match y {
                Yield::Value(yv) => {
                    if let Some(value) = &yv.value {
                        self.expression(value);
                    }
                }
                Yield::Pair(yp) => {
                    self.expression(yp.key);
                    self.expression(yp.value);
                }
                Yield::From(yf) => self.expression(yf.iterator),
            },
            Expression::Throw(t) => self.expression(t.exception),
            Expression::Clone(c) => self.expression(c.object),
            Expression::Pipe(p) => {
                self.expression(p.input);
                self.expression(p.callable);
            }
            Expression::Closure(closure) => self.statements(closure.body.statements.iter()),
            Expression::ArrowFunction(arrow) => self.expression(arrow.expression),
            _ => {}
        }
    }

    fn array_element<'b>(&mut self, element: &'b ArrayElement<'b>) {
        match element {
            ArrayElement::KeyValue(kv) => {
                self.expression(kv.key);
                self.expression(kv.value);
            }
            ArrayElement::Value(v) => self.expression(v.value),
            ArrayElement::Variadic(v) => self.expression(v.value),
            ArrayElement::Missing(_) => {}
        }
    }

    fn arguments<'b>(&mut self, arguments: &TokenSeparatedSequence<'b, Argument<'b>>) {
        for arg in arguments.iter() {
            match arg {
                Argument::Positional(pos) => self.expression(pos.value),
                Argument::Named(named) => self.expression(named.value),
            }
        }
    }

    /// Record `call` if its target class is statically known.
    fn record_call<'b>(&mut self, call: &'b Call<'b>, span: mago_span::Span) {
        let (class, method, arguments) = match call {
            Call::StaticMethod(sc) => {
                let Some(token) = class_token(sc.class) else {
                    return;
                };
                let ClassLikeMemberSelector::Identifier(ident) = &sc.method else {
                    return;
                };
                let Some(class) = self.context.resolve_class_name(token) else {
                    return;
                };
                (class, ident.value, &sc.argument_list.arguments)
            }
            Call::Method(mc) => {
                let Expression::Variable(Variable::Direct(dv)) = mc.object else {
                    return;
                };
                if dv.name != "$this" {
                    return;
                }
                let ClassLikeMemberSelector::Identifier(ident) = &mc.method else {
                    return;
                };
                let Some(class) = self.context.enclosing_class() else {
                    return;
                };
                (class.clone(), ident.value, &mc.argument_list.arguments)
            }
            _ => return,
        };

        self.calls.push(RawCall {
            class,
            method: method.to_string(),
            arguments: arguments.iter().map(lower_argument).collect(),
            context: Arc::clone(self.context),
            location: self.src.location(span),
        });
    }
}

/// The class name token of a static call or class constant target.
fn class_token<'e>(expr: &'e Expression<'_>) -> Option<&'e str> {
    match expr {
        Expression::Identifier(ident) => Some(ident.value()),
        Expression::Self_(_) => Some("self"),
        Expression::Static(_) => Some("static"),
        Expression::Parent(_) => Some("parent"),
        _ => None,
    }
}

fn lower_argument(arg: &Argument<'_>) -> CallArgument {
    match arg {
        Argument::Positional(pos) => CallArgument::positional(lower_expression(pos.value)),
        Argument::Named(named) => CallArgument::named(named.name.value, lower_expression(named.value)),
    }
}

/// Lower an argument expression to one of the shapes the resolver knows.
pub(crate) fn lower_expression(expr: &Expression<'_>) -> ArgumentExpr {
    match expr {
        Expression::Parenthesized(p) => lower_expression(p.expression),
        Expression::Literal(Literal::String(lit)) => ArgumentExpr::StringLiteral(
            lit.value
                .map(str::to_string)
                .unwrap_or_else(|| unquote(lit.raw).to_string()),
        ),
        Expression::Access(Access::ClassConstant(cca)) => {
            let ClassLikeConstantSelector::Identifier(ident) = &cca.constant else {
                return ArgumentExpr::Unsupported {
                    kind: "dynamic class constant",
                };
            };
            if ident.value.eq_ignore_ascii_case("class") {
                return ArgumentExpr::Unsupported {
                    kind: "class name fetch",
                };
            }
            match class_token(cca.class) {
                Some(class) => ArgumentExpr::ClassConstant {
                    class: class.to_string(),
                    constant: ident.value.to_string(),
                },
                None => ArgumentExpr::Unsupported {
                    kind: "dynamic class constant",
                },
            }
        }
        other => ArgumentExpr::Unsupported {
            kind: expression_kind(other),
        },
    }
}

/// A short, human-readable name for an expression's shape.
pub(crate) fn expression_kind(expr: &Expression<'_>) -> &'static str {
    match expr {
        Expression::Parenthesized(p) => expression_kind(p.expression),
        Expression::Variable(_) => "variable",
        Expression::Literal(Literal::String(_)) => "string literal",
        Expression::Literal(Literal::Integer(_)) => "integer literal",
        Expression::Literal(Literal::Float(_)) => "float literal",
        Expression::Literal(_) => "literal",
        Expression::CompositeString(_) => "interpolated string",
        Expression::Binary(_) => "binary operation",
        Expression::Conditional(_) => "ternary",
        Expression::Call(_) => "call",
        Expression::Access(Access::ClassConstant(_)) => "class constant",
        Expression::Access(_) => "property access",
        Expression::ArrayAccess(_) => "array access",
        Expression::Array(_) | Expression::LegacyArray(_) => "array",
        Expression::Instantiation(_) => "instantiation",
        Expression::Closure(_) | Expression::ArrowFunction(_) => "closure",
        Expression::Identifier(_) | Expression::ConstantAccess(_) => "constant",
        Expression::Match(_) => "match",
        Expression::Assignment(_) => "assignment",
        _ => "expression",
    }
}

/// Strip one pair of matching quotes.
pub(super) fn unquote(raw: &str) -> &str {
    raw.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::super::parse_php;
    use super::*;

    fn calls(php: &str) -> Vec<RawCall> {
        parse_php("calls.php", php).calls
    }

    #[test]
    fn static_calls_anywhere_in_top_level_code() {
        let found = calls(
            "<?php\nnamespace App;\n\nfunction f() {\n    if (true) {\n        return Locator::get('\\Foo');\n    }\n}\n$x = [Locator::get(Bar::TYPE)];\n",
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].class.as_str(), "\\App\\Locator");
        assert_eq!(found[0].method, "get");
        assert_eq!(found[0].location.line, 6);
        assert_eq!(
            found[0].arguments,
            vec![CallArgument::positional(ArgumentExpr::StringLiteral("\\Foo".into()))]
        );
        assert_eq!(
            found[1].arguments[0].value,
            ArgumentExpr::ClassConstant {
                class: "Bar".into(),
                constant: "TYPE".into()
            }
        );
    }

    #[test]
    fn self_and_this_calls_need_a_class() {
        let found = calls(
            "<?php\nclass Child extends Base {\n    function run() {\n        $fn = function () { return $this->make('A'); };\n        return parent::make(self::TYPE);\n    }\n}\nself::make('B');\n$this->make('C');\n",
        );
        let targets: Vec<(&str, &str)> = found
            .iter()
            .map(|c| (c.class.as_str(), c.method.as_str()))
            .collect();
        assert_eq!(targets, [("\\Child", "make"), ("\\Base", "make")]);
        assert_eq!(
            found[1].arguments[0].value,
            ArgumentExpr::ClassConstant {
                class: "self".into(),
                constant: "TYPE".into()
            }
        );
    }

    #[test]
    fn nested_calls_are_all_recorded() {
        let found = calls("<?php\nA::outer(B::inner('X'));\n");
        let methods: Vec<&str> = found.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(methods, ["outer", "inner"]);
        assert_eq!(found[0].arguments[0].value, ArgumentExpr::Unsupported { kind: "call" });
    }

    #[test]
    fn argument_shapes() {
        let found = calls(
            "<?php\nL::get($var, ('\\Wrapped'), Foo::class, 'a' . 'b', type: \"Named\");\n",
        );
        let args = &found[0].arguments;
        assert_eq!(args[0].value, ArgumentExpr::Unsupported { kind: "variable" });
        assert_eq!(args[1].value, ArgumentExpr::StringLiteral("\\Wrapped".into()));
        assert_eq!(
            args[2].value,
            ArgumentExpr::Unsupported {
                kind: "class name fetch"
            }
        );
        assert_eq!(
            args[3].value,
            ArgumentExpr::Unsupported {
                kind: "binary operation"
            }
        );
        assert_eq!(args[4].name.as_deref(), Some("type"));
        assert_eq!(args[4].value, ArgumentExpr::StringLiteral("Named".into()));
    }

    #[test]
    fn loop_headers_are_walked() {
        let found = calls(
            "<?php\nforeach (L::each('\\A') as $x) {}\nwhile (L::poll('\\B')) {}\ndo {} while (L::again('\\C'));\nfor ($i = L::start('\\D'); L::check('\\E'); L::step('\\F')) {}\n",
        );
        let methods: Vec<(&str, u32)> = found
            .iter()
            .map(|c| (c.method.as_str(), c.location.line))
            .collect();
        assert_eq!(
            methods,
            [
                ("each", 2),
                ("poll", 3),
                ("again", 4),
                ("start", 5),
                ("check", 5),
                ("step", 5)
            ]
        );
    }

    #[test]
    fn instantiation_and_array_access_are_walked() {
        let found = calls(
            "<?php\n$a = new (L::kind('\\A'))(L::arg('\\B'));\n$b = L::map('\\C')[L::key('\\D')];\n",
        );
        let methods: Vec<&str> = found.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(methods, ["kind", "arg", "map", "key"]);
    }

    #[test]
    fn static_unset_and_echo_tags_are_walked() {
        let found = calls(
            "<?php\nfunction f() {\n    static $cache = L::initial('\\A'), $empty;\n    unset($GLOBALS[L::slot('\\B')]);\n}\n?>\n<?= L::render('\\C') ?>\n",
        );
        let methods: Vec<&str> = found.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(methods, ["initial", "slot", "render"]);
    }

    #[test]
    fn unquote_strips_one_pair() {
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("\"b\""), "b");
        assert_eq!(unquote("c"), "c");
    }
}
