use pretty_assertions::assert_eq;

use super::*;

fn parse_ok(source: &str) -> Vec<Stmt> {
    parse(source).unwrap().body
}

fn expr_of(source: &str) -> Expr {
    match parse_ok(source).remove(0).kind {
        StmtKind::Expr(expr) => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

/// Compact s-expression rendering for structural assertions.
fn sexp(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(Literal::Int32(v)) => v.to_string(),
        ExprKind::Literal(Literal::Int64(v)) => format!("{v}L"),
        ExprKind::Literal(Literal::Float64(v)) => format!("{v:?}"),
        ExprKind::Literal(Literal::Str(s)) => format!("{s:?}"),
        ExprKind::Literal(other) => format!("{other:?}"),
        ExprKind::Ident(name) => name.clone(),
        ExprKind::GlobalIdent(name) => format!("(var {name})"),
        ExprKind::Binary { op, lhs, rhs } => {
            format!("({} {} {})", op.as_symbol(), sexp(lhs), sexp(rhs))
        }
        ExprKind::Unary { op, operand } => format!("({} {})", op.as_symbol(), sexp(operand)),
        ExprKind::Update { op, prefix, target } => {
            let sym = if *op == UpdateOp::Inc { "++" } else { "--" };
            if *prefix {
                format!("({sym} {})", sexp(target))
            } else {
                format!("({} {sym})", sexp(target))
            }
        }
        ExprKind::Assign { op, target, value } => {
            let sym = op.map_or("=".to_owned(), |op| format!("{}=", op.as_symbol()));
            format!("({sym} {} {})", sexp(target), sexp(value))
        }
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => format!("(? {} {} {})", sexp(cond), sexp(then_expr), sexp(else_expr)),
        ExprKind::Call { callee, args } => {
            let args: Vec<String> = args.iter().map(sexp).collect();
            format!("(call {} [{}])", sexp(callee), args.join(" "))
        }
        ExprKind::Index { object, index } => format!("([] {} {})", sexp(object), sexp(index)),
        ExprKind::Member { object, name } => format!("(. {} {name})", sexp(object)),
        ExprKind::Function(f) => format!("(function [{}] {})", f.params.join(" "), f.body.len()),
    }
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(sexp(&expr_of("1 + 2 * 3 - 4")), "(- (+ 1 (* 2 3)) 4)");
    assert_eq!(sexp(&expr_of("a < b == c > d")), "(== (< a b) (> c d))");
    assert_eq!(sexp(&expr_of("a || b && c | d ^ e & f")), "(|| a (&& b (| c (^ d (& e f)))))");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(sexp(&expr_of("a = b += 2")), "(= a (+= b 2))");
}

#[test]
fn ternary_binds_below_or() {
    assert_eq!(sexp(&expr_of("a || b ? 1 : c = 2")), "(? (|| a b) 1 (= c 2))");
}

#[test]
fn prefix_and_postfix() {
    assert_eq!(sexp(&expr_of("-a.b[1](2)")), "(- (call ([] (. a b) 1) [2]))");
    assert_eq!(sexp(&expr_of("++a.b")), "(++ (. a b))");
    assert_eq!(sexp(&expr_of("x--")), "(x --)");
    assert_eq!(sexp(&expr_of("!~+x")), "(! (~ x))");
}

#[test]
fn explicit_global_identifier() {
    assert_eq!(sexp(&expr_of("(var v) = 114514")), "(= (var v) 114514)");
}

#[test]
fn integer_literals_narrow_to_int32() {
    assert_eq!(sexp(&expr_of("2147483647")), "2147483647");
    assert_eq!(sexp(&expr_of("2147483648")), "2147483648L");
    assert_eq!(sexp(&expr_of("1.5")), "1.5");
}

#[test]
fn function_literal() {
    let expr = expr_of("f = function(n, m) { return n; }");
    assert_eq!(sexp(&expr), "(= f (function [n m] 1))");
}

#[test]
fn statements_without_semicolons() {
    let body = parse_ok("a = 1 b = 2; c");
    assert_eq!(body.len(), 3);
}

#[test]
fn control_flow_statements() {
    let body = parse_ok(
        "if (a) b; else { c; d }
         while (x < 3) x++
         for (let i = 0; i < 3; ++i) continue
         for (;;) break
         foreach (e : list) print(e)
         return",
    );
    assert_eq!(body.len(), 6);
    assert!(matches!(
        body[0].kind,
        StmtKind::If {
            else_branch: Some(_),
            ..
        }
    ));
    match &body[2].kind {
        StmtKind::For {
            init: Some(init), ..
        } => assert!(matches!(
            init.kind,
            StmtKind::Declare {
                scope: DeclScope::Local,
                ..
            }
        )),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        body[3].kind,
        StmtKind::For {
            init: None,
            cond: None,
            step: None,
            ..
        }
    ));
    assert!(matches!(body[4].kind, StmtKind::ForEach { .. }));
    assert_eq!(body[5].kind, StmtKind::Return(None));
}

#[test]
fn parenthesised_condition_does_not_swallow_the_body() {
    let body = parse_ok("if (a) -b;");
    match &body[0].kind {
        StmtKind::If {
            cond, then_branch, ..
        } => {
            assert_eq!(sexp(cond), "a");
            assert!(matches!(then_branch.kind, StmtKind::Expr(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn declarations() {
    let body = parse_ok("var a = 1, b; let c");
    match &body[0].kind {
        StmtKind::Declare { scope, items } => {
            assert_eq!(*scope, DeclScope::Global);
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].name, "a");
            assert!(items[1].init.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        body[1].kind,
        StmtKind::Declare {
            scope: DeclScope::Local,
            ..
        }
    ));
}

#[test]
fn throw_and_debugbreak() {
    let body = parse_ok("throw \"bad\"; debugbreak;");
    assert!(matches!(body[0].kind, StmtKind::Throw(_)));
    assert_eq!(body[1].kind, StmtKind::DebugBreak);
}

#[test]
fn invalid_assignment_target() {
    let err = parse("1 = a").unwrap_err();
    assert_eq!(err.message, "invalid assignment target");
    assert_eq!(err.span, Span::new(0, 1));
    assert!(parse("f() += 1").is_err());
    assert!(parse("(a + b)++").is_err());
}

#[test]
fn unexpected_end_of_input() {
    let err = parse("a = (1 + ").unwrap_err();
    assert_eq!(err.message, "expected expression, found end of input");
    assert_eq!(err.span, Span::point(9));
    assert!(parse("{ a").is_err());
}

#[test]
fn spans_cover_the_expression() {
    let expr = expr_of("  foo(1, 2)");
    assert_eq!(expr.span, Span::new(2, 11));
}

#[test]
fn deep_nesting_does_not_overflow() {
    let depth = 5_000;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(sexp(&expr_of(&source)), "1");
}
