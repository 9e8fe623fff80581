use pretty_assertions::assert_eq;

use quill_syntax::parse;

use super::*;
use crate::NoGlobals;

struct Host;

impl Globals for Host {
    fn is_global(&self, name: &str) -> bool {
        matches!(name, "Pi" | "true" | "sqrt" | "print")
    }

    fn constant(&self, name: &str) -> Option<Literal> {
        match name {
            "Pi" => Some(Literal::Float64(std::f64::consts::PI)),
            "true" => Some(Literal::Int32(1)),
            _ => None,
        }
    }

    fn fold_call(&self, name: &str, args: &[Literal]) -> Option<Literal> {
        match (name, args) {
            ("sqrt", [Literal::Int32(v)]) => Some(Literal::Float64(f64::from(*v).sqrt())),
            _ => None,
        }
    }
}

fn folded(source: &str) -> Script {
    let mut script = parse(source).unwrap();
    fold_script(&mut script, &Host);
    script
}

/// Value assigned by `x = <expr>` after folding.
fn folded_value(expr: &str) -> ExprKind {
    let mut script = folded(&format!("x = {expr}"));
    match script.body.remove(0).kind {
        StmtKind::Expr(Expr {
            kind: ExprKind::Assign { value, .. },
            ..
        }) => value.kind,
        other => panic!("unexpected {other:?}"),
    }
}

fn lit(literal: Literal) -> ExprKind {
    ExprKind::Literal(literal)
}

#[test]
fn arithmetic_folds_with_runtime_semantics() {
    assert_eq!(folded_value("1 + 2 * 3"), lit(Literal::Int32(7)));
    assert_eq!(folded_value("7 / 2"), lit(Literal::Int32(3)));
    assert_eq!(folded_value("1 + 0.5"), lit(Literal::Float64(1.5)));
    assert_eq!(folded_value("2147483647 + 1"), lit(Literal::Int32(i32::MIN)));
    assert_eq!(folded_value("-(3)"), lit(Literal::Int32(-3)));
    assert_eq!(folded_value("!0"), lit(Literal::Int32(1)));
    assert_eq!(folded_value("~0"), lit(Literal::Int32(-1)));
}

#[test]
fn strings_concatenate() {
    assert_eq!(folded_value("\"a\" + 1"), lit(Literal::Str("a1".to_owned())));
    assert_eq!(folded_value("\"a\" == \"a\""), lit(Literal::Int32(1)));
}

#[test]
fn errors_are_left_for_runtime() {
    assert!(matches!(
        folded_value("1 / 0"),
        ExprKind::Binary {
            op: BinaryOp::Div,
            ..
        }
    ));
    assert!(matches!(folded_value("-\"a\""), ExprKind::Unary { .. }));
}

#[test]
fn partially_constant_expressions_fold_their_constant_parts() {
    match folded_value("y + 2 * 3") {
        ExprKind::Binary { rhs, .. } => assert_eq!(rhs.kind, lit(Literal::Int32(6))),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn named_constants_are_substituted() {
    assert_eq!(
        folded_value("Pi * 2"),
        lit(Literal::Float64(std::f64::consts::PI * 2.0))
    );
    assert_eq!(folded_value("true"), lit(Literal::Int32(1)));
}

#[test]
fn assignment_targets_are_not_substituted() {
    let script = folded("Pi = 3");
    match &script.body[0].kind {
        StmtKind::Expr(Expr {
            kind: ExprKind::Assign { target, .. },
            ..
        }) => assert_eq!(target.kind, ExprKind::Ident("Pi".to_owned())),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn pure_calls_with_literal_arguments() {
    assert_eq!(folded_value("sqrt(16)"), lit(Literal::Float64(4.0)));
    assert_eq!(folded_value("sqrt(2 * 8)"), lit(Literal::Float64(4.0)));
    assert!(matches!(folded_value("sqrt(y)"), ExprKind::Call { .. }));
    assert!(matches!(folded_value("print(1)"), ExprKind::Call { .. }));
}

#[test]
fn ternary_with_constant_condition() {
    assert_eq!(folded_value("1 ? a : b"), ExprKind::Ident("a".to_owned()));
    assert_eq!(folded_value("0 ? a : b"), ExprKind::Ident("b".to_owned()));
}

#[test]
fn dead_branches_are_pruned() {
    let script = folded("if (0) a = 1; else b = 2; if (1 > 2) c = 3; while (0) d = 4");
    assert_eq!(script.body.len(), 1);
    match &script.body[0].kind {
        StmtKind::Expr(Expr {
            kind: ExprKind::Assign { target, .. },
            ..
        }) => assert_eq!(target.kind, ExprKind::Ident("b".to_owned())),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn false_for_keeps_only_the_initialiser() {
    let script = folded("for (i = 5; 0; ++i) print(i)");
    assert_eq!(script.body.len(), 1);
    assert!(matches!(script.body[0].kind, StmtKind::Expr(_)));
}

#[test]
fn true_for_condition_is_dropped() {
    let script = folded("for (;1;) break");
    assert!(matches!(script.body[0].kind, StmtKind::For { cond: None, .. }));
}

#[test]
fn literal_statements_are_removed() {
    let script = folded("1 + 1; \"x\"; y");
    assert_eq!(script.body.len(), 1);
}

#[test]
fn function_bodies_are_folded() {
    let script = folded("f = function() { return 2 * 21; }");
    let StmtKind::Expr(Expr {
        kind: ExprKind::Assign { value, .. },
        ..
    }) = &script.body[0].kind
    else {
        panic!("expected assignment");
    };
    let ExprKind::Function(function) = &value.kind else {
        panic!("expected function literal");
    };
    match &function.body[0].kind {
        StmtKind::Return(Some(expr)) => assert_eq!(expr.kind, lit(Literal::Int32(42))),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn fold_count_is_reported() {
    let mut script = parse("x = 1 + 2; y = z").unwrap();
    assert_eq!(fold_script(&mut script, &NoGlobals), 1);
    let mut script = parse("y = z").unwrap();
    assert_eq!(fold_script(&mut script, &NoGlobals), 0);
}
