use son::compile::scope::{collect_declarations, scope_body, suspend_computes, AlgorithmKind, Algorithms, VariableContext};
use son::tree::build::*;
use son::{JsPrinter, Node, Printer};

fn algorithms() -> Algorithms {
    let mut algorithms = Algorithms::new();
    algorithms.insert("total".to_string(), AlgorithmKind::Property { lazy: false });
    algorithms.insert("helper".to_string(), AlgorithmKind::Function);
    algorithms
}

fn render(body: &[Node]) -> String {
    JsPrinter::new().print_body(body)
}

#[test]
fn hoists_free_assignments_in_order() {
    let algorithms = Algorithms::new();
    let mut ctx = VariableContext::new(&algorithms);
    ctx.declared.insert("known".to_string());
    let body = vec![
        stmt(assign(ident("b"), num(1.0))),
        stmt(assign(ident("a"), ident("b"))),
        stmt(assign(ident("known"), num(2.0))),
        stmt(assign(ident("b"), num(3.0))),
    ];
    let body = scope_body(body, &mut ctx).unwrap();
    assert_eq!(render(&body), "var b, a;\nb = 1;\na = b;\nknown = 2;\nb = 3;");
}

#[test]
fn nested_function_gets_own_scope() {
    let algorithms = algorithms();
    let mut ctx = VariableContext::new(&algorithms).compiling("helper");
    let inner = arrow(&["item"], vec![stmt(assign(ident("seen"), ident("total"))), ret(Some(ident("item")))]);
    let body = vec![
        stmt(assign(ident("outer"), num(0.0))),
        stmt(call(member(ident("list"), "forEach"), vec![inner])),
    ];
    let body = scope_body(body, &mut ctx).unwrap();
    assert_eq!(
        render(&body),
        "var outer;\nouter = 0;\nlist.forEach((item) => {\n    var seen;\n    seen = total;\n    return item;\n});"
    );
    assert!(ctx.deps.contains("total"));
    assert!(!ctx.free.contains("seen"));
}

#[test]
fn recursion_is_not_a_dependency() {
    let algorithms = algorithms();
    let mut ctx = VariableContext::new(&algorithms).compiling("helper");
    let body = vec![ret(Some(call_named("helper", vec![])))];
    scope_body(body, &mut ctx).unwrap();
    assert!(ctx.deps.is_empty());
}

#[test]
fn compute_becomes_aggregate_call() {
    let algorithms = algorithms();
    let mut ctx = VariableContext::new(&algorithms);
    let body = vec![stmt(call_named("compute", vec![ident("total")]))];
    let body = scope_body(body, &mut ctx).unwrap();
    assert_eq!(render(&body), "__compute_all_total();");
    assert!(ctx.computes.contains("total"));
    assert!(ctx.deps.contains("total"));
}

#[test]
fn compute_argument_checks() {
    let algorithms = algorithms();
    let mut ctx = VariableContext::new(&algorithms);
    let err = scope_body(vec![stmt(call_named("compute", vec![]))], &mut ctx).unwrap_err();
    assert_eq!(err.code(), "SON0013");
    let err = scope_body(vec![stmt(call_named("compute", vec![text("total")]))], &mut ctx).unwrap_err();
    assert_eq!(err.code(), "SON0013");
    let err = scope_body(vec![stmt(call_named("compute", vec![ident("helper")]))], &mut ctx).unwrap_err();
    assert_eq!(err.code(), "SON0020");
}

#[test]
fn await_marks_only_its_own_scope() {
    let algorithms = Algorithms::new();
    let mut ctx = VariableContext::new(&algorithms);
    let inner = arrow(&[], vec![stmt(awaited(call_named("load", vec![])))]);
    scope_body(vec![stmt(call_named("defer", vec![inner]))], &mut ctx).unwrap();
    assert!(!ctx.suspends);
    scope_body(vec![stmt(awaited(call_named("load", vec![])))], &mut ctx).unwrap();
    assert!(ctx.suspends);
}

#[test]
fn suspension_reaches_innermost_function() {
    let inner = arrow(&[], vec![stmt(call_named("__compute_all_total", vec![]))]);
    let body = vec![
        stmt(call_named("defer", vec![inner])),
        stmt(call_named("__compute_all_other", vec![])),
    ];
    let (body, found) = suspend_computes(body, &|property: &str| property == "total").unwrap();
    assert!(!found);
    assert_eq!(
        render(&body),
        "defer(async () => {\n    await __compute_all_total();\n});\n__compute_all_other();"
    );
}

#[test]
fn declarations_stop_at_functions() {
    let body = vec![
        var("a", num(1.0)),
        if_else(ident("x"), vec![var("b", num(2.0))], Some(vec![var("c", num(3.0))])),
        function("inner", &[], vec![var("hidden", num(0.0))]),
    ];
    assert_eq!(collect_declarations(&body), vec!["a", "b", "c", "inner"]);
}
