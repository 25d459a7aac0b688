use son::tree::build::*;
use son::{JsPrinter, JsonTreeParser, Node, Printer, SourceParser};
use std::path::Path;

fn assert(node: Node, expected: &str) {
    let text = JsPrinter::new().print(&node);
    println!("{}", text);
    assert_eq!(text, expected);
}

macro_rules! case {
    ($name:ident, $node:expr, $expected:expr) => {
        #[test]
        fn $name() {
            assert($node, $expected);
        }
    };
}

case!(
    precedence_left,
    binary("*", binary("+", ident("a"), ident("b")), ident("c")),
    "(a + b) * c"
);
case!(
    precedence_right,
    binary("-", ident("a"), binary("-", ident("b"), ident("c"))),
    "a - (b - c)"
);
case!(
    power_right_assoc,
    binary("**", ident("a"), binary("**", ident("b"), ident("c"))),
    "a ** b ** c"
);
case!(negated_comparison, not(binary("===", ident("x"), num(1.0))), "!(x === 1)");
case!(literals, array(vec![null(), boolean(true), num(1.5), text("a\"b")]), r#"[null, true, 1.5, "a\"b"]"#);
case!(computed_member, index(ident("list"), num(0.0)), "list[0]");
case!(object_statement, stmt(object(vec![("a", num(1.0))])), "({\n    a: 1\n});");
case!(quoted_key, object(vec![("two words", num(2.0))]), "{\n    \"two words\": 2\n}");
case!(throw_statement, throw(call(ident("Error"), vec![text("bad")])), "throw Error(\"bad\");");

case!(
    else_chain,
    if_else(
        ident("a"),
        vec![ret(Some(num(1.0)))],
        Some(vec![if_else(ident("b"), vec![ret(Some(num(2.0)))], Some(vec![ret(None)]))]),
    ),
    "if (a) {\n    return 1;\n} else if (b) {\n    return 2;\n} else {\n    return;\n}"
);

case!(
    nested_function,
    function("outer", &["x"], vec![function("inner", &[], vec![]), ret(Some(call_named("inner", vec![])))]),
    "function outer(x) {\n    function inner() {}\n    return inner();\n}"
);

#[test]
fn parses_program_object() {
    let text = r#"{
        "body": [
            {"type": "Expression", "line": 1, "expression": {
                "type": "Call", "line": 1,
                "callee": {"type": "Identifier", "name": "fun"},
                "arguments": [{"type": "Identifier", "name": "n"}]
            }},
            {"type": "If", "line": 2,
                "test": {"type": "Binary", "operator": "<", "left": {"type": "Identifier", "name": "n"}, "right": {"type": "Literal", "value": 0}},
                "consequent": {"type": "Block", "body": [{"type": "Throw", "argument": {"type": "Literal", "value": "negative"}}]}
            },
            {"type": "Return", "line": 3, "argument": {"type": "Identifier", "name": "n"}}
        ]
    }"#;
    let body = JsonTreeParser::new().parse(text, Path::new("abs.json")).unwrap();
    assert_eq!(body.len(), 3);
    assert_eq!(body[1].line, 2);
    assert_eq!(
        JsPrinter::new().print_body(&body),
        "fun(n);\nif (n < 0) {\n    throw \"negative\";\n}\nreturn n;"
    );
}

#[test]
fn parses_statement_array() {
    let text = r#"[{"type": "Break"}, {"type": "Expression", "expression": {"type": "Literal", "value": null}}]"#;
    let body = JsonTreeParser::new().parse(text, Path::new("a.json")).unwrap();
    assert_eq!(JsPrinter::new().print_body(&body), "break;\nnull;");
}
