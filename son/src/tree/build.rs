//! Shorthand constructors for synthesized nodes. Generated nodes carry the line
//! of the construct they were derived from, or 0 when there is none.

use super::node::{DeclKind, Declarator, Function, FunctionForm, Kind, Lit, Node, Property};

pub fn ident(name: &str) -> Node {
    Node::new(Kind::Identifier { name: name.to_string() }, 0)
}

pub fn num(value: f64) -> Node {
    Node::new(Kind::Literal { value: Lit::Number(value) }, 0)
}

pub fn text(value: &str) -> Node {
    Node::new(Kind::Literal { value: Lit::Str(value.to_string()) }, 0)
}

pub fn boolean(value: bool) -> Node {
    Node::new(Kind::Literal { value: Lit::Bool(value) }, 0)
}

pub fn null() -> Node {
    Node::new(Kind::Literal { value: Lit::Null }, 0)
}

pub fn binary(operator: &str, left: Node, right: Node) -> Node {
    Node::new(
        Kind::Binary {
            operator: operator.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        },
        0,
    )
}

pub fn not(argument: Node) -> Node {
    Node::new(
        Kind::Unary {
            operator: "!".to_string(),
            argument: Box::new(argument),
        },
        0,
    )
}

pub fn assign(left: Node, right: Node) -> Node {
    Node::new(
        Kind::Assign {
            operator: "=".to_string(),
            left: Box::new(left),
            right: Box::new(right),
        },
        0,
    )
}

pub fn call(callee: Node, arguments: Vec<Node>) -> Node {
    Node::new(
        Kind::Call {
            callee: Box::new(callee),
            arguments,
        },
        0,
    )
}

/// `callee(arguments)` where callee is a bare name
pub fn call_named(callee: &str, arguments: Vec<Node>) -> Node {
    call(ident(callee), arguments)
}

pub fn member(object: Node, property: &str) -> Node {
    Node::new(
        Kind::Member {
            object: Box::new(object),
            property: Box::new(ident(property)),
            computed: false,
        },
        0,
    )
}

pub fn index(object: Node, property: Node) -> Node {
    Node::new(
        Kind::Member {
            object: Box::new(object),
            property: Box::new(property),
            computed: true,
        },
        0,
    )
}

pub fn awaited(argument: Node) -> Node {
    Node::new(
        Kind::Await {
            argument: Box::new(argument),
        },
        0,
    )
}

pub fn object(entries: Vec<(&str, Node)>) -> Node {
    let properties = entries
        .into_iter()
        .map(|(key, value)| Property {
            key: key.to_string(),
            value,
        })
        .collect();
    Node::new(Kind::Object { properties }, 0)
}

pub fn array(elements: Vec<Node>) -> Node {
    Node::new(Kind::Array { elements }, 0)
}

pub fn stmt(expression: Node) -> Node {
    let line = expression.line;
    Node::new(
        Kind::Expression {
            expression: Box::new(expression),
        },
        line,
    )
}

pub fn ret(argument: Option<Node>) -> Node {
    Node::new(
        Kind::Return {
            argument: argument.map(Box::new),
        },
        0,
    )
}

pub fn throw(argument: Node) -> Node {
    Node::new(
        Kind::Throw {
            argument: Box::new(argument),
        },
        0,
    )
}

pub fn block(body: Vec<Node>) -> Node {
    Node::new(Kind::Block { body }, 0)
}

pub fn if_else(test: Node, consequent: Vec<Node>, alternate: Option<Vec<Node>>) -> Node {
    Node::new(
        Kind::If {
            test: Box::new(test),
            consequent: Box::new(block(consequent)),
            alternate: alternate.map(|body| Box::new(block(body))),
        },
        0,
    )
}

/// `var a, b, c;` without initializers
pub fn declare<'a>(names: impl IntoIterator<Item = &'a str>) -> Node {
    let declarations = names
        .into_iter()
        .map(|name| Declarator {
            name: name.to_string(),
            init: None,
        })
        .collect();
    Node::new(
        Kind::Declaration {
            kind: DeclKind::Var,
            declarations,
        },
        0,
    )
}

pub fn var(name: &str, init: Node) -> Node {
    Node::new(
        Kind::Declaration {
            kind: DeclKind::Var,
            declarations: vec![Declarator {
                name: name.to_string(),
                init: Some(init),
            }],
        },
        0,
    )
}

pub fn function(name: &str, params: &[&str], body: Vec<Node>) -> Node {
    Node::new(
        Kind::Function(Function {
            name: Some(name.to_string()),
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
            is_async: false,
            form: FunctionForm::Declaration,
        }),
        0,
    )
}

pub fn arrow(params: &[&str], body: Vec<Node>) -> Node {
    Node::new(
        Kind::Function(Function {
            name: None,
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
            is_async: false,
            form: FunctionForm::Arrow,
        }),
        0,
    )
}

/// Give a node (and nothing below it) a source line.
pub fn at(mut node: Node, line: usize) -> Node {
    node.line = line;
    node
}
