use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoStaticStr;

/// One node of the generic syntax tree with the source line it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: Kind,
    #[serde(default)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type")]
pub enum Kind {
    // Expressions
    Identifier { name: String },                               // ident
    Literal { value: Lit },                                    // null | bool | number | string
    Array { elements: Vec<Node> },                             // "[" [ expr { "," expr } ] "]"
    Object { properties: Vec<Property> },                      // "{" [ key ":" expr { "," ... } ] "}"
    Function(Function),                                        // function / arrow
    Unary { operator: String, argument: Box<Node> },           // op expr
    Update { operator: String, prefix: bool, argument: Box<Node> }, // "++" expr | expr "++"
    Binary { operator: String, left: Box<Node>, right: Box<Node> }, // expr op expr
    Assign { operator: String, left: Box<Node>, right: Box<Node> }, // expr "=" expr
    Conditional { test: Box<Node>, consequent: Box<Node>, alternate: Box<Node> }, // expr "?" expr ":" expr
    Call { callee: Box<Node>, arguments: Vec<Node> },          // expr "(" args ")"
    New { callee: Box<Node>, arguments: Vec<Node> },           // "new" expr "(" args ")"
    Member { object: Box<Node>, property: Box<Node>, #[serde(default)] computed: bool }, // expr "." ident | expr "[" expr "]"
    Await { argument: Box<Node> },                             // "await" expr

    // Statements
    Expression { expression: Box<Node> },                      // expr ";"
    Declaration { kind: DeclKind, declarations: Vec<Declarator> }, // ("var" | "let" | "const") decl { "," decl } ";"
    Block { body: Vec<Node> },                                 // "{" { stmt } "}"
    If {
        test: Box<Node>,
        consequent: Box<Node>,
        #[serde(default)]
        alternate: Option<Box<Node>>,
    }, // "if" "(" expr ")" stmt [ "else" stmt ]
    Switch { discriminant: Box<Node>, cases: Vec<SwitchCase> }, // "switch" "(" expr ")" "{" { case } "}"
    For {
        #[serde(default)]
        init: Option<Box<Node>>,
        #[serde(default)]
        test: Option<Box<Node>>,
        #[serde(default)]
        update: Option<Box<Node>>,
        body: Box<Node>,
    }, // "for" "(" [ init ] ";" [ expr ] ";" [ expr ] ")" stmt
    ForIn { left: Box<Node>, right: Box<Node>, body: Box<Node>, #[serde(default)] of: bool }, // "for" "(" lhs ("in" | "of") expr ")" stmt
    While { test: Box<Node>, body: Box<Node> },                // "while" "(" expr ")" stmt
    Return {
        #[serde(default)]
        argument: Option<Box<Node>>,
    }, // "return" [ expr ] ";"
    Throw { argument: Box<Node> },                             // "throw" expr ";"
    Break,                                                     // "break" ";"
    Continue,                                                  // "continue" ";"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lit {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionForm {
    #[default]
    Declaration,
    Expression,
    Arrow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub params: Vec<String>,
    pub body: Vec<Node>,
    #[serde(default, rename = "async")]
    pub is_async: bool,
    #[serde(default)]
    pub form: FunctionForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub name: String,
    #[serde(default)]
    pub init: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub test: Option<Node>,
    pub body: Vec<Node>,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Var => write!(f, "var"),
            DeclKind::Let => write!(f, "let"),
            DeclKind::Const => write!(f, "const"),
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lit::Null => write!(f, "null"),
            Lit::Bool(b) => write!(f, "{}", b),
            Lit::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 => {
                write!(f, "{}", *n as i64)
            }
            Lit::Number(n) => write!(f, "{}", n),
            Lit::Str(s) => {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                write!(f, "{}", quoted)
            }
        }
    }
}

impl Node {
    pub fn new(kind: Kind, line: usize) -> Self {
        Node { kind, line }
    }

    /// Variant name, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        (&self.kind).into()
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            Kind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// `name(args);` as a statement, where `name` is a bare identifier
    pub fn reserved_call(&self) -> Option<(&str, &[Node])> {
        let Kind::Expression { expression } = &self.kind else {
            return None;
        };
        match &expression.kind {
            Kind::Call { callee, arguments } => callee.as_ident().map(|name| (name, arguments.as_slice())),
            _ => None,
        }
    }

    /// Return or throw: control never falls through
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, Kind::Return { .. } | Kind::Throw { .. })
    }

    pub fn is_statement(&self) -> bool {
        match &self.kind {
            Kind::Function(func) => func.form == FunctionForm::Declaration,
            Kind::Expression { .. }
            | Kind::Declaration { .. }
            | Kind::Block { .. }
            | Kind::If { .. }
            | Kind::Switch { .. }
            | Kind::For { .. }
            | Kind::ForIn { .. }
            | Kind::While { .. }
            | Kind::Return { .. }
            | Kind::Throw { .. }
            | Kind::Break
            | Kind::Continue => true,
            _ => false,
        }
    }

    /// Rebuild this node with every direct child passed through `f`.
    /// Scalars (names, operators, flags) are carried over unchanged.
    pub fn try_map<E, F>(self, f: &mut F) -> Result<Node, E>
    where
        F: FnMut(Node) -> Result<Node, E>,
    {
        let Node { kind, line } = self;
        let kind = match kind {
            Kind::Identifier { name } => Kind::Identifier { name },
            Kind::Literal { value } => Kind::Literal { value },
            Kind::Array { elements } => Kind::Array {
                elements: map_vec(elements, f)?,
            },
            Kind::Object { properties } => Kind::Object {
                properties: properties
                    .into_iter()
                    .map(|Property { key, value }| Ok(Property { key, value: f(value)? }))
                    .collect::<Result<_, E>>()?,
            },
            Kind::Function(func) => Kind::Function(Function {
                body: map_vec(func.body, f)?,
                ..func
            }),
            Kind::Unary { operator, argument } => Kind::Unary {
                operator,
                argument: map_box(argument, f)?,
            },
            Kind::Update {
                operator,
                prefix,
                argument,
            } => Kind::Update {
                operator,
                prefix,
                argument: map_box(argument, f)?,
            },
            Kind::Binary {
                operator,
                left,
                right,
            } => Kind::Binary {
                operator,
                left: map_box(left, f)?,
                right: map_box(right, f)?,
            },
            Kind::Assign {
                operator,
                left,
                right,
            } => Kind::Assign {
                operator,
                left: map_box(left, f)?,
                right: map_box(right, f)?,
            },
            Kind::Conditional {
                test,
                consequent,
                alternate,
            } => Kind::Conditional {
                test: map_box(test, f)?,
                consequent: map_box(consequent, f)?,
                alternate: map_box(alternate, f)?,
            },
            Kind::Call { callee, arguments } => Kind::Call {
                callee: map_box(callee, f)?,
                arguments: map_vec(arguments, f)?,
            },
            Kind::New { callee, arguments } => Kind::New {
                callee: map_box(callee, f)?,
                arguments: map_vec(arguments, f)?,
            },
            Kind::Member {
                object,
                property,
                computed,
            } => Kind::Member {
                object: map_box(object, f)?,
                property: map_box(property, f)?,
                computed,
            },
            Kind::Await { argument } => Kind::Await {
                argument: map_box(argument, f)?,
            },
            Kind::Expression { expression } => Kind::Expression {
                expression: map_box(expression, f)?,
            },
            Kind::Declaration { kind, declarations } => Kind::Declaration {
                kind,
                declarations: declarations
                    .into_iter()
                    .map(|Declarator { name, init }| {
                        Ok(Declarator {
                            name,
                            init: init.map(&mut *f).transpose()?,
                        })
                    })
                    .collect::<Result<_, E>>()?,
            },
            Kind::Block { body } => Kind::Block {
                body: map_vec(body, f)?,
            },
            Kind::If {
                test,
                consequent,
                alternate,
            } => Kind::If {
                test: map_box(test, f)?,
                consequent: map_box(consequent, f)?,
                alternate: map_opt(alternate, f)?,
            },
            Kind::Switch {
                discriminant,
                cases,
            } => Kind::Switch {
                discriminant: map_box(discriminant, f)?,
                cases: cases
                    .into_iter()
                    .map(|SwitchCase { test, body }| {
                        Ok(SwitchCase {
                            test: test.map(&mut *f).transpose()?,
                            body: map_vec(body, f)?,
                        })
                    })
                    .collect::<Result<_, E>>()?,
            },
            Kind::For {
                init,
                test,
                update,
                body,
            } => Kind::For {
                init: map_opt(init, f)?,
                test: map_opt(test, f)?,
                update: map_opt(update, f)?,
                body: map_box(body, f)?,
            },
            Kind::ForIn {
                left,
                right,
                body,
                of,
            } => Kind::ForIn {
                left: map_box(left, f)?,
                right: map_box(right, f)?,
                body: map_box(body, f)?,
                of,
            },
            Kind::While { test, body } => Kind::While {
                test: map_box(test, f)?,
                body: map_box(body, f)?,
            },
            Kind::Return { argument } => Kind::Return {
                argument: map_opt(argument, f)?,
            },
            Kind::Throw { argument } => Kind::Throw {
                argument: map_box(argument, f)?,
            },
            Kind::Break => Kind::Break,
            Kind::Continue => Kind::Continue,
        };
        Ok(Node { kind, line })
    }
}

fn map_box<E, F>(node: Box<Node>, f: &mut F) -> Result<Box<Node>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
{
    f(*node).map(Box::new)
}

fn map_opt<E, F>(node: Option<Box<Node>>, f: &mut F) -> Result<Option<Box<Node>>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
{
    node.map(|node| map_box(node, f)).transpose()
}

fn map_vec<E, F>(nodes: Vec<Node>, f: &mut F) -> Result<Vec<Node>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
{
    nodes.into_iter().map(|node| f(node)).collect()
}
