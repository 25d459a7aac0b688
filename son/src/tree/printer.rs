use super::node::{Declarator, Function, FunctionForm, Kind, Node};
use itertools::Itertools;

/// Renders trees back to source text.
/// The compiler also uses it to obtain the canonical text of a test or statement
/// when comparing scenarios, so equal trees must render identically.
pub trait Printer {
    fn print(&self, node: &Node) -> String;

    fn print_body(&self, body: &[Node]) -> String {
        body.iter().map(|node| self.print(node)).join("\n")
    }
}

/// JavaScript renderer with 4-space indentation
#[derive(Debug, Clone, Default)]
pub struct JsPrinter;

// Binding power of each expression form
const ASSIGN: u8 = 3;
const CONDITIONAL: u8 = 4;
const UNARY: u8 = 17;
const POSTFIX: u8 = 18;
const CALL: u8 = 19;
const PRIMARY: u8 = 20;

fn binary_precedence(operator: &str) -> u8 {
    match operator {
        "??" => 5,
        "||" => 6,
        "&&" => 7,
        "|" => 8,
        "^" => 9,
        "&" => 10,
        "==" | "!=" | "===" | "!==" => 11,
        "<" | ">" | "<=" | ">=" | "in" | "instanceof" => 12,
        "<<" | ">>" | ">>>" => 13,
        "+" | "-" => 14,
        "*" | "/" | "%" => 15,
        "**" => 16,
        _ => 11,
    }
}

fn precedence(node: &Node) -> u8 {
    match &node.kind {
        Kind::Assign { .. } => ASSIGN,
        Kind::Function(func) if func.form == FunctionForm::Arrow => ASSIGN,
        Kind::Conditional { .. } => CONDITIONAL,
        Kind::Binary { operator, .. } => binary_precedence(operator),
        Kind::Unary { .. } | Kind::Await { .. } => UNARY,
        Kind::Update { prefix: true, .. } => UNARY,
        Kind::Update { prefix: false, .. } => POSTFIX,
        Kind::Call { .. } | Kind::New { .. } | Kind::Member { .. } => CALL,
        _ => PRIMARY,
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn pad(level: usize) -> String {
    "    ".repeat(level)
}

impl Printer for JsPrinter {
    fn print(&self, node: &Node) -> String {
        if node.is_statement() {
            self.statement(node, 0)
        } else {
            self.expr(node, 0, 0)
        }
    }
}

impl JsPrinter {
    pub fn new() -> Self {
        JsPrinter
    }

    fn statement(&self, node: &Node, level: usize) -> String {
        let indent = pad(level);
        match &node.kind {
            Kind::Expression { expression } => {
                let text = self.expr(expression, 0, level);
                // An expression statement must not start like a declaration or a block
                let wrap = match &expression.kind {
                    Kind::Object { .. } => true,
                    Kind::Function(func) => func.form == FunctionForm::Expression,
                    _ => false,
                };
                if wrap {
                    format!("{}({});", indent, text)
                } else {
                    format!("{}{};", indent, text)
                }
            }
            Kind::Declaration { .. } => format!("{}{};", indent, self.declaration(node, level)),
            Kind::Block { body } => format!("{}{}", indent, self.block(body, level)),
            Kind::If { .. } => format!("{}{}", indent, self.if_chain(node, level)),
            Kind::Switch {
                discriminant,
                cases,
            } => {
                let mut out = format!("{}switch ({}) {{\n", indent, self.expr(discriminant, 0, level));
                for case in cases {
                    match &case.test {
                        Some(test) => out.push_str(&format!(
                            "{}case {}:\n",
                            pad(level + 1),
                            self.expr(test, 0, level + 1)
                        )),
                        None => out.push_str(&format!("{}default:\n", pad(level + 1))),
                    }
                    for stmt in &case.body {
                        out.push_str(&self.statement(stmt, level + 2));
                        out.push('\n');
                    }
                }
                out.push_str(&indent);
                out.push('}');
                out
            }
            Kind::For {
                init,
                test,
                update,
                body,
            } => {
                let init = init.as_ref().map_or(String::new(), |init| match &init.kind {
                    Kind::Declaration { .. } => self.declaration(init, level),
                    Kind::Expression { expression } => self.expr(expression, 0, level),
                    _ => self.expr(init, 0, level),
                });
                let test = test.as_ref().map_or(String::new(), |t| format!(" {}", self.expr(t, 0, level)));
                let update = update
                    .as_ref()
                    .map_or(String::new(), |u| format!(" {}", self.expr(u, 0, level)));
                format!(
                    "{}for ({};{};{}) {}",
                    indent,
                    init,
                    test,
                    update,
                    self.clause(body, level)
                )
            }
            Kind::ForIn {
                left,
                right,
                body,
                of,
            } => {
                let left = match &left.kind {
                    Kind::Declaration { .. } => self.declaration(left, level),
                    _ => self.expr(left, 0, level),
                };
                format!(
                    "{}for ({} {} {}) {}",
                    indent,
                    left,
                    if *of { "of" } else { "in" },
                    self.expr(right, 0, level),
                    self.clause(body, level)
                )
            }
            Kind::While { test, body } => format!(
                "{}while ({}) {}",
                indent,
                self.expr(test, 0, level),
                self.clause(body, level)
            ),
            Kind::Return { argument: None } => format!("{}return;", indent),
            Kind::Return {
                argument: Some(argument),
            } => format!("{}return {};", indent, self.expr(argument, 0, level)),
            Kind::Throw { argument } => format!("{}throw {};", indent, self.expr(argument, 0, level)),
            Kind::Break => format!("{}break;", indent),
            Kind::Continue => format!("{}continue;", indent),
            Kind::Function(func) if func.form == FunctionForm::Declaration => {
                format!("{}{}", indent, self.function(func, level))
            }
            _ => format!("{}{};", indent, self.expr(node, 0, level)),
        }
    }

    fn block(&self, body: &[Node], level: usize) -> String {
        if body.is_empty() {
            return "{}".to_string();
        }
        let mut out = String::from("{\n");
        for stmt in body {
            out.push_str(&self.statement(stmt, level + 1));
            out.push('\n');
        }
        out.push_str(&pad(level));
        out.push('}');
        out
    }

    /// Body of a compound statement, always braced
    fn clause(&self, node: &Node, level: usize) -> String {
        match &node.kind {
            Kind::Block { body } => self.block(body, level),
            _ => self.block(std::slice::from_ref(node), level),
        }
    }

    fn if_chain(&self, node: &Node, level: usize) -> String {
        let Kind::If {
            test,
            consequent,
            alternate,
        } = &node.kind
        else {
            return self.statement(node, level);
        };
        let mut out = format!(
            "if ({}) {}",
            self.expr(test, 0, level),
            self.clause(consequent, level)
        );
        if let Some(alternate) = alternate {
            let nested = match &alternate.kind {
                Kind::If { .. } => Some(alternate.as_ref()),
                Kind::Block { body } if body.len() == 1 && matches!(body[0].kind, Kind::If { .. }) => {
                    Some(&body[0])
                }
                _ => None,
            };
            match nested {
                Some(nested) => {
                    out.push_str(" else ");
                    out.push_str(&self.if_chain(nested, level));
                }
                None => {
                    out.push_str(" else ");
                    out.push_str(&self.clause(alternate, level));
                }
            }
        }
        out
    }

    fn declaration(&self, node: &Node, level: usize) -> String {
        let Kind::Declaration { kind, declarations } = &node.kind else {
            return String::new();
        };
        let items = declarations
            .iter()
            .map(|Declarator { name, init }| match init {
                Some(init) => format!("{} = {}", name, self.expr(init, ASSIGN, level)),
                None => name.clone(),
            })
            .join(", ");
        format!("{} {}", kind, items)
    }

    fn function(&self, func: &Function, level: usize) -> String {
        let prefix = if func.is_async { "async " } else { "" };
        let params = func.params.join(", ");
        let body = self.block(&func.body, level);
        match func.form {
            FunctionForm::Arrow => format!("{}({}) => {}", prefix, params, body),
            _ => format!(
                "{}function {}({}) {}",
                prefix,
                func.name.as_deref().unwrap_or(""),
                params,
                body
            ),
        }
    }

    fn args(&self, args: &[Node], level: usize) -> String {
        args.iter().map(|arg| self.expr(arg, ASSIGN, level)).join(", ")
    }

    /// Render an expression, parenthesized when it binds looser than `min`.
    fn expr(&self, node: &Node, min: u8, level: usize) -> String {
        let text = match &node.kind {
            Kind::Identifier { name } => name.clone(),
            Kind::Literal { value } => value.to_string(),
            Kind::Array { elements } => format!("[{}]", self.args(elements, level)),
            Kind::Object { properties } if properties.is_empty() => "{}".to_string(),
            Kind::Object { properties } => {
                let entries = properties
                    .iter()
                    .map(|p| {
                        let key = if is_plain_key(&p.key) {
                            p.key.clone()
                        } else {
                            serde_json::to_string(&p.key).unwrap_or_else(|_| p.key.clone())
                        };
                        format!("{}{}: {}", pad(level + 1), key, self.expr(&p.value, ASSIGN, level + 1))
                    })
                    .join(",\n");
                format!("{{\n{}\n{}}}", entries, pad(level))
            }
            Kind::Function(func) => self.function(func, level),
            Kind::Unary { operator, argument } => {
                let space = if operator.chars().all(|c| c.is_ascii_alphabetic()) { " " } else { "" };
                format!("{}{}{}", operator, space, self.expr(argument, UNARY, level))
            }
            Kind::Update {
                operator,
                prefix: true,
                argument,
            } => format!("{}{}", operator, self.expr(argument, UNARY, level)),
            Kind::Update {
                operator,
                prefix: false,
                argument,
            } => format!("{}{}", self.expr(argument, POSTFIX, level), operator),
            Kind::Binary {
                operator,
                left,
                right,
            } => {
                let prec = binary_precedence(operator);
                let (lmin, rmin) = if operator == "**" { (prec + 1, prec) } else { (prec, prec + 1) };
                format!(
                    "{} {} {}",
                    self.expr(left, lmin, level),
                    operator,
                    self.expr(right, rmin, level)
                )
            }
            Kind::Assign {
                operator,
                left,
                right,
            } => format!(
                "{} {} {}",
                self.expr(left, CALL, level),
                operator,
                self.expr(right, ASSIGN, level)
            ),
            Kind::Conditional {
                test,
                consequent,
                alternate,
            } => format!(
                "{} ? {} : {}",
                self.expr(test, CONDITIONAL + 1, level),
                self.expr(consequent, ASSIGN, level),
                self.expr(alternate, ASSIGN, level)
            ),
            Kind::Call { callee, arguments } => {
                format!("{}({})", self.expr(callee, CALL, level), self.args(arguments, level))
            }
            Kind::New { callee, arguments } => {
                format!("new {}({})", self.expr(callee, PRIMARY, level), self.args(arguments, level))
            }
            Kind::Member {
                object,
                property,
                computed: false,
            } => format!("{}.{}", self.expr(object, CALL, level), self.expr(property, PRIMARY, level)),
            Kind::Member {
                object,
                property,
                computed: true,
            } => format!("{}[{}]", self.expr(object, CALL, level), self.expr(property, 0, level)),
            Kind::Await { argument } => format!("await {}", self.expr(argument, UNARY, level)),
            // Statements never appear in expression position; render them verbatim
            _ => self.statement(node, level).trim_start().to_string(),
        };
        if precedence(node) < min {
            format!("({})", text)
        } else {
            text
        }
    }
}
