use super::section::Plot;
use crate::error::{Error, ErrorKind, Result};
use crate::tree::{Kind, Lit, Node, Printer};
use tracing::debug;

/// Identifier that marks the catch-all arm of a literal comparison cascade
pub const WILDCARD: &str = "OTHER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Yes,
    No,
}

/// `subject == literal` extracted from a rule test
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub subject: String,
    pub value: Option<Lit>, // None: wildcard
}

impl Comparison {
    pub fn is_wildcard(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub polarity: Polarity,
    pub test: Node,
    pub text: String,
    pub line: usize,
    pub comparison: Option<Comparison>,
    pub matched: Chain,
    pub alternate: Chain,
}

#[derive(Debug, Clone)]
pub enum Decision {
    Rule(Rule),
    Action {
        stmt: Node,
        text: String,
        line: usize,
        next: Chain,
    },
}

pub type Chain = Option<Box<Decision>>;

impl Decision {
    pub fn text(&self) -> &str {
        match self {
            Decision::Rule(rule) => &rule.text,
            Decision::Action { text, .. } => text,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Decision::Rule(rule) => rule.line,
            Decision::Action { line, .. } => *line,
        }
    }
}

/// Builds one chain per plot and fuses them into a single decision tree.
pub struct DecisionTreeBuilder<'p> {
    printer: &'p dyn Printer,
}

impl<'p> DecisionTreeBuilder<'p> {
    pub fn new(printer: &'p dyn Printer) -> Self {
        DecisionTreeBuilder { printer }
    }

    /// Merge all plots of a section. Empty plots contribute nothing.
    pub fn build(&self, plots: Vec<Plot>) -> Result<Chain> {
        let mut chains = plots
            .into_iter()
            .filter(|plot| !plot.body.is_empty())
            .map(|plot| {
                debug!(plot = %plot.name, statements = plot.body.len(), "building scenario chain");
                self.chain(plot.body)
            });
        let mut root = match chains.next() {
            Some(chain) => chain,
            None => return Ok(None),
        };
        for chain in chains {
            merge(&mut root, chain)?;
        }
        Ok(root)
    }

    /// Statements of one plot, left to right, as a singly linked chain.
    pub fn chain(&self, body: Vec<Node>) -> Chain {
        body.into_iter()
            .rev()
            .fold(None, |next, stmt| Some(Box::new(self.node(stmt, next))))
    }

    fn node(&self, stmt: Node, next: Chain) -> Decision {
        let line = stmt.line;
        let rule = match &stmt.kind {
            Kind::Expression { expression } => match &expression.kind {
                Kind::Call { callee, arguments } if arguments.len() == 1 => match callee.as_ident() {
                    Some("yes") => Some((Polarity::Yes, arguments[0].clone())),
                    Some("no") => Some((Polarity::No, arguments[0].clone())),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };
        match rule {
            Some((polarity, test)) => Decision::Rule(Rule {
                polarity,
                text: self.printer.print(&test),
                comparison: self.comparison(&test),
                test,
                line,
                matched: next,
                alternate: None,
            }),
            None => Decision::Action {
                text: self.printer.print(&stmt),
                stmt,
                line,
                next,
            },
        }
    }

    fn comparison(&self, test: &Node) -> Option<Comparison> {
        let Kind::Binary {
            operator,
            left,
            right,
        } = &test.kind
        else {
            return None;
        };
        if operator != "==" && operator != "===" {
            return None;
        }
        let (subject, value) = match (operand_value(right), operand_value(left)) {
            (Some(value), _) => (left, value),
            (None, Some(value)) => (right, value),
            (None, None) => return None,
        };
        Some(Comparison {
            subject: self.printer.print(subject),
            value,
        })
    }
}

/// Literal value of a comparison operand; `Some(None)` for the wildcard
fn operand_value(node: &Node) -> Option<Option<Lit>> {
    match &node.kind {
        Kind::Literal { value } => Some(Some(value.clone())),
        Kind::Identifier { name } if name == WILDCARD => Some(None),
        _ => None,
    }
}

/// Fold `addition` into `main`. A side that is absent ends the walk: the shorter
/// chain already left the function at its last statement.
pub fn merge(main: &mut Chain, addition: Chain) -> Result<()> {
    match (main.as_deref_mut(), addition) {
        (Some(main), Some(addition)) => merge_nodes(main, *addition),
        _ => Ok(()),
    }
}

/// Hang `addition` off an alternate slot, merging when the slot is taken.
fn attach(slot: &mut Chain, addition: Chain) -> Result<()> {
    match slot {
        Some(_) => merge(slot, addition),
        None => {
            *slot = addition;
            Ok(())
        }
    }
}

/// How a pair of rules relates before the generic rules apply.
enum Pairing {
    /// Same subject against a different literal, or a trailing wildcard
    Cascade,
    /// Same subject against an equal literal; only identical tests may merge
    Overlap,
    Unrelated,
}

fn pairing(main: &Rule, addition: &Rule) -> Result<Pairing> {
    let (Some(mc), Some(ac)) = (&main.comparison, &addition.comparison) else {
        return Ok(Pairing::Unrelated);
    };
    if mc.subject != ac.subject || main.text == addition.text {
        return Ok(Pairing::Unrelated);
    }
    if mc.is_wildcard() {
        return Err(Error::at(ErrorKind::WildcardNotLast(mc.subject.clone()), addition.line));
    }
    if ac.is_wildcard() {
        if main.polarity != addition.polarity {
            return Err(Error::at(ErrorKind::WildcardPolarity(ac.subject.clone()), addition.line));
        }
        return Ok(Pairing::Cascade);
    }
    if mc.value == ac.value {
        Ok(Pairing::Overlap)
    } else {
        Ok(Pairing::Cascade)
    }
}

fn merge_nodes(main: &mut Decision, addition: Decision) -> Result<()> {
    if let Decision::Rule(m) = main {
        let relation = match &addition {
            Decision::Rule(a) => pairing(m, a)?,
            Decision::Action { .. } => Pairing::Unrelated,
        };
        match relation {
            Pairing::Cascade => return attach(&mut m.alternate, Some(Box::new(addition))),
            // An unrelated test acts as an independent guard
            Pairing::Unrelated if m.text != addition.text() => {
                return attach(&mut m.alternate, Some(Box::new(addition)))
            }
            _ => {}
        }
    }

    match (main, addition) {
        (
            Decision::Action { text, next, .. },
            Decision::Action {
                text: atext,
                next: anext,
                ..
            },
        ) if *text == atext => merge(next, anext),
        (Decision::Rule(m), Decision::Rule(a)) if m.text == a.text => {
            if m.polarity == a.polarity {
                merge(&mut m.matched, a.matched)
            } else {
                attach(&mut m.alternate, a.matched)
            }
        }
        (_, addition) => Err(Error::at(ErrorKind::NotMutuallyExclusive, addition.line())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build::*;
    use crate::tree::JsPrinter;

    fn rule(name: &str, test: Node) -> Node {
        stmt(call_named(name, vec![test]))
    }

    #[test]
    fn test_chain_order() {
        let printer = JsPrinter::new();
        let builder = DecisionTreeBuilder::new(&printer);
        let chain = builder.chain(vec![
            rule("yes", ident("a")),
            stmt(call_named("f", vec![])),
            ret(Some(num(1.0))),
        ]);
        let Some(first) = chain else { panic!("empty chain") };
        let Decision::Rule(rule) = *first else { panic!("rule expected") };
        assert_eq!(rule.text, "a");
        assert_eq!(rule.polarity, Polarity::Yes);
        let Some(second) = rule.matched else { panic!("action expected") };
        assert_eq!(second.text(), "f();");
    }

    #[test]
    fn test_comparison_extraction() {
        let printer = JsPrinter::new();
        let builder = DecisionTreeBuilder::new(&printer);
        let left = builder.comparison(&binary("===", member(ident("req"), "kind"), text("get")));
        assert_eq!(
            left,
            Some(Comparison {
                subject: "req.kind".to_string(),
                value: Some(Lit::Str("get".to_string())),
            })
        );
        let reversed = builder.comparison(&binary("==", num(2.0), ident("x")));
        assert_eq!(reversed.map(|c| c.subject), Some("x".to_string()));
        let wildcard = builder.comparison(&binary("===", ident("x"), ident("OTHER")));
        assert!(wildcard.map_or(false, |c| c.is_wildcard()));
        assert_eq!(builder.comparison(&binary("<", ident("x"), num(1.0))), None);
        assert_eq!(builder.comparison(&binary("===", ident("x"), ident("y"))), None);
    }
}
