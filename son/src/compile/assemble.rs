use super::decision::{Chain, Decision, Polarity, Rule};
use crate::tree::{build, Node};

/// Lower a decision tree to statements. An alternative whose sibling branch
/// already returned or threw is emitted after the `if` instead of in an `else`.
pub fn assemble(chain: Chain, out: &mut Vec<Node>) {
    let Some(decision) = chain else {
        return;
    };
    match *decision {
        Decision::Action { stmt, next, .. } => {
            out.push(stmt);
            assemble(next, out);
        }
        Decision::Rule(rule) => assemble_rule(rule, out),
    }
}

fn assemble_rule(rule: Rule, out: &mut Vec<Node>) {
    let Rule {
        polarity,
        test,
        line,
        comparison,
        matched,
        alternate,
        ..
    } = rule;

    // The catch-all arm of a cascade runs unconditionally once reached
    if comparison.as_ref().map_or(false, |c| c.is_wildcard()) {
        assemble(matched, out);
        return;
    }

    let (upper, lower) = match polarity {
        Polarity::Yes => (matched, alternate),
        Polarity::No => (alternate, matched),
    };

    let mut consequent = Vec::new();
    assemble(upper, &mut consequent);
    let mut alternative = Vec::new();
    assemble(lower, &mut alternative);

    if consequent.is_empty() {
        if !alternative.is_empty() {
            out.push(build::at(build::if_else(build::not(test), alternative, None), line));
        }
        return;
    }

    let terminated = consequent.last().map_or(false, Node::is_terminal);
    if alternative.is_empty() {
        out.push(build::at(build::if_else(test, consequent, None), line));
    } else if terminated {
        out.push(build::at(build::if_else(test, consequent, None), line));
        out.extend(alternative);
    } else {
        out.push(build::at(build::if_else(test, consequent, Some(alternative)), line));
    }
}
