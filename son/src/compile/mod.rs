pub mod assemble;
pub mod decision;
pub mod scope;
pub mod section;

use crate::error::Result;
use crate::tree::{Node, Printer};
use decision::DecisionTreeBuilder;
use scope::VariableContext;
use section::{ensure_unique, SectionBuilder};
use tracing::debug;

const CALCULATOR_PREFIX: &str = "__compute_";
const AGGREGATE_PREFIX: &str = "__compute_all_";

/// Private function computing one property
pub fn calculator_name(property: &str) -> String {
    format!("{}{}", CALCULATOR_PREFIX, property)
}

/// Private function recomputing a property and everything it eagerly depends on
pub fn aggregate_name(property: &str) -> String {
    format!("{}{}", AGGREGATE_PREFIX, property)
}

pub fn aggregated_property(name: &str) -> Option<&str> {
    name.strip_prefix(AGGREGATE_PREFIX)
}

/// Scope-rewrite a scenario body within `ctx`, then lower it to plain statements.
pub fn compile_body(body: Vec<Node>, ctx: &mut VariableContext, printer: &dyn Printer) -> Result<Vec<Node>> {
    let body = scope::scope_body(body, ctx)?;
    lower(body, printer)
}

/// Sections in order; each contributes its leading statements, then its merged plots.
pub fn lower(body: Vec<Node>, printer: &dyn Printer) -> Result<Vec<Node>> {
    let sections = SectionBuilder::build(body)?;
    ensure_unique(&sections)?;

    let builder = DecisionTreeBuilder::new(printer);
    let mut out = Vec::new();
    for section in sections {
        debug!(section = %section.name, plots = section.plots.len(), "lowering section");
        out.extend(section.body);
        let tree = builder.build(section.plots)?;
        assemble::assemble(tree, &mut out);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        assert_eq!(calculator_name("total"), "__compute_total");
        assert_eq!(aggregate_name("total"), "__compute_all_total");
        assert_eq!(aggregated_property("__compute_all_total"), Some("total"));
        assert_eq!(aggregated_property("__compute_total"), None);
    }
}
