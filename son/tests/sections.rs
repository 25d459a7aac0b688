use son::compile::section::{SectionBuilder, State};
use son::tree::build::*;
use son::Node;

fn marker(name: &str, args: Vec<Node>) -> Node {
    stmt(call_named(name, args))
}

fn walk(body: Vec<Node>, states: &[State]) {
    let mut builder = SectionBuilder::new();
    assert_eq!(body.len(), states.len());
    for (idx, (stmt, expect)) in body.into_iter().zip(states).enumerate() {
        builder.next(stmt).unwrap();
        println!("{:>2}: {:?}", idx, builder.state());
        assert_eq!(builder.state(), *expect);
    }
}

macro_rules! case {
    ($name:ident, $body:expr, $states:expr) => {
        #[test]
        fn $name() {
            walk($body, $states);
        }
    };
}

case!(
    leading_then_rule,
    vec![
        var("a", num(1.0)),
        marker("yes", vec![ident("a")]),
        ret(None),
        marker("no", vec![ident("a")]),
    ],
    &[State::Start, State::InPlot, State::AfterTerminal, State::InPlot]
);

case!(
    markers,
    vec![
        marker("plot", vec![text("p")]),
        stmt(call_named("log", vec![])),
        marker("section", vec![]),
        ret(None),
        marker("plot", vec![]),
        throw(text("x")),
        marker("section", vec![text("tail")]),
    ],
    &[
        State::InPlot,
        State::InPlot,
        State::Start,
        State::Start,
        State::InPlot,
        State::AfterTerminal,
        State::Start,
    ]
);

#[test]
fn auto_names() {
    let body = vec![
        marker("yes", vec![ident("a")]),
        ret(None),
        marker("no", vec![ident("a")]),
        ret(None),
        marker("section", vec![text("second")]),
        marker("plot", vec![]),
        ret(None),
    ];
    let sections = SectionBuilder::build(body).unwrap();
    let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["#1", "second"]);
    let plots: Vec<_> = sections
        .iter()
        .flat_map(|s| &s.plots)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(plots, vec!["#1, plot 1", "#1, plot 2", "second, plot 1"]);
    assert_eq!(sections[1].ordinal, 2);
}

#[test]
fn done_is_final() {
    let mut builder = SectionBuilder::new();
    builder.next(ret(None)).unwrap();
    let sections = builder.done().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].body.len(), 1);
    assert_eq!(builder.state(), State::Complete);
    assert_eq!(builder.next(ret(None)).unwrap_err().code(), "SON0099");
}

#[test]
fn malformed_markers() {
    let name = SectionBuilder::build(vec![marker("section", vec![num(1.0)])]).unwrap_err();
    assert_eq!(name.code(), "SON0006");
    let arity = SectionBuilder::build(vec![marker("plot", vec![text("a"), text("b")])]).unwrap_err();
    assert_eq!(arity.code(), "SON0009");
    let function = SectionBuilder::build(vec![son::tree::build::function("inner", &[], vec![])]).unwrap_err();
    assert_eq!(function.code(), "SON0010");
}
