use super::{aggregate_name, aggregated_property};
use crate::error::{Error, ErrorKind, Result};
use crate::tree::{build, Function, FunctionForm, Kind, Node};
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Function,
    Property { lazy: bool },
}

/// Every function and property name known within a module
pub type Algorithms = IndexMap<String, AlgorithmKind>;

/// Receiver of qualified field accesses
pub const RECEIVER: &str = "self";

pub struct VariableContext<'a> {
    pub declared: IndexSet<String>,
    pub free: IndexSet<String>, // assigned without declaration, hoisted on exit
    pub fields: IndexSet<String>,
    pub algorithms: &'a Algorithms,
    pub relax: bool,
    pub current: Option<String>,
    pub deps: IndexSet<String>,
    pub computes: IndexSet<String>,
    pub suspends: bool,
}

impl<'a> VariableContext<'a> {
    pub fn new(algorithms: &'a Algorithms) -> Self {
        VariableContext {
            declared: IndexSet::new(),
            free: IndexSet::new(),
            fields: IndexSet::new(),
            algorithms,
            relax: false,
            current: None,
            deps: IndexSet::new(),
            computes: IndexSet::new(),
            suspends: false,
        }
    }

    pub fn relaxed(mut self, relax: bool) -> Self {
        self.relax = self.relax || relax;
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Dependencies recorded from here on belong to `name`.
    pub fn compiling(mut self, name: &str) -> Self {
        self.current = Some(name.to_string());
        self
    }

    /// Scope of a function nested in this one.
    pub fn child(&self, own: impl IntoIterator<Item = String>) -> VariableContext<'a> {
        let mut declared = self.declared.clone();
        declared.extend(self.free.iter().cloned());
        declared.extend(own);
        VariableContext {
            declared,
            free: IndexSet::new(),
            fields: self.fields.clone(),
            algorithms: self.algorithms,
            relax: self.relax,
            current: self.current.clone(),
            deps: IndexSet::new(),
            computes: IndexSet::new(),
            suspends: false,
        }
    }

    /// Fold what a nested function found back into this scope.
    /// Suspension stays with the nested function.
    pub fn absorb(&mut self, child: VariableContext<'a>) {
        self.deps.extend(child.deps);
        self.computes.extend(child.computes);
    }

    /// `var a, b;` for every free-assigned name
    pub fn hoisted(&self) -> Option<Node> {
        if self.free.is_empty() {
            None
        } else {
            Some(build::declare(self.free.iter().map(String::as_str)))
        }
    }

    fn depend(&mut self, name: &str) {
        let recursion = self.current.as_deref() == Some(name)
            && self.algorithms.get(name) == Some(&AlgorithmKind::Function);
        if !recursion {
            self.deps.insert(name.to_string());
        }
    }

    fn assign(&mut self, name: &str, line: usize) -> Result<()> {
        if self.algorithms.contains_key(name) {
            return Err(Error::at(ErrorKind::AssignToAlgorithm(name.to_string()), line));
        }
        if !self.declared.contains(name) && !self.fields.contains(name) {
            self.free.insert(name.to_string());
        }
        Ok(())
    }
}

/// Rewrite a top-level body and hoist its implicit locals.
pub fn scope_body(body: Vec<Node>, ctx: &mut VariableContext) -> Result<Vec<Node>> {
    let mut body = transform_body(body, ctx)?;
    if let Some(decl) = ctx.hoisted() {
        body.insert(0, decl);
    }
    Ok(body)
}

pub fn transform_body(body: Vec<Node>, ctx: &mut VariableContext) -> Result<Vec<Node>> {
    body.into_iter().map(|node| transform(node, ctx)).collect()
}

pub fn transform(node: Node, ctx: &mut VariableContext) -> Result<Node> {
    let line = node.line;
    match node.kind {
        Kind::Function(func) => transform_function(func, line, ctx),

        Kind::Identifier { name } => {
            if ctx.algorithms.contains_key(&name) {
                ctx.depend(&name);
            }
            if ctx.fields.contains(&name) {
                let receiver = build::at(build::ident(RECEIVER), line);
                return Ok(build::at(build::member(receiver, &name), line));
            }
            Ok(Node::new(Kind::Identifier { name }, line))
        }

        // `a.b`: only the object is a reference
        Kind::Member {
            object,
            property,
            computed: false,
        } => Ok(Node::new(
            Kind::Member {
                object: Box::new(transform(*object, ctx)?),
                property,
                computed: false,
            },
            line,
        )),

        Kind::Assign {
            operator,
            left,
            right,
        } => {
            if let Some(name) = left.as_ident() {
                ctx.assign(name, line)?;
            }
            Node::new(
                Kind::Assign {
                    operator,
                    left,
                    right,
                },
                line,
            )
            .try_map(&mut |n| transform(n, ctx))
        }

        Kind::ForIn {
            left,
            right,
            body,
            of,
        } => {
            if let Some(name) = left.as_ident() {
                ctx.assign(name, line)?;
            }
            Node::new(
                Kind::ForIn {
                    left,
                    right,
                    body,
                    of,
                },
                line,
            )
            .try_map(&mut |n| transform(n, ctx))
        }

        Kind::If { .. } if !ctx.relax => Err(Error::at(ErrorKind::RestrictedConstruct("if statement"), line)),
        Kind::Switch { .. } if !ctx.relax => {
            Err(Error::at(ErrorKind::RestrictedConstruct("switch statement"), line))
        }

        Kind::Await { argument } => {
            ctx.suspends = true;
            Ok(Node::new(
                Kind::Await {
                    argument: Box::new(transform(*argument, ctx)?),
                },
                line,
            ))
        }

        Kind::Call { callee, arguments } if callee.as_ident() == Some("compute") => compute(arguments, line, ctx),

        kind => Node::new(kind, line).try_map(&mut |n| transform(n, ctx)),
    }
}

fn transform_function(func: Function, line: usize, ctx: &mut VariableContext) -> Result<Node> {
    let own: Vec<String> = func
        .params
        .iter()
        .cloned()
        .chain(collect_declarations(&func.body))
        .collect();
    let mut child = ctx.child(own);
    let body = scope_body(func.body, &mut child)?;
    ctx.absorb(child);
    Ok(Node::new(Kind::Function(Function { body, ..func }), line))
}

/// `compute(prop)` becomes a call of the property's aggregate calculator.
fn compute(arguments: Vec<Node>, line: usize, ctx: &mut VariableContext) -> Result<Node> {
    let [argument] = arguments.as_slice() else {
        return Err(Error::at(ErrorKind::ComputeArgument, line));
    };
    let name = argument
        .as_ident()
        .ok_or(Error::at(ErrorKind::ComputeArgument, line))?;
    match ctx.algorithms.get(name) {
        Some(AlgorithmKind::Property { .. }) => {}
        _ => return Err(Error::at(ErrorKind::UnknownProperty(name.to_string()), line)),
    }
    ctx.depend(name);
    ctx.computes.insert(name.to_string());
    let callee = build::at(build::ident(&aggregate_name(name)), line);
    Ok(build::at(build::call(callee, vec![]), line))
}

/// Names declared directly in a body: `var`/`let`/`const` and function
/// declarations, looking into nested statements but never into nested functions.
pub fn collect_declarations(body: &[Node]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in body {
        collect(stmt, &mut names);
    }
    names
}

fn collect(node: &Node, names: &mut Vec<String>) {
    match &node.kind {
        Kind::Declaration { declarations, .. } => {
            names.extend(declarations.iter().map(|d| d.name.clone()));
        }
        Kind::Function(func) => {
            if let (FunctionForm::Declaration, Some(name)) = (func.form, &func.name) {
                names.push(name.clone());
            }
        }
        Kind::Block { body } => body.iter().for_each(|stmt| collect(stmt, names)),
        Kind::If {
            consequent,
            alternate,
            ..
        } => {
            collect(consequent, names);
            if let Some(alternate) = alternate {
                collect(alternate, names);
            }
        }
        Kind::Switch { cases, .. } => cases
            .iter()
            .flat_map(|case| &case.body)
            .for_each(|stmt| collect(stmt, names)),
        Kind::For { init, body, .. } => {
            if let Some(init) = init {
                collect(init, names);
            }
            collect(body, names);
        }
        Kind::ForIn { left, body, .. } => {
            collect(left, names);
            collect(body, names);
        }
        Kind::While { body, .. } => collect(body, names),
        _ => {}
    }
}

/// Await every aggregate call whose property suspends, once the dependency
/// graph is known. Returns the new body and whether it now suspends; nested
/// functions that gain an `await` become `async` themselves.
pub fn suspend_computes(body: Vec<Node>, suspends: &dyn Fn(&str) -> bool) -> Result<(Vec<Node>, bool)> {
    let mut suspender = Suspender {
        suspends,
        found: false,
    };
    let body = body
        .into_iter()
        .map(|node| suspender.visit(node))
        .collect::<Result<Vec<_>>>()?;
    Ok((body, suspender.found))
}

struct Suspender<'f> {
    suspends: &'f dyn Fn(&str) -> bool,
    found: bool,
}

impl Suspender<'_> {
    fn is_suspending_call(&self, node: &Node) -> bool {
        match &node.kind {
            Kind::Call { callee, arguments } if arguments.is_empty() => callee
                .as_ident()
                .and_then(aggregated_property)
                .map_or(false, |property| (self.suspends)(property)),
            _ => false,
        }
    }

    fn visit(&mut self, node: Node) -> Result<Node> {
        let line = node.line;
        match node.kind {
            Kind::Function(func) => {
                let mut inner = Suspender {
                    suspends: self.suspends,
                    found: false,
                };
                let body = func
                    .body
                    .into_iter()
                    .map(|node| inner.visit(node))
                    .collect::<Result<Vec<_>>>()?;
                let is_async = func.is_async || inner.found;
                Ok(Node::new(
                    Kind::Function(Function {
                        body,
                        is_async,
                        ..func
                    }),
                    line,
                ))
            }
            // Already awaited in the source
            Kind::Await { argument } if self.is_suspending_call(&argument) => {
                self.found = true;
                Ok(Node::new(Kind::Await { argument }, line))
            }
            kind => {
                let node = Node::new(kind, line);
                if self.is_suspending_call(&node) {
                    self.found = true;
                    return Ok(build::at(build::awaited(node), line));
                }
                node.try_map(&mut |n| self.visit(n))
            }
        }
    }
}
