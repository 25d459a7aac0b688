use crate::compile::scope::AlgorithmKind;
use crate::error::{Error, ErrorKind, Result};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use std::cell::RefCell;
use std::path::PathBuf;
use tracing::debug;

/// One function or property of a module, as seen after its scope pass.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub kind: AlgorithmKind,
    pub suspends: bool,           // awaits in its own body
    pub deps: IndexSet<String>,   // referenced algorithms
    pub computes: IndexSet<String>, // properties passed to compute()
    pub file: PathBuf,
}

impl Vertex {
    pub fn is_property(&self) -> bool {
        matches!(self.kind, AlgorithmKind::Property { .. })
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.kind, AlgorithmKind::Property { lazy: true })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Property evaluation orders of a module, with the suspension of every algorithm.
#[derive(Debug, Default)]
pub struct Resolution {
    pub full: IndexMap<String, Vec<String>>,  // every property a property transitively reads
    pub eager: IndexMap<String, Vec<String>>, // same, without edges into lazy properties
    pub suspends: IndexMap<String, bool>,
    pub aggregate_suspends: IndexMap<String, bool>,
}

impl Resolution {
    pub fn suspends(&self, name: &str) -> bool {
        self.suspends.get(name).copied().unwrap_or(false)
    }

    pub fn aggregate_suspends(&self, property: &str) -> bool {
        self.aggregate_suspends.get(property).copied().unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    vertices: IndexMap<String, Vertex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, vertex: Vertex) {
        self.vertices.insert(name.to_string(), vertex);
    }

    pub fn vertex(&self, name: &str) -> Option<&Vertex> {
        self.vertices.get(name)
    }

    /// Properties `start` depends on, dependencies first and `start` last.
    /// With `eager`, edges into lazy properties are not followed.
    pub fn order(&self, start: &str, eager: bool) -> Result<Vec<String>> {
        let mut order = self.closure(start, eager)?;
        order.retain(|name| self.vertices.get(name).map_or(false, Vertex::is_property));
        Ok(order)
    }

    /// Every algorithm reachable from `start`, functions included, in dependency order.
    pub fn closure(&self, start: &str, eager: bool) -> Result<Vec<String>> {
        let mut marks = IndexMap::new();
        let mut path = Vec::new();
        let mut order = Vec::new();
        self.visit(start, eager, &mut marks, &mut path, &mut order)?;
        Ok(order)
    }

    fn visit<'g>(
        &'g self,
        name: &str,
        eager: bool,
        marks: &mut IndexMap<&'g str, Mark>,
        path: &mut Vec<&'g str>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        let Some((name, vertex)) = self.vertices.get_key_value(name) else {
            return Ok(());
        };
        match marks.get(name.as_str()) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return self.closed_loop(name, path),
            None => {}
        }

        marks.insert(name.as_str(), Mark::InProgress);
        path.push(name.as_str());
        for dep in &vertex.deps {
            if eager && self.vertices.get(dep).map_or(false, Vertex::is_lazy) {
                continue;
            }
            self.visit(dep, eager, marks, path, order)?;
        }
        path.pop();
        marks.insert(name.as_str(), Mark::Done);
        order.push(name.clone());
        Ok(())
    }

    /// An edge back into the current path.
    fn closed_loop(&self, name: &str, path: &[&str]) -> Result<()> {
        let position = path.iter().position(|p| *p == name).unwrap_or(0);
        let cycle = &path[position..];
        let shown = cycle.iter().chain(std::iter::once(&name)).join(" > ");
        let mut err = Error::new(ErrorKind::DependencyCycle(shown));
        if let Some(file) = path.last().and_then(|p| self.vertices.get(*p)).map(|v| &v.file) {
            err = err.in_file(file);
        }
        Err(err)
    }

    /// Orders for every property, then the suspension of every algorithm and aggregate.
    pub fn resolve(&self) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        let mut closures = IndexMap::new();
        for (name, vertex) in &self.vertices {
            let closure = self.closure(name, false)?;
            if !vertex.is_property() {
                continue;
            }
            closures.insert(name.clone(), closure);
            let full = self.order(name, false)?;
            let eager = self.order(name, true)?;
            debug!(property = %name, full = ?full, eager = ?eager, "resolved property order");
            resolution.full.insert(name.clone(), full);
            resolution.eager.insert(name.clone(), eager);
        }

        let memo = RefCell::new(IndexMap::new());
        for name in self.vertices.keys() {
            let suspends = self.suspends(name, &closures, &memo);
            resolution.suspends.insert(name.clone(), suspends);
        }
        for (property, closure) in &closures {
            let suspends = closure.iter().any(|p| resolution.suspends(p));
            resolution.aggregate_suspends.insert(property.clone(), suspends);
        }
        Ok(resolution)
    }

    /// Own await, or a compute() of a property whose aggregate suspends.
    fn suspends(
        &self,
        name: &str,
        closures: &IndexMap<String, Vec<String>>,
        memo: &RefCell<IndexMap<String, Option<bool>>>,
    ) -> bool {
        match memo.borrow().get(name) {
            Some(Some(known)) => return *known,
            Some(None) => return false, // being decided further up
            None => {}
        }
        let Some(vertex) = self.vertices.get(name) else {
            return false;
        };
        memo.borrow_mut().insert(name.to_string(), None);

        let suspends = vertex.suspends
            || vertex.computes.iter().any(|property| {
                closures
                    .get(property)
                    .map_or(false, |closure| closure.iter().any(|p| self.suspends(p, closures, memo)))
            });
        memo.borrow_mut().insert(name.to_string(), Some(suspends));
        suspends
    }
}
