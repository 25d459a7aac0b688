use crate::error::{Error, ErrorKind, Result};
use crate::tree::{Kind, Lit, Node};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Section {
    pub ordinal: usize,
    pub name: String,
    pub line: usize,
    pub body: Vec<Node>, // statements before the first plot
    pub plots: Vec<Plot>,
}

#[derive(Debug, Clone)]
pub struct Plot {
    pub name: String,
    pub line: usize,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    InPlot,
    AfterTerminal,
    Complete,
}

/// Classified top-level statement
enum Step {
    Section(Option<String>),
    Plot(Option<String>),
    Rule(Node),
    Terminal(Node),
    Plain(Node),
}

impl Section {
    fn new(ordinal: usize, name: Option<String>, line: usize) -> Self {
        Section {
            ordinal,
            name: name.unwrap_or_else(|| format!("#{}", ordinal)),
            line,
            body: Vec::new(),
            plots: Vec::new(),
        }
    }
}

/// Segments a scenario body into sections of plots, one statement at a time.
pub struct SectionBuilder {
    state: State,
    sections: Vec<Section>,
    current: Option<Section>,
}

impl Default for SectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionBuilder {
    pub fn new() -> Self {
        SectionBuilder {
            state: State::Start,
            sections: Vec::new(),
            current: Some(Section::new(1, None, 0)),
        }
    }

    /// Run the whole body through a fresh builder.
    pub fn build(body: Vec<Node>) -> Result<Vec<Section>> {
        let mut builder = Self::new();
        for stmt in body {
            builder.next(stmt)?;
        }
        builder.done()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn next(&mut self, stmt: Node) -> Result<()> {
        let line = stmt.line;
        let step = classify(stmt)?;
        self.state = match (self.state, step) {
            (State::Complete, _) => return Err(Error::at(ErrorKind::Internal("section builder is complete"), line)),

            (_, Step::Section(name)) => {
                self.next_section(name, line)?;
                State::Start
            }
            (_, Step::Plot(name)) => {
                self.start_plot(name, line)?;
                State::InPlot
            }

            (State::Start, Step::Plain(stmt) | Step::Terminal(stmt)) => {
                self.section()?.body.push(stmt);
                State::Start
            }
            (State::Start | State::AfterTerminal, Step::Rule(stmt)) => {
                self.start_plot(None, line)?;
                self.add_to_plot(stmt)?;
                State::InPlot
            }

            (State::InPlot, Step::Plain(stmt) | Step::Rule(stmt)) => {
                self.add_to_plot(stmt)?;
                State::InPlot
            }
            (State::InPlot, Step::Terminal(stmt)) => {
                self.add_to_plot(stmt)?;
                State::AfterTerminal
            }

            (State::AfterTerminal, Step::Plain(_) | Step::Terminal(_)) => {
                return Err(Error::at(ErrorKind::ExpectedScenario, line))
            }
        };
        Ok(())
    }

    /// Close the last section. The builder accepts nothing afterwards.
    pub fn done(&mut self) -> Result<Vec<Section>> {
        let current = self
            .current
            .take()
            .ok_or(Error::new(ErrorKind::Internal("section builder is complete")))?;
        self.sections.push(current);
        self.state = State::Complete;
        Ok(std::mem::take(&mut self.sections))
    }

    fn section(&mut self) -> Result<&mut Section> {
        self.current
            .as_mut()
            .ok_or(Error::new(ErrorKind::Internal("section builder is complete")))
    }

    fn next_section(&mut self, name: Option<String>, line: usize) -> Result<()> {
        let current = self
            .current
            .take()
            .ok_or(Error::new(ErrorKind::Internal("section builder is complete")))?;
        let ordinal = current.ordinal + 1;
        self.sections.push(current);
        self.current = Some(Section::new(ordinal, name, line));
        Ok(())
    }

    fn start_plot(&mut self, name: Option<String>, line: usize) -> Result<()> {
        let section = self.section()?;
        let name = name.unwrap_or_else(|| format!("{}, plot {}", section.name, section.plots.len() + 1));
        section.plots.push(Plot {
            name,
            line,
            body: Vec::new(),
        });
        Ok(())
    }

    fn add_to_plot(&mut self, stmt: Node) -> Result<()> {
        self.section()?
            .plots
            .last_mut()
            .ok_or(Error::new(ErrorKind::Internal("no open plot")))?
            .body
            .push(stmt);
        Ok(())
    }
}

fn classify(stmt: Node) -> Result<Step> {
    let line = stmt.line;
    if let Kind::Function(_) = stmt.kind {
        return Err(Error::at(ErrorKind::FunctionDeclaration, line));
    }
    if let Some((name, args)) = stmt.reserved_call() {
        match name {
            "section" => {
                let name = match args {
                    [] => None,
                    [arg] => Some(string_arg(arg).ok_or(Error::at(ErrorKind::SectionName, line))?),
                    _ => return Err(Error::at(ErrorKind::SectionArity(args.len()), line)),
                };
                return Ok(Step::Section(name));
            }
            "plot" => {
                let name = match args {
                    [] => None,
                    [arg] => Some(string_arg(arg).ok_or(Error::at(ErrorKind::PlotName, line))?),
                    _ => return Err(Error::at(ErrorKind::PlotArity(args.len()), line)),
                };
                return Ok(Step::Plot(name));
            }
            "yes" | "no" => {
                if args.len() != 1 {
                    return Err(Error::at(ErrorKind::RuleArity(args.len()), line));
                }
                return Ok(Step::Rule(stmt));
            }
            _ => {}
        }
    }
    if stmt.is_terminal() {
        Ok(Step::Terminal(stmt))
    } else {
        Ok(Step::Plain(stmt))
    }
}

fn string_arg(arg: &Node) -> Option<String> {
    match &arg.kind {
        Kind::Literal { value: Lit::Str(s) } => Some(s.clone()),
        _ => None,
    }
}

/// Section names and plot names must each be unique within a file.
pub fn ensure_unique(sections: &[Section]) -> Result<()> {
    let mut names = HashSet::new();
    for section in sections {
        if !names.insert(section.name.as_str()) {
            return Err(Error::at(ErrorKind::DuplicateSection(section.name.clone()), section.line));
        }
    }
    let mut names = HashSet::new();
    for plot in sections.iter().flat_map(|s| &s.plots) {
        if !names.insert(plot.name.as_str()) {
            return Err(Error::at(ErrorKind::DuplicatePlot(plot.name.clone()), plot.line));
        }
    }
    Ok(())
}
