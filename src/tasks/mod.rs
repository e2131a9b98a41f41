//! Task registry, dependency graph and runtime task list.
//!
//! - [`TaskKind`] / [`REGISTRY`] - the static, declarative task table
//! - [`graph`] - DAG over the registry with a dependency-first resolver
//! - [`list`] - the mutable per-run task list with completion signaling

pub mod graph;
pub mod list;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub use graph::DependencyGraph;
pub use list::{EndOutcome, TaskList};

/// A named unit of the audit
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Resolve the input URL to its canonical form
    Normalize,
    /// Fetch and parse the main document
    Html,
    /// Fetch linked stylesheets
    Css,
    /// Fetch linked scripts
    Js,
    /// General page information
    General,
    /// Recommendations for further human audit (finalizer)
    Audit,
    /// NF Z67-147 audit metadata (finalizer)
    Nfz,
    /// Cookies set by the page and its third parties
    Cookies,
    /// Resources loaded from other hosts
    Externals,
    /// Embedded videos
    Videos,
    /// Forms and their destinations
    Forms,
    /// TLS certificate
    Ssl,
    /// Web fonts
    Fonts,
    /// DNS prefetching hints
    Prefetching,
    /// Analytics tools
    Analytics,
    /// Content delivery networks
    Cdn,
    /// Social media widgets
    Social,
}

/// Declared dependencies and flags of a task
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// The task this entry describes
    pub kind: TaskKind,
    /// Tasks that must be scheduled before this one
    pub dependencies: &'static [TaskKind],
    /// Always part of a run, whatever the selection
    pub mandatory: bool,
}

const fn spec(kind: TaskKind, dependencies: &'static [TaskKind], mandatory: bool) -> TaskSpec {
    TaskSpec {
        kind,
        dependencies,
        mandatory,
    }
}

use TaskKind::*;

/// The task table, in declaration order.
pub const REGISTRY: &[TaskSpec] = &[
    spec(Normalize, &[], true),
    spec(Html, &[], false),
    spec(Css, &[Html], false),
    spec(Js, &[Html], false),
    spec(General, &[Html, Css, Js], true),
    spec(Audit, &[], false),
    spec(Nfz, &[], false),
    spec(Cookies, &[Html, Css], false),
    spec(Externals, &[Html, Css, Js], false),
    spec(Videos, &[Html], false),
    spec(Forms, &[Html], false),
    spec(Ssl, &[Html, Css], false),
    spec(Fonts, &[Html, Css], false),
    spec(Prefetching, &[Html, Css], false),
    spec(Analytics, &[Html, Css, Js], false),
    spec(Cdn, &[Html, Css, Js], false),
    spec(Social, &[Html, Css, Js], false),
];

/// Tasks that summarize the run and must come last
pub const FINALIZERS: [TaskKind; 2] = [Nfz, Audit];

impl TaskKind {
    /// Every task, in registry order
    pub fn all() -> impl Iterator<Item = TaskKind> {
        REGISTRY.iter().map(|s| s.kind)
    }

    /// Registry entry for this task
    pub fn spec(self) -> &'static TaskSpec {
        // REGISTRY holds one entry per variant, in variant order
        &REGISTRY[self as usize]
    }

    /// Whether this is one of the two summary tasks
    pub fn is_finalizer(self) -> bool {
        FINALIZERS.contains(&self)
    }

    /// Lowercase task name
    pub fn as_str(self) -> &'static str {
        match self {
            Normalize => "normalize",
            Html => "html",
            Css => "css",
            Js => "js",
            General => "general",
            Audit => "audit",
            Nfz => "nfz",
            Cookies => "cookies",
            Externals => "externals",
            Videos => "videos",
            Forms => "forms",
            Ssl => "ssl",
            Fonts => "fonts",
            Prefetching => "prefetching",
            Analytics => "analytics",
            Cdn => "cdn",
            Social => "social",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TaskKind::all()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = TaskKind::all().map(TaskKind::as_str).collect();
                Error::config(
                    "tasks",
                    format!("unknown task '{}' (known tasks: {})", s, known.join(", ")),
                )
            })
    }
}

/// Mandatory tasks with their dependencies, in first-seen order.
///
/// Each mandatory task contributes its not-yet-seen dependencies followed by
/// itself: `normalize, html, css, js, general`.
pub fn mandatory_tasks() -> Vec<TaskKind> {
    let mut tasks = Vec::new();
    for spec in REGISTRY.iter().filter(|s| s.mandatory) {
        for dep in spec.dependencies {
            if !tasks.contains(dep) {
                tasks.push(*dep);
            }
        }
        if !tasks.contains(&spec.kind) {
            tasks.push(spec.kind);
        }
    }
    tasks
}
