//! Runtime task list: which tasks are scheduled, which are running, and when
//! the run is ready for its finalizers.

use super::{DependencyGraph, TaskKind, mandatory_tasks};

/// What the caller must do after [`TaskList::end`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// Other work is still scheduled
    Continue,
    /// Only finalizer tasks remain; run them now
    Finalize,
}

/// Mutable list of scheduled tasks for one audit run.
///
/// `in_progress` is not kept a subset of `active`: a task may be started and
/// later removed independently. Completion logic only looks at `active`.
#[derive(Debug, Clone)]
pub struct TaskList {
    graph: DependencyGraph,
    active: Vec<TaskKind>,
    in_progress: Vec<TaskKind>,
    finalized: bool,
}

impl TaskList {
    /// Create a list holding the mandatory tasks
    pub fn with_mandatory(graph: DependencyGraph) -> Self {
        Self {
            graph,
            active: mandatory_tasks(),
            in_progress: Vec::new(),
            finalized: false,
        }
    }

    /// Create a list for a caller selection and prepare it for running
    pub fn for_selection(graph: DependencyGraph, selection: &[TaskKind]) -> Self {
        let mut list = Self::with_mandatory(graph);
        for &task in selection {
            list.new_task(task);
        }
        list.prepare();
        list
    }

    /// Schedule `task` after its not-yet-scheduled dependencies
    pub fn new_task(&mut self, task: TaskKind) {
        for kind in self.graph.resolve(task) {
            if !self.active.contains(&kind) {
                self.active.push(kind);
            }
        }
    }

    /// Drop `task` from both the active and in-progress sets
    pub fn remove(&mut self, task: TaskKind) {
        self.active.retain(|&t| t != task);
        self.in_progress.retain(|&t| t != task);
    }

    /// Mark `task` as running. Starting a running task again is a no-op.
    pub fn start(&mut self, task: TaskKind) {
        if !self.in_progress.contains(&task) {
            self.in_progress.push(task);
        }
    }

    /// Whether `task` is currently running
    pub fn is_doing(&self, task: TaskKind) -> bool {
        self.in_progress.contains(&task)
    }

    /// Whether `task` is scheduled
    pub fn has(&self, task: TaskKind) -> bool {
        self.active.contains(&task)
    }

    /// Finish `task` and report whether the finalizers are now due.
    ///
    /// Finalizers never trigger themselves. [`EndOutcome::Finalize`] is
    /// returned at most once per list, the first time every remaining active
    /// task is a finalizer.
    pub fn end(&mut self, task: TaskKind) -> EndOutcome {
        self.remove(task);
        if task.is_finalizer() {
            return EndOutcome::Continue;
        }

        let finalizers_left = self.active.iter().filter(|t| t.is_finalizer()).count();
        if self.active.len() > finalizers_left || self.finalized {
            return EndOutcome::Continue;
        }

        self.finalized = true;
        tracing::debug!(remaining = ?self.active, "all analysis tasks ended");
        EndOutcome::Finalize
    }

    /// With no selection beyond the mandatory set, schedule every task
    pub fn prepare(&mut self) {
        if self.active == mandatory_tasks() {
            let all: Vec<_> = TaskKind::all().collect();
            for task in all {
                self.new_task(task);
            }
        }
    }

    /// Scheduled tasks, in scheduling order
    pub fn active(&self) -> &[TaskKind] {
        &self.active
    }

    /// Running tasks, in start order
    pub fn in_progress(&self) -> &[TaskKind] {
        &self.in_progress
    }

    /// Whether [`EndOutcome::Finalize`] has already been handed out
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}
