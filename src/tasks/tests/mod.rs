use super::*;
use crate::error::Error;

fn graph() -> DependencyGraph {
    DependencyGraph::from_registry().unwrap()
}

#[test]
fn test_registry_is_in_variant_order() {
    for (idx, spec) in REGISTRY.iter().enumerate() {
        assert_eq!(spec.kind as usize, idx, "{} is out of place", spec.kind);
        assert_eq!(spec.kind.spec().kind, spec.kind);
    }
}

#[test]
fn test_task_names_round_trip() {
    for kind in TaskKind::all() {
        let parsed: TaskKind = kind.as_str().parse().unwrap();
        assert_eq!(parsed, kind);
    }
    assert_eq!(" Cookies ".parse::<TaskKind>().unwrap(), TaskKind::Cookies);
}

#[test]
fn test_unknown_task_is_config_error() {
    let err = "trackers".parse::<TaskKind>().unwrap_err();
    match err {
        Error::Config { key, message } => {
            assert_eq!(key.as_deref(), Some("tasks"));
            assert!(message.contains("trackers"));
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_mandatory_tasks_order() {
    assert_eq!(
        mandatory_tasks(),
        vec![
            TaskKind::Normalize,
            TaskKind::Html,
            TaskKind::Css,
            TaskKind::Js,
            TaskKind::General
        ]
    );
}

#[test]
fn test_mandatory_tasks_is_stable() {
    let first = mandatory_tasks();
    for _ in 0..5 {
        assert_eq!(mandatory_tasks(), first);
    }
}

#[test]
fn test_resolve_puts_dependencies_first_without_duplicates() {
    let graph = graph();
    for kind in TaskKind::all() {
        let resolved = graph.resolve(kind);
        assert_eq!(resolved.last(), Some(&kind));

        let mut seen = std::collections::HashSet::new();
        for (pos, task) in resolved.iter().enumerate() {
            assert!(seen.insert(*task), "{task} repeated when resolving {kind}");
            for dep in task.spec().dependencies {
                let dep_pos = resolved.iter().position(|t| t == dep);
                assert!(
                    matches!(dep_pos, Some(p) if p < pos),
                    "{dep} must precede {task} when resolving {kind}"
                );
            }
        }
    }
}

#[test]
fn test_resolve_general() {
    assert_eq!(
        graph().resolve(TaskKind::General),
        vec![TaskKind::Html, TaskKind::Css, TaskKind::Js, TaskKind::General]
    );
}

#[test]
fn test_dependencies_keep_declaration_order() {
    assert_eq!(
        graph().dependencies(TaskKind::Analytics),
        vec![TaskKind::Html, TaskKind::Css, TaskKind::Js]
    );
    assert!(graph().dependencies(TaskKind::Nfz).is_empty());
}

#[test]
fn test_topological_order_covers_registry() {
    let graph = graph();
    let order = graph.topological_order();
    assert_eq!(order.len(), REGISTRY.len());
    for spec in REGISTRY {
        let pos = order.iter().position(|t| *t == spec.kind).unwrap();
        for dep in spec.dependencies {
            let dep_pos = order.iter().position(|t| t == dep).unwrap();
            assert!(dep_pos < pos);
        }
    }
}

#[test]
fn test_cycle_is_rejected() {
    static CYCLIC: &[TaskSpec] = &[
        TaskSpec {
            kind: TaskKind::Html,
            dependencies: &[TaskKind::Css],
            mandatory: false,
        },
        TaskSpec {
            kind: TaskKind::Css,
            dependencies: &[TaskKind::Html],
            mandatory: false,
        },
    ];
    let err = DependencyGraph::build(CYCLIC).unwrap_err();
    assert!(matches!(err, Error::DependencyCycle(_)));
}

#[test]
fn test_unregistered_dependency_is_rejected() {
    static DANGLING: &[TaskSpec] = &[TaskSpec {
        kind: TaskKind::Css,
        dependencies: &[TaskKind::Html],
        mandatory: false,
    }];
    let err = DependencyGraph::build(DANGLING).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_new_task_expands_dependencies() {
    let mut list = TaskList::with_mandatory(graph());
    list.new_task(TaskKind::Cookies);
    list.new_task(TaskKind::Cookies);
    assert_eq!(
        list.active(),
        &[
            TaskKind::Normalize,
            TaskKind::Html,
            TaskKind::Css,
            TaskKind::Js,
            TaskKind::General,
            TaskKind::Cookies
        ]
    );
}

#[test]
fn test_prepare_without_selection_runs_everything() {
    let list = TaskList::for_selection(graph(), &[]);
    assert_eq!(list.active().len(), REGISTRY.len());
    for kind in TaskKind::all() {
        assert!(list.has(kind), "{kind} should be scheduled");
    }
}

#[test]
fn test_selecting_a_mandatory_task_counts_as_no_selection() {
    let list = TaskList::for_selection(graph(), &[TaskKind::General]);
    assert_eq!(list.active().len(), REGISTRY.len());
}

#[test]
fn test_prepare_keeps_explicit_selection() {
    let list = TaskList::for_selection(graph(), &[TaskKind::Ssl]);
    assert!(list.has(TaskKind::Ssl));
    assert!(!list.has(TaskKind::Cookies));
    assert!(!list.has(TaskKind::Audit));
}

#[test]
fn test_remove_is_idempotent() {
    let mut list = TaskList::with_mandatory(graph());
    list.start(TaskKind::Html);
    list.remove(TaskKind::Html);
    list.remove(TaskKind::Html);
    assert!(!list.has(TaskKind::Html));
    assert!(!list.is_doing(TaskKind::Html));
}

#[test]
fn test_start_does_not_duplicate_markers() {
    let mut list = TaskList::with_mandatory(graph());
    list.start(TaskKind::Css);
    list.start(TaskKind::Css);
    assert_eq!(list.in_progress(), &[TaskKind::Css]);
    list.remove(TaskKind::Css);
    assert!(!list.is_doing(TaskKind::Css));
}

#[test]
fn test_in_progress_task_can_leave_active_first() {
    let mut list = TaskList::with_mandatory(graph());
    list.start(TaskKind::Ssl);
    assert!(list.is_doing(TaskKind::Ssl));
    assert!(!list.has(TaskKind::Ssl));
    assert_eq!(list.end(TaskKind::Normalize), EndOutcome::Continue);
}

fn end_all(list: &mut TaskList, order: &[TaskKind]) -> usize {
    order
        .iter()
        .filter(|&&task| list.end(task) == EndOutcome::Finalize)
        .count()
}

#[test]
fn test_end_finalizes_once_with_both_finalizers() {
    let mut list = TaskList::for_selection(graph(), &[TaskKind::Nfz, TaskKind::Audit]);
    let work: Vec<_> = list
        .active()
        .iter()
        .copied()
        .filter(|t| !t.is_finalizer())
        .collect();

    let (last, rest) = work.split_last().unwrap();
    assert_eq!(end_all(&mut list, rest), 0);
    assert_eq!(list.end(*last), EndOutcome::Finalize);
    assert!(list.has(TaskKind::Nfz) && list.has(TaskKind::Audit));

    // The finalizers themselves, and any stray end, never re-trigger
    assert_eq!(list.end(TaskKind::Nfz), EndOutcome::Continue);
    assert_eq!(list.end(TaskKind::Audit), EndOutcome::Continue);
    assert_eq!(list.end(TaskKind::Cookies), EndOutcome::Continue);
}

#[test]
fn test_end_finalizes_without_nfz() {
    let mut list = TaskList::for_selection(graph(), &[TaskKind::Audit, TaskKind::Forms]);
    assert!(!list.has(TaskKind::Nfz));

    let order = [
        TaskKind::Forms,
        TaskKind::Normalize,
        TaskKind::Html,
        TaskKind::Css,
        TaskKind::General,
        TaskKind::Js,
    ];
    let (last, rest) = order.split_last().unwrap();
    assert_eq!(end_all(&mut list, rest), 0);
    assert_eq!(list.end(*last), EndOutcome::Finalize);
    assert_eq!(list.active(), &[TaskKind::Audit]);
}

#[test]
fn test_end_finalizes_without_any_finalizer() {
    let mut list = TaskList::for_selection(graph(), &[TaskKind::Videos]);
    let work = list.active().to_vec();
    assert_eq!(end_all(&mut list, &work), 1);
    assert!(list.active().is_empty());
    assert!(list.is_finalized());
}

#[test]
fn test_end_order_does_not_matter() {
    let base = TaskList::for_selection(graph(), &[]);
    let work: Vec<_> = base
        .active()
        .iter()
        .copied()
        .filter(|t| !t.is_finalizer())
        .collect();

    for rotation in 0..work.len() {
        let mut order = work.clone();
        order.rotate_left(rotation);
        order.reverse();
        let mut list = base.clone();
        assert_eq!(end_all(&mut list, &order), 1, "rotation {rotation}");
    }
}

#[test]
fn test_ending_a_finalizer_never_finalizes() {
    let mut list = TaskList::for_selection(graph(), &[TaskKind::Nfz]);
    assert_eq!(list.end(TaskKind::Nfz), EndOutcome::Continue);
    assert!(!list.is_finalized());
}
