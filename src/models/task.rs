use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Id(pub i64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub done: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub author: user::Id,
    pub parent: Option<Id>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub content: String,
    pub deadline: Option<DateTime<Utc>>,
    pub author: user::Id,
    pub parent: Option<Id>,
}

impl NewTask {
    pub fn with_id(self, id: Id) -> Task {
        Task {
            id,
            title: self.title,
            content: self.content,
            done: false,
            deadline: self.deadline,
            author: self.author,
            parent: self.parent,
        }
    }
}

/// A task placed in the planning outline, `depth` levels below its root.
#[derive(Debug)]
pub struct PlannedTask {
    pub task: Task,
    pub depth: usize,
}

/// Lays tasks out in outline order: each task directly followed by its
/// descendants, siblings in id order.
///
/// Tasks whose parent is unknown become roots. A node is never emitted
/// twice, so malformed parent chains cannot loop. The walk keeps its own
/// stack, so nesting depth is bounded by memory only.
pub fn build_forest(tasks: Vec<Task>) -> Vec<PlannedTask> {
    let known: HashSet<Id> = tasks.iter().map(|t| t.id).collect();
    let mut children: BTreeMap<Option<Id>, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        let parent = task.parent.filter(|p| known.contains(p) && *p != task.id);
        children.entry(parent).or_default().push(task);
    }

    let mut visited = HashSet::new();
    let mut outline = Vec::new();
    let roots = children.remove(&None).unwrap_or_default();
    walk(roots, &mut children, &mut visited, &mut outline);

    // Whatever is left only hangs off a cycle; surface it at the top level.
    while let Some((_, stranded)) = children.pop_first() {
        walk(stranded, &mut children, &mut visited, &mut outline);
    }
    outline
}

fn walk(
    roots: Vec<Task>,
    children: &mut BTreeMap<Option<Id>, Vec<Task>>,
    visited: &mut HashSet<Id>,
    outline: &mut Vec<PlannedTask>,
) {
    // Pushed in reverse so siblings pop in order
    let mut stack: Vec<(Task, usize)> = roots.into_iter().rev().map(|t| (t, 0)).collect();

    while let Some((task, depth)) = stack.pop() {
        if !visited.insert(task.id) {
            continue;
        }
        if let Some(kids) = children.remove(&Some(task.id)) {
            stack.extend(kids.into_iter().rev().map(|kid| (kid, depth + 1)));
        }
        outline.push(PlannedTask { task, depth });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, parent: Option<i64>) -> Task {
        Task {
            id: Id(id),
            title: format!("Task {id}"),
            content: String::new(),
            done: false,
            deadline: None,
            author: user::Id(1),
            parent: parent.map(Id),
        }
    }

    fn outline(tasks: Vec<Task>) -> Vec<(i64, usize)> {
        build_forest(tasks)
            .into_iter()
            .map(|p| (p.task.id.0, p.depth))
            .collect()
    }

    #[test]
    fn nests_children_under_parents() {
        let planned = outline(vec![
            task(1, None),
            task(2, Some(1)),
            task(3, Some(2)),
            task(4, None),
            task(5, Some(1)),
        ]);

        assert_eq!(planned, vec![(1, 0), (2, 1), (3, 2), (5, 1), (4, 0)]);
    }

    #[test]
    fn orphans_become_roots() {
        assert_eq!(outline(vec![task(2, Some(99)), task(3, Some(2))]), vec![(2, 0), (3, 1)]);
    }

    #[test]
    fn cycles_do_not_loop() {
        let mut seen: Vec<i64> = outline(vec![task(1, Some(2)), task(2, Some(1)), task(3, Some(3))])
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn very_deep_chains_do_not_exhaust_the_stack() {
        const DEPTH: i64 = 100_000;
        let chain: Vec<Task> = (1..=DEPTH)
            .map(|id| task(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();

        let planned = build_forest(chain);
        assert_eq!(planned.len(), DEPTH as usize);
        assert_eq!(planned[0].task.id, Id(1));
        let last = planned.last().unwrap();
        assert_eq!(last.task.id, Id(DEPTH));
        assert_eq!(last.depth, (DEPTH - 1) as usize);
    }

    #[test]
    fn new_task_is_not_done() {
        let task = NewTask {
            title: "Plan".into(),
            content: "Sprint".into(),
            deadline: None,
            author: user::Id(1),
            parent: None,
        }
        .with_id(Id(1));
        assert!(!task.done);
    }
}
