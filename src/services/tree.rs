use std::collections::{HashMap, HashSet};

use crate::models::{ListedTask, Progress, Task, TaskNode};

/// Flat task table indexed for tree walks.
///
/// Tasks live in one vector; `index` maps ids to slots and `children` maps a
/// parent id (`None` for roots) to its children's slots in `(position, id)`
/// order. All walks use explicit stacks so deep trees never grow the call stack.
/// The nested [`TaskNode`] values handed out are also freed iteratively.
pub struct TaskArena {
    tasks: Vec<Task>,
    index: HashMap<i64, usize>,
    children: HashMap<Option<i64>, Vec<usize>>,
}

impl TaskArena {
    pub fn new(mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|t| (t.position, t.id));

        let index = tasks
            .iter()
            .enumerate()
            .map(|(slot, t)| (t.id, slot))
            .collect();

        let mut children: HashMap<Option<i64>, Vec<usize>> = HashMap::new();
        for (slot, task) in tasks.iter().enumerate() {
            children.entry(task.parent_id).or_default().push(slot);
        }

        Self { tasks, index, children }
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.index.get(&id).map(|&slot| &self.tasks[slot])
    }

    fn child_slots(&self, parent_id: Option<i64>) -> &[usize] {
        self.children
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct children of `parent_id` (roots when `None`), one level only.
    pub fn immediate_children(&self, parent_id: Option<i64>) -> Vec<Task> {
        self.child_slots(parent_id)
            .iter()
            .map(|&slot| self.tasks[slot].clone())
            .collect()
    }

    /// Slots reachable from `starts`, each listed after all of its descendants.
    fn post_order(&self, starts: &[usize]) -> Vec<usize> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(usize, bool)> = starts.iter().rev().map(|&s| (s, false)).collect();

        while let Some((slot, expanded)) = stack.pop() {
            if expanded {
                order.push(slot);
                continue;
            }
            if !seen.insert(slot) {
                continue;
            }
            stack.push((slot, true));
            let id = self.tasks[slot].id;
            for &child in self.child_slots(Some(id)).iter().rev() {
                stack.push((child, false));
            }
        }

        order
    }

    fn build_nodes(&self, starts: &[usize]) -> Vec<TaskNode> {
        let mut built: HashMap<usize, TaskNode> = HashMap::new();

        for slot in self.post_order(starts) {
            let task = self.tasks[slot].clone();
            let children = self
                .child_slots(Some(task.id))
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(slot, TaskNode { task, children });
        }

        starts
            .iter()
            .filter_map(|slot| built.remove(slot))
            .collect()
    }

    /// Ordered children of `parent_id` (or all roots), each carrying its
    /// full nested subtree.
    pub fn subtree(&self, parent_id: Option<i64>) -> Vec<TaskNode> {
        let starts = self.child_slots(parent_id).to_vec();
        self.build_nodes(&starts)
    }

    /// Slots reachable from `starts`, each listed before its descendants.
    fn pre_order(&self, starts: &[usize]) -> Vec<usize> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<usize> = starts.iter().rev().copied().collect();

        while let Some(slot) = stack.pop() {
            if !seen.insert(slot) {
                continue;
            }
            order.push(slot);
            let id = self.tasks[slot].id;
            stack.extend(self.child_slots(Some(id)).iter().rev());
        }

        order
    }

    /// `roots` and all their descendants as flat rows, parents before
    /// children and siblings in `(position, id)` order. Unknown ids are skipped.
    pub fn flatten(&self, roots: &[i64]) -> Vec<ListedTask> {
        let starts: Vec<usize> = roots
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .collect();
        let percents = self.percents(&starts);

        self.pre_order(&starts)
            .into_iter()
            .map(|slot| ListedTask {
                task: self.tasks[slot].clone(),
                progress: self.progress_at(slot, &percents),
            })
            .collect()
    }

    /// Ids of `id` and all its descendants, children before their parents.
    pub fn descendants_post_order(&self, id: i64) -> Vec<i64> {
        match self.index.get(&id) {
            Some(&slot) => self
                .post_order(&[slot])
                .into_iter()
                .map(|s| self.tasks[s].id)
                .collect(),
            None => Vec::new(),
        }
    }

    fn percents(&self, starts: &[usize]) -> HashMap<usize, u32> {
        let mut percents: HashMap<usize, u32> = HashMap::new();
        for slot in self.post_order(starts) {
            let task = &self.tasks[slot];
            let kids = self.child_slots(Some(task.id));
            let percent = if kids.is_empty() {
                Progress::leaf(task.is_done).percent
            } else {
                let sum: u32 = kids.iter().map(|k| percents.get(k).copied().unwrap_or(0)).sum();
                sum / kids.len() as u32
            };
            percents.insert(slot, percent);
        }
        percents
    }

    fn progress_at(&self, slot: usize, percents: &HashMap<usize, u32>) -> Progress {
        let task = &self.tasks[slot];
        let total = self.child_slots(Some(task.id)).len();
        if total == 0 {
            Progress::leaf(task.is_done)
        } else {
            Progress {
                done: None,
                total,
                percent: percents.get(&slot).copied().unwrap_or(0),
            }
        }
    }

    /// Completion percentage for `id`.
    ///
    /// A parent's percent is the truncated arithmetic mean of its children's
    /// percents, regardless of how large each child's subtree is.
    pub fn progress(&self, id: i64) -> Progress {
        let Some(&root) = self.index.get(&id) else {
            return Progress::missing();
        };
        let percents = self.percents(&[root]);
        self.progress_at(root, &percents)
    }

    /// Progress for every task in the arena, keyed by id.
    pub fn all_progress(&self) -> HashMap<i64, Progress> {
        let roots = self.child_slots(None).to_vec();
        let percents = self.percents(&roots);
        (0..self.tasks.len())
            .filter(|slot| percents.contains_key(slot))
            .map(|slot| (self.tasks[slot].id, self.progress_at(slot, &percents)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, parent_id: Option<i64>, is_done: bool) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: String::new(),
            is_done,
            parent_id,
            category: None,
            is_today: false,
            position: 0,
            created_at: "2026-10-19T00:00:00+00:00".to_string(),
            updated_at: "2026-10-19T00:00:00+00:00".to_string(),
            completed_at: None,
        }
    }

    #[test]
    fn test_subtree_nests_children_in_order() {
        let mut late = task(3, Some(1), false);
        late.position = 5;
        let arena = TaskArena::new(vec![
            task(1, None, false),
            late,
            task(2, Some(1), false),
            task(4, Some(2), false),
            task(5, None, false),
        ]);

        let roots = arena.subtree(None);
        assert_eq!(roots.iter().map(|n| n.task.id).collect::<Vec<_>>(), vec![1, 5]);
        let first = &roots[0];
        assert_eq!(
            first.children.iter().map(|n| n.task.id).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(first.children[0].children[0].task.id, 4);
        assert!(roots[1].children.is_empty());
    }

    #[test]
    fn test_immediate_children_is_one_level() {
        let arena = TaskArena::new(vec![
            task(1, None, false),
            task(2, Some(1), false),
            task(3, Some(2), false),
        ]);
        let kids = arena.immediate_children(Some(1));
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].id, 2);
    }

    #[test]
    fn test_descendants_post_order_puts_children_first() {
        let arena = TaskArena::new(vec![
            task(1, None, false),
            task(2, Some(1), false),
            task(3, Some(2), false),
            task(4, Some(1), false),
        ]);
        let order = arena.descendants_post_order(1);
        assert_eq!(order.len(), 4);
        let pos = |id: i64| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(3) < pos(2));
        assert!(pos(2) < pos(1));
        assert!(pos(4) < pos(1));
        assert!(arena.descendants_post_order(99).is_empty());
    }

    #[test]
    fn test_leaf_progress() {
        let arena = TaskArena::new(vec![task(1, None, true), task(2, None, false)]);
        assert_eq!(arena.progress(1), Progress { done: Some(1), total: 1, percent: 100 });
        assert_eq!(arena.progress(2), Progress { done: Some(0), total: 1, percent: 0 });
    }

    #[test]
    fn test_missing_task_progress_is_zero() {
        let arena = TaskArena::new(vec![]);
        assert_eq!(arena.progress(7), Progress::missing());
    }

    #[test]
    fn test_parent_progress_is_truncated_unweighted_mean() {
        // children: 2 (done leaf, 100), 3 (half of two leaves, 50), 6 (open leaf, 0)
        let arena = TaskArena::new(vec![
            task(1, None, false),
            task(2, Some(1), true),
            task(3, Some(1), false),
            task(4, Some(3), true),
            task(5, Some(3), false),
            task(6, Some(1), false),
        ]);
        assert_eq!(arena.progress(3).percent, 50);
        assert_eq!(arena.progress(1), Progress { done: None, total: 3, percent: 50 });
    }

    #[test]
    fn test_progress_truncates() {
        let arena = TaskArena::new(vec![
            task(1, None, false),
            task(2, Some(1), true),
            task(3, Some(1), false),
            task(4, Some(1), false),
        ]);
        assert_eq!(arena.progress(1).percent, 33);
    }

    #[test]
    fn test_all_progress_matches_single_lookups() {
        let arena = TaskArena::new(vec![
            task(1, None, false),
            task(2, Some(1), true),
            task(3, Some(1), false),
            task(4, None, true),
        ]);
        let all = arena.all_progress();
        assert_eq!(all.len(), 4);
        for id in 1..=4 {
            assert_eq!(all[&id], arena.progress(id));
        }
    }

    #[test]
    fn test_large_subtree_counts_as_one_child() {
        let mut tasks = vec![task(1, None, false), task(2, Some(1), false), task(3, Some(1), true)];
        for id in 10..110 {
            tasks.push(task(id, Some(2), false));
        }
        let arena = TaskArena::new(tasks);
        assert_eq!(arena.progress(1).percent, 50);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut tasks = vec![task(1, None, true)];
        for id in 2..20_000 {
            tasks.push(task(id, Some(id - 1), id == 19_999));
        }
        let arena = TaskArena::new(tasks);
        assert_eq!(arena.progress(1).percent, 100);
        assert_eq!(arena.descendants_post_order(1).len(), 19_999);
        assert_eq!(arena.flatten(&[1]).len(), 19_999);

        let roots = arena.subtree(None);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children[0].task.id, 2);
        drop(roots);
    }

    #[test]
    fn test_flatten_lists_parents_before_children() {
        let mut late = task(3, Some(1), true);
        late.position = 5;
        let arena = TaskArena::new(vec![
            task(1, None, false),
            late,
            task(2, Some(1), false),
            task(4, Some(2), true),
            task(5, None, false),
            task(6, None, false),
        ]);

        let rows = arena.flatten(&[6, 1, 99]);
        let ids: Vec<i64> = rows.iter().map(|r| r.task.id).collect();
        assert_eq!(ids, vec![6, 1, 2, 4, 3]);

        assert_eq!(rows[1].progress, Progress { done: None, total: 2, percent: 100 });
        assert_eq!(rows[2].progress, Progress { done: None, total: 1, percent: 100 });
        assert_eq!(rows[3].progress, Progress::leaf(true));
    }
}
