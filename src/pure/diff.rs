//! A diff of changes to the pure window manager state.
//!
//! Reconciliation against the X server is driven entirely by comparing a
//! snapshot of the pure state before and after a transformation. Membership
//! changes are computed as set differences on client identity so that a
//! client moving between two visible workspaces in a single transformation
//! is never unmapped by mistake.
use crate::pure::{geometry::Rect, screen::Screen};
use std::{collections::HashSet, hash::Hash, iter::once, mem::swap};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ScreenState<C>
where
    C: Copy + Clone + PartialEq + Eq + Hash,
{
    pub screen: usize,
    pub tag: String,
    pub clients: Vec<C>,
}

impl<C> From<&Screen<C>> for ScreenState<C>
where
    C: Copy + Clone + PartialEq + Eq + Hash,
{
    fn from(s: &Screen<C>) -> Self {
        Self {
            screen: s.index,
            tag: s.workspace.tag.clone(),
            clients: s.workspace.clients().copied().collect(),
        }
    }
}

/// A summary of the information required to update the X server state from
/// our own internal pure state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot<C>
where
    C: Copy + Clone + PartialEq + Eq + Hash,
{
    pub focused_client: Option<C>,
    pub focused: ScreenState<C>,
    pub visible: Vec<ScreenState<C>>,
    pub positions: Vec<(C, Rect)>,
    pub hidden_clients: Vec<C>,
    pub killed_clients: Vec<C>,
}

impl<C> Snapshot<C>
where
    C: Copy + Clone + PartialEq + Eq + Hash,
{
    pub(crate) fn visible_clients(&self) -> impl Iterator<Item = &C> {
        self.positions.iter().map(|(c, _)| c)
    }

    pub(crate) fn all_clients(&self) -> impl Iterator<Item = &C> {
        self.focused
            .clients
            .iter()
            .chain(self.visible.iter().flat_map(|s| s.clients.iter()))
            .chain(self.hidden_clients.iter())
    }
}

/// The before and after state of the last pure state transformation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Diff<C>
where
    C: Copy + Clone + PartialEq + Eq + Hash,
{
    pub before: Snapshot<C>,
    pub after: Snapshot<C>,
}

impl<C> Diff<C>
where
    C: Copy + Clone + PartialEq + Eq + Hash,
{
    #[cfg(test)]
    pub fn new(before: Snapshot<C>, after: Snapshot<C>) -> Self {
        Self { before, after }
    }

    pub fn update(&mut self, after: Snapshot<C>) {
        swap(&mut self.before, &mut self.after);
        self.after = after;
    }

    pub fn focused_client_changed(&self) -> bool {
        self.before.focused_client != self.after.focused_client
    }

    /// Clients that are in the model now but were not before.
    pub fn new_clients(&self) -> impl Iterator<Item = &C> {
        let before: HashSet<_> = self.before.all_clients().collect();

        self.after
            .all_clients()
            .filter(move |c| !before.contains(c))
    }

    /// Clients that had a screen position before but no longer do.
    pub fn hidden_clients(&self) -> impl Iterator<Item = &C> {
        let after: HashSet<_> = self.after.visible_clients().collect();

        self.before
            .visible_clients()
            .filter(move |c| !after.contains(c))
    }

    /// Clients that currently have a screen position.
    pub fn visible_clients(&self) -> impl Iterator<Item = &C> {
        self.after.visible_clients()
    }

    /// Clients that have left the model entirely.
    pub fn withdrawn_clients(&self) -> impl Iterator<Item = &C> {
        let after: HashSet<_> = self.after.all_clients().collect();

        self.before
            .all_clients()
            .filter(move |c| !after.contains(c))
    }

    /// Clients removed from the model that should now be closed.
    pub fn killed_clients(&self) -> impl Iterator<Item = &C> {
        self.after.killed_clients.iter()
    }

    pub fn previous_visible_tags(&self) -> HashSet<&str> {
        once(self.before.focused.tag.as_ref())
            .chain(self.before.visible.iter().map(|s| s.tag.as_ref()))
            .collect()
    }

    #[cfg(test)]
    pub fn current_visible_tags(&self) -> HashSet<&str> {
        once(self.after.focused.tag.as_ref())
            .chain(self.after.visible.iter().map(|s| s.tag.as_ref()))
            .collect()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        !(self.focused_client_changed()
            || self.new_clients().count() > 0
            || self.withdrawn_clients().count() > 0
            || self.previous_visible_tags() != self.current_visible_tags()
            || self.before.positions != self.after.positions
            || !self.after.killed_clients.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pure::stack_set::tests::{test_stack_set, test_stack_set_with_stacks},
        pure::StackSet,
        stack,
    };
    use simple_test_case::test_case;

    impl StackSet<u8> {
        fn snapshot_with_positions(&mut self) -> Snapshot<u8> {
            let positions: Vec<_> = self
                .screens()
                .flat_map(|s| s.workspace.clients().map(|&c| (c, s.geometry())))
                .collect();

            self.snapshot(positions)
        }
    }

    #[test]
    fn diff_of_unchanged_stackset_is_empty() {
        let mut s: StackSet<u8> = test_stack_set(5, 2);
        let positions: Vec<_> = s.clients().map(|&c| (c, Rect::default())).collect();
        let ss = s.snapshot(positions);

        let diff = Diff::new(ss.clone(), ss);

        assert!(diff.is_empty())
    }

    #[test]
    fn adding_a_client_is_new_in_diff() {
        let mut s: StackSet<u8> = test_stack_set(5, 2);
        let before = s.snapshot_with_positions();

        s.insert(1);

        let diff = Diff::new(before, s.snapshot_with_positions());
        let new: Vec<&u8> = diff.new_clients().collect();

        assert_eq!(new, vec![&1]);
    }

    #[test]
    fn focusing_new_workspace_hides_old_clients_and_tag_in_diff() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!(1, [2])), None, None], 1);
        let before = s.snapshot_with_positions();

        s.focus_tag("3");

        let diff = Diff::new(before, s.snapshot_with_positions());
        let hidden: HashSet<&u8> = diff.hidden_clients().collect();

        assert_eq!(hidden, HashSet::from([&1, &2]));
        assert!(diff.previous_visible_tags().contains("1"));
    }

    #[test]
    fn removing_focused_client_sets_withdrawn_and_hidden_in_diff() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!(1, [2]))], 1);
        let before = s.snapshot_with_positions();

        s.remove_focused();

        let diff = Diff::new(before, s.snapshot_with_positions());

        assert!(diff.withdrawn_clients().any(|&c| c == 1));
        assert!(diff.hidden_clients().any(|&c| c == 1));
    }

    #[test]
    fn killing_focused_client_sets_killed_withdrawn_and_hidden_in_diff() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!(1, [2]))], 1);
        let before = s.snapshot_with_positions();

        s.kill_focused();

        let diff = Diff::new(before, s.snapshot_with_positions());

        assert!(diff.withdrawn_clients().any(|&c| c == 1));
        assert!(diff.hidden_clients().any(|&c| c == 1));
        assert!(diff.killed_clients().any(|&c| c == 1));
    }

    // A client moving between two workspaces that are both visible before
    // and after the change must never be reported as hidden: membership is
    // tracked by identity, not by position in any particular list.
    #[test_case(true; "moved to focused workspace")]
    #[test_case(false; "moved to other visible workspace")]
    #[test]
    fn client_moving_between_visible_workspaces_is_not_hidden(to_focused: bool) {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!(1)), Some(stack!(2))], 2);
        let before = s.snapshot_with_positions();

        if to_focused {
            s.move_client_to_tag(&2, "1");
        } else {
            s.move_client_to_tag(&1, "2");
        }

        let diff = Diff::new(before, s.snapshot_with_positions());

        assert_eq!(diff.hidden_clients().count(), 0);
        assert_eq!(diff.withdrawn_clients().count(), 0);
    }

    #[test]
    fn moving_client_to_hidden_workspace_sets_hidden_in_diff() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!(1, [2])), None], 1);
        let before = s.snapshot_with_positions();

        s.move_client_to_tag(&1, "2");

        let diff = Diff::new(before, s.snapshot_with_positions());

        assert!(diff.hidden_clients().any(|&c| c == 1));
        assert_eq!(diff.withdrawn_clients().count(), 0);
    }
}
