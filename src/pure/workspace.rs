use crate::{
    core::layout::{IntoMessage, LayoutStack, Message},
    pure::Stack,
    Error, Result,
};
use std::collections::HashSet;

/// A named collection of client windows sharing a set of layouts.
///
/// A workspace is shown on at most one screen at a time. The `id` is the
/// position of the workspace in the tag list used at startup and is stable
/// for the lifetime of the window manager, unlike the screen (if any) that
/// the workspace is displayed on.
#[derive(Default, Debug, Clone)]
pub struct Workspace<C> {
    pub(crate) id: usize,
    pub(crate) tag: String,
    pub(crate) layouts: LayoutStack,
    pub(crate) stack: Option<Stack<C>>,
}

impl<C> Workspace<C> {
    /// Create a new Workspace with the given layouts and clients.
    pub fn new<T>(id: usize, tag: T, layouts: LayoutStack, stack: Option<Stack<C>>) -> Self
    where
        T: Into<String>,
    {
        Self {
            id,
            tag: tag.into(),
            layouts,
            stack,
        }
    }

    // Used to back-fill workspaces when there are more screens than tags.
    pub(crate) fn new_default(id: usize) -> Self {
        Self::new(id, format!("WS-{}", id + 1), LayoutStack::default(), None)
    }

    /// The id of this workspace.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The tag of this workspace.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// A reference to the underlying [Stack] of clients if there are any.
    pub fn stack(&self) -> Option<&Stack<C>> {
        self.stack.as_ref()
    }

    /// The name of the currently active layout for this workspace.
    pub fn layout_name(&self) -> String {
        self.layouts.name()
    }

    /// Returns `true` if this workspace has no clients.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_none()
    }

    /// The focused client of this workspace if there is one.
    pub fn focus(&self) -> Option<&C> {
        self.stack.as_ref().map(|s| &s.focus)
    }

    /// An iterator over all clients on this workspace in stack order.
    pub fn clients(&self) -> impl Iterator<Item = &C> {
        self.stack.iter().flat_map(|s| s.iter())
    }

    /// Returns `true` if the given client is part of this workspace.
    pub fn contains(&self, c: &C) -> bool
    where
        C: PartialEq,
    {
        self.stack.as_ref().map(|s| s.contains(c)).unwrap_or(false)
    }

    pub(crate) fn remove_focused(&mut self) -> Option<C> {
        let current = self.stack.take();
        let (focus, new_stack) = current?.remove_focused();
        self.stack = new_stack;

        Some(focus)
    }

    pub(crate) fn remove(&mut self, c: &C) -> Option<C>
    where
        C: PartialEq,
    {
        let current = self.stack.take();
        let (maybe_c, new_stack) = current?.remove(c);
        self.stack = new_stack;

        maybe_c
    }

    /// Send the given message to the active layout of this workspace.
    ///
    /// Returns `true` if the layout reported a change of state.
    pub fn handle_message<M>(&mut self, m: M) -> bool
    where
        M: IntoMessage,
    {
        self.layouts.handle_message(&m.into_message())
    }

    pub(crate) fn handle_message_ref(&mut self, m: &Message) -> bool {
        self.layouts.handle_message(m)
    }

    /// Send the given message to every layout available to this workspace,
    /// not just the active one.
    ///
    /// Returns `true` if any layout reported a change of state.
    pub fn broadcast_message<M>(&mut self, m: M) -> bool
    where
        M: IntoMessage,
    {
        self.layouts.broadcast_message(&m.into_message())
    }

    pub(crate) fn broadcast_message_ref(&mut self, m: &Message) -> bool {
        self.layouts.broadcast_message(m)
    }

    /// Switch to the next available layout for this workspace.
    pub fn next_layout(&mut self) {
        self.layouts.switch_focus(|s| {
            s.focus_down();
        });
    }

    /// Switch to the previous available layout for this workspace.
    pub fn previous_layout(&mut self) {
        self.layouts.switch_focus(|s| {
            s.focus_up();
        });
    }

    /// Switch to the first layout with the given name, if there is one.
    pub fn set_layout_by_name(&mut self, name: impl AsRef<str>) -> bool {
        self.layouts.set_by_name(name.as_ref())
    }
}

// Tags must be unique so that they can be used to address workspaces.
pub(crate) fn check_unique_tags<C>(workspaces: &[Workspace<C>]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();

    for w in workspaces.iter() {
        if !seen.insert(&w.tag) {
            duplicates.push(w.tag.clone());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::NonUniqueTags { tags: duplicates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack;
    use simple_test_case::test_case;

    #[test_case(Some(stack!([1, 2], 3, [4, 5])), Some(5), true; "known in stack")]
    #[test_case(Some(stack!(5)), Some(5), false; "known focus only")]
    #[test_case(Some(stack!([1, 2], 3, [4])), None, true; "unknown")]
    #[test_case(None, None, false; "empty stack")]
    #[test]
    fn remove_returns_as_expected(stack: Option<Stack<u8>>, maybe_c: Option<u8>, is_some: bool) {
        let mut w = Workspace::new(0, "test", LayoutStack::default(), stack);

        assert_eq!(w.remove(&5), maybe_c);
        assert_eq!(w.stack.is_some(), is_some);
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let workspaces: Vec<Workspace<u8>> = ["1", "2", "1"]
            .iter()
            .enumerate()
            .map(|(i, t)| Workspace::new(i, *t, LayoutStack::default(), None))
            .collect();

        let res = check_unique_tags(&workspaces);

        assert!(
            matches!(res, Err(Error::NonUniqueTags { tags }) if tags == vec!["1".to_string()])
        );
    }
}
