//! Layouts for positioning client windows on the screen within a given
//! workspace.
use crate::{
    builtin::layout::{
        messages::{Hide, NextLayout, PreviousLayout, SetLayout},
        MainAndStack,
    },
    pure::{geometry::Rect, Stack},
    Xid,
};
use std::{any::Any, fmt};

/// A dynamically typed message to be sent to a [Layout] for processing
pub struct Message(Box<dyn Any>);

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message").finish()
    }
}

impl Message {
    /// Attempt to extract a reference to the underlying message type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

/// Marker trait for a type that can be sent as a [Message]
pub trait IntoMessage: Any {
    /// Wrap this value as a dynamically typed message
    fn into_message(self) -> Message
    where
        Self: Sized,
    {
        Message(Box::new(self))
    }
}

/// A [Layout] is responsible for positioning a [Stack] of clients in a given
/// coordinate space denoting the dimensions of the user's display.
///
/// Mutating the state of a Layout is possible by sending it a [Message]
/// which can either modify the layout in place or swap it out for a new one
/// entirely. There is no requirement to be able to handle all message types.
pub trait Layout {
    /// A short display name for this Layout, appropriate for rendering in a
    /// status bar as an indicator of which layout is currently being used.
    ///
    /// The name is also the identity used to look this layout back up when
    /// state is restored over an in-place restart, so it should be stable
    /// and unique within the layouts available to a workspace.
    fn name(&self) -> String;

    /// Create a clone of this layout as a trait object.
    fn boxed_clone(&self) -> Box<dyn Layout>;

    /// Generate screen positions for the clients of a given workspace.
    ///
    /// The default implementation calls [Layout::layout] if there are any
    /// clients present and [Layout::layout_empty] if not.
    ///
    /// # Positioning clients
    /// For each client that should be shown on the screen a pair of its
    /// [Xid] and a [Rect] should be provided, indicating the screen position
    /// the client should be placed at. To hide a client that was present in
    /// the [Stack] simply do not provide a position for it.
    ///
    /// The order in which the pairs are returned is the stacking order on
    /// the screen: the first pair returned ends up on top.
    ///
    /// # Returning a new layout
    /// Returning `Some(layout)` replaces this layout for subsequent calls,
    /// which allows a layout to retain internal state (such as the current
    /// selection of a sub-layout) without mutating in place.
    fn layout_workspace(
        &mut self,
        tag: &str,
        stack: &Option<Stack<Xid>>,
        r: Rect,
    ) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
        match stack {
            Some(s) => self.layout(s, r),
            None => self.layout_empty(r),
        }
    }

    /// Generate screen positions for clients from a given [Stack].
    ///
    /// See [Layout::layout_workspace] for details of how positions should be
    /// returned.
    fn layout(&mut self, s: &Stack<Xid>, r: Rect) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>);

    /// Generate screen positions for an empty [Stack].
    ///
    /// See [Layout::layout_workspace] for details of how positions should be
    /// returned.
    fn layout_empty(&mut self, _r: Rect) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
        (None, vec![])
    }

    /// Process a dynamic [Message].
    ///
    /// Returns `Some` if (and only if) the layout changed in response to the
    /// message: either `self` after an in-place update or a replacement
    /// layout to swap in. Returning `None` indicates that the message was
    /// not recognised (or required no change) and that no refresh of screen
    /// state is needed.
    fn handle_message(&mut self, m: &Message) -> Option<Box<dyn Layout>>;
}

impl Clone for Box<dyn Layout> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

impl fmt::Debug for Box<dyn Layout> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout").field("name", &self.name()).finish()
    }
}

impl Default for Box<dyn Layout> {
    fn default() -> Self {
        Box::<MainAndStack>::default()
    }
}

/// A stack of [Layout] options for use on a particular workspace.
///
/// Only the focused layout is run to position clients. Sending a
/// [NextLayout] / [PreviousLayout] message rotates the selection and
/// [SetLayout] jumps to the layout with a matching name; in each case the
/// outgoing layout is sent [Hide] before the switch so that it can release
/// any state tied to being on screen. All other messages are forwarded to
/// the focused layout.
pub type LayoutStack = Stack<Box<dyn Layout>>;

impl LayoutStack {
    /// The name of the currently focused layout.
    pub fn name(&self) -> String {
        self.focus.name()
    }

    pub(crate) fn layout_workspace(
        &mut self,
        tag: &str,
        stack: &Option<Stack<Xid>>,
        r: Rect,
    ) -> Vec<(Xid, Rect)> {
        let (new, positions) = self.focus.layout_workspace(tag, stack, r);

        if let Some(l) = new {
            self.focus = l;
        }

        positions
    }

    // Let the focused layout know that it is being taken off screen before
    // the switch happens.
    fn hide_focused(&mut self) {
        if let Some(new) = self.focus.handle_message(&Hide.into_message()) {
            self.focus = new;
        }
    }

    // Returns false when there is nothing to switch to: rotating a single
    // layout is the identity and must not trigger a refresh.
    pub(crate) fn switch_focus<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut Self),
    {
        if self.len() == 1 {
            return false;
        }

        self.hide_focused();
        f(self);

        true
    }

    pub(crate) fn set_by_name(&mut self, name: &str) -> bool {
        if self.focus.name() == name || !self.iter().any(|l| l.name() == name) {
            return false;
        }

        self.hide_focused();

        for _ in 0..self.len() {
            if self.focus.name() == name {
                return true;
            }
            self.focus_down();
        }

        false
    }

    /// Process a [Message], either switching the focused layout or
    /// forwarding the message to it.
    ///
    /// Returns `true` if the message resulted in a change of layout state.
    pub fn handle_message(&mut self, m: &Message) -> bool {
        if m.downcast_ref::<NextLayout>().is_some() {
            self.switch_focus(|s| {
                s.focus_down();
            })
        } else if m.downcast_ref::<PreviousLayout>().is_some() {
            self.switch_focus(|s| {
                s.focus_up();
            })
        } else if let Some(SetLayout(name)) = m.downcast_ref() {
            self.set_by_name(name)
        } else if let Some(new) = self.focus.handle_message(m) {
            self.focus = new;
            true
        } else {
            false
        }
    }

    /// Send the given [Message] to every [Layout] in this stack rather than
    /// just the currently focused one.
    ///
    /// Returns `true` if any layout reported a change of state.
    pub fn broadcast_message(&mut self, m: &Message) -> bool {
        let mut changed = false;

        for l in self.iter_mut() {
            if let Some(new) = l.handle_message(m) {
                *l = new;
                changed = true;
            }
        }

        changed
    }
}

/// A wrapper around some inner [Layout] that modifies the viewport it is
/// asked to fill, the positions it generates, or both.
///
/// Transformers automatically pass unhandled messages through to the inner
/// layout.
pub trait LayoutTransformer: Clone + Sized + 'static {
    /// The same as [Layout::name] but for the transformed layout.
    fn transformed_name(&self) -> String;

    /// A mutable reference to the wrapped inner [Layout].
    fn inner_mut(&mut self) -> &mut Box<dyn Layout>;

    /// Optionally modify the screen dimensions before they are passed to the
    /// inner [Layout].
    fn transform_initial(&self, r: Rect) -> Rect {
        r
    }

    /// Optionally modify the positions returned by the inner [Layout] before
    /// they are applied by the window manager. `r` is the original dimension
    /// of the screen being laid out, before
    /// [transform_initial][LayoutTransformer::transform_initial] was applied.
    fn transform_positions(&mut self, r: Rect, positions: Vec<(Xid, Rect)>) -> Vec<(Xid, Rect)> {
        let _ = r;
        positions
    }
}

impl<LT> Layout for LT
where
    LT: LayoutTransformer,
{
    fn name(&self) -> String {
        self.transformed_name()
    }

    fn boxed_clone(&self) -> Box<dyn Layout> {
        Box::new(self.clone())
    }

    fn layout_workspace(
        &mut self,
        tag: &str,
        stack: &Option<Stack<Xid>>,
        r: Rect,
    ) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
        let r_inner = self.transform_initial(r);
        let (new, positions) = self.inner_mut().layout_workspace(tag, stack, r_inner);

        if let Some(l) = new {
            *self.inner_mut() = l;
        }

        (None, self.transform_positions(r, positions))
    }

    fn layout(&mut self, s: &Stack<Xid>, r: Rect) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
        let r_inner = self.transform_initial(r);
        let (new, positions) = self.inner_mut().layout(s, r_inner);

        if let Some(l) = new {
            *self.inner_mut() = l;
        }

        (None, self.transform_positions(r, positions))
    }

    fn layout_empty(&mut self, r: Rect) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
        let r_inner = self.transform_initial(r);
        let (new, positions) = self.inner_mut().layout_empty(r_inner);

        if let Some(l) = new {
            *self.inner_mut() = l;
        }

        (None, self.transform_positions(r, positions))
    }

    fn handle_message(&mut self, m: &Message) -> Option<Box<dyn Layout>> {
        match self.inner_mut().handle_message(m) {
            Some(new) => {
                *self.inner_mut() = new;
                Some(self.boxed_clone())
            }
            None => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::stack;

    // A layout that records whether it has been hidden so that selector
    // behaviour can be observed from the outside.
    #[derive(Debug, Clone)]
    pub(crate) struct TestLayout {
        name: String,
        hidden: bool,
    }

    impl TestLayout {
        pub fn boxed(name: impl Into<String>) -> Box<dyn Layout> {
            Box::new(Self {
                name: name.into(),
                hidden: false,
            })
        }
    }

    impl Layout for TestLayout {
        fn name(&self) -> String {
            if self.hidden {
                format!("{}*", self.name)
            } else {
                self.name.clone()
            }
        }

        fn boxed_clone(&self) -> Box<dyn Layout> {
            Box::new(self.clone())
        }

        fn layout(
            &mut self,
            s: &Stack<Xid>,
            r: Rect,
        ) -> (Option<Box<dyn Layout>>, Vec<(Xid, Rect)>) {
            (None, s.iter().map(|&c| (c, r)).collect())
        }

        fn handle_message(&mut self, m: &Message) -> Option<Box<dyn Layout>> {
            if m.downcast_ref::<Hide>().is_some() {
                self.hidden = true;
                Some(self.boxed_clone())
            } else {
                None
            }
        }
    }

    fn test_layouts() -> LayoutStack {
        stack!(
            TestLayout::boxed("a"),
            TestLayout::boxed("b"),
            TestLayout::boxed("c")
        )
    }

    #[test]
    fn next_layout_rotates_the_selection() {
        let mut ls = test_layouts();

        assert_eq!(ls.name(), "a");

        let changed = ls.handle_message(&NextLayout.into_message());
        assert!(changed);
        assert_eq!(ls.name(), "b");

        ls.handle_message(&NextLayout.into_message());
        assert_eq!(ls.name(), "c");

        ls.handle_message(&NextLayout.into_message());
        // 'a' was hidden when it was rotated away from so its name is now tagged
        assert_eq!(ls.name(), "a*");
    }

    #[test]
    fn rotating_a_single_layout_reports_no_change() {
        let mut ls: LayoutStack = stack!(TestLayout::boxed("a"));

        assert!(!ls.handle_message(&NextLayout.into_message()));
        assert!(!ls.handle_message(&PreviousLayout.into_message()));

        // no switch happened so the layout was never hidden
        assert_eq!(ls.name(), "a");
    }

    #[test]
    fn outgoing_layout_is_sent_hide() {
        let mut ls = test_layouts();

        ls.handle_message(&NextLayout.into_message());

        let names: Vec<String> = ls.iter().map(|l| l.name()).collect();

        assert_eq!(names, vec!["a*", "b", "c"]);
    }

    #[test]
    fn set_layout_by_name_jumps_to_the_matching_layout() {
        let mut ls = test_layouts();

        let changed = ls.handle_message(&SetLayout("c".to_string()).into_message());

        assert!(changed);
        assert_eq!(ls.name(), "c");
    }

    #[test]
    fn set_layout_by_name_with_unknown_name_reports_no_change() {
        let mut ls = test_layouts();

        let changed = ls.handle_message(&SetLayout("nope".to_string()).into_message());

        assert!(!changed);
        assert_eq!(ls.name(), "a");
    }

    #[test]
    fn unknown_messages_report_no_change() {
        struct Unknown;
        impl IntoMessage for Unknown {}

        let mut ls = test_layouts();

        assert!(!ls.handle_message(&Unknown.into_message()));
    }
}
