use crate::{
    core::layout::{LayoutStack, Message},
    pure::{
        diff::{ScreenState, Snapshot},
        geometry::{Rect, RelativeRect, RelativeTo},
        screen::StatusGap,
        workspace::check_unique_tags,
        Position, Screen, Stack, Workspace,
    },
    stack, Error, Result,
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    hash::Hash,
    mem::{swap, take},
};

/// The side-effect free internal state representation of the window manager.
///
/// The [Workspace] shown on the focused [Screen] is the current workspace and
/// its focused client (if there is one) is the focused client of the whole
/// window manager. All other on-screen workspaces are visible and everything
/// else is hidden.
#[derive(Default, Debug, Clone)]
pub struct StackSet<C>
where
    C: Clone + PartialEq + Eq + Hash,
{
    pub(crate) screens: Stack<Screen<C>>, // Workspaces visible on screens
    pub(crate) hidden: VecDeque<Workspace<C>>, // Workspaces not currently on any screen
    pub(crate) floating: HashMap<C, RelativeRect>, // Floating client positions
    pub(crate) killed_clients: Vec<C>, // Clients pending removal on the X side
}

impl<C> StackSet<C>
where
    C: Clone + PartialEq + Eq + Hash,
{
    /// Create a new [StackSet] of empty workspaces with the given tags.
    ///
    /// # Errors
    /// This method will error if there are not enough workspaces to cover the
    /// attached screens or if no screens are attached.
    pub fn try_new<I, J, T>(layouts: LayoutStack, ws_tags: I, screen_details: J) -> Result<Self>
    where
        T: Into<String>,
        I: IntoIterator<Item = T>,
        J: IntoIterator<Item = Rect>,
    {
        let workspaces: Vec<Workspace<C>> = ws_tags
            .into_iter()
            .enumerate()
            .map(|(i, tag)| Workspace::new(i, tag, layouts.clone(), None))
            .collect();

        let screen_details: Vec<Rect> = screen_details.into_iter().collect();

        Self::try_new_concrete(workspaces, screen_details, HashMap::new())
    }

    pub(crate) fn try_new_concrete(
        mut workspaces: Vec<Workspace<C>>,
        screen_details: Vec<Rect>,
        floating: HashMap<C, RelativeRect>,
    ) -> Result<Self> {
        check_unique_tags(&workspaces)?;

        match (workspaces.len(), screen_details.len()) {
            (_, 0) => return Err(Error::NoScreens),
            (n_ws, n_screens) if n_ws < n_screens => {
                return Err(Error::InsufficientWorkspaces { n_ws, n_screens })
            }
            _ => (),
        }

        let hidden: VecDeque<Workspace<C>> = workspaces
            .split_off(screen_details.len())
            .into_iter()
            .collect();

        let screens =
            Stack::from_iter_unchecked(workspaces.into_iter().zip(screen_details).enumerate().map(
                |(index, (workspace, r))| Screen {
                    workspace,
                    index,
                    r,
                    gap: StatusGap::default(),
                },
            ));

        Ok(Self {
            screens,
            hidden,
            floating,
            killed_clients: vec![],
        })
    }

    /// Set focus to the [Screen] with the specified index.
    ///
    /// If there is no matching screen then the [StackSet] is unmodified.
    pub fn focus_screen(&mut self, screen_index: usize) {
        let current = self.screens.focus.index;
        if current == screen_index {
            return;
        }

        loop {
            self.screens.focus_down();
            if [current, screen_index].contains(&self.screens.focus.index) {
                break;
            }
        }
    }

    /// Set focus to the [Workspace] with the specified tag.
    ///
    /// If there is no matching workspace then the [StackSet] is unmodified.
    /// If the [Workspace] is currently visible on another screen then focus
    /// moves to that screen, otherwise the workspace replaces whatever was on
    /// the active screen and the displaced workspace becomes hidden.
    ///
    /// If you always want to focus the given tag on the active screen, see
    /// [StackSet::pull_tag_to_screen] instead.
    pub fn focus_tag(&mut self, tag: impl AsRef<str>) {
        let tag = tag.as_ref();

        if self.screens.focus.workspace.tag == tag {
            return; // already focused
        }

        // If the tag is visible on another screen, focus moves to that screen
        if !self.try_cycle_screen_to_tag(tag) {
            // If the tag is hidden then it gets moved to the current screen
            self.try_swap_on_screen_workspace_with_hidden(tag);
        }

        // If nothing matched by this point then the requested tag is unknown
        // so there is nothing for us to do
    }

    fn try_cycle_screen_to_tag(&mut self, tag: &str) -> bool {
        let current_tag = self.screens.focus.workspace.tag.clone();

        loop {
            self.screens.focus_down();
            match &self.screens.focus.workspace.tag {
                // we've found and focused the tag
                t if t == tag => return true,

                // we've looped so this tag isn't visible
                t if t == &current_tag => return false,

                // try the next tag
                _ => (),
            }
        }
    }

    fn try_swap_on_screen_workspace_with_hidden(&mut self, tag: &str) {
        if let Some(mut w) = pop_where!(self, hidden, |w: &Workspace<C>| w.tag == tag) {
            swap(&mut w, &mut self.screens.focus.workspace);
            self.hidden.push_back(w);
        }
    }

    // true if we swapped otherwise false
    fn try_swap_focused_workspace_with_tag(&mut self, tag: &str) -> bool {
        if self.screens.focus.workspace.tag == tag {
            return false;
        }

        let p = |s: &&mut Screen<C>| s.workspace.tag == tag;

        let in_up = self.screens.up.iter_mut().find(p);
        let in_down = self.screens.down.iter_mut().find(p);

        if let Some(s) = in_up.or(in_down) {
            swap(&mut self.screens.focus.workspace, &mut s.workspace);
            return true;
        }

        false
    }

    /// Focus the requested tag on the current screen.
    ///
    /// If the tag is currently visible on another screen the two screens swap
    /// their workspaces, otherwise this is the same as [StackSet::focus_tag].
    pub fn pull_tag_to_screen(&mut self, tag: impl AsRef<str>) {
        let tag = tag.as_ref();

        if self.screens.focus.workspace.tag == tag {
            return;
        }

        if !self.try_swap_focused_workspace_with_tag(tag) {
            self.try_swap_on_screen_workspace_with_hidden(tag);
        }
    }

    /// Focus the given client and set its [Workspace] as current (see
    /// [StackSet::focus_tag]).
    ///
    /// If the client is unknown then this is a no-op.
    pub fn focus_client(&mut self, client: &C) {
        if self.current_client() == Some(client) {
            return; // already focused
        }

        let tag = match self.tag_for_client(client) {
            Some(tag) => tag.to_string(),
            None => return, // unknown client
        };

        self.focus_tag(&tag);

        while self.current_client() != Some(client) {
            self.focus_up()
        }
    }

    /// Insert the given client above the current focus point of the current
    /// [Stack], focusing it.
    pub fn insert(&mut self, client: C) {
        self.insert_at(Position::default(), client)
    }

    /// Insert the given client into the current [Stack] at the requested
    /// [Position]. If the client is already present somewhere in the
    /// [StackSet] the stack set is unmodified.
    pub fn insert_at(&mut self, pos: Position, client: C) {
        if self.contains(&client) {
            return;
        }

        self.modify(|current_stack| match current_stack {
            Some(mut s) => {
                s.insert_at(pos, client);
                Some(s)
            }
            None => Some(stack!(client)),
        })
    }

    /// Record the given client as floating in the given screen position.
    ///
    /// If the client is not currently part of this [StackSet] it is first
    /// inserted at the focus point of the current workspace.
    pub fn float<R>(&mut self, client: C, r: R)
    where
        R: RelativeTo,
    {
        if !self.contains(&client) {
            self.insert(client.clone());
        }

        self.float_unchecked(client, r);
    }

    pub(crate) fn float_unchecked<R: RelativeTo>(&mut self, client: C, r: R) {
        let r_screen = self
            .screen_for_client(&client)
            .map(|s| s.r)
            .unwrap_or(self.screens.focus.r);
        let r = r.relative_to(&r_screen);
        self.floating.insert(client, r);
    }

    /// Clear the floating status of a client, returning its previous
    /// preferred screen position if the client was floating, otherwise
    /// `None`. The client reverts to its tiled position.
    pub fn sink(&mut self, client: &C) -> Option<Rect> {
        self.floating
            .remove(client)
            .map(|rr| rr.applied_to(&self.screens.focus.r))
    }

    /// Delete a client from this [StackSet].
    ///
    /// The client is purged from whichever workspace stack holds it and from
    /// the floating layer. This is a no-op if the client is unknown.
    pub fn remove_client(&mut self, client: &C) -> Option<C> {
        self.sink(client); // Clear any floating information we might have

        self.workspaces_mut()
            .map(|w| w.remove(client))
            .find(|opt| opt.is_some())
            .flatten()
    }

    /// Remove the currently focused client from this stack set if there is
    /// one, returning it to the caller.
    pub fn remove_focused(&mut self) -> Option<C> {
        let client = self.current_client()?.clone();
        self.remove_client(&client)
    }

    /// Delete the currently focused client from this stack set if there is
    /// one.
    ///
    /// The client is recorded for processing on the X side so that the next
    /// refresh can close it using the correct client protocol.
    pub fn kill_focused(&mut self) {
        if let Some(client) = self.remove_focused() {
            self.killed_clients.push(client);
        }
    }

    /// Move the focused client of the current [Workspace] to the focused
    /// position of the workspace matching the provided `tag`.
    ///
    /// Focus on the source workspace moves to the next client below the one
    /// that was moved. Moving the only client of a workspace leaves that
    /// workspace empty.
    pub fn move_focused_to_tag(&mut self, tag: impl AsRef<str>) {
        let tag = tag.as_ref();
        if self.current_tag() == tag || !self.contains_tag(tag) {
            return;
        }

        let c = match self.screens.focus.workspace.remove_focused() {
            None => return,
            Some(c) => c,
        };

        self.insert_as_focus_for(tag, c)
    }

    /// Move the given client to the focused position of the [Workspace]
    /// matching the provided `tag`, preserving the focus of the source
    /// workspace where possible. If the client is already on the target
    /// workspace it is moved to the focused position.
    pub fn move_client_to_tag(&mut self, client: &C, tag: impl AsRef<str>) {
        let tag = tag.as_ref();

        if !self.contains_tag(tag) {
            return;
        }

        // Not calling self.remove_client as that will also sink the client
        // if it was floating
        let maybe_removed = self
            .workspaces_mut()
            .map(|w| w.remove(client))
            .find(|opt| opt.is_some())
            .flatten();

        let c = match maybe_removed {
            None => return,
            Some(c) => c,
        };

        self.insert_as_focus_for(tag, c)
    }

    /// Insert a client as the current focus for the given tag.
    ///
    /// NOTE: This will silently fail if the tag is not in the StackSet which
    ///       is why the method is not in the public API
    pub(crate) fn insert_as_focus_for(&mut self, tag: &str, c: C) {
        self.modify_workspace(tag, |w| {
            w.stack = Some(match take(&mut w.stack) {
                None => stack!(c),
                Some(mut s) => {
                    s.insert_at(Position::Focus, c);
                    s
                }
            });
        });
    }

    /// Is the given tag present in the [StackSet]?
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.workspaces().any(|w| w.tag == tag)
    }

    /// All [Workspace] tags in this [StackSet] ordered by their id.
    pub fn ordered_tags(&self) -> Vec<String> {
        let mut indexed: Vec<_> = self.workspaces().map(|w| (w.id, w.tag.clone())).collect();

        indexed.sort_by_key(|(id, _)| *id);

        indexed.into_iter().map(|(_, tag)| tag).collect()
    }

    /// Find the tag of the [Workspace] currently displayed on [Screen]
    /// `index`. Returns [None] if the index is out of bounds.
    pub fn tag_for_screen(&self, index: usize) -> Option<&str> {
        self.screens()
            .find(|s| s.index == index)
            .map(|s| s.workspace.tag.as_str())
    }

    /// Find the tag of the [Workspace] containing a given client.
    /// Returns Some(tag) if the client is known otherwise None.
    pub fn tag_for_client(&self, client: &C) -> Option<&str> {
        self.workspaces()
            .find(|w| w.contains(client))
            .map(|w| w.tag.as_str())
    }

    /// Find the tag of the [Workspace] with the given workspace id.
    pub fn tag_for_workspace_id(&self, id: usize) -> Option<String> {
        self.workspaces()
            .find(|w| w.id == id)
            .map(|w| w.tag.clone())
    }

    /// If the given client is currently visible on a screen return a
    /// reference to that screen, otherwise None.
    pub fn screen_for_client(&self, client: &C) -> Option<&Screen<C>> {
        self.screens.iter().find(|s| s.workspace.contains(client))
    }

    /// Returns `true` if the [StackSet] contains an element equal to the
    /// given value.
    pub fn contains(&self, client: &C) -> bool {
        self.clients().any(|c| c == client)
    }

    /// Extract a reference to the focused element of the current [Stack]
    pub fn current_client(&self) -> Option<&C> {
        self.screens
            .focus
            .workspace
            .stack
            .as_ref()
            .map(|s| &s.focus)
    }

    /// An immutable reference to the currently focused [Screen]
    pub fn current_screen(&self) -> &Screen<C> {
        &self.screens.focus
    }

    /// An immutable reference to the current [Workspace]
    pub fn current_workspace(&self) -> &Workspace<C> {
        &self.screens.focus.workspace
    }

    /// A mutable reference to the current [Workspace]
    pub fn current_workspace_mut(&mut self) -> &mut Workspace<C> {
        &mut self.screens.focus.workspace
    }

    /// An immutable reference to the current [Stack] if there is one
    pub fn current_stack(&self) -> Option<&Stack<C>> {
        self.screens.focus.workspace.stack.as_ref()
    }

    /// The `tag` of the current [Workspace]
    pub fn current_tag(&self) -> &str {
        &self.screens.focus.workspace.tag
    }

    /// A reference to the [Workspace] with a tag of `tag` if there is one
    pub fn workspace(&self, tag: &str) -> Option<&Workspace<C>> {
        self.workspaces().find(|w| w.tag == tag)
    }

    /// A mutable reference to the [Workspace] with a tag of `tag` if there
    /// is one
    pub fn workspace_mut(&mut self, tag: &str) -> Option<&mut Workspace<C>> {
        self.workspaces_mut().find(|w| w.tag == tag)
    }

    /// Switch to the next available layout on the focused [Workspace]
    pub fn next_layout(&mut self) {
        self.screens.focus.workspace.next_layout()
    }

    /// Switch to the previous available layout on the focused [Workspace]
    pub fn previous_layout(&mut self) {
        self.screens.focus.workspace.previous_layout()
    }

    /// Switch to the first layout matching the given name on the focused
    /// [Workspace]
    pub fn set_layout_by_name(&mut self, name: impl AsRef<str>) {
        self.screens.focus.workspace.set_layout_by_name(name);
    }

    /// Move focus to the next [Screen]
    pub fn next_screen(&mut self) {
        self.screens.focus_down();
    }

    /// Move focus to the previous [Screen]
    pub fn previous_screen(&mut self) {
        self.screens.focus_up();
    }

    /// If the current [Stack] is [None], return `default` otherwise
    /// apply the function to it to generate a value
    pub fn with<T, F>(&self, default: T, f: F) -> T
    where
        F: Fn(&Stack<C>) -> T,
    {
        self.current_stack().map(f).unwrap_or(default)
    }

    /// Apply a function to modify the current [Stack] if there is one
    /// or compute and inject a default value if it is currently [None]
    pub fn modify<F>(&mut self, f: F)
    where
        F: FnOnce(Option<Stack<C>>) -> Option<Stack<C>>,
    {
        self.screens.focus.workspace.stack = f(take(&mut self.screens.focus.workspace.stack));
    }

    /// Apply a function to modify the current [Stack] if it is non-empty
    /// without allowing for emptying it entirely.
    pub fn modify_occupied<F>(&mut self, f: F)
    where
        F: FnOnce(Stack<C>) -> Stack<C>,
    {
        self.modify(|s| s.map(f))
    }

    fn modify_workspace<F>(&mut self, tag: &str, f: F)
    where
        F: FnOnce(&mut Workspace<C>),
    {
        self.workspaces_mut().find(|w| w.tag == tag).map(f);
    }

    /// Augment the hidden workspaces with any missing tags from the given
    /// list, leaving existing workspaces untouched. Used when restoring
    /// state on restart.
    pub fn ensure_tags<T>(&mut self, layouts: &LayoutStack, tags: &[T])
    where
        T: AsRef<str>,
    {
        let mut next_id = self.workspaces().map(|w| w.id).max().unwrap_or(0) + 1;

        for tag in tags {
            let tag = tag.as_ref();
            if !self.contains_tag(tag) {
                self.hidden
                    .push_back(Workspace::new(next_id, tag, layouts.clone(), None));
                next_id += 1;
            }
        }
    }

    /// Apply the given function to the layouts of every [Workspace] in this
    /// [StackSet]. Used when restoring state on restart.
    pub fn map_layouts<F>(&mut self, mut f: F)
    where
        F: FnMut(LayoutStack) -> LayoutStack,
    {
        for w in self.workspaces_mut() {
            w.layouts = f(take(&mut w.layouts));
        }
    }

    // Deliver the given message to the layouts of every workspace, returning
    // true if any of them reported a change of state.
    pub(crate) fn broadcast_message(&mut self, m: &Message) -> bool {
        let mut changed = false;

        for w in self.workspaces_mut() {
            changed |= w.broadcast_message_ref(m);
        }

        changed
    }

    /// Iterate over each [Screen] in this [StackSet] in an arbitrary order.
    pub fn screens(&self) -> impl Iterator<Item = &Screen<C>> {
        self.screens.iter()
    }

    /// Mutably iterate over each [Screen] in this [StackSet] in an arbitrary
    /// order.
    pub fn screens_mut(&mut self) -> impl Iterator<Item = &mut Screen<C>> {
        self.screens.iter_mut()
    }

    /// Iterate over each [Workspace] in this [StackSet] in an arbitrary
    /// order.
    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace<C>> {
        self.screens
            .iter()
            .map(|s| &s.workspace)
            .chain(self.hidden.iter())
    }

    /// Mutably iterate over each [Workspace] in this [StackSet] in an
    /// arbitrary order.
    pub fn workspaces_mut(&mut self) -> impl Iterator<Item = &mut Workspace<C>> {
        self.screens
            .iter_mut()
            .map(|s| &mut s.workspace)
            .chain(self.hidden.iter_mut())
    }

    /// Iterate over the [Workspace] currently displayed on a screen in an
    /// arbitrary order.
    pub fn on_screen_workspaces(&self) -> impl Iterator<Item = &Workspace<C>> {
        self.screens.iter().map(|s| &s.workspace)
    }

    /// Iterate over the currently hidden [Workspace] in this [StackSet] in
    /// an arbitrary order.
    pub fn hidden_workspaces(&self) -> impl Iterator<Item = &Workspace<C>> {
        self.hidden.iter()
    }

    pub(crate) fn hidden_workspaces_mut(&mut self) -> impl Iterator<Item = &mut Workspace<C>> {
        self.hidden.iter_mut()
    }

    /// Iterate over each client in this [StackSet] in an arbitrary order.
    pub fn clients(&self) -> impl Iterator<Item = &C> {
        self.workspaces().flat_map(|w| w.clients())
    }

    /// Iterate over clients from workspaces not currently mapped to a
    /// screen.
    pub fn hidden_workspace_clients(&self) -> impl Iterator<Item = &C> {
        self.hidden_workspaces().flat_map(|w| w.clients())
    }

    // The checks required to hold for this stack set to be well formed. Run
    // after each pure state transformation in debug builds and by the
    // property tests.
    pub(crate) fn is_consistent(&self) -> bool {
        let tags: Vec<&str> = self.workspaces().map(|w| w.tag.as_str()).collect();
        if tags.len() != tags.iter().collect::<HashSet<_>>().len() {
            return false;
        }

        let indices: Vec<usize> = self.screens.iter().map(|s| s.index).collect();
        if indices.len() != indices.iter().collect::<HashSet<_>>().len() {
            return false;
        }

        let clients: Vec<&C> = self.clients().collect();
        if clients.len() != clients.iter().collect::<HashSet<_>>().len() {
            return false;
        }

        self.floating.keys().all(|k| clients.contains(&k))
    }
}

impl<C> StackSet<C>
where
    C: Clone + Default + PartialEq + Eq + Hash,
{
    /// Rebuild the screen list after the available outputs have changed.
    ///
    /// Workspaces are bound to the new screens positionally: the current
    /// workspace stays on the first screen, followed by the other visible
    /// workspaces and then previously hidden ones if extra screens have been
    /// added. Status gaps carry over for screens that keep their position and
    /// new screens start without one. If there are now more screens than
    /// workspaces the difference is made up with generated empty workspaces.
    pub fn update_screens(&mut self, rects: Vec<Rect>) -> Result<()> {
        if rects.is_empty() {
            return Err(Error::NoScreens);
        }

        let mut gap_for_position: Vec<(usize, StatusGap)> =
            self.screens.iter().map(|s| (s.index, s.gap)).collect();
        gap_for_position.sort_by_key(|(index, _)| *index);

        let Stack { up, focus, down } = take(&mut self.screens);
        let mut ws: Vec<Workspace<C>> = vec![focus.workspace];
        ws.extend(up.into_iter().map(|s| s.workspace));
        ws.extend(down.into_iter().map(|s| s.workspace));
        ws.extend(take(&mut self.hidden));

        let next_id = ws.iter().map(|w| w.id).max().unwrap_or(0) + 1;
        for n in 0..rects.len().saturating_sub(ws.len()) {
            ws.push(Workspace::new_default(next_id + n));
        }

        let extra = ws.split_off(rects.len());
        self.hidden = extra.into_iter().collect();

        self.screens =
            Stack::from_iter_unchecked(ws.into_iter().zip(rects).enumerate().map(
                |(index, (workspace, r))| Screen {
                    index,
                    workspace,
                    r,
                    gap: gap_for_position
                        .get(index)
                        .map(|&(_, gap)| gap)
                        .unwrap_or_default(),
                },
            ));

        Ok(())
    }
}

impl<C> StackSet<C>
where
    C: Copy + Clone + PartialEq + Eq + Hash,
{
    pub(crate) fn snapshot(&mut self, positions: Vec<(C, Rect)>) -> Snapshot<C> {
        let visible = self
            .screens
            .up
            .iter()
            .rev()
            .chain(self.screens.down.iter())
            .map(ScreenState::from)
            .collect();

        Snapshot {
            focused_client: self.current_client().copied(),
            focused: ScreenState::from(&self.screens.focus),
            visible,
            positions,
            hidden_clients: self.hidden_workspace_clients().copied().collect(),
            killed_clients: take(&mut self.killed_clients),
        }
    }
}

macro_rules! defer_to_current_stack {
    ($(
        $(#[$doc_str:meta])*
        $method:ident
    ),+) => {
        impl<C> StackSet<C>
        where
            C: Clone + PartialEq + Eq + Hash
        {
            $(
                $(#[$doc_str])*
                pub fn $method(&mut self) {
                    if let Some(ref mut stack) = self.screens.focus.workspace.stack {
                        stack.$method();
                    }
                }
            )+
        }
    }
}

defer_to_current_stack!(
    /// Move focus from the current client up the [Stack], wrapping to
    /// the bottom if focus is already at the top.
    /// This is a no-op if the current stack is empty.
    focus_up,
    /// Move focus from the current client down the [Stack], wrapping to
    /// the top if focus is already at the bottom.
    /// This is a no-op if the current stack is empty.
    focus_down,
    /// Swap the position of the focused client with the one above it.
    /// The currently focused client is maintained by this operation.
    /// This is a no-op if the current stack is empty.
    swap_up,
    /// Swap the position of the focused client with the one below it.
    /// The currently focused client is maintained by this operation.
    /// This is a no-op if the current stack is empty.
    swap_down,
    /// Rotate all clients of the stack forward, wrapping from top to bottom.
    /// The currently focused position in the stack is maintained by this
    /// operation. This is a no-op if the current stack is empty.
    rotate_up,
    /// Rotate all clients of the stack back, wrapping from bottom to top.
    /// The currently focused position in the stack is maintained by this
    /// operation. This is a no-op if the current stack is empty.
    rotate_down,
    /// Swap the current head client with the focused client in the
    /// stack order. Focus stays with the original focused client.
    /// This is a no-op if the current stack is empty.
    swap_focus_and_head
);

#[cfg(test)]
pub mod tests {
    use super::*;
    use simple_test_case::test_case;

    pub fn test_stack_set<C>(n_tags: usize, n_screens: usize) -> StackSet<C>
    where
        C: Copy + Clone + PartialEq + Eq + Hash,
    {
        let tags = (1..=n_tags).map(|n| n.to_string());
        let screens: Vec<Rect> = (0..(n_screens as u32))
            .map(|k| Rect::new(k * 1000, k * 2000, 1000, 2000))
            .collect();

        StackSet::try_new(LayoutStack::default(), tags, screens).unwrap()
    }

    pub fn test_stack_set_with_stacks<C>(stacks: Vec<Option<Stack<C>>>, n: usize) -> StackSet<C>
    where
        C: Copy + Clone + PartialEq + Eq + Hash,
    {
        let workspaces: Vec<Workspace<C>> = stacks
            .into_iter()
            .enumerate()
            .map(|(i, s)| Workspace::new(i, (i + 1).to_string(), LayoutStack::default(), s))
            .collect();

        match StackSet::try_new_concrete(
            workspaces,
            (0..(n as u32))
                .map(|k| Rect::new(k * 1000, k * 2000, 1000, 2000))
                .collect(),
            HashMap::new(),
        ) {
            Ok(s) => s,
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn construction_fails_without_screens() {
        let res: Result<StackSet<u8>> =
            StackSet::try_new(LayoutStack::default(), ["1", "2"], vec![]);

        assert!(matches!(res, Err(Error::NoScreens)));
    }

    #[test]
    fn construction_fails_with_more_screens_than_tags() {
        let res: Result<StackSet<u8>> = StackSet::try_new(
            LayoutStack::default(),
            ["1"],
            vec![Rect::default(), Rect::default()],
        );

        assert!(matches!(
            res,
            Err(Error::InsufficientWorkspaces {
                n_ws: 1,
                n_screens: 2
            })
        ));
    }

    #[test_case("1", &["1", "2"]; "current focused workspace")]
    #[test_case("2", &["1", "2"]; "visible on other screen")]
    #[test_case("3", &["3", "2"]; "currently hidden")]
    #[test]
    fn focus_tag_sets_correct_visible_workspaces(target: &str, vis: &[&str]) {
        let mut s: StackSet<u8> = test_stack_set(5, 2);

        s.focus_tag(target);

        let visible_tags: Vec<&str> = s.screens().map(|s| s.workspace.tag.as_ref()).collect();

        assert_eq!(s.screens.focus.workspace.tag, target);
        assert_eq!(visible_tags, vis);
    }

    #[test]
    fn focus_tag_for_visible_tag_focuses_that_screen() {
        let mut s: StackSet<u8> = test_stack_set(5, 2);

        assert_eq!(s.current_screen().index(), 0);
        s.focus_tag("2");
        assert_eq!(s.current_screen().index(), 1);
    }

    #[test]
    fn pull_tag_to_screen_swaps_visible_workspaces() {
        let mut s: StackSet<u8> = test_stack_set(5, 2);

        s.pull_tag_to_screen("2");

        let visible_tags: Vec<&str> = s.screens().map(|s| s.workspace.tag.as_ref()).collect();

        assert_eq!(s.current_screen().index(), 0);
        assert_eq!(s.current_tag(), "2");
        assert_eq!(visible_tags, &["2", "1"]);
    }

    #[test_case(0, Some("1"), Some("3"); "initial focus")]
    #[test_case(1, Some("2"), Some("2"); "other screen")]
    #[test_case(2, None, None; "out of bounds")]
    #[test]
    fn tag_for_screen_works(index: usize, before: Option<&str>, after: Option<&str>) {
        let mut s: StackSet<u8> = test_stack_set(5, 2);

        assert_eq!(s.tag_for_screen(index), before);
        s.focus_tag("3");
        assert_eq!(s.tag_for_screen(index), after);
    }

    #[test_case(5, Some("1"); "in down")]
    #[test_case(6, Some("2"); "focus")]
    #[test_case(9, Some("3"); "in up")]
    #[test_case(42, None; "unknown")]
    #[test]
    fn tag_for_client_works(client: u8, expected: Option<&str>) {
        let s = test_stack_set_with_stacks(
            vec![
                Some(stack!([1, 2], 3, [4, 5])),
                Some(stack!(6, [7, 8])),
                Some(stack!([9], 10)),
            ],
            1,
        );

        assert_eq!(s.tag_for_client(&client), expected);
    }

    #[test_case(None; "empty current stack")]
    #[test_case(Some(stack!(1)); "current stack with one element")]
    #[test_case(Some(stack!([2], 1)); "current stack with up")]
    #[test_case(Some(stack!(1, [3])); "current stack with down")]
    #[test_case(Some(stack!([2], 1, [3])); "current stack with up and down")]
    #[test]
    fn insert(stack: Option<Stack<u8>>) {
        let mut s = test_stack_set_with_stacks(vec![stack], 1);
        s.insert(42);

        assert!(s.contains(&42));
        assert_eq!(s.current_client(), Some(&42));
    }

    #[test]
    fn insert_of_known_client_is_a_no_op() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!([1], 2, [3]))], 1);

        s.insert(3);

        assert_eq!(s.current_stack(), Some(&stack!([1], 2, [3])));
    }

    #[test]
    fn remove_client_focuses_next_below_then_above() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!([1, 2], 3, [4, 5]))], 1);

        s.remove_client(&3);
        assert_eq!(s.current_client(), Some(&4));

        s.remove_client(&4);
        assert_eq!(s.current_client(), Some(&5));

        s.remove_client(&5);
        assert_eq!(s.current_client(), Some(&2));

        s.remove_client(&2);
        s.remove_client(&1);
        assert_eq!(s.current_client(), None);
        assert!(s.current_workspace().is_empty());
    }

    #[test]
    fn changing_workspace_retains_clients() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!(1)), Some(stack!(2, 3)), None], 1);

        let clients = |s: &StackSet<u8>| {
            let mut cs: Vec<_> = s.clients().copied().collect();
            cs.sort();

            cs
        };

        assert_eq!(clients(&s), vec![1, 2, 3]);
        s.focus_tag("2");
        assert_eq!(clients(&s), vec![1, 2, 3]);
    }

    #[test]
    fn moving_the_only_client_leaves_the_workspace_empty() {
        let mut s = test_stack_set_with_stacks(vec![Some(stack!(1)), None], 1);

        s.move_focused_to_tag("2");

        assert!(s.current_workspace().is_empty());
        assert_eq!(s.workspace("2").unwrap().focus(), Some(&1));
    }

    #[test]
    fn floating_layer_clients_hold_focus() {
        let mut s: StackSet<u8> = test_stack_set(5, 3);

        for n in 1..5 {
            s.insert(n);
        }

        s.float_unchecked(4, Rect::default());

        assert_eq!(s.current_client(), Some(&4));
    }

    #[test]
    fn float_of_unknown_client_inserts_it_first() {
        let mut s: StackSet<u8> = test_stack_set(2, 1);

        s.float(7, Rect::new(0, 0, 100, 100));

        assert!(s.contains(&7));
        assert!(s.floating.contains_key(&7));
        assert_eq!(s.current_client(), Some(&7));
    }

    #[test]
    fn sink_removes_floating_state() {
        let mut s: StackSet<u8> = test_stack_set(2, 1);

        s.float(7, Rect::new(0, 0, 100, 100));
        s.sink(&7);

        assert!(s.contains(&7));
        assert!(!s.floating.contains_key(&7));
    }

    #[test_case(1, "1"; "current focus to current tag")]
    #[test_case(2, "1"; "from current tag to current tag")]
    #[test_case(6, "1"; "from other tag to current tag")]
    #[test_case(6, "2"; "from other tag to same tag")]
    #[test_case(0, "2"; "from current tag to other tag")]
    #[test_case(7, "3"; "from other tag to other tag")]
    #[test_case(7, "4"; "from other tag to empty tag")]
    #[test]
    fn move_client_to_tag(client: u8, tag: &str) {
        let mut s = test_stack_set_with_stacks(
            vec![
                Some(stack!([0], 1, [2, 3])),
                Some(stack!([6, 7], 8)),
                Some(stack!(4, [5])),
                None,
            ],
            1,
        );

        s.move_client_to_tag(&client, tag);

        assert_eq!(s.workspace(tag).unwrap().focus(), Some(&client));
    }

    #[test]
    fn ensure_tags_adds_missing_tags_as_hidden() {
        let mut s: StackSet<u8> = test_stack_set(2, 1);

        s.ensure_tags(&LayoutStack::default(), &["2", "3", "4"]);

        assert_eq!(s.ordered_tags(), vec!["1", "2", "3", "4"]);
        assert_eq!(s.current_tag(), "1");
    }

    fn focused_tags(ss: &StackSet<u8>) -> Vec<&String> {
        ss.screens.iter().map(|s| &s.workspace.tag).collect()
    }

    #[test_case(1, 1, vec!["1"], vec!["1"]; "single to single")]
    #[test_case(1, 2, vec!["1"], vec!["1", "2"]; "single to multiple no padding")]
    #[test_case(1, 3, vec!["1"], vec!["1", "2", "WS-3"]; "single to multiple with padding")]
    #[test_case(2, 1, vec!["1", "2"], vec!["2"]; "multiple to single keeps current")]
    #[test_case(2, 2, vec!["1", "2"], vec!["2", "1"]; "multiple to same count")]
    #[test]
    fn update_screens(
        n_before: usize,
        n_after: usize,
        tags_before: Vec<&str>,
        tags_after: Vec<&str>,
    ) {
        let mut ss: StackSet<u8> = StackSet::try_new(
            LayoutStack::default(),
            ["1", "2"],
            vec![Rect::default(); n_before],
        )
        .expect("enough workspaces to cover the number of initial screens");

        // Focus the last screen so that truncation has to preserve the
        // current workspace on the remaining first screen
        ss.focus_screen(n_before - 1);

        assert_eq!(ss.screens.len(), n_before);
        assert_eq!(focused_tags(&ss), tags_before);

        let current = ss.current_tag().to_string();
        ss.update_screens(vec![Rect::default(); n_after]).unwrap();

        assert_eq!(ss.screens.len(), n_after);
        assert_eq!(ss.current_tag(), current);
        assert_eq!(ss.screens.focus.index, 0);
        assert_eq!(focused_tags(&ss), tags_after);

        // Shouldn't have dropped any workspaces, only padded if needed
        assert_eq!(ss.workspaces().count(), std::cmp::max(2, n_after));
    }

    #[test]
    fn update_screens_preserves_gaps_by_position() {
        let mut ss: StackSet<u8> = test_stack_set(4, 2);
        for s in ss.screens_mut() {
            s.gap = StatusGap::new(20, 0, 0, 0);
        }

        ss.update_screens(vec![Rect::default(); 3]).unwrap();

        let gaps: Vec<StatusGap> = ss.screens().map(|s| s.gap).collect();

        assert_eq!(
            gaps,
            vec![
                StatusGap::new(20, 0, 0, 0),
                StatusGap::new(20, 0, 0, 0),
                StatusGap::default()
            ]
        );
    }

    #[test]
    fn update_screens_with_empty_vec_is_an_error() {
        let mut ss: StackSet<u8> =
            StackSet::try_new(LayoutStack::default(), ["1", "2"], vec![Rect::default(); 2])
                .expect("enough workspaces to cover the number of screens");

        let res = ss.update_screens(vec![]);

        assert!(matches!(res, Err(Error::NoScreens)));
    }
}
