//! Logic for interacting with the X server
use crate::{
    builtin::layout::messages::Hide,
    core::{
        bindings::{KeyCode, MouseState},
        layout::IntoMessage,
        ClientSet, Config, State,
    },
    pure::geometry::Rect,
    x::{atom::AUTO_FLOAT_WINDOW_TYPES, event::ClientMessage, property::WmState},
    Color, Result, Xid,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, trace};

pub mod atom;
pub mod event;
pub mod property;

#[cfg(test)]
pub mod mock;

#[cfg(test)]
pub use mock::{RecordingXConn, StubXConn};

pub use atom::Atom;
pub use event::XEvent;
pub use property::{Prop, WindowAttributes, WmNormalHints};

/// On screen configuration options for X clients (not all are curently implemented)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientConfig {
    /// The border width in pixels
    BorderPx(u32),
    /// Absolute size and position on the screen as a [Rect]
    Position(Rect),
    /// Mark this window as stacking on top of its peer
    StackAbove(Xid),
    /// Mark this window as stacking above all other windows
    StackTop,
}

/// Attributes for an X11 client window (not all are curently implemented)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientAttr {
    /// Border color as an argb hex value
    BorderColor(u32),
    /// Set the pre-defined client event mask
    ClientEventMask,
    /// Set the pre-defined client event mask for sending unmap notify events
    ClientUnmapMask,
    /// Set the pre-defined root event mask
    RootEventMask,
}

/// A handle on a running X11 connection that we can use for issuing X
/// requests.
///
/// XConn is intended as an abstraction layer to allow for communication with
/// the underlying display system using whatever mechanism the implementer
/// wishes. In theory it should be possible to write an implementation that
/// runs against something other than X, but X idioms and high level event
/// types are assumed.
pub trait XConn {
    /// The ID of the window manager root window.
    fn root(&self) -> Xid;
    /// Ask the X server for the dimensions of each currently available
    /// screen.
    fn screen_details(&self) -> Result<Vec<Rect>>;

    /// Grab the specified keys and mouse button states, intercepting them
    /// for processing within the window manager itself. Any previous grabs
    /// are released first.
    fn grab(&self, key_codes: &[KeyCode], mouse_states: &[MouseState]) -> Result<()>;
    /// Block and wait for the next event from the X server so it can be
    /// processed.
    fn next_event(&self) -> Result<XEvent>;
    /// Flush any pending requests to the X server.
    fn flush(&self);
    /// Discard any queued EnterNotify events, returning how many were
    /// dropped.
    ///
    /// Repositioning and revealing windows generates EnterNotify events for
    /// whatever ends up under the pointer. These must not feed back into
    /// focus handling, so the reconciliation pass drains them once it has
    /// finished issuing requests.
    fn drain_enter_events(&self) -> Result<usize>;
    /// Replay the most recent grabbed pointer event to the client it
    /// occurred in.
    fn replay_pointer_event(&self) -> Result<()>;

    /// Look up the [Xid] of a given [Atom] name, interning it if it is
    /// unknown.
    fn intern_atom(&self, atom: &str) -> Result<Xid>;
    /// Look up the string name of a given [Atom] by its [Xid].
    fn atom_name(&self, xid: Xid) -> Result<String>;

    /// Look up the current dimensions and position of a given client
    /// window.
    fn client_geometry(&self, client: Xid) -> Result<Rect>;
    /// Ask the X server for the IDs of all currently known client windows
    fn existing_clients(&self) -> Result<Vec<Xid>>;

    /// Map the given client window to the screen, making it visible.
    fn map(&self, client: Xid) -> Result<()>;
    /// Unmap the given client window from the screen, hiding it.
    fn unmap(&self, client: Xid) -> Result<()>;
    /// Kill the given client window without any client protocol interaction.
    fn kill(&self, client: Xid) -> Result<()>;
    /// Set X input focus to be held by the given client window.
    fn focus(&self, client: Xid) -> Result<()>;

    /// Look up a specific property on a given client window.
    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>>;
    /// Request the [WindowAttributes] for a given client window.
    fn get_window_attributes(&self, client: Xid) -> Result<WindowAttributes>;

    /// Set the current ICCCM [WmState] for a given client window.
    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()>;
    /// Set one or more [ClientAttr] for a given client window.
    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()>;
    /// Set the [ClientConfig] for a given client window.
    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()>;
    /// Send a [ClientMessage] to a given client.
    fn send_client_message(&self, msg: ClientMessage) -> Result<()>;
    /// Send a synthetic ConfigureNotify to a client informing it of its
    /// current geometry without moving it.
    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()>;
}

/// Extended functionality for [XConn] impls in order to run the window
/// manager.
pub trait XConnExt: XConn + Sized {
    /// Establish the window manager state for the given client window and
    /// refresh the current X state.
    fn manage(&self, id: Xid, state: &mut State) -> Result<()> {
        trace!(%id, "managing new client");
        manage_without_refresh(id, None, state, self)?;
        self.refresh(state)
    }

    /// Remove the window manager state for the given client window and
    /// refresh the current X state. The client's `WM_STATE` is set to
    /// Withdrawn as part of the following refresh.
    fn unmanage(&self, client: Xid, state: &mut State) -> Result<()> {
        trace!(%client, "removing client");
        self.modify_and_refresh(state, |cs| {
            cs.remove_client(&client);
        })?;

        state.mapped.remove(&client);
        state.pending_unmap.remove(&client);

        Ok(())
    }

    /// Display a client on the screen by mapping it and setting its WmState
    /// to Normal. This is idempotent if the client is already visible.
    fn reveal(&self, client: Xid, cs: &ClientSet, mapped: &mut HashSet<Xid>) -> Result<()> {
        self.set_wm_state(client, WmState::Normal)?;
        self.map(client)?;
        if cs.contains(&client) {
            mapped.insert(client);
        }

        Ok(())
    }

    /// Hide a client by unmapping it and setting its WmState to Iconic.
    ///
    /// The unmap this causes is recorded in `pending_unmap` so that the
    /// resulting UnmapNotify can be told apart from one initiated by the
    /// client itself.
    fn hide(
        &self,
        client: Xid,
        mapped: &mut HashSet<Xid>,
        pending_unmap: &mut HashMap<Xid, usize>,
    ) -> Result<()> {
        if !mapped.contains(&client) {
            return Ok(());
        }

        self.set_client_attributes(client, &[ClientAttr::ClientUnmapMask])?;
        self.unmap(client)?;
        self.set_client_attributes(client, &[ClientAttr::ClientEventMask])?;
        self.set_wm_state(client, WmState::Iconic)?;

        mapped.remove(&client);
        pending_unmap
            .entry(client)
            .and_modify(|count| *count += 1)
            .or_insert(1);

        Ok(())
    }

    /// Apply a pure function that modifies the [ClientSet] and then handle
    /// refreshing the window manager state and associated X11 calls.
    ///
    /// This is the main logic that drives what the user will see on the
    /// screen: everything is computed from a diff of the pure state before
    /// and after the transformation carried out by `f`, in a fixed order:
    /// kills, new-client properties, hide notifications for workspaces that
    /// left a screen, restacking and positioning, visibility changes, input
    /// focus and border colours. Any EnterNotify events generated by the
    /// pass itself are drained at the end so they cannot feed back into
    /// focus handling.
    fn modify_and_refresh<F>(&self, state: &mut State, mut f: F) -> Result<()>
    where
        F: FnMut(&mut ClientSet),
    {
        f(&mut state.client_set); // mutating the existing state

        debug_assert!(
            state.client_set.is_consistent(),
            "pure state transformation broke stack set consistency"
        );

        let positions = state.client_set.visible_client_positions();
        let snapshot = state.client_set.snapshot(positions);
        state.diff.update(snapshot);

        notify_killed(self, state);
        set_window_props(self, state);
        notify_hidden_workspaces(state);
        self.position_clients(state);
        set_window_visibility(self, state);
        set_focus(self, state);

        self.flush();

        match self.drain_enter_events() {
            Ok(n) if n > 0 => trace!(n, "drained enter notifies caused by refresh"),
            Ok(_) => (),
            Err(e) => error!(%e, "unable to drain enter notifies"),
        }

        Ok(())
    }

    /// Refresh the current X server state based on a diff of the current
    /// state against the state when we last refreshed.
    fn refresh(&self, state: &mut State) -> Result<()> {
        self.modify_and_refresh(state, |_| ())
    }

    /// Send the given message to the active layout of the current workspace,
    /// refreshing the screen if (and only if) the layout reported a change.
    fn send_layout_message<M>(&self, m: M, state: &mut State) -> Result<()>
    where
        M: IntoMessage,
    {
        let m = m.into_message();
        let changed = state.client_set.current_workspace_mut().handle_message_ref(&m);

        if changed {
            self.refresh(state)?;
        }

        Ok(())
    }

    /// Send the given message to every layout of every workspace, refreshing
    /// the screen if any layout reported a change.
    fn broadcast_layout_message<M>(&self, m: M, state: &mut State) -> Result<()>
    where
        M: IntoMessage,
    {
        let m = m.into_message();
        let changed = state.client_set.broadcast_message(&m);

        if changed {
            self.refresh(state)?;
        }

        Ok(())
    }

    /// Check whether or not the given client should be assigned floating
    /// status based on its window type and class.
    fn client_should_float(&self, client: Xid, floating_classes: &[String]) -> Result<bool> {
        trace!(%client, "fetching WmClass prop");
        if let Some(Prop::UTF8String(strs)) = self.get_prop(client, Atom::WmClass.as_ref())? {
            if strs.iter().any(|c| floating_classes.contains(c)) {
                debug!(%client, ?floating_classes, "window has a floating class: setting to floating state");
                return Ok(true);
            }
        }

        trace!(%client, "fetching NetWmWindowType prop");
        let window_types = self.get_prop(client, Atom::NetWmWindowType.as_ref())?;
        let float_types: Vec<&str> = AUTO_FLOAT_WINDOW_TYPES.iter().map(|a| a.as_ref()).collect();

        let should_float = match window_types {
            Some(Prop::Atom(atoms)) => atoms.iter().any(|a| float_types.contains(&a.as_ref())),
            _ => false,
        };

        Ok(should_float)
    }

    /// Update the border color of the given client window.
    fn set_client_border_color<C>(&self, id: Xid, color: C) -> Result<()>
    where
        C: Into<Color>,
    {
        let color = color.into();
        self.set_client_attributes(id, &[ClientAttr::BorderColor(color.argb_u32())])
    }

    /// Set the initial window properties for a newly managed window.
    fn set_initial_properties(&self, client: Xid, config: &Config) -> Result<()> {
        let Config {
            normal_border,
            border_width,
            ..
        } = config;

        let conf = &[ClientConfig::BorderPx(*border_width)];
        let attrs = &[
            ClientAttr::ClientEventMask,
            ClientAttr::BorderColor(normal_border.argb_u32()),
        ];

        self.set_wm_state(client, WmState::Iconic)?;
        self.set_client_attributes(client, attrs)?;
        self.set_client_config(client, conf)
    }

    /// Update the geometry of a given client based on the given [Rect].
    fn position_client(&self, client: Xid, r: Rect) -> Result<()> {
        trace!(%client, ?r, "positioning client");
        self.set_client_config(client, &[ClientConfig::Position(r)])
    }

    /// Update the geometry of a floating client, constrained by any size
    /// hints it has set.
    fn position_floating_client(&self, client: Xid, mut r: Rect) -> Result<()> {
        let p = Atom::WmNormalHints.as_ref();
        if let Ok(Some(Prop::WmNormalHints(hints))) = self.get_prop(client, p) {
            trace!(%client, ?hints, "client has WmNormalHints: applying size hints");
            r = hints.apply_to(r);
        }

        self.position_client(client, r)
    }

    /// Restack and set the geometry for the positioned client windows from
    /// the last state refresh. The positions are shrunk by the configured
    /// border width so that the frame fits within the space allocated by the
    /// layout, unless the client occupies a full screen.
    ///
    /// A server error for any individual client is logged and that client is
    /// skipped.
    fn position_clients(&self, state: &State) {
        let border = state.config.border_width;
        let positions = &state.diff.after.positions;
        let screen_rects: Vec<Rect> = state.client_set.screens().map(|s| s.r).collect();

        self.restack(positions.iter().map(|(id, _)| id));

        for &(c, mut r) in positions.iter() {
            if !screen_rects.contains(&r) {
                r = r.shrink_in(border);
            }

            let res = if state.client_set.floating.contains_key(&c) {
                self.position_floating_client(c, r)
            } else {
                self.position_client(c, r)
            };

            if let Err(e) = res {
                error!(%e, %c, "unable to position client");
            }
        }
    }

    /// Restack the given windows, each one above the last.
    fn restack<'a, I>(&self, mut ids: I)
    where
        I: Iterator<Item = &'a Xid>,
    {
        let mut previous = match ids.next() {
            Some(id) => *id,
            None => return, // nothing to stack
        };

        for &id in ids {
            if let Err(e) = self.set_client_config(id, &[ClientConfig::StackAbove(previous)]) {
                error!(%e, %id, "unable to restack client");
            }
            previous = id;
        }
    }

    /// Focus the given client, updating the current workspace if necessary,
    /// and refresh the X state.
    fn set_active_client(&self, client: Xid, state: &mut State) -> Result<()> {
        self.modify_and_refresh(state, |cs| cs.focus_client(&client))
    }

    /// Check to see if a given client window supports a particular protocol
    /// or not
    fn client_supports_protocol(&self, id: Xid, proto: &str) -> Result<bool> {
        if let Some(Prop::Atom(protocols)) = self.get_prop(id, Atom::WmProtocols.as_ref())? {
            Ok(protocols.iter().any(|p| p == proto))
        } else {
            Ok(false)
        }
    }
}

// Auto impl XConnExt for all XConn impls
impl<T> XConnExt for T where T: XConn {}

// The main logic for inserting a new client into the StackSet without any
// refresh of the X state. In normal window manager operation the `manage`
// method on XConnExt is always used: this is provided independently to
// support managing existing clients on startup.
pub(crate) fn manage_without_refresh<X: XConn>(
    id: Xid,
    tag: Option<&str>,
    state: &mut State,
    x: &X,
) -> Result<()> {
    trace!(%id, "fetching WmTransientFor prop");
    let (owned_tag, transient_for) = match x.get_prop(id, Atom::WmTransientFor.as_ref())? {
        Some(Prop::Window(ids)) => {
            let parent = ids[0];
            let owned_tag = state
                .client_set
                .tag_for_client(&parent)
                .or(tag)
                .map(|t| t.to_string());

            debug!(%id, %parent, ?owned_tag, "client is transient");
            (owned_tag, Some(parent))
        }

        _ => (tag.map(|t| t.to_string()), None),
    };

    trace!(%id, "fetching WmNormalHints prop");
    let hints = match x.get_prop(id, Atom::WmNormalHints.as_ref())? {
        Some(Prop::WmNormalHints(hints)) => Some(hints),
        _ => None,
    };

    // Dialogs and windows that can not be resized are never tiled
    let fixed_size = hints.map(|h| h.fixed_size()).unwrap_or(false);
    let should_float = transient_for.is_some()
        || fixed_size
        || x.client_should_float(id, &state.config.floating_classes)?;

    match owned_tag {
        Some(tag) => state.client_set.insert_as_focus_for(tag.as_ref(), id),
        None => state.client_set.insert(id),
    }

    if should_float {
        debug!(%id, "client should float");
        let r = floating_client_position(id, transient_for, hints, state, x)?;
        state.client_set.float(id, r);
    }

    Ok(())
}

/// When positioning a floating client we try to position it in priority
/// order of:
///   - the position requested in its size hints
///   - the client's currently configured position if it is not at the origin
///   - centered in its parent's screen (if transient)
///   - centered in the focused screen
fn floating_client_position<X: XConn>(
    id: Xid,
    transient_for: Option<Xid>,
    hints: Option<WmNormalHints>,
    state: &State,
    x: &X,
) -> Result<Rect> {
    trace!(%id, "fetching client geometry");
    let r_initial = hints
        .and_then(|h| h.requested_position())
        .map(Ok)
        .unwrap_or_else(|| x.client_geometry(id))?;
    debug!(?r_initial, "initial geometry");

    if (r_initial.x, r_initial.y) != (0, 0) {
        debug!(?r_initial, "accepting client's requested position");
        return Ok(r_initial);
    }

    let r_parent = transient_for
        .and_then(|parent| state.client_set.screen_for_client(&parent))
        .unwrap_or(state.client_set.current_screen())
        .r;

    let r_final = r_initial.centered_in(&r_parent).unwrap_or_else(|| {
        r_initial
            .centered_in(&state.client_set.current_screen().r)
            .unwrap_or(r_initial)
    });
    debug!(?r_final, "final geometry");

    Ok(r_final)
}

// Clients removed via ClientSet::kill_focused are closed with the
// WM_DELETE_WINDOW protocol when they advertise support for it, otherwise
// they are killed outright.
fn notify_killed<X: XConn>(x: &X, state: &State) {
    for &c in state.diff.killed_clients() {
        let res = match x.client_supports_protocol(c, Atom::WmDeleteWindow.as_ref()) {
            Ok(true) => x.intern_atom(Atom::WmDeleteWindow.as_ref()).and_then(|a| {
                trace!(%c, "sending WM_DELETE_WINDOW");
                let msg = ClientMessage::new(c, Atom::WmProtocols.as_ref(), [*a, 0, 0, 0, 0]);
                x.send_client_message(msg)
            }),
            _ => {
                trace!(%c, "client does not support WM_DELETE_WINDOW: killing");
                x.kill(c)
            }
        };

        if let Err(e) = res {
            error!(%e, %c, "unable to close client");
        }
    }
}

fn set_window_props<X: XConn>(x: &X, state: &mut State) {
    for &c in state.diff.new_clients() {
        if let Err(e) = x.set_initial_properties(c, &state.config) {
            error!(%e, %c, "unable to set initial client properties");
        }
    }

    if let Some(focused) = state.diff.before.focused_client {
        if let Err(e) = x.set_client_border_color(focused, state.config.normal_border) {
            error!(%e, %focused, "unable to reset client border");
        }
    }

    if let Some(&focused) = state.client_set.current_client() {
        trace!(%focused, "setting border for focused client");
        if let Err(e) = x.set_client_border_color(focused, state.config.focused_border) {
            error!(%e, %focused, "unable to set focused client border");
        }
    }
}

fn notify_hidden_workspaces(state: &mut State) {
    let previous_visible_tags = state.diff.previous_visible_tags();

    state
        .client_set
        .hidden_workspaces_mut()
        .filter(|w| previous_visible_tags.contains(&w.tag.as_ref()))
        .for_each(|ws| {
            ws.broadcast_message(Hide);
        });
}

fn set_window_visibility<X: XConn>(x: &X, state: &mut State) {
    let State {
        client_set,
        diff,
        mapped,
        pending_unmap,
        destroyed,
        ..
    } = state;

    for &c in diff.visible_clients() {
        trace!(%c, "revealing client");
        if let Err(e) = x.reveal(c, client_set, mapped) {
            error!(%e, %c, "unable to reveal client");
        }
    }

    // Clients that the server has already destroyed are skipped: any call
    // against them would just be a BadWindow error.
    for &c in diff.hidden_clients() {
        if destroyed.contains(&c) {
            mapped.remove(&c);
            continue;
        }

        trace!(%c, "hiding client");
        if let Err(e) = x.hide(c, mapped, pending_unmap) {
            error!(%e, %c, "unable to hide client");
        }
    }

    for &c in diff.withdrawn_clients() {
        if destroyed.contains(&c) {
            continue;
        }

        trace!(%c, "setting withdrawn state for client");
        if let Err(e) = x.set_wm_state(c, WmState::Withdrawn) {
            error!(%e, %c, "unable to withdraw client");
        }
    }

    destroyed.clear();
}

fn set_focus<X: XConn>(x: &X, state: &mut State) {
    let res = if let Some(&id) = state.client_set.current_client() {
        x.focus(id)
    } else {
        x.focus(state.root)
    };

    if let Err(e) = res {
        error!(%e, "unable to set input focus");
    }
}
