//! XEvent handlers for use in the main event loop
use crate::{
    builtin::layout::messages::RawXEvent,
    core::{
        bindings::{ActiveDrag, KeyBindings, KeyCode, MouseBindings, MouseEventKind},
        layout::IntoMessage,
        State,
    },
    x::{
        event::{ClientMessage, ConfigureEvent, UnmapEvent},
        Atom, ClientConfig, XConn, XConnExt, XEvent,
    },
    Xid,
};
use std::str::FromStr;
use tracing::{error, trace};

pub(crate) fn keypress<X: XConn>(
    key: KeyCode,
    bindings: &mut KeyBindings<X>,
    state: &mut State,
    x: &X,
) {
    if let Some(action) = bindings.get_mut(&key.ignoring_locks()) {
        trace!(?key, "running user keybinding");
        if let Err(error) = action.call(state, x) {
            error!(%error, ?key, "error running user keybinding");
        }
    }
}

pub(crate) fn map_request<X: XConn>(client: Xid, state: &mut State, x: &X) {
    if state.client_set.contains(&client) {
        return;
    }

    match x.get_window_attributes(client) {
        Ok(attrs) if !attrs.override_redirect => {
            if let Err(error) = x.manage(client, state) {
                error!(%error, %client, "unable to manage client");
            }
        }

        Ok(_) => trace!(%client, "ignoring map request from override-redirect window"),
        Err(error) => error!(%error, %client, "unable to query window attributes"),
    }
}

pub(crate) fn destroy<X: XConn>(client: Xid, state: &mut State, x: &X) {
    if state.client_set.contains(&client) {
        state.destroyed.insert(client);
        if let Err(error) = x.unmanage(client, state) {
            error!(%error, %client, "unable to unmanage client");
        }
    }
}

// Unmaps that we caused ourselves are tracked in pending_unmap and ignored:
// only client initiated unmaps (or ICCCM synthetic ones signalling a move to
// the Withdrawn state) result in the client being unmanaged.
pub(crate) fn unmap_notify<X: XConn>(e: &UnmapEvent, state: &mut State, x: &X) {
    let expected = *state.pending_unmap.get(&e.id).unwrap_or(&0);

    if e.synthetic || expected == 0 {
        if state.client_set.contains(&e.id) {
            if let Err(error) = x.unmanage(e.id, state) {
                error!(%error, client = %e.id, "unable to unmanage client");
            }
        }
    } else if expected == 1 {
        state.pending_unmap.remove(&e.id);
    } else {
        state
            .pending_unmap
            .entry(e.id)
            .and_modify(|count| *count -= 1);
    }
}

// Floating and unmanaged windows are in charge of their own geometry; tiled
// windows are sent a synthetic ConfigureNotify with their server side
// geometry instead so that the layout stays authoritative.
pub(crate) fn configure_request<X: XConn>(e: &ConfigureEvent, state: &mut State, x: &X) {
    let floating = state.client_set.floating.contains_key(&e.id);

    let res = if floating {
        x.modify_and_refresh(state, |cs| cs.float_unchecked(e.id, e.r))
    } else if !state.client_set.contains(&e.id) {
        x.set_client_config(e.id, &[ClientConfig::Position(e.r)])
    } else {
        x.client_geometry(e.id)
            .and_then(|r| x.send_configure_notify(e.id, r, state.config.border_width))
    };

    if let Err(error) = res {
        error!(%error, client = %e.id, "unable to handle configure request");
    }
}

pub(crate) fn detect_screens<X: XConn>(state: &mut State, x: &X) {
    let rects = match x.screen_details() {
        Ok(rects) => rects,
        Err(error) => {
            error!(%error, "unable to read screen details");
            return;
        }
    };

    trace!(?rects, "updating screens");
    let res = x.modify_and_refresh(state, |cs| {
        if let Err(error) = cs.update_screens(rects.clone()) {
            error!(%error, "unable to update screens");
        }
    });

    if let Err(error) = res {
        error!(%error, "unable to refresh after screen change");
    }
}

pub(crate) fn enter<X: XConn>(client: Xid, state: &mut State, x: &X) {
    if !state.config.focus_follow_mouse || !state.client_set.contains(&client) {
        return;
    }

    if let Err(error) = x.modify_and_refresh(state, |cs| cs.focus_client(&client)) {
        error!(%error, %client, "unable to focus client under pointer");
    }
}

pub(crate) fn client_message<X: XConn>(msg: ClientMessage, state: &mut State, x: &X) {
    let data = msg.data();
    trace!(id = %msg.id, dtype = ?msg.dtype, ?data, "got client message");

    let res = match Atom::from_str(&msg.dtype) {
        // Restart in place, preserving the current state
        #[cfg(feature = "serde")]
        Ok(Atom::TrellisRestart) => crate::core::resume::restart(state),

        // Focus the requested window
        Ok(Atom::NetActiveWindow) => x.set_active_client(msg.id, state),

        // Focus the requested workspace by ID
        Ok(Atom::NetCurrentDesktop) => x.modify_and_refresh(state, |cs| {
            if let Some(t) = cs.tag_for_workspace_id(data.as_usize()[0]) {
                cs.focus_tag(&t);
            }
        }),

        // Move the target client to the requested workspace by ID
        Ok(Atom::NetWmDesktop) => x.modify_and_refresh(state, |cs| {
            if let Some(t) = cs.tag_for_workspace_id(data.as_usize()[0]) {
                cs.move_client_to_tag(&msg.id, &t);
            }
        }),

        // All other client message types are only of interest to layouts
        _ => {
            broadcast_to_layouts(XEvent::ClientMessage(msg), state);
            return;
        }
    };

    if let Err(error) = res {
        error!(%error, "unable to process client message");
    }
}

pub(crate) fn mouse_event<X: XConn>(
    e: crate::core::bindings::MouseEvent,
    bindings: &mut MouseBindings<X>,
    drag: &mut Option<ActiveDrag<X>>,
    state: &mut State,
    x: &X,
) {
    use MouseEventKind::*;

    match e.kind {
        Press => {
            if let Some(handler) = bindings.get_mut(&(Press, e.state.clone())) {
                match handler.call(&e, state, x) {
                    Ok(new_drag) => *drag = new_drag,
                    Err(error) => error!(%error, "error running user mouse binding"),
                }
            } else if e.id != state.root {
                // An unbound press on a client: focus it and let the client
                // see the event as normal
                if let Err(error) = x.modify_and_refresh(state, |cs| cs.focus_client(&e.id)) {
                    error!(%error, client = %e.id, "unable to focus clicked client");
                }
                if let Err(error) = x.replay_pointer_event() {
                    error!(%error, "unable to replay pointer event");
                }
            }
        }

        Release => match drag.take() {
            Some(mut d) => {
                if let Err(error) = (d.on_release)(state, x) {
                    error!(%error, "error completing pointer drag");
                }
            }
            None => broadcast_to_layouts(XEvent::MouseEvent(e), state),
        },

        Motion => match drag.as_mut() {
            Some(d) => {
                if let Err(error) = (d.on_motion)(state, x, e.rpt) {
                    error!(%error, "error advancing pointer drag");
                }
            }
            None => broadcast_to_layouts(XEvent::MouseEvent(e), state),
        },
    }
}

// Unhandled events are still made available to layouts in case they want to
// react to them. No refresh is run off the back of this.
pub(crate) fn broadcast_to_layouts(event: XEvent, state: &mut State) {
    state
        .client_set
        .broadcast_message(&RawXEvent(event).into_message());
}
