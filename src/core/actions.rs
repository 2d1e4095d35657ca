//! Helpers for writing user key and mouse bindings.
use crate::{
    core::{
        bindings::{ActiveDrag, KeyEventHandler, MouseEvent, MouseEventHandler},
        layout::IntoMessage,
        ClientSet, State,
    },
    x::{XConn, XConnExt},
    Result,
};

/// Construct a [KeyEventHandler] from a closure over the window manager
/// state and X connection.
pub fn key_handler<X, F>(f: F) -> Box<dyn KeyEventHandler<X>>
where
    X: XConn,
    F: FnMut(&mut State, &X) -> Result<()> + 'static,
{
    Box::new(f)
}

/// Mutate the [ClientSet] and refresh the on screen state.
pub fn modify_with<X, F>(mut f: F) -> Box<dyn KeyEventHandler<X>>
where
    X: XConn,
    F: FnMut(&mut ClientSet) + 'static,
{
    key_handler(move |s: &mut State, x: &X| x.modify_and_refresh(s, &mut f))
}

/// Send a message to the active layout of the current workspace, refreshing
/// the screen if the layout reports a change.
pub fn send_layout_message<X, F, M>(f: F) -> Box<dyn KeyEventHandler<X>>
where
    X: XConn,
    F: Fn() -> M + 'static,
    M: IntoMessage,
{
    key_handler(move |s: &mut State, x: &X| x.send_layout_message(f(), s))
}

/// Send a message to every layout of every workspace, refreshing the screen
/// if any layout reports a change.
pub fn broadcast_layout_message<X, F, M>(f: F) -> Box<dyn KeyEventHandler<X>>
where
    X: XConn,
    F: Fn() -> M + 'static,
    M: IntoMessage,
{
    key_handler(move |s: &mut State, x: &X| x.broadcast_layout_message(f(), s))
}

/// Spawn an external program as part of a key binding.
pub fn spawn<X>(program: &'static str) -> Box<dyn KeyEventHandler<X>>
where
    X: XConn,
{
    key_handler(move |_: &mut State, _: &X| crate::util::spawn(program))
}

/// Spawn an external program with explicit arguments as part of a key
/// binding. Unlike [spawn], the arguments are passed through untouched so
/// they may contain whitespace.
pub fn spawn_with_args<X>(
    program: &'static str,
    args: &'static [&'static str],
) -> Box<dyn KeyEventHandler<X>>
where
    X: XConn,
{
    key_handler(move |_: &mut State, _: &X| crate::util::spawn_with_args(program, args))
}

/// Construct a [MouseEventHandler] from a closure over the triggering mouse
/// event, the window manager state and X connection.
pub fn mouse_handler<X, F>(f: F) -> Box<dyn MouseEventHandler<X>>
where
    X: XConn,
    F: FnMut(&MouseEvent, &mut State, &X) -> Result<Option<ActiveDrag<X>>> + 'static,
{
    Box::new(f)
}
