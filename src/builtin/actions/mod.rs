//! Pre-defined actions for use in user defined key bindings
use crate::{
    core::{actions::key_handler, bindings::KeyEventHandler},
    x::XConn,
};

pub mod floating;

/// Exit the window manager immediately with exit code 0.
pub fn exit<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|_, _| std::process::exit(0))
}

/// Restart the window manager in place, preserving the current state.
///
/// The current process is replaced with a new copy of itself which takes
/// over every managed window without them being remapped.
#[cfg(feature = "serde")]
pub fn restart<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s, _| crate::core::resume::restart(s))
}

/// Close the currently focused client using the WM_DELETE_WINDOW protocol
/// if it is supported, killing the client outright otherwise.
pub fn kill_focused<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    crate::core::actions::modify_with(|cs| cs.kill_focused())
}
