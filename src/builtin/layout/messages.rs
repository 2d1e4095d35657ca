//! Built-in layout messages.
//!
//! It is not a hard requirement for [Layout][0] implementations to handle
//! each of the messages provided by this module but wherever possible you
//! should attempt to do so if the semantics of the message make sense for
//! the layout you are writing.
//!
//! [0]: crate::core::layout::Layout
use crate::x::event::XEvent;

macro_rules! msg {
    ($m:ident) => {
        impl $crate::core::layout::IntoMessage for $m {}
    };
}

/// Alter the number of clients contained in the main area of the layout.
///
/// The resulting client count is clamped at zero.
pub struct IncMain(pub i8);
msg!(IncMain);

/// Expand the size of the main area of the layout.
pub struct ExpandMain;
msg!(ExpandMain);

/// Shrink the size of the main area of the layout.
pub struct ShrinkMain;
msg!(ShrinkMain);

/// Select the next layout available to the active workspace.
pub struct NextLayout;
msg!(NextLayout);

/// Select the previous layout available to the active workspace.
pub struct PreviousLayout;
msg!(PreviousLayout);

/// Jump to the first layout with the given name if the active workspace has
/// one available.
pub struct SetLayout(pub String);
msg!(SetLayout);

/// Sent when a layout is no longer visible: the layout changed on a visible
/// workspace or the workspace itself was taken off screen. Layouts holding
/// on to state that is only valid while they are on screen should release
/// it.
pub struct Hide;
msg!(Hide);

/// Sent when the window manager is shutting down or restarting in place.
/// Layouts should release any server side resources they hold.
pub struct ShutDown;
msg!(ShutDown);

/// An event from the X server that was not handled by the window manager
/// itself, forwarded so that layouts can react if they care to.
pub struct RawXEvent(pub XEvent);
msg!(RawXEvent);
