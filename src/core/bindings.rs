//! Setting up and responding to user defined key/mouse bindings
use crate::{
    core::State,
    pure::geometry::Point,
    x::XConn,
    Error, Result,
};
use std::collections::HashMap;
use strum::{EnumIter, IntoEnumIterator};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Run a [KeyEventHandler] from the received key press
pub type KeyBindings<X> = HashMap<KeyCode, Box<dyn KeyEventHandler<X>>>;

/// Run a [MouseEventHandler] from the received mouse event
pub type MouseBindings<X> = HashMap<(MouseEventKind, MouseState), Box<dyn MouseEventHandler<X>>>;

// X11 modifier bit positions
const SHIFT: u16 = 1 << 0;
const LOCK: u16 = 1 << 1;
const CONTROL: u16 = 1 << 2;
const MOD1: u16 = 1 << 3;
const MOD2: u16 = 1 << 4;
const MOD4: u16 = 1 << 6;

// NumLock (Mod2) and CapsLock (Lock) are stripped before bindings are looked
// up so that they fire regardless of lock state.
pub(crate) const IGNORED_MODIFIERS: u16 = LOCK | MOD2;

/// The modifier combinations a backend must grab for each binding so that it
/// fires regardless of the NumLock / CapsLock state.
pub const LOCK_MASK_COMBOS: [u16; 4] = [0, LOCK, MOD2, LOCK | MOD2];

/// Known modifier keys for bindings
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, EnumIter, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum ModifierKey {
    /// Control
    Ctrl,
    /// Alt
    Alt,
    /// Shift
    Shift,
    /// Meta / super / windows
    Meta,
}

impl ModifierKey {
    fn was_held(&self, mask: u16) -> bool {
        mask & u16::from(*self) > 0
    }
}

impl From<ModifierKey> for u16 {
    fn from(m: ModifierKey) -> u16 {
        match m {
            ModifierKey::Ctrl => CONTROL,
            ModifierKey::Alt => MOD1,
            ModifierKey::Shift => SHIFT,
            ModifierKey::Meta => MOD4,
        }
    }
}

impl TryFrom<&str> for ModifierKey {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s {
            "C" => Ok(Self::Ctrl),
            "A" => Ok(Self::Alt),
            "S" => Ok(Self::Shift),
            "M" => Ok(Self::Meta),
            _ => Err(Error::UnknownModifier(s.into())),
        }
    }
}

/// A key press and the held modifiers
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct KeyCode {
    /// The held modifier mask
    pub mask: u16,
    /// The key code that was held
    pub code: u8,
}

impl KeyCode {
    /// Create a new [KeyCode] from this one, removing the given mask
    pub fn ignoring_modifier(&self, mask: u16) -> KeyCode {
        KeyCode {
            mask: self.mask & !mask,
            code: self.code,
        }
    }

    pub(crate) fn ignoring_locks(&self) -> KeyCode {
        self.ignoring_modifier(IGNORED_MODIFIERS)
    }
}

/// Known mouse buttons for binding actions
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MouseButton {
    /// 1
    Left,
    /// 2
    Middle,
    /// 3
    Right,
    /// 4
    ScrollUp,
    /// 5
    ScrollDown,
}

impl From<MouseButton> for u8 {
    fn from(b: MouseButton) -> u8 {
        match b {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::ScrollUp => 4,
            MouseButton::ScrollDown => 5,
        }
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        match n {
            1 => Ok(Self::Left),
            2 => Ok(Self::Middle),
            3 => Ok(Self::Right),
            4 => Ok(Self::ScrollUp),
            5 => Ok(Self::ScrollDown),
            _ => Err(Error::UnknownMouseButton(n)),
        }
    }
}

/// A mouse button press along with the held modifiers
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MouseState {
    pub(crate) button: MouseButton,
    pub(crate) modifiers: Vec<ModifierKey>,
}

impl MouseState {
    /// Construct a new MouseState
    pub fn new(button: MouseButton, mut modifiers: Vec<ModifierKey>) -> Self {
        modifiers.sort();
        Self { button, modifiers }
    }

    pub(crate) fn from_event(detail: u8, state: u16) -> Result<Self> {
        Ok(Self {
            button: MouseButton::try_from(detail)?,
            modifiers: ModifierKey::iter().filter(|m| m.was_held(state)).collect(),
        })
    }

    /// The modifier mask for the held modifiers
    pub fn mask(&self) -> u16 {
        self.modifiers
            .iter()
            .fold(0, |acc, &val| acc | u16::from(val))
    }

    /// The numeric button code for the pressed button
    pub fn button(&self) -> u8 {
        self.button.into()
    }
}

/// The types of mouse events represented by a MouseEvent
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum MouseEventKind {
    /// A button was pressed
    Press,
    /// A button was released
    Release,
    /// The mouse was moved while a button was held
    Motion,
}

/// A mouse movement or button event
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseEvent {
    /// The ID of the window that contained the event
    pub id: crate::Xid,
    /// Absolute coordinate of the event
    pub rpt: Point,
    /// Coordinate of the event relative to top-left of the window itself
    pub wpt: Point,
    /// The modifier and button code that was received
    pub state: MouseState,
    /// Was this press, release or motion?
    pub kind: MouseEventKind,
}

impl MouseEvent {
    /// Construct a new [MouseEvent] from its components
    pub fn new(
        id: crate::Xid,
        rpt: Point,
        wpt: Point,
        state: MouseState,
        kind: MouseEventKind,
    ) -> Self {
        Self {
            id,
            rpt,
            wpt,
            state,
            kind,
        }
    }
}

/// An action to be run in response to a key press
pub trait KeyEventHandler<X: XConn> {
    /// Call this handler with the current window manager state
    fn call(&mut self, state: &mut State, x: &X) -> Result<()>;
}

impl<F, X: XConn> KeyEventHandler<X> for F
where
    F: FnMut(&mut State, &X) -> Result<()>,
{
    fn call(&mut self, state: &mut State, x: &X) -> Result<()> {
        (self)(state, x)
    }
}

/// The in-flight state of a pointer drag.
///
/// `on_motion` is invoked for every pointer motion event while the drag is
/// active and `on_release` exactly once when the grabbed button is released.
pub struct ActiveDrag<X: XConn> {
    /// Advance the drag to the given absolute pointer position
    pub on_motion: Box<dyn FnMut(&mut State, &X, Point) -> Result<()>>,
    /// Commit the result of the drag
    pub on_release: Box<dyn FnMut(&mut State, &X) -> Result<()>>,
}

/// An action to be run in response to a mouse event.
///
/// Returning an [ActiveDrag] starts a pointer drag that receives all
/// subsequent motion events until the button is released.
pub trait MouseEventHandler<X: XConn> {
    /// Call this handler with the mouse event and current state
    fn call(&mut self, evt: &MouseEvent, state: &mut State, x: &X) -> Result<Option<ActiveDrag<X>>>;
}

impl<F, X: XConn> MouseEventHandler<X> for F
where
    F: FnMut(&MouseEvent, &mut State, &X) -> Result<Option<ActiveDrag<X>>>,
{
    fn call(&mut self, evt: &MouseEvent, state: &mut State, x: &X) -> Result<Option<ActiveDrag<X>>> {
        (self)(evt, state, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case(0, 0; "no modifiers")]
    #[test_case(LOCK, 0; "caps lock")]
    #[test_case(MOD2, 0; "num lock")]
    #[test_case(LOCK | MOD2, 0; "both locks")]
    #[test_case(MOD4 | LOCK | MOD2, MOD4; "locks and a real modifier")]
    #[test]
    fn ignoring_locks_strips_lock_masks(mask: u16, expected: u16) {
        let k = KeyCode { mask, code: 42 };

        assert_eq!(k.ignoring_locks(), KeyCode { mask: expected, code: 42 });
    }

    #[test]
    fn mouse_state_mask_is_union_of_modifiers() {
        let m = MouseState::new(MouseButton::Left, vec![ModifierKey::Meta, ModifierKey::Shift]);

        assert_eq!(m.mask(), MOD4 | SHIFT);
    }

    #[test]
    fn mouse_state_from_event_ignores_lock_masks() {
        let m = MouseState::from_event(1, MOD4 | LOCK | MOD2).unwrap();

        assert_eq!(m, MouseState::new(MouseButton::Left, vec![ModifierKey::Meta]));
    }
}
