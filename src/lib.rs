//! An X11 tiling window manager built around a pure, fully testable workspace zipper.
//!
//! The heart of the crate is the side-effect free state model in [pure]: a
//! [StackSet][pure::StackSet] tracking every managed window, which workspace
//! it lives on and which workspace is shown on which screen. Everything the
//! manager does is expressed as a pure transformation of that state which is
//! then reconciled against the X server in a single, well defined pass (see
//! [XConnExt::modify_and_refresh][x::XConnExt::modify_and_refresh]).
//!
//! The live X11 backend is provided by [x11rb][::x11rb] behind the
//! `x11rb-backend` feature. The pure layer and the reconciliation logic are
//! fully testable without a running display.
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

#[macro_use]
mod macros;

pub mod builtin;
pub mod core;
pub mod pure;
pub mod util;
pub mod x;

#[cfg(feature = "x11rb-backend")]
pub mod x11rb;

use std::ops::Deref;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use crate::core::{ClientSet, Config, State, WindowManager};
#[doc(inline)]
pub use pure::{geometry::Rect, Position, Stack, StackSet, Workspace};

/// An X11 ID for a given resource
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Xid(pub(crate) u32);

impl std::fmt::Display for Xid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<Xid> for u32 {
    fn from(id: Xid) -> Self {
        id.0
    }
}

/// A simple RGBA colour used for window borders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl Color {
    /// Create a new Color from a hex encoded u32: 0xRRGGBBAA
    pub fn new_from_hex(hex: u32) -> Self {
        let floats: Vec<f64> = hex
            .to_be_bytes()
            .iter()
            .map(|n| *n as f64 / 255.0)
            .collect();

        let (r, g, b, a) = (floats[0], floats[1], floats[2], floats[3]);

        Self { r, g, b, a }
    }

    /// The RGB information of this colour as 0.0-1.0 range floats
    pub fn rgb(&self) -> (f64, f64, f64) {
        (self.r, self.g, self.b)
    }

    /// The RGBA information of this colour as 0.0-1.0 range floats
    pub fn rgba(&self) -> (f64, f64, f64, f64) {
        (self.r, self.g, self.b, self.a)
    }

    /// Render this colour as an argb u32 of the form the X server expects
    /// for border colours.
    pub fn argb_u32(&self) -> u32 {
        let (r, g, b, a) = self.rgba();
        let argb = [a, r, g, b].map(|f| (f * 255.0) as u32);

        (argb[0] << 24) | (argb[1] << 16) | (argb[2] << 8) | argb[3]
    }
}

impl TryFrom<&str> for Color {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        let hex = match s.strip_prefix('#') {
            Some(hex) => hex,
            None => return Err(Error::InvalidHexColor(s.into())),
        };

        let parsed = match hex.len() {
            6 => u32::from_str_radix(hex, 16).map(|h| (h << 8) | 0xFF),
            8 => u32::from_str_radix(hex, 16),
            _ => return Err(Error::InvalidHexColor(s.into())),
        };

        match parsed {
            Ok(h) => Ok(Self::new_from_hex(h)),
            Err(_) => Err(Error::InvalidHexColor(s.into())),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Color::try_from(s.as_str())
    }
}

/// Error variants from the core of the window manager and its X11 backends
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// There were not enough workspaces to cover the attached screens
    #[error("there were {n_ws} workspaces but {n_screens} screens")]
    InsufficientWorkspaces {
        /// Number of provided workspaces
        n_ws: usize,
        /// Number of connected screens
        n_screens: usize,
    },

    /// A string could not be parsed as a hex colour
    #[error("invalid hex color: {0}")]
    InvalidHexColor(String),

    /// Client hint data received from the X server was malformed
    #[error("invalid window hints message: {0}")]
    InvalidHints(String),

    /// An IO operation failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A requested property was not set on the target client
    #[error("'{0}' is not set for client {1}")]
    MissingProperty(String, Xid),

    /// No screens were found when asking the X server for available outputs
    #[error("no screens were found")]
    NoScreens,

    /// Workspace tags must be unique within a StackSet
    #[error("tags must be unique: {tags:?} were duplicated")]
    NonUniqueTags {
        /// The tags that were duplicated
        tags: Vec<String>,
    },

    /// A serialized state snapshot passed on restart could not be parsed
    #[cfg(feature = "serde")]
    #[error("unable to parse state snapshot: {0}")]
    InvalidStateSnapshot(#[from] serde_json::Error),

    /// An unknown modifier key name was used in a binding
    #[error("'{0}' is not a known modifier key")]
    UnknownModifier(String),

    /// An unknown mouse button was pressed
    #[error("{0} is not a known mouse button")]
    UnknownMouseButton(u8),

    /// An operation targeted a client that is not in the StackSet
    #[error("client {0} is unknown")]
    UnknownClient(Xid),

    /// Another window manager already owns the root window
    #[error("unable to select events on the root window: another window manager is running")]
    WmAlreadyRunning,

    /// Unable to connect to the X server
    #[cfg(feature = "x11rb-backend")]
    #[error(transparent)]
    Connect(#[from] ::x11rb::errors::ConnectError),

    /// The X11 connection broke
    #[cfg(feature = "x11rb-backend")]
    #[error(transparent)]
    Connection(#[from] ::x11rb::errors::ConnectionError),

    /// An X11 request failed
    #[cfg(feature = "x11rb-backend")]
    #[error(transparent)]
    X11Reply(#[from] ::x11rb::errors::ReplyError),

    /// An X11 request failed or an ID could not be generated
    #[cfg(feature = "x11rb-backend")]
    #[error(transparent)]
    X11ReplyOrId(#[from] ::x11rb::errors::ReplyOrIdError),
}

/// A Result where the error type is a trellis [Error]
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("#ff0000", 0xffff0000; "red no alpha")]
    #[test_case("#00ff00", 0xff00ff00; "green no alpha")]
    #[test_case("#0000ff", 0xff0000ff; "blue no alpha")]
    #[test_case("#000000ff", 0xff000000; "black explicit alpha")]
    #[test]
    fn color_try_from_str(s: &str, argb: u32) {
        let c = Color::try_from(s).expect("valid hex string");

        assert_eq!(c.argb_u32(), argb);
    }

    #[test_case(""; "empty")]
    #[test_case("#ff00"; "too short")]
    #[test_case("#ff0000ff00"; "too long")]
    #[test_case("#nothex"; "not hex chars")]
    #[test]
    fn invalid_colors_error(s: &str) {
        assert!(matches!(Color::try_from(s), Err(Error::InvalidHexColor(_))));
    }
}
