//! Data types for working with X events
use crate::{
    core::bindings::{KeyCode, MouseEvent},
    pure::geometry::{Point, Rect},
    Xid,
};

/// Wrapper around the low level X event types that correspond to request /
/// response data when communicating with the X server itself.
///
/// The variant names and data are drawn up with the X11 protocol in mind but
/// should be producible by any backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XEvent {
    /// A message has been sent to a particular client
    ClientMessage(ClientMessage),

    /// Client config has changed in some way
    ConfigureNotify(ConfigureEvent),

    /// A client is asking to be repositioned
    ConfigureRequest(ConfigureEvent),

    /// A client window has been destroyed
    Destroy(Xid),

    /// The mouse pointer has entered a new client window
    Enter(PointerChange),

    /// The mouse pointer has left a client window
    Leave(PointerChange),

    /// A grabbed key combination has been entered by the user
    KeyPress(KeyCode),

    /// A client window is requesting to be positioned and rendered on the
    /// screen
    MapRequest(Xid),

    /// The keyboard mapping has changed and key grabs need re-issuing
    MappingNotify,

    /// The mouse has moved or a mouse button has been pressed
    MouseEvent(MouseEvent),

    /// A client property has changed in some way
    PropertyNotify(PropertyEvent),

    /// The available screens / screen dimensions have changed
    RandrNotify,

    /// A client window is no longer visible
    UnmapNotify(UnmapEvent),
}

impl std::fmt::Display for XEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use XEvent::*;

        match self {
            ClientMessage(m) => write!(f, "ClientMessage({}, {})", m.id, m.dtype),
            ConfigureNotify(e) => write!(f, "ConfigureNotify({})", e.id),
            ConfigureRequest(e) => write!(f, "ConfigureRequest({})", e.id),
            Destroy(id) => write!(f, "Destroy({id})"),
            Enter(p) => write!(f, "Enter({})", p.id),
            Leave(p) => write!(f, "Leave({})", p.id),
            KeyPress(k) => write!(f, "KeyPress({k:?})"),
            MapRequest(id) => write!(f, "MapRequest({id})"),
            MappingNotify => write!(f, "MappingNotify"),
            MouseEvent(e) => write!(f, "MouseEvent({}, {:?})", e.id, e.kind),
            PropertyNotify(e) => write!(f, "PropertyNotify({})", e.id),
            RandrNotify => write!(f, "RandrNotify"),
            UnmapNotify(e) => write!(f, "UnmapNotify({})", e.id),
        }
    }
}

/// A client message sent by another client or the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    /// The ID of the window the message was sent to
    pub id: Xid,
    /// The name of the message type (interned atom name)
    pub dtype: String,
    data: ClientMessageData,
}

impl ClientMessage {
    /// Construct a new [ClientMessage] from its components
    pub fn new(id: Xid, dtype: impl Into<String>, data: impl Into<ClientMessageData>) -> Self {
        Self {
            id,
            dtype: dtype.into(),
            data: data.into(),
        }
    }

    /// The data payload of this message
    pub fn data(&self) -> &ClientMessageData {
        &self.data
    }
}

/// The data payload of a [ClientMessage], always held as u32s internally.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientMessageData(Vec<u32>);

impl ClientMessageData {
    /// The raw u32 values of this payload
    pub fn as_u32(&self) -> &[u32] {
        &self.0
    }

    /// The payload values as usizes
    pub fn as_usize(&self) -> Vec<usize> {
        self.0.iter().map(|&x| x as usize).collect()
    }
}

impl From<Vec<u32>> for ClientMessageData {
    fn from(data: Vec<u32>) -> Self {
        Self(data)
    }
}

impl From<[u32; 5]> for ClientMessageData {
    fn from(data: [u32; 5]) -> Self {
        Self(data.to_vec())
    }
}

/// A change of client geometry or a request for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureEvent {
    /// The ID of the window that had a property changed
    pub id: Xid,
    /// The new or requested window size
    pub r: Rect,
    /// Is this window the root window?
    pub is_root: bool,
}

/// The mouse pointer has moved into a different window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerChange {
    /// The ID of the window now containing the pointer
    pub id: Xid,
    /// Absolute coordinate of the event
    pub abs: Point,
    /// Coordinate of the event relative to top-left of the window itself
    pub relative: Point,
}

/// A client property has changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEvent {
    /// The ID of the window that had a property changed
    pub id: Xid,
    /// The name of the property that changed
    pub atom: String,
    /// Is this window the root window?
    pub is_root: bool,
}

/// A client window has been unmapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmapEvent {
    /// The ID of the window that was unmapped
    pub id: Xid,
    /// Whether this event was sent with SendEvent rather than generated by
    /// the server. ICCCM requires clients moving to the Withdrawn state to
    /// send a synthetic unmap, so these always trigger an unmanage.
    pub synthetic: bool,
}
