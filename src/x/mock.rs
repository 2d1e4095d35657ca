//! Mock implementations of [XConn] for writing tests without a display.
//! This module and its contents are only available when testing.
use crate::{
    core::bindings::{KeyCode, MouseState},
    pure::geometry::Rect,
    x::{
        event::{ClientMessage, XEvent},
        property::{MapState, Prop, WindowAttributes, WindowClass, WmState},
        ClientAttr, ClientConfig, XConn,
    },
    Result, Xid,
};
use std::{cell::RefCell, collections::HashMap};

/// A stub [XConn] with a benign default for every operation.
///
/// Tests implement the `mock_` methods they care about and get an [XConn]
/// for free via the blanket impl: server mutating calls succeed and do
/// nothing, queries report an empty server.
#[allow(unused_variables)]
pub trait StubXConn {
    fn mock_root(&self) -> Xid {
        Xid(0)
    }

    fn mock_screen_details(&self) -> Result<Vec<Rect>> {
        Ok(vec![Rect::new(0, 0, 1024, 768)])
    }

    fn mock_grab(&self, key_codes: &[KeyCode], mouse_states: &[MouseState]) -> Result<()> {
        Ok(())
    }

    fn mock_next_event(&self) -> Result<XEvent> {
        unimplemented!("mock_next_event")
    }

    fn mock_flush(&self) {}

    fn mock_drain_enter_events(&self) -> Result<usize> {
        Ok(0)
    }

    fn mock_replay_pointer_event(&self) -> Result<()> {
        Ok(())
    }

    fn mock_intern_atom(&self, atom: &str) -> Result<Xid> {
        Ok(Xid(9999))
    }

    fn mock_atom_name(&self, xid: Xid) -> Result<String> {
        Ok(String::new())
    }

    fn mock_client_geometry(&self, client: Xid) -> Result<Rect> {
        Ok(Rect::default())
    }

    fn mock_existing_clients(&self) -> Result<Vec<Xid>> {
        Ok(vec![])
    }

    fn mock_map(&self, client: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_unmap(&self, client: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_kill(&self, client: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_focus(&self, client: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        Ok(None)
    }

    fn mock_get_window_attributes(&self, client: Xid) -> Result<WindowAttributes> {
        Ok(WindowAttributes::new(
            false,
            MapState::Viewable,
            WindowClass::InputOutput,
        ))
    }

    fn mock_set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()> {
        Ok(())
    }

    fn mock_set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()> {
        Ok(())
    }

    fn mock_set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        Ok(())
    }

    fn mock_send_client_message(&self, msg: ClientMessage) -> Result<()> {
        Ok(())
    }

    fn mock_send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()> {
        Ok(())
    }
}

impl<T> XConn for T
where
    T: StubXConn,
{
    fn root(&self) -> Xid {
        self.mock_root()
    }

    fn screen_details(&self) -> Result<Vec<Rect>> {
        self.mock_screen_details()
    }

    fn grab(&self, key_codes: &[KeyCode], mouse_states: &[MouseState]) -> Result<()> {
        self.mock_grab(key_codes, mouse_states)
    }

    fn next_event(&self) -> Result<XEvent> {
        self.mock_next_event()
    }

    fn flush(&self) {
        self.mock_flush()
    }

    fn drain_enter_events(&self) -> Result<usize> {
        self.mock_drain_enter_events()
    }

    fn replay_pointer_event(&self) -> Result<()> {
        self.mock_replay_pointer_event()
    }

    fn intern_atom(&self, atom: &str) -> Result<Xid> {
        self.mock_intern_atom(atom)
    }

    fn atom_name(&self, xid: Xid) -> Result<String> {
        self.mock_atom_name(xid)
    }

    fn client_geometry(&self, client: Xid) -> Result<Rect> {
        self.mock_client_geometry(client)
    }

    fn existing_clients(&self) -> Result<Vec<Xid>> {
        self.mock_existing_clients()
    }

    fn map(&self, client: Xid) -> Result<()> {
        self.mock_map(client)
    }

    fn unmap(&self, client: Xid) -> Result<()> {
        self.mock_unmap(client)
    }

    fn kill(&self, client: Xid) -> Result<()> {
        self.mock_kill(client)
    }

    fn focus(&self, client: Xid) -> Result<()> {
        self.mock_focus(client)
    }

    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        self.mock_get_prop(client, prop_name)
    }

    fn get_window_attributes(&self, client: Xid) -> Result<WindowAttributes> {
        self.mock_get_window_attributes(client)
    }

    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()> {
        self.mock_set_wm_state(client, wm_state)
    }

    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()> {
        self.mock_set_client_attributes(client, attrs)
    }

    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        self.mock_set_client_config(client, data)
    }

    fn send_client_message(&self, msg: ClientMessage) -> Result<()> {
        self.mock_send_client_message(msg)
    }

    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()> {
        self.mock_send_configure_notify(client, r, border)
    }
}

/// The individual server mutating calls made against a [RecordingXConn].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XCall {
    /// The client was mapped
    Map(Xid),
    /// The client was unmapped
    Unmap(Xid),
    /// The client was given input focus
    Focus(Xid),
    /// The client was killed without protocol interaction
    Kill(Xid),
    /// The client was moved / resized
    Position(Xid, Rect),
    /// The client was restacked above another
    StackAbove(Xid, Xid),
    /// The client had its ICCCM WM_STATE set
    SetWmState(Xid, WmState),
    /// The client was sent a message of the named type
    SendMessage(Xid, String),
    /// The client was sent a synthetic ConfigureNotify for the given rect
    ConfigureNotify(Xid, Rect),
}

/// An [XConn] that records every server mutating call made against it, for
/// asserting on the exact X requests driven by the event handling and
/// reconciliation logic.
#[derive(Debug, Default)]
pub struct RecordingXConn {
    screens: RefCell<Vec<Rect>>,
    props: RefCell<HashMap<(Xid, String), Prop>>,
    geometry: RefCell<HashMap<Xid, Rect>>,
    calls: RefCell<Vec<XCall>>,
}

impl RecordingXConn {
    /// Create a new [RecordingXConn] reporting the given screens.
    pub fn new(screens: Vec<Rect>) -> Self {
        Self {
            screens: RefCell::new(screens),
            ..Default::default()
        }
    }

    /// Set a property that will be reported for the given client.
    pub fn set_prop(&self, client: Xid, name: &str, prop: Prop) {
        self.props.borrow_mut().insert((client, name.to_string()), prop);
    }

    /// Set the geometry reported for the given client.
    pub fn set_geometry(&self, client: Xid, r: Rect) {
        self.geometry.borrow_mut().insert(client, r);
    }

    /// Replace the screens reported by this connection.
    pub fn set_screens(&self, screens: Vec<Rect>) {
        *self.screens.borrow_mut() = screens;
    }

    /// All recorded calls in the order they were made.
    pub fn calls(&self) -> Vec<XCall> {
        self.calls.borrow().clone()
    }

    /// Drop all recorded calls.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: XCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl StubXConn for RecordingXConn {
    fn mock_screen_details(&self) -> Result<Vec<Rect>> {
        Ok(self.screens.borrow().clone())
    }

    fn mock_client_geometry(&self, client: Xid) -> Result<Rect> {
        Ok(self
            .geometry
            .borrow()
            .get(&client)
            .copied()
            .unwrap_or_default())
    }

    fn mock_get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        Ok(self
            .props
            .borrow()
            .get(&(client, prop_name.to_string()))
            .cloned())
    }

    fn mock_map(&self, client: Xid) -> Result<()> {
        self.record(XCall::Map(client));
        Ok(())
    }

    fn mock_unmap(&self, client: Xid) -> Result<()> {
        self.record(XCall::Unmap(client));
        Ok(())
    }

    fn mock_focus(&self, client: Xid) -> Result<()> {
        self.record(XCall::Focus(client));
        Ok(())
    }

    fn mock_kill(&self, client: Xid) -> Result<()> {
        self.record(XCall::Kill(client));
        Ok(())
    }

    fn mock_set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()> {
        self.record(XCall::SetWmState(client, wm_state));
        Ok(())
    }

    fn mock_set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        for d in data {
            match *d {
                ClientConfig::Position(r) => self.record(XCall::Position(client, r)),
                ClientConfig::StackAbove(below) => self.record(XCall::StackAbove(client, below)),
                _ => (),
            }
        }

        Ok(())
    }

    fn mock_send_client_message(&self, msg: ClientMessage) -> Result<()> {
        self.record(XCall::SendMessage(msg.id, msg.dtype));
        Ok(())
    }

    fn mock_send_configure_notify(&self, client: Xid, r: Rect, _border: u32) -> Result<()> {
        self.record(XCall::ConfigureNotify(client, r));
        Ok(())
    }
}
