//! An [XConn] implementation backed by the [x11rb][::x11rb] crate.
use crate::{
    core::{
        bindings::{KeyBindings, KeyCode, MouseBindings, MouseState, LOCK_MASK_COMBOS},
        Config, WindowManager,
    },
    pure::geometry::Rect,
    x::{
        atom::Atom,
        event::{ClientMessage, XEvent},
        property::{MapState, Prop, WindowAttributes, WindowClass, WmNormalHints, WmState},
        ClientAttr, ClientConfig, XConn,
    },
    Error, Result, Xid,
};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
};
use strum::IntoEnumIterator;
use tracing::{info, trace, warn};
use x11rb::{
    connection::Connection,
    errors::ReplyError,
    protocol::{
        randr::{self, ConnectionExt as _},
        xproto::{
            self, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureNotifyEvent,
            ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask, GrabMode,
            InputFocus, ModMask, PropMode, StackMode,
        },
        ErrorKind, Event,
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    CURRENT_TIME, NONE,
};

pub(crate) mod conversions;

fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::PROPERTY_CHANGE
}

fn client_event_mask() -> EventMask {
    EventMask::ENTER_WINDOW | EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE
}

// The mask used while the manager itself unmaps a client, so that the unmap
// does not come back to us as a StructureNotify event.
fn client_unmap_mask() -> EventMask {
    EventMask::ENTER_WINDOW | EventMask::PROPERTY_CHANGE
}

/// Construct a [WindowManager] backed by a live [RustConn].
///
/// If `replace` is true an ICCCM handover is performed with any running
/// window manager, otherwise the presence of one is a fatal
/// [Error::WmAlreadyRunning].
pub fn new_x11rb_backed_window_manager(
    config: Config,
    key_bindings: KeyBindings<RustConn>,
    mouse_bindings: MouseBindings<RustConn>,
    replace: bool,
) -> Result<WindowManager<RustConn>> {
    let conn = RustConn::new(replace)?;

    WindowManager::new(config, key_bindings, mouse_bindings, conn)
}

/// Construct a [WindowManager] from the state snapshot passed over an
/// in-place restart via `--resume`.
#[cfg(feature = "serde")]
pub fn resume_x11rb_backed_window_manager(
    config: Config,
    key_bindings: KeyBindings<RustConn>,
    mouse_bindings: MouseBindings<RustConn>,
    snapshot: &str,
) -> Result<WindowManager<RustConn>> {
    // We are taking over from ourselves so the previous instance has
    // already released the root window by exiting.
    let conn = RustConn::new(true)?;

    WindowManager::resume(config, key_bindings, mouse_bindings, conn, snapshot)
}

/// An [XConn] backed by an x11rb [RustConnection].
pub struct RustConn {
    conn: RustConnection,
    root: xproto::Window,
    check_win: xproto::Window,
    atoms: RefCell<HashMap<String, u32>>,
    pending: RefCell<VecDeque<XEvent>>,
}

impl std::fmt::Debug for RustConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustConn")
            .field("root", &self.root)
            .field("check_win", &self.check_win)
            .finish()
    }
}

impl RustConn {
    /// Establish a new X11 connection and take ownership of window
    /// management for the default screen.
    ///
    /// With `replace` set, the `WM_S<n>` manager selection is claimed and we
    /// wait for the running window manager to shut down before selecting
    /// events on the root window (ICCCM 2.8). Without it, an existing
    /// selection owner is an error.
    pub fn new(replace: bool) -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn.setup().roots[screen_num].root;

        let check_win = conn.generate_id()?;
        conn.create_window(
            0, // copy depth from parent
            check_win,
            root,
            -1,
            -1,
            1,
            1,
            0,
            xproto::WindowClass::INPUT_ONLY,
            0, // copy visual from parent
            &CreateWindowAux::new().override_redirect(1),
        )?
        .check()?;

        let this = Self {
            conn,
            root,
            check_win,
            atoms: RefCell::new(HashMap::new()),
            pending: RefCell::new(VecDeque::new()),
        };

        for atom in Atom::iter() {
            this.atom_id(atom.as_ref())?;
        }

        this.take_wm_ownership(screen_num, replace)?;
        this.select_root_events()?;

        Ok(this)
    }

    fn take_wm_ownership(&self, screen_num: usize, replace: bool) -> Result<()> {
        let selection = self.atom_id(&format!("WM_S{screen_num}"))?;
        let owner = self.conn.get_selection_owner(selection)?.reply()?.owner;

        if owner != NONE && !replace {
            return Err(Error::WmAlreadyRunning);
        }

        self.conn
            .set_selection_owner(self.check_win, selection, CURRENT_TIME)?
            .check()?;

        if owner != NONE {
            info!(%owner, "waiting for the current window manager to exit");
            self.conn.change_window_attributes(
                owner,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
            )?;
            self.conn.flush()?;

            loop {
                match self.conn.wait_for_event()? {
                    Event::DestroyNotify(e) if e.window == owner => break,
                    _ => (),
                }
            }
        }

        Ok(())
    }

    fn select_root_events(&self) -> Result<()> {
        let res = self
            .conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new().event_mask(root_event_mask()),
            )?
            .check();

        match res {
            Ok(_) => (),
            Err(ReplyError::X11Error(e)) if e.error_kind == ErrorKind::Access => {
                return Err(Error::WmAlreadyRunning)
            }
            Err(e) => return Err(e.into()),
        }

        // Screen change notifications when the RandR extension is present
        let notify = randr::NotifyMask::CRTC_CHANGE
            | randr::NotifyMask::OUTPUT_CHANGE
            | randr::NotifyMask::SCREEN_CHANGE;
        if let Err(e) = self.conn.randr_select_input(self.root, notify) {
            warn!(%e, "unable to select RandR events: screen changes will not be detected");
        }

        Ok(())
    }

    fn atom_id(&self, name: &str) -> Result<u32> {
        if let Some(&id) = self.atoms.borrow().get(name) {
            return Ok(id);
        }

        let id = self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom;
        self.atoms.borrow_mut().insert(name.to_string(), id);

        Ok(id)
    }

    pub(crate) fn root_id(&self) -> xproto::Window {
        self.root
    }

    fn prop_from_reply(&self, name: &str, reply: xproto::GetPropertyReply) -> Result<Option<Prop>> {
        if reply.type_ == NONE {
            return Ok(None);
        }

        // Properties with a known fixed interpretation
        if name == Atom::WmNormalHints.as_ref() {
            let raw: Vec<u32> = reply.value32().map(|it| it.collect()).unwrap_or_default();
            return Ok(Some(Prop::WmNormalHints(WmNormalHints::try_from_bytes(
                &raw,
            )?)));
        }

        let atom = u32::from(AtomEnum::ATOM);
        let cardinal = u32::from(AtomEnum::CARDINAL);
        let string = u32::from(AtomEnum::STRING);
        let window = u32::from(AtomEnum::WINDOW);
        let utf8_string = self.atom_id(Atom::UTF8String.as_ref())?;

        let prop = match reply.type_ {
            t if t == atom => {
                let names = reply
                    .value32()
                    .map(|it| it.map(|a| self.atom_name(Xid(a))).collect::<Result<_>>())
                    .transpose()?
                    .unwrap_or_default();

                Prop::Atom(names)
            }

            t if t == cardinal => {
                Prop::Cardinal(reply.value32().map(|it| it.collect()).unwrap_or_default())
            }

            t if t == window => Prop::Window(
                reply
                    .value32()
                    .map(|it| it.map(Xid).collect())
                    .unwrap_or_default(),
            ),

            t if t == string || t == utf8_string => Prop::UTF8String(
                String::from_utf8_lossy(&reply.value)
                    .split('\0')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect(),
            ),

            _ => Prop::Bytes(reply.value32().map(|it| it.collect()).unwrap_or_default()),
        };

        Ok(Some(prop))
    }
}

impl XConn for RustConn {
    fn root(&self) -> Xid {
        Xid(self.root)
    }

    fn screen_details(&self) -> Result<Vec<Rect>> {
        let monitors = self
            .conn
            .randr_get_monitors(self.root, true)?
            .reply()?
            .monitors;

        let mut rects: Vec<Rect> = monitors
            .into_iter()
            .map(|m| {
                Rect::new(
                    m.x.max(0) as u32,
                    m.y.max(0) as u32,
                    m.width as u32,
                    m.height as u32,
                )
            })
            .collect();

        // Indices are assigned from left to right based on the position of
        // each screen's top left corner
        rects.sort_by_key(|r| (r.x, r.y));

        if rects.is_empty() {
            return Err(Error::NoScreens);
        }

        Ok(rects)
    }

    fn grab(&self, key_codes: &[KeyCode], mouse_states: &[MouseState]) -> Result<()> {
        // AnyKey / AnyButton
        self.conn.ungrab_key(0, self.root, ModMask::ANY)?;
        self.conn
            .ungrab_button(xproto::ButtonIndex::ANY, self.root, ModMask::ANY)?;

        let mouse_event_mask =
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION;

        // Bindings are grabbed for every combination of the NumLock and
        // CapsLock masks so that they fire regardless of lock state
        for combo in LOCK_MASK_COMBOS {
            for k in key_codes {
                self.conn.grab_key(
                    false,
                    self.root,
                    ModMask::from(k.mask | combo),
                    k.code,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }

            for m in mouse_states {
                let button = match m.button() {
                    1 => xproto::ButtonIndex::M1,
                    2 => xproto::ButtonIndex::M2,
                    3 => xproto::ButtonIndex::M3,
                    4 => xproto::ButtonIndex::M4,
                    _ => xproto::ButtonIndex::M5,
                };

                self.conn.grab_button(
                    false,
                    self.root,
                    mouse_event_mask,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                    NONE,
                    NONE,
                    button,
                    ModMask::from(m.mask() | combo),
                )?;
            }
        }

        self.conn.flush()?;

        Ok(())
    }

    fn next_event(&self) -> Result<XEvent> {
        if let Some(event) = self.pending.borrow_mut().pop_front() {
            return Ok(event);
        }

        loop {
            let raw = self.conn.wait_for_event()?;
            if let Some(event) = self.convert_event(raw) {
                return Ok(event);
            }
        }
    }

    fn flush(&self) {
        let _ = self.conn.flush();
    }

    fn drain_enter_events(&self) -> Result<usize> {
        let mut n = 0;

        while let Some(raw) = self.conn.poll_for_event()? {
            match self.convert_event(raw) {
                Some(XEvent::Enter(_)) => n += 1,
                Some(event) => self.pending.borrow_mut().push_back(event),
                None => (),
            }
        }

        Ok(n)
    }

    fn replay_pointer_event(&self) -> Result<()> {
        self.conn
            .allow_events(xproto::Allow::REPLAY_POINTER, CURRENT_TIME)?;
        self.conn.flush()?;

        Ok(())
    }

    fn intern_atom(&self, atom: &str) -> Result<Xid> {
        self.atom_id(atom).map(Xid)
    }

    fn atom_name(&self, xid: Xid) -> Result<String> {
        if let Some(name) = self
            .atoms
            .borrow()
            .iter()
            .find(|&(_, &id)| id == *xid)
            .map(|(name, _)| name.clone())
        {
            return Ok(name);
        }

        let name = String::from_utf8_lossy(&self.conn.get_atom_name(*xid)?.reply()?.name).to_string();
        self.atoms.borrow_mut().insert(name.clone(), *xid);

        Ok(name)
    }

    fn client_geometry(&self, client: Xid) -> Result<Rect> {
        let g = self.conn.get_geometry(*client)?.reply()?;

        Ok(Rect::new(
            g.x.max(0) as u32,
            g.y.max(0) as u32,
            g.width as u32,
            g.height as u32,
        ))
    }

    fn existing_clients(&self) -> Result<Vec<Xid>> {
        let children = self.conn.query_tree(self.root)?.reply()?.children;

        Ok(children
            .into_iter()
            .filter(|&id| id != self.check_win)
            .map(Xid)
            .collect())
    }

    fn map(&self, client: Xid) -> Result<()> {
        self.conn.map_window(*client)?;

        Ok(())
    }

    fn unmap(&self, client: Xid) -> Result<()> {
        self.conn.unmap_window(*client)?;

        Ok(())
    }

    fn kill(&self, client: Xid) -> Result<()> {
        self.conn.kill_client(*client)?;

        Ok(())
    }

    fn focus(&self, client: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::PARENT, *client, CURRENT_TIME)?;

        Ok(())
    }

    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        let atom_id = self.atom_id(prop_name)?;
        let reply = self
            .conn
            .get_property(false, *client, atom_id, AtomEnum::ANY, 0, 1024)?
            .reply()?;

        self.prop_from_reply(prop_name, reply)
    }

    fn get_window_attributes(&self, client: Xid) -> Result<WindowAttributes> {
        let attrs = self.conn.get_window_attributes(*client)?.reply()?;

        let map_state = if attrs.map_state == xproto::MapState::UNMAPPED {
            MapState::Unmapped
        } else if attrs.map_state == xproto::MapState::UNVIEWABLE {
            MapState::UnViewable
        } else {
            MapState::Viewable
        };
        let window_class = if attrs.class == xproto::WindowClass::COPY_FROM_PARENT {
            WindowClass::CopyFromParent
        } else if attrs.class == xproto::WindowClass::INPUT_OUTPUT {
            WindowClass::InputOutput
        } else {
            WindowClass::InputOnly
        };

        Ok(WindowAttributes::new(
            attrs.override_redirect,
            map_state,
            window_class,
        ))
    }

    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()> {
        let wm_state_atom = self.atom_id(Atom::WmState.as_ref())?;

        self.conn.change_property32(
            PropMode::REPLACE,
            *client,
            wm_state_atom,
            wm_state_atom,
            &[u32::from(wm_state), NONE],
        )?;

        Ok(())
    }

    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()> {
        let mut aux = ChangeWindowAttributesAux::new();

        for attr in attrs {
            aux = match attr {
                ClientAttr::BorderColor(c) => aux.border_pixel(*c),
                ClientAttr::ClientEventMask => aux.event_mask(client_event_mask()),
                ClientAttr::ClientUnmapMask => aux.event_mask(client_unmap_mask()),
                ClientAttr::RootEventMask => aux.event_mask(root_event_mask()),
            };
        }

        self.conn.change_window_attributes(*client, &aux)?;

        // Unbound clicks on a managed client are intercepted (and then
        // replayed) so that click-to-focus works when focus-follows-mouse
        // is disabled
        if attrs.contains(&ClientAttr::ClientEventMask) {
            self.conn.grab_button(
                false,
                *client,
                EventMask::BUTTON_PRESS,
                GrabMode::SYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                xproto::ButtonIndex::ANY,
                ModMask::ANY,
            )?;
        }

        Ok(())
    }

    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        let mut aux = ConfigureWindowAux::new();

        for conf in data {
            aux = match conf {
                ClientConfig::BorderPx(px) => aux.border_width(*px),
                ClientConfig::Position(r) => aux
                    .x(r.x as i32)
                    .y(r.y as i32)
                    .width(r.w)
                    .height(r.h),
                ClientConfig::StackAbove(id) => {
                    aux.sibling(**id).stack_mode(StackMode::ABOVE)
                }
                ClientConfig::StackTop => aux.stack_mode(StackMode::ABOVE),
            };
        }

        self.conn.configure_window(*client, &aux)?;

        Ok(())
    }

    fn send_client_message(&self, msg: ClientMessage) -> Result<()> {
        trace!(?msg, "sending client message");
        let type_ = self.atom_id(&msg.dtype)?;

        let mut data = [0u32; 5];
        for (i, &v) in msg.data().as_u32().iter().take(5).enumerate() {
            data[i] = v;
        }

        let event = ClientMessageEvent::new(32, *msg.id, type_, data);
        self.conn
            .send_event(false, *msg.id, EventMask::NO_EVENT, event)?;

        Ok(())
    }

    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: xproto::CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: *client,
            window: *client,
            above_sibling: NONE,
            x: r.x as i16,
            y: r.y as i16,
            width: r.w as u16,
            height: r.h as u16,
            border_width: border as u16,
            override_redirect: false,
        };

        self.conn
            .send_event(false, *client, EventMask::STRUCTURE_NOTIFY, event)?;

        Ok(())
    }
}
