//! Translating raw x11rb events into their [XEvent] representations.
use crate::{
    core::bindings::{KeyCode, MouseButton, MouseEvent, MouseEventKind, MouseState},
    pure::geometry::{Point, Rect},
    x::{
        event::{ClientMessage, ConfigureEvent, PointerChange, PropertyEvent, UnmapEvent, XEvent},
        XConn,
    },
    x11rb::RustConn,
    Xid,
};
use tracing::{trace, warn};
use x11rb::{
    protocol::{
        xproto::{
            ButtonPressEvent, ButtonReleaseEvent, KeyButMask, MotionNotifyEvent, NotifyMode,
        },
        Event,
    },
    NONE,
};

// Synthetic (SendEvent generated) events have the top bit of their response
// type set.
const SEND_EVENT_MASK: u8 = 0x80;

fn mask_bits(state: KeyButMask) -> u16 {
    u16::from(state)
}

// For events delivered via a grab on the root window the window of interest
// is the subwindow containing the pointer; for grabs on the client itself it
// is the event window.
fn target_window(root: u32, event: u32, child: u32) -> Xid {
    if event == root && child != NONE {
        Xid(child)
    } else {
        Xid(event)
    }
}

// Motion events carry no button detail: the held button has to be recovered
// from the event state mask.
fn held_button(state: KeyButMask) -> MouseButton {
    let bits = mask_bits(state);

    if bits & (1 << 8) > 0 {
        MouseButton::Left
    } else if bits & (1 << 9) > 0 {
        MouseButton::Middle
    } else if bits & (1 << 10) > 0 {
        MouseButton::Right
    } else if bits & (1 << 11) > 0 {
        MouseButton::ScrollUp
    } else {
        MouseButton::ScrollDown
    }
}

impl RustConn {
    pub(crate) fn convert_event(&self, event: Event) -> Option<XEvent> {
        let root = self.root_id();

        match event {
            Event::ButtonPress(e) => self.button_event(MouseEventKind::Press, &e),

            Event::ButtonRelease(e) => self.button_release(&e),

            Event::MotionNotify(e) => self.motion_event(&e),

            Event::ClientMessage(e) => {
                let dtype = match self.atom_name(Xid(e.type_)) {
                    Ok(name) => name,
                    Err(err) => {
                        warn!(%err, "unable to resolve client message type");
                        return None;
                    }
                };
                let data = e.data.as_data32().to_vec();

                Some(XEvent::ClientMessage(ClientMessage::new(
                    Xid(e.window),
                    dtype,
                    data,
                )))
            }

            Event::ConfigureNotify(e) => Some(XEvent::ConfigureNotify(ConfigureEvent {
                id: Xid(e.window),
                r: Rect::new(
                    e.x.max(0) as u32,
                    e.y.max(0) as u32,
                    e.width as u32,
                    e.height as u32,
                ),
                is_root: e.window == root,
            })),

            Event::ConfigureRequest(e) => Some(XEvent::ConfigureRequest(ConfigureEvent {
                id: Xid(e.window),
                r: Rect::new(
                    e.x.max(0) as u32,
                    e.y.max(0) as u32,
                    e.width as u32,
                    e.height as u32,
                ),
                is_root: e.window == root,
            })),

            Event::DestroyNotify(e) => Some(XEvent::Destroy(Xid(e.window))),

            Event::EnterNotify(e) if e.mode == NotifyMode::NORMAL => {
                Some(XEvent::Enter(PointerChange {
                    id: Xid(e.event),
                    abs: Point::new(e.root_x.max(0) as u32, e.root_y.max(0) as u32),
                    relative: Point::new(e.event_x.max(0) as u32, e.event_y.max(0) as u32),
                }))
            }

            Event::LeaveNotify(e) if e.mode == NotifyMode::NORMAL => {
                Some(XEvent::Leave(PointerChange {
                    id: Xid(e.event),
                    abs: Point::new(e.root_x.max(0) as u32, e.root_y.max(0) as u32),
                    relative: Point::new(e.event_x.max(0) as u32, e.event_y.max(0) as u32),
                }))
            }

            Event::KeyPress(e) => Some(XEvent::KeyPress(KeyCode {
                mask: mask_bits(e.state),
                code: e.detail,
            })),

            Event::MapRequest(e) => Some(XEvent::MapRequest(Xid(e.window))),

            Event::MappingNotify(_) => Some(XEvent::MappingNotify),

            Event::PropertyNotify(e) => {
                let atom = self.atom_name(Xid(e.atom)).ok()?;

                Some(XEvent::PropertyNotify(PropertyEvent {
                    id: Xid(e.window),
                    atom,
                    is_root: e.window == root,
                }))
            }

            Event::RandrNotify(_) | Event::RandrScreenChangeNotify(_) => {
                Some(XEvent::RandrNotify)
            }

            Event::UnmapNotify(e) => Some(XEvent::UnmapNotify(UnmapEvent {
                id: Xid(e.window),
                synthetic: e.response_type & SEND_EVENT_MASK != 0,
            })),

            event => {
                trace!(?event, "dropping unhandled event type");
                None
            }
        }
    }

    fn button_event(&self, kind: MouseEventKind, e: &ButtonPressEvent) -> Option<XEvent> {
        let state = match MouseState::from_event(e.detail, mask_bits(e.state)) {
            Ok(state) => state,
            Err(err) => {
                warn!(%err, "dropping button event with unknown button");
                return None;
            }
        };

        Some(XEvent::MouseEvent(MouseEvent::new(
            target_window(self.root_id(), e.event, e.child),
            Point::new(e.root_x.max(0) as u32, e.root_y.max(0) as u32),
            Point::new(e.event_x.max(0) as u32, e.event_y.max(0) as u32),
            state,
            kind,
        )))
    }

    fn button_release(&self, e: &ButtonReleaseEvent) -> Option<XEvent> {
        self.button_event(MouseEventKind::Release, e)
    }

    fn motion_event(&self, e: &MotionNotifyEvent) -> Option<XEvent> {
        let button = held_button(e.state);
        let state = MouseState::from_event(button.into(), mask_bits(e.state)).ok()?;

        Some(XEvent::MouseEvent(MouseEvent::new(
            target_window(self.root_id(), e.event, e.child),
            Point::new(e.root_x.max(0) as u32, e.root_y.max(0) as u32),
            Point::new(e.event_x.max(0) as u32, e.event_y.max(0) as u32),
            state,
            MouseEventKind::Motion,
        )))
    }
}
