//! Data types for working with X window properties
use crate::{pure::geometry::Rect, Error, Result, Xid};
use bitflags::bitflags;

/// Known property types that should be returnable by [XConn][0] impls when
/// they check window properties.
///
/// [0]: crate::x::XConn
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Prop {
    /// One or more X Atoms
    Atom(Vec<String>),
    /// Raw bytes for when the prop type is non-standard
    Bytes(Vec<u32>),
    /// One or more cardinal numbers
    Cardinal(Vec<u32>),
    /// UTF-8 encoded string data
    UTF8String(Vec<String>),
    /// One or more X window IDs
    Window(Vec<Xid>),
    /// The WmNormalHints properties for this window
    WmNormalHints(WmNormalHints),
}

/// Valid values for setting the `WM_STATE` property on a client.
///
/// See the [ICCCM docs][1] for more information.
///
/// [1]: https://tronche.com/gui/x/icccm/sec-4.html#s-4.1.3.1
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WmState {
    /// Window is not visible
    Withdrawn,
    /// Window is visible
    Normal,
    /// Window is iconified
    Iconic,
}

impl From<WmState> for u32 {
    fn from(s: WmState) -> u32 {
        match s {
            WmState::Withdrawn => 0,
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }
}

impl TryFrom<u32> for WmState {
    type Error = Error;

    fn try_from(n: u32) -> Result<Self> {
        match n {
            0 => Ok(Self::Withdrawn),
            1 => Ok(Self::Normal),
            3 => Ok(Self::Iconic),
            _ => Err(Error::InvalidHints(format!("invalid WM_STATE: {n}"))),
        }
    }
}

/// The mapping states a window can be in
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MapState {
    /// The window is unmapped
    Unmapped,
    /// The window is never viewable
    UnViewable,
    /// The window is currently viewable
    Viewable,
}

/// The input class for a window
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WindowClass {
    /// Class is copied from parent window
    CopyFromParent,
    /// Window can be displayed
    InputOutput,
    /// Window can only be used for queries
    InputOnly,
}

/// The subset of window attributes tracked when deciding whether or not a
/// window should be managed.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WindowAttributes {
    /// Whether the window has asked not to be managed
    pub override_redirect: bool,
    /// The current [MapState] of the window
    pub map_state: MapState,
    /// The [WindowClass] of the window
    pub window_class: WindowClass,
}

impl WindowAttributes {
    /// Create a new instance from component parts
    pub fn new(override_redirect: bool, map_state: MapState, window_class: WindowClass) -> Self {
        Self {
            override_redirect,
            map_state,
            window_class,
        }
    }
}

bitflags! {
    /// Possible flags that can be set in a WmNormalHints client property
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WmNormalHintsFlags: u32 {
        /// User-specified x, y
        const U_POSITION    = 0b0000000001;
        /// User-specified width, height
        const U_SIZE        = 0b0000000010;
        /// Program-specified position
        const P_POSITION    = 0b0000000100;
        /// Program-specified size
        const P_SIZE        = 0b0000001000;
        /// Program-specified minimum size
        const P_MIN_SIZE    = 0b0000010000;
        /// Program-specified maximum size
        const P_MAX_SIZE    = 0b0000100000;
        /// Program-specified resize increments
        const P_RESIZE_INC  = 0b0001000000;
        /// Program-specified min and max aspect ratios
        const P_ASPECT      = 0b0010000000;
        /// Program-specified base size
        const P_BASE_SIZE   = 0b0100000000;
        /// Program-specified window gravity
        const P_WIN_GRAVITY = 0b1000000000;
    }
}

/// Client requested hints about window geometry.
///
/// See the ICCCM [spec][1] for further details.
///
/// [1]: https://www.x.org/releases/X11R7.6/doc/xorg-docs/specs/ICCCM/icccm.html#wm_normal_hints_property
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct WmNormalHints {
    pub(crate) flags: WmNormalHintsFlags,
    pub(crate) base: Option<(u32, u32)>,
    pub(crate) min: Option<(u32, u32)>,
    pub(crate) max: Option<(u32, u32)>,
    pub(crate) inc: Option<(u32, u32)>,
    pub(crate) min_aspect: Option<(u32, u32)>,
    pub(crate) max_aspect: Option<(u32, u32)>,
    pub(crate) user_specified: Option<Rect>,
}

impl WmNormalHints {
    /// Create a new instance from component parts.
    pub fn new(
        flags: WmNormalHintsFlags,
        base: Option<(u32, u32)>,
        min: Option<(u32, u32)>,
        max: Option<(u32, u32)>,
        inc: Option<(u32, u32)>,
        min_aspect: Option<(u32, u32)>,
        max_aspect: Option<(u32, u32)>,
        user_specified: Option<Rect>,
    ) -> Self {
        Self {
            flags,
            base,
            min,
            max,
            inc,
            min_aspect,
            max_aspect,
            user_specified,
        }
    }

    /// A window whose minimum and maximum sizes coincide can not be resized
    /// and is managed as a floating window.
    pub fn fixed_size(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min == max)
    }

    /// The screen position requested for this window, if one was given.
    pub fn requested_position(&self) -> Option<Rect> {
        self.user_specified
    }

    /// Constrain a candidate screen position to these hints.
    ///
    /// The base size is removed, the aspect ratio bounds and resize
    /// increments are applied to the remaining interior size, the result is
    /// clamped to the maximum size and the base is added back. The final
    /// extent is never smaller than 1x1. The position of the [Rect] is left
    /// untouched.
    pub fn apply_to(&self, r: Rect) -> Rect {
        let (bw, bh) = self.base.or(self.min).unwrap_or((0, 0));
        let mut w = r.w.max(1).saturating_sub(bw);
        let mut h = r.h.max(1).saturating_sub(bh);

        // min_aspect <= w/h <= max_aspect
        if let Some((num, den)) = self.max_aspect {
            if num > 0 && den > 0 && (w as u64) * (den as u64) > (h as u64) * (num as u64) {
                w = ((h as u64) * (num as u64) / (den as u64)) as u32;
            }
        }
        if let Some((num, den)) = self.min_aspect {
            if num > 0 && den > 0 && (w as u64) * (den as u64) < (h as u64) * (num as u64) {
                h = ((w as u64) * (den as u64) / (num as u64)) as u32;
            }
        }

        if let Some((iw, ih)) = self.inc {
            if iw > 0 {
                w -= w % iw;
            }
            if ih > 0 {
                h -= h % ih;
            }
        }

        if let Some((mw, mh)) = self.max {
            w = w.min(mw.saturating_sub(bw));
            h = h.min(mh.saturating_sub(bh));
        }

        Rect {
            w: (w + bw).max(1),
            h: (h + bh).max(1),
            ..r
        }
    }

    /// Try to construct a [WmNormalHints] instance from raw bytes.
    ///
    /// This method expects a slice of 18 u32s corresponding to the C struct
    /// layout shown below.
    ///
    /// ```C
    /// typedef struct {
    ///     long flags;                /* marks which fields in this structure are defined */
    ///     int x, y;                  /* Obsolete */
    ///     int width, height;         /* Obsolete */
    ///     int min_width, min_height;
    ///     int max_width, max_height;
    ///     int width_inc, height_inc;
    ///     struct {
    ///            int x;              /* numerator */
    ///            int y;              /* denominator */
    ///     } min_aspect, max_aspect;
    ///     int base_width, base_height;
    ///     int win_gravity;
    /// } XSizeHints;
    /// ```
    pub fn try_from_bytes(raw: &[u32]) -> Result<Self> {
        if raw.len() != 18 {
            return Err(Error::InvalidHints(format!(
                "raw bytes should be [u32; 18] for WmNormalHints, got [u32; {}]",
                raw.len()
            )));
        }

        let flags = WmNormalHintsFlags::from_bits_truncate(raw[0]);

        // These fields are marked as obsolete but some clients still set
        // them so they are useful as a fallback position request
        let (x, y) = (raw[1], raw[2]);
        let (user_w, user_h) = (raw[3], raw[4]);

        let if_set = |w: u32, h: u32| if w > 0 && h > 0 { Some((w, h)) } else { None };

        Ok(Self {
            flags,
            base: if_set(raw[15], raw[16]),
            min: if_set(raw[5], raw[6]),
            max: if_set(raw[7], raw[8]),
            inc: if_set(raw[9], raw[10]),
            min_aspect: if_set(raw[11], raw[12]),
            max_aspect: if_set(raw[13], raw[14]),
            user_specified: if user_w > 0 && user_h > 0 {
                Some(Rect::new(x, y, user_w, user_h))
            } else {
                None
            },
        })
    }
}
