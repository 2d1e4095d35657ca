//! Core data structures and user facing functionality for the window manager
use crate::{
    builtin::layout::{MainAndStack, Monocle},
    core::{
        bindings::{ActiveDrag, KeyBindings, KeyCode, MouseBindings, MouseState},
        layout::LayoutStack,
    },
    pure::{
        diff::Diff,
        geometry::Rect,
        screen::StatusGap,
        Stack, StackSet, Workspace,
    },
    stack,
    x::{manage_without_refresh, property::MapState, XConn, XConnExt, XEvent},
    Color, Result, Xid,
};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
};
use tracing::{error, info, trace};

pub mod actions;
pub mod bindings;
pub mod handle;
pub mod layout;

#[cfg(feature = "serde")]
pub mod resume;

/// The pure client state information for the window manager
pub type ClientSet = StackSet<Xid>;

/// The pure client state information for a single [Workspace]
pub type ClientSpace = Workspace<Xid>;

impl ClientSet {
    /// Run the per-workspace layouts to get a screen position for each
    /// visible client. Floating clients are placed above tiled clients and
    /// the first position returned by a layout ends up on top of the tiled
    /// block below them.
    ///
    /// Layouts are run against a copy of their state and the copy is only
    /// written back on success, so a panicking layout can not corrupt the
    /// layouts stored on its workspace: its placements for the pass are
    /// replaced with fullscreen ones instead.
    pub(crate) fn visible_client_positions(&mut self) -> Vec<(Xid, Rect)> {
        let mut positions: Vec<(Xid, Rect)> = Vec::new();
        let floating = self.floating.clone();

        for s in self.screens.iter_mut() {
            let r = s.visible_rect();
            let tag = s.workspace.tag.clone();
            let tiling = s
                .workspace
                .stack
                .as_ref()
                .and_then(|st| st.from_filtered(|c| !floating.contains_key(c)));

            let mut layouts = s.workspace.layouts.clone();
            let res = catch_unwind(AssertUnwindSafe(|| {
                layouts.layout_workspace(&tag, &tiling, r)
            }));

            let stack_positions = match res {
                Ok(ps) => {
                    s.workspace.layouts = layouts;
                    ps
                }
                Err(_) => {
                    error!(%tag, "layout panicked: using fullscreen placements for this pass");
                    fullscreen_positions(&tiling, r)
                }
            };

            positions.extend(stack_positions.into_iter().rev());

            let r_screen = s.r;
            if let Some(st) = s.workspace.stack.as_ref() {
                positions.extend(
                    st.iter()
                        .filter_map(|c| floating.get(c).map(|rr| (*c, rr.applied_to(&r_screen)))),
                );
            }
        }

        positions
    }
}

// The placements used when a layout fails: the semantics of [Monocle]
// without involving any layout code.
fn fullscreen_positions(stack: &Option<Stack<Xid>>, r: Rect) -> Vec<(Xid, Rect)> {
    match stack {
        Some(s) => std::iter::once(&s.focus)
            .chain(s.up.iter())
            .chain(s.down.iter())
            .map(|&c| (c, r))
            .collect(),
        None => vec![],
    }
}

/// User facing configuration options for the window manager.
#[derive(Debug, Clone)]
pub struct Config {
    /// The border colour applied to unfocused client windows
    pub normal_border: Color,
    /// The border colour applied to the focused client window
    pub focused_border: Color,
    /// The width in pixels of window borders
    pub border_width: u32,
    /// Whether moving the pointer into a window should focus it
    pub focus_follow_mouse: bool,
    /// The layouts available to each workspace
    pub default_layouts: LayoutStack,
    /// The tags of the workspaces to create at startup
    pub workspace_names: Vec<String>,
    /// WM_CLASS values that should always float
    pub floating_classes: Vec<String>,
    /// Space reserved on each screen for status bars and docks
    pub gap: StatusGap,
}

impl Default for Config {
    fn default() -> Self {
        let strings = |slice: &[&str]| slice.iter().map(|s| s.to_string()).collect();

        Config {
            normal_border: "#3c3836".try_into().expect("valid hex code"),
            focused_border: "#cc241d".try_into().expect("valid hex code"),
            border_width: 2,
            focus_follow_mouse: true,
            default_layouts: stack!(MainAndStack::boxed(1, 0.6, 0.1), Monocle::boxed()),
            workspace_names: strings(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]),
            floating_classes: strings(&["dmenu", "dunst"]),
            gap: StatusGap::default(),
        }
    }
}

/// Mutable internal state for the window manager.
///
/// The event handling in [handle] and the reconciliation in
/// [XConnExt][crate::x::XConnExt] all operate on this single value.
#[derive(Debug)]
pub struct State {
    /// The user provided configuration
    pub config: Config,
    /// The pure window manager state: what is where and what has focus
    pub client_set: ClientSet,
    /// An opaque string-keyed store carried across in-place restarts for
    /// the benefit of user extensions
    pub extensions: HashMap<String, String>,
    pub(crate) root: Xid,
    pub(crate) mapped: HashSet<Xid>,
    pub(crate) pending_unmap: HashMap<Xid, usize>,
    // Clients the server has already destroyed: they are purged from the
    // model like any other removal but no X calls may target them.
    pub(crate) destroyed: HashSet<Xid>,
    pub(crate) diff: Diff<Xid>,
}

impl State {
    pub(crate) fn try_new<X: XConn>(config: Config, x: &X) -> Result<Self> {
        let screen_details = x.screen_details()?;

        let mut client_set = StackSet::try_new(
            config.default_layouts.clone(),
            config.workspace_names.clone(),
            screen_details,
        )?;

        for s in client_set.screens_mut() {
            s.gap = config.gap;
        }

        Ok(Self {
            root: x.root(),
            config,
            client_set,
            extensions: HashMap::new(),
            mapped: HashSet::new(),
            pending_unmap: HashMap::new(),
            destroyed: HashSet::new(),
            diff: Diff::default(),
        })
    }

    /// The root window of the display being managed.
    pub fn root(&self) -> Xid {
        self.root
    }
}

/// A window manager instance: the event loop plus everything it drives.
///
/// The generic parameter is the [XConn] implementation used to communicate
/// with the X server, which allows the full event handling logic to be
/// exercised in tests without a display.
pub struct WindowManager<X>
where
    X: XConn,
{
    x: X,
    /// The mutable state driven by the event loop
    pub state: State,
    key_bindings: KeyBindings<X>,
    mouse_bindings: MouseBindings<X>,
    drag: Option<ActiveDrag<X>>,
}

impl<X: XConn> fmt::Debug for WindowManager<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManager")
            .field("state", &self.state)
            .field("n_key_bindings", &self.key_bindings.len())
            .field("n_mouse_bindings", &self.mouse_bindings.len())
            .finish()
    }
}

impl<X> WindowManager<X>
where
    X: XConn,
{
    /// Construct a new [WindowManager] with fresh workspaces built from the
    /// given [Config].
    pub fn new(
        config: Config,
        key_bindings: KeyBindings<X>,
        mouse_bindings: MouseBindings<X>,
        x: X,
    ) -> Result<Self> {
        let state = State::try_new(config, &x)?;

        Ok(Self {
            x,
            state,
            key_bindings,
            mouse_bindings,
            drag: None,
        })
    }

    /// Construct a [WindowManager] from the serialized snapshot of a
    /// previous instance, as passed on the command line over an in-place
    /// restart.
    ///
    /// Workspace contents, focus and floating positions are restored from
    /// the snapshot; clients that no longer exist on the X server are
    /// dropped and any workspace tags added to the config since the
    /// snapshot was taken are created empty.
    #[cfg(feature = "serde")]
    pub fn resume(
        config: Config,
        key_bindings: KeyBindings<X>,
        mouse_bindings: MouseBindings<X>,
        x: X,
        snapshot: &str,
    ) -> Result<Self> {
        let snapshot: resume::Snapshot = serde_json::from_str(snapshot)?;
        let state = resume::hydrate(snapshot, config, &x)?;

        Ok(Self {
            x,
            state,
            key_bindings,
            mouse_bindings,
            drag: None,
        })
    }

    fn grab_bindings(&self) -> Result<()> {
        let key_codes: Vec<KeyCode> = self.key_bindings.keys().copied().collect();
        let mouse_states: Vec<MouseState> = self
            .mouse_bindings
            .keys()
            .map(|(_, state)| state.clone())
            .collect();

        self.x.grab(&key_codes, &mouse_states)
    }

    // Take over any clients that are already present on the X server, such
    // as when starting with --replace or coming back from a restart.
    fn manage_existing_clients(&mut self) -> Result<()> {
        let Self { x, state, .. } = self;

        for id in x.existing_clients()? {
            if state.client_set.contains(&id) {
                continue; // restored from a resume snapshot
            }

            match x.get_window_attributes(id) {
                Ok(attrs) if !attrs.override_redirect && attrs.map_state == MapState::Viewable => {
                    info!(%id, "managing existing client");
                    if let Err(e) = manage_without_refresh(id, None, state, x) {
                        error!(%e, %id, "unable to manage existing client");
                    }
                }
                Ok(_) => (),
                Err(e) => error!(%e, %id, "unable to query window attributes"),
            }
        }

        Ok(())
    }

    /// Grab the user's bindings, take over any existing clients and run the
    /// main event loop.
    ///
    /// Each event is handled in full before the next is read: errors inside
    /// individual handlers are logged and never tear down the loop. This
    /// method only returns if reading from the X server itself fails.
    pub fn run(mut self) -> Result<()> {
        info!("grabbing key and mouse bindings");
        self.grab_bindings()?;

        info!("managing existing clients");
        self.manage_existing_clients()?;
        self.x.refresh(&mut self.state)?;

        loop {
            self.x.flush();

            let event = self.x.next_event()?;
            trace!(%event, "got event from X server");
            self.handle_xevent(event);
        }
    }

    /// Dispatch a single [XEvent] to the appropriate handler.
    ///
    /// Event handling is total: events with no specific handler are
    /// broadcast to all layouts and every handler deals with its own errors
    /// by logging and carrying on.
    pub fn handle_xevent(&mut self, event: XEvent) {
        use XEvent::*;

        match &event {
            ClientMessage(m) => handle::client_message(m.clone(), &mut self.state, &self.x),
            ConfigureNotify(e) if e.is_root => handle::detect_screens(&mut self.state, &self.x),
            ConfigureRequest(e) => handle::configure_request(e, &mut self.state, &self.x),
            Destroy(id) => handle::destroy(*id, &mut self.state, &self.x),
            Enter(p) => handle::enter(p.id, &mut self.state, &self.x),
            KeyPress(code) => {
                handle::keypress(*code, &mut self.key_bindings, &mut self.state, &self.x)
            }
            MapRequest(id) => handle::map_request(*id, &mut self.state, &self.x),
            MappingNotify => {
                if let Err(error) = self.grab_bindings() {
                    error!(%error, "unable to re-grab bindings after mapping change");
                }
            }
            MouseEvent(e) => handle::mouse_event(
                e.clone(),
                &mut self.mouse_bindings,
                &mut self.drag,
                &mut self.state,
                &self.x,
            ),
            RandrNotify => handle::detect_screens(&mut self.state, &self.x),
            UnmapNotify(e) => handle::unmap_notify(e, &mut self.state, &self.x),

            // Everything else is of no interest to the window manager
            // itself but layouts may want to react
            _ => handle::broadcast_to_layouts(event.clone(), &mut self.state),
        }
    }
}
