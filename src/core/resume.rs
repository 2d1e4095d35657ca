//! Carrying window manager state over an in-place restart.
//!
//! The pure state is captured as a plain data snapshot, serialized to JSON
//! and handed to the replacement process as a single `--resume` command line
//! argument. Workspace layouts are recorded by name and looked back up in
//! the configured layouts on the other side, so the snapshot stays valid
//! even though layouts themselves are trait objects.
use crate::{
    builtin::layout::messages::ShutDown,
    core::{layout::IntoMessage, Config, State},
    pure::{geometry::RelativeRect, screen::StatusGap, Stack, StackSet, Workspace},
    x::XConn,
    Result, Xid,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    os::unix::process::CommandExt,
    process::Command,
};
use tracing::{info, warn};

/// A plain data capture of everything needed to rebuild a [State] in a new
/// process: workspace contents, screen assignments, focus, floating
/// positions and the opaque extension store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub(crate) screens: Vec<ScreenSnapshot>,
    pub(crate) focused_screen: usize,
    pub(crate) hidden: Vec<WorkspaceSnapshot>,
    pub(crate) floating: Vec<(Xid, RelativeRect)>,
    pub(crate) extensions: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ScreenSnapshot {
    pub(crate) index: usize,
    pub(crate) gap: StatusGap,
    pub(crate) workspace: WorkspaceSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WorkspaceSnapshot {
    pub(crate) id: usize,
    pub(crate) tag: String,
    pub(crate) layout: String,
    pub(crate) up: Vec<Xid>,
    pub(crate) focus: Option<Xid>,
    pub(crate) down: Vec<Xid>,
}

impl Snapshot {
    pub(crate) fn capture(state: &State) -> Self {
        let cs = &state.client_set;

        let mut screens: Vec<ScreenSnapshot> = cs
            .screens()
            .map(|s| ScreenSnapshot {
                index: s.index(),
                gap: s.gap(),
                workspace: snapshot_workspace(&s.workspace),
            })
            .collect();
        screens.sort_by_key(|s| s.index);

        Self {
            focused_screen: cs.current_screen().index(),
            screens,
            hidden: cs.hidden_workspaces().map(snapshot_workspace).collect(),
            floating: cs.floating.iter().map(|(c, r)| (*c, *r)).collect(),
            extensions: state.extensions.clone(),
        }
    }
}

fn snapshot_workspace(w: &Workspace<Xid>) -> WorkspaceSnapshot {
    // `up` is serialized head first, matching the order expected by
    // Stack::new on the way back in
    WorkspaceSnapshot {
        id: w.id(),
        tag: w.tag().to_string(),
        layout: w.layout_name(),
        up: w
            .stack()
            .map(|s| s.up.iter().rev().copied().collect())
            .unwrap_or_default(),
        focus: w.stack().map(|s| *s.focused()),
        down: w
            .stack()
            .map(|s| s.down.iter().copied().collect())
            .unwrap_or_default(),
    }
}

/// Rebuild a [State] from a [Snapshot] against the current contents of the
/// X server.
///
/// Clients that no longer exist are dropped (with focus falling to the next
/// client below, then above, matching a normal delete), missing configured
/// tags are created empty, and screens are re-read from the server rather
/// than trusted from the snapshot.
pub(crate) fn hydrate<X: XConn>(snapshot: Snapshot, config: Config, x: &X) -> Result<State> {
    let existing: HashSet<Xid> = x.existing_clients()?.into_iter().collect();
    let screen_rects = x.screen_details()?;

    let Snapshot {
        screens,
        focused_screen,
        hidden,
        floating,
        extensions,
    } = snapshot;

    let mut gaps: Vec<StatusGap> = Vec::with_capacity(screens.len());
    let mut workspaces: Vec<Workspace<Xid>> = Vec::new();

    for s in screens {
        gaps.push(s.gap);
        workspaces.push(rebuild_workspace(s.workspace, &config, &existing));
    }
    workspaces.extend(
        hidden
            .into_iter()
            .map(|w| rebuild_workspace(w, &config, &existing)),
    );

    // Tags added to the config since the snapshot was taken, plus enough
    // padding to cover every screen the server now reports
    let mut next_id = workspaces.iter().map(|w| w.id()).max().unwrap_or(0) + 1;
    for tag in &config.workspace_names {
        if !workspaces.iter().any(|w| w.tag() == tag) {
            workspaces.push(Workspace::new(
                next_id,
                tag,
                config.default_layouts.clone(),
                None,
            ));
            next_id += 1;
        }
    }
    while workspaces.len() < screen_rects.len() {
        workspaces.push(Workspace::new(
            next_id,
            format!("WS-{}", next_id + 1),
            config.default_layouts.clone(),
            None,
        ));
        next_id += 1;
    }

    let floating: HashMap<Xid, RelativeRect> = floating
        .into_iter()
        .filter(|(c, _)| existing.contains(c))
        .collect();

    let mut client_set = StackSet::try_new_concrete(workspaces, screen_rects, floating)?;

    for s in client_set.screens_mut() {
        s.gap = gaps.get(s.index()).copied().unwrap_or(config.gap);
    }
    client_set.focus_screen(focused_screen);

    Ok(State {
        root: x.root(),
        config,
        client_set,
        extensions,
        mapped: HashSet::new(),
        pending_unmap: HashMap::new(),
        destroyed: HashSet::new(),
        diff: Default::default(),
    })
}

fn rebuild_workspace(
    w: WorkspaceSnapshot,
    config: &Config,
    existing: &HashSet<Xid>,
) -> Workspace<Xid> {
    let WorkspaceSnapshot {
        id,
        tag,
        layout,
        up,
        focus,
        down,
    } = w;

    let mut layouts = config.default_layouts.clone();
    if layouts.name() != layout && !layouts.set_by_name(&layout) {
        warn!(%tag, %layout, "layout from snapshot is not in the configured layouts");
    }

    let mut up: Vec<Xid> = up.into_iter().filter(|c| existing.contains(c)).collect();
    let down: Vec<Xid> = down.into_iter().filter(|c| existing.contains(c)).collect();

    let stack = match focus.filter(|c| existing.contains(c)) {
        Some(f) => Some(Stack::new(up, f, down)),

        // The focused client died while we were restarting: focus falls to
        // the next client below, then the nearest one above
        None if !down.is_empty() => {
            let mut it = down.into_iter();
            let f = it.next().expect("non-empty");
            Some(Stack::new(up, f, it.collect::<Vec<_>>()))
        }
        None => up.pop().map(|f| Stack::new(up, f, Vec::new())),
    };

    Workspace::new(id, tag, layouts, stack)
}

/// Replace the current process with a fresh copy of itself, passing the
/// serialized [Snapshot] of the current state via `--resume`.
///
/// Layouts are sent [ShutDown] before the snapshot is taken so that they can
/// release any server side resources they hold. This function only returns
/// if the exec itself fails.
pub(crate) fn restart(state: &mut State) -> Result<()> {
    info!("restarting in place");
    state.client_set.broadcast_message(&ShutDown.into_message());

    let snapshot = Snapshot::capture(state);
    let arg = serde_json::to_string(&snapshot)?;
    let exe = std::env::current_exe()?;

    // exec only returns if it failed to replace the process
    let err = Command::new(exe).arg("--resume").arg(arg).exec();

    Err(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pure::geometry::Rect,
        x::{mock::StubXConn, XConnExt},
    };

    #[derive(Debug, Default)]
    struct ResumeTestXConn {
        clients: Vec<Xid>,
    }

    impl StubXConn for ResumeTestXConn {
        fn mock_screen_details(&self) -> Result<Vec<Rect>> {
            Ok(vec![
                Rect::new(0, 0, 1000, 800),
                Rect::new(1000, 0, 1000, 800),
            ])
        }

        fn mock_existing_clients(&self) -> Result<Vec<Xid>> {
            Ok(self.clients.clone())
        }
    }

    fn seeded_state(x: &ResumeTestXConn) -> State {
        let mut state = State::try_new(Config::default(), x).unwrap();

        for n in [1u32, 2, 3] {
            state.client_set.insert(Xid(n));
        }
        state.client_set.focus_tag("3");
        state.client_set.insert(Xid(4));
        state.client_set.float(Xid(4), Rect::new(10, 10, 100, 100));
        state.client_set.focus_tag("1");
        state.client_set.focus_up();
        state.client_set.next_layout();
        state
            .extensions
            .insert("user-key".to_string(), "user-value".to_string());

        state
    }

    fn observable(state: &State) -> (String, Vec<(String, String, Vec<Xid>, Option<Xid>)>) {
        let mut workspaces: Vec<_> = state
            .client_set
            .workspaces()
            .map(|w| {
                (
                    w.tag().to_string(),
                    w.layout_name(),
                    w.clients().copied().collect::<Vec<Xid>>(),
                    w.focus().copied(),
                )
            })
            .collect();
        workspaces.sort();

        (state.client_set.current_tag().to_string(), workspaces)
    }

    #[test]
    fn round_trip_preserves_everything_observable() {
        let x = ResumeTestXConn {
            clients: vec![Xid(1), Xid(2), Xid(3), Xid(4)],
        };
        let state = seeded_state(&x);

        let snapshot = Snapshot::capture(&state);
        let as_json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&as_json).unwrap();
        let restored = hydrate(parsed, Config::default(), &x).unwrap();

        assert_eq!(observable(&restored), observable(&state));
        assert_eq!(restored.client_set.floating, state.client_set.floating);
        assert_eq!(restored.extensions, state.extensions);
        assert_eq!(
            restored.client_set.current_screen().index(),
            state.client_set.current_screen().index()
        );
    }

    #[test]
    fn hydrate_drops_clients_that_no_longer_exist() {
        let x = ResumeTestXConn {
            clients: vec![Xid(1), Xid(2), Xid(3), Xid(4)],
        };
        let state = seeded_state(&x);
        let snapshot = Snapshot::capture(&state);

        // client 4 (floating, on tag 3) went away during the restart
        let x = ResumeTestXConn {
            clients: vec![Xid(1), Xid(2), Xid(3)],
        };
        let restored = hydrate(snapshot, Config::default(), &x).unwrap();

        assert!(!restored.client_set.contains(&Xid(4)));
        assert!(restored.client_set.floating.is_empty());
        assert_eq!(
            restored.client_set.workspace("3").unwrap().focus(),
            Some(&Xid(3))
        );
    }

    #[test]
    fn hydrate_adds_new_config_tags() {
        let x = ResumeTestXConn {
            clients: vec![Xid(1)],
        };
        let mut config = Config {
            workspace_names: vec!["1".into(), "2".into()],
            ..Config::default()
        };
        let state = State::try_new(config.clone(), &x).unwrap();

        let snapshot = Snapshot::capture(&state);

        config.workspace_names.push("extra".into());
        let restored = hydrate(snapshot, config, &x).unwrap();

        assert!(restored.client_set.contains_tag("extra"));
    }

    #[test]
    fn refresh_after_hydration_works() {
        let x = ResumeTestXConn {
            clients: vec![Xid(1), Xid(2), Xid(3), Xid(4)],
        };
        let state = seeded_state(&x);
        let snapshot = Snapshot::capture(&state);

        let mut restored = hydrate(snapshot, Config::default(), &x).unwrap();

        assert!(x.refresh(&mut restored).is_ok());
    }
}
