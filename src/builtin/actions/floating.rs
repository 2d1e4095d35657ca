//! Actions for manipulating floating windows.
use crate::{
    core::{
        actions::{key_handler, modify_with, mouse_handler},
        bindings::{ActiveDrag, KeyEventHandler, MouseEventHandler},
    },
    pure::geometry::Point,
    x::{XConn, XConnExt},
};

/// Resize a currently floating window by a given (width, height) delta
pub fn resize<X: XConn>(dw: i32, dh: i32) -> Box<dyn KeyEventHandler<X>> {
    modify_with(move |cs| {
        let id = match cs.current_client() {
            Some(&id) => id,
            None => return,
        };

        let r_screen = cs.current_screen().geometry();
        if let Some(rr) = cs.floating.get_mut(&id) {
            *rr = rr.apply_as_rect(&r_screen, |mut r| {
                r.resize(dw, dh);
                r
            });
        }
    })
}

/// Move a currently floating window by a given (x, y) delta
pub fn reposition<X: XConn>(dx: i32, dy: i32) -> Box<dyn KeyEventHandler<X>> {
    modify_with(move |cs| {
        let id = match cs.current_client() {
            Some(&id) => id,
            None => return,
        };

        let r_screen = cs.current_screen().geometry();
        if let Some(rr) = cs.floating.get_mut(&id) {
            *rr = rr.apply_as_rect(&r_screen, |mut r| {
                r.reposition(dx, dy);
                r
            });
        }
    })
}

/// Move the currently focused window to the floating layer in its current
/// on screen position
pub fn float_focused<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|state, x: &X| {
        let id = match state.client_set.current_client() {
            Some(&id) => id,
            None => return Ok(()),
        };

        let r = x.client_geometry(id)?;

        x.modify_and_refresh(state, |cs| cs.float(id, r))
    })
}

/// Sink the current window back into tiling mode if it was floating
pub fn sink_focused<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    modify_with(|cs| {
        let id = match cs.current_client() {
            Some(&id) => id,
            None => return,
        };

        cs.sink(&id);
    })
}

/// Sink all floating windows back into their tiled positions
pub fn sink_all<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    modify_with(|cs| cs.floating.clear())
}

/// Drag the window under the pointer with the mouse, floating it in its
/// final position when the button is released.
pub fn mouse_move_window<X: XConn>() -> Box<dyn MouseEventHandler<X>> {
    mouse_handler(|e, state, x: &X| {
        let id = e.id;
        if !state.client_set.contains(&id) {
            return Ok(None);
        }

        let r0 = x.client_geometry(id)?;
        let p0 = e.rpt;

        Ok(Some(ActiveDrag {
            on_motion: Box::new(move |_, x: &X, p: Point| {
                let mut r = r0;
                r.reposition(p.x as i32 - p0.x as i32, p.y as i32 - p0.y as i32);

                x.position_client(id, r)
            }),
            on_release: Box::new(move |state, x: &X| {
                let r = x.client_geometry(id)?;

                x.modify_and_refresh(state, |cs| cs.float(id, r))
            }),
        }))
    })
}

/// Resize the window under the pointer with the mouse, respecting any size
/// hints it has set and floating it in its final shape when the button is
/// released.
pub fn mouse_resize_window<X: XConn>() -> Box<dyn MouseEventHandler<X>> {
    mouse_handler(|e, state, x: &X| {
        let id = e.id;
        if !state.client_set.contains(&id) {
            return Ok(None);
        }

        let r0 = x.client_geometry(id)?;
        let p0 = e.rpt;

        Ok(Some(ActiveDrag {
            on_motion: Box::new(move |_, x: &X, p: Point| {
                let mut r = r0;
                r.resize(p.x as i32 - p0.x as i32, p.y as i32 - p0.y as i32);

                x.position_floating_client(id, r)
            }),
            on_release: Box::new(move |state, x: &X| {
                let r = x.client_geometry(id)?;

                x.modify_and_refresh(state, |cs| cs.float(id, r))
            }),
        }))
    })
}
