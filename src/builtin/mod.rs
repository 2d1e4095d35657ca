//! Built-in layouts and actions for use in user key bindings.
pub mod actions;
pub mod layout;
