//! UI rendering module for the market price dashboard
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod dashboard;
pub mod help_overlay;

use ratatui::Frame;

use crate::app::App;

pub use dashboard::{format_inr, render as render_dashboard, render_loading};
pub use help_overlay::render as render_help_overlay;

/// Renders the UI based on the current application state
pub fn render<S>(frame: &mut Frame, app: &App<S>) {
    if app.is_loading() {
        render_loading(frame, &app.translator);
        return;
    }
    render_dashboard(frame, app);
    if app.show_help {
        render_help_overlay(frame, &app.translator);
    }
}
