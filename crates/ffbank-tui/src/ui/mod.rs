//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `dashboard`: Greeting, balance card and transaction table
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling

pub mod dashboard;
pub mod input;
pub mod render;
pub mod styles;
