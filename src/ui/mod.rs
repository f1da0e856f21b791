pub mod terminal_ui;
pub mod widgets;

pub use terminal_ui::{TerminalUI, UiAction};
