pub mod edit_window;

pub use edit_window::{EditWindowPolicy, EDIT_WINDOW_HOURS};
