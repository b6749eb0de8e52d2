mod form;
mod handler;
mod ui;

pub use form::SourceForm;
pub use handler::{handle_key_event, handle_mouse_event, AppAction, InputContext};
pub use ui::draw;
