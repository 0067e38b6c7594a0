pub mod actions;
pub mod controller;
pub mod reply;
pub mod session;
pub mod texts;
pub mod transition;

pub use actions::{CallbackAction, FlowCommand};
pub use controller::{FlowController, FlowSettings};
pub use reply::{Button, Keyboard, Reply};
