//! Screen state machine, controller and persistence session for SitConnect.

pub mod action;
pub mod app;
pub mod screen;
pub mod session;

pub use action::Action;
pub use app::{App, Message, MessageLevel};
pub use screen::{Nav, Screen, Tab, route};
pub use session::Session;
