pub mod contacts;
pub mod controller;
pub mod export;
pub mod markup;
pub mod profile;
pub mod selection;
pub mod thread;

pub use controller::{ChatController, Event, Notice};
