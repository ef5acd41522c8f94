//! The game session controller and its pure helpers.

mod controller;
mod pool;

pub use controller::{Advance, GameController, GenerationTicket};
pub use pool::{build_session, filter_pool};
