mod controller;
mod events;
mod state;

pub use controller::PlayerController;
pub use events::{NoopObserver, PlayerEvent, PlayerObserver, SharedPlayerObserver};
pub use state::PlaybackState;
