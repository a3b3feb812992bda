pub mod api;
pub mod device;
pub mod episode;
pub mod error;
pub mod http;
pub mod player;
pub mod session;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use api::{EpisodeQuery, SortOrder, fetch_episode, fetch_episodes};
pub use device::{DeviceEvent, LoadId, PlaybackDevice, SimulatedDevice, SimulatedDeviceOptions};
pub use episode::{Episode, format_duration};
pub use error::{ApiError, PlayerError};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use player::{
    NoopObserver, PlaybackState, PlayerController, PlayerEvent, PlayerObserver,
    SharedPlayerObserver,
};
pub use session::{Command, PlayerSession, Progress, SessionSnapshot};
