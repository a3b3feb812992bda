// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

/// State changes emitted by the player controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The queue was replaced by a play request
    QueueReplaced {
        queue_len: usize,
        /// Index selected in the new queue
        index: usize,
    },

    /// The selected episode moved within the current queue
    EpisodeChanged {
        index: usize,
        episode_id: String,
    },

    /// Playing flag changed
    PlayingChanged { is_playing: bool },

    /// Looping flag changed
    LoopingChanged { is_looping: bool },

    /// Shuffling flag changed
    ShufflingChanged { is_shuffling: bool },

    /// Queue emptied and selection reset
    Cleared,
}

/// Trait for observing player state changes.
///
/// The rendering layer implements this to redraw whatever depends on the
/// changed part of the state.
pub trait PlayerObserver: Send + Sync {
    /// Called after the state change has been applied
    fn notify(&self, event: PlayerEvent);
}

/// A shared reference to a player observer
pub type SharedPlayerObserver = Arc<dyn PlayerObserver>;

/// An observer that silently ignores all events.
/// Useful for tests or headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlayerObserver for NoopObserver {
    fn notify(&self, _event: PlayerEvent) {}
}

impl NoopObserver {
    /// Create a new NoopObserver wrapped in an Arc
    pub fn shared() -> SharedPlayerObserver {
        Arc::new(Self)
    }
}
