// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use crate::episode::Episode;

/// Read-only snapshot of the player state
///
/// The queue is shared with the controller that produced the snapshot. Play
/// requests replace the controller's queue instead of mutating it, so a
/// snapshot keeps seeing the queue it was taken from.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub queue: Arc<[Episode]>,
    /// Selected index, `None` when nothing is selected
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub is_looping: bool,
    pub is_shuffling: bool,
}

impl PlaybackState {
    /// Initial state: empty queue, nothing selected, not playing
    pub fn empty() -> Self {
        Self {
            queue: Arc::from(Vec::new()),
            current_index: None,
            is_playing: false,
            is_looping: false,
            is_shuffling: false,
        }
    }

    /// The selected episode, if any
    pub fn current_episode(&self) -> Option<&Episode> {
        self.current_index.and_then(|index| self.queue.get(index))
    }

    /// Whether `play_next` would select another episode
    ///
    /// Shuffling always has a next pick, even for a single-episode queue.
    pub fn has_next(&self) -> bool {
        match self.current_index {
            Some(index) => self.is_shuffling || index + 1 < self.queue.len(),
            None => false,
        }
    }

    /// Whether `play_previous` would select another episode
    pub fn has_previous(&self) -> bool {
        self.current_index.is_some_and(|index| index > 0)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::empty()
    }
}
