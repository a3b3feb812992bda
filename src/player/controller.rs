// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::episode::Episode;
use crate::error::PlayerError;

use super::events::{NoopObserver, PlayerEvent, SharedPlayerObserver};
use super::state::PlaybackState;

/// Single source of truth for what is playing and what comes next
///
/// All mutation goes through the methods below; every change is reported to
/// the configured [`PlayerObserver`](super::PlayerObserver). Operations that
/// leave the state as it was report nothing.
pub struct PlayerController {
    queue: Arc<[Episode]>,
    current_index: Option<usize>,
    is_playing: bool,
    is_looping: bool,
    is_shuffling: bool,
    /// Bumped every time the queue is replaced or cleared
    generation: u64,
    rng: StdRng,
    observer: SharedPlayerObserver,
}

impl PlayerController {
    /// Create an empty controller that reports to nobody
    pub fn new() -> Self {
        Self::with_observer(NoopObserver::shared())
    }

    /// Create an empty controller reporting to `observer`
    pub fn with_observer(observer: SharedPlayerObserver) -> Self {
        let initial = PlaybackState::empty();

        Self {
            queue: initial.queue,
            current_index: initial.current_index,
            is_playing: initial.is_playing,
            is_looping: initial.is_looping,
            is_shuffling: initial.is_shuffling,
            generation: 0,
            rng: StdRng::from_os_rng(),
            observer,
        }
    }

    /// Replace the random source used for shuffled picks
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            queue: Arc::clone(&self.queue),
            current_index: self.current_index,
            is_playing: self.is_playing,
            is_looping: self.is_looping,
            is_shuffling: self.is_shuffling,
        }
    }

    pub fn queue(&self) -> &[Episode] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.current_index.and_then(|index| self.queue.get(index))
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_looping(&self) -> bool {
        self.is_looping
    }

    pub fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    /// Counter identifying the current queue instance
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// See [`PlaybackState::has_next`]
    pub fn has_next(&self) -> bool {
        match self.current_index {
            Some(index) => self.is_shuffling || index + 1 < self.queue.len(),
            None => false,
        }
    }

    /// See [`PlaybackState::has_previous`]
    pub fn has_previous(&self) -> bool {
        self.current_index.is_some_and(|index| index > 0)
    }

    /// Play a single episode, replacing the queue with `[episode]`
    pub fn play(&mut self, episode: Episode) {
        debug!(episode_id = %episode.id, "Playing single episode");
        self.replace_queue(Arc::from(vec![episode]), 0);
    }

    /// Play `episodes` starting at `index`, replacing the queue
    ///
    /// Rejects an empty list or an out-of-bounds index and leaves the state
    /// untouched in that case.
    pub fn play_list(&mut self, episodes: Vec<Episode>, index: usize) -> Result<(), PlayerError> {
        if episodes.is_empty() {
            return Err(PlayerError::EmptyQueue);
        }
        if index >= episodes.len() {
            return Err(PlayerError::IndexOutOfBounds {
                index,
                len: episodes.len(),
            });
        }

        debug!(queue_len = episodes.len(), index, "Playing episode list");
        self.replace_queue(Arc::from(episodes), index);
        Ok(())
    }

    /// Flip the playing flag. Nothing happens while no episode is selected.
    pub fn toggle_play(&mut self) {
        if self.current_index.is_none() {
            return;
        }
        self.set_playing(!self.is_playing);
    }

    pub fn toggle_loop(&mut self) {
        self.is_looping = !self.is_looping;
        self.observer.notify(PlayerEvent::LoopingChanged {
            is_looping: self.is_looping,
        });
    }

    pub fn toggle_shuffle(&mut self) {
        self.is_shuffling = !self.is_shuffling;
        self.observer.notify(PlayerEvent::ShufflingChanged {
            is_shuffling: self.is_shuffling,
        });
    }

    /// Sync the playing flag from the playback device
    ///
    /// A device claiming to play while nothing is selected is ignored.
    pub fn set_playing_state(&mut self, value: bool) {
        if value && self.current_index.is_none() {
            debug!("Ignoring playing state while nothing is selected");
            return;
        }
        self.set_playing(value);
    }

    /// Select the next episode
    ///
    /// While shuffling, the next index is drawn uniformly from the whole
    /// queue and may be the current one. Otherwise the selection advances by
    /// one and stays put at the end of the queue.
    pub fn play_next(&mut self) {
        let Some(index) = self.current_index else {
            return;
        };

        let next = if self.is_shuffling {
            self.rng.random_range(0..self.queue.len())
        } else if index + 1 < self.queue.len() {
            index + 1
        } else {
            debug!(index, "Already at the last episode");
            return;
        };

        self.select(next);
    }

    /// Select the previous episode. Shuffle does not apply here.
    pub fn play_previous(&mut self) {
        match self.current_index {
            Some(index) if index > 0 => self.select(index - 1),
            _ => {}
        }
    }

    /// Empty the queue, reset the selection and stop playing
    ///
    /// Loop and shuffle preferences are kept.
    pub fn clear_player_state(&mut self) {
        if self.queue.is_empty() && self.current_index.is_none() && !self.is_playing {
            return;
        }

        debug!("Clearing player state");
        self.queue = Arc::from(Vec::new());
        self.current_index = None;
        self.is_playing = false;
        self.generation += 1;
        self.observer.notify(PlayerEvent::Cleared);
    }

    fn replace_queue(&mut self, queue: Arc<[Episode]>, index: usize) {
        self.queue = queue;
        self.current_index = Some(index);
        self.generation += 1;
        self.observer.notify(PlayerEvent::QueueReplaced {
            queue_len: self.queue.len(),
            index,
        });
        self.set_playing(true);
    }

    fn select(&mut self, index: usize) {
        if self.current_index == Some(index) {
            return;
        }

        self.current_index = Some(index);
        let episode_id = self.queue[index].id.clone();
        debug!(index, %episode_id, "Selected episode");
        self.observer
            .notify(PlayerEvent::EpisodeChanged { index, episode_id });
    }

    fn set_playing(&mut self, value: bool) {
        if self.is_playing == value {
            return;
        }

        self.is_playing = value;
        self.observer
            .notify(PlayerEvent::PlayingChanged { is_playing: value });
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::player::events::testing::RecordingObserver;
    use crate::testing::{make_episode, make_episodes};

    fn seeded() -> PlayerController {
        PlayerController::new().with_rng(StdRng::seed_from_u64(7))
    }

    fn with_list(ids: &[&str], index: usize) -> PlayerController {
        let mut player = seeded();
        player.play_list(make_episodes(ids), index).unwrap();
        player
    }

    #[test]
    fn starts_empty() {
        let player = PlayerController::new();

        assert!(player.queue().is_empty());
        assert_eq!(player.current_index(), None);
        assert!(player.current_episode().is_none());
        assert!(!player.is_playing());
        assert!(!player.is_looping());
        assert!(!player.is_shuffling());
        assert!(!player.has_next());
        assert!(!player.has_previous());
    }

    #[test]
    fn play_replaces_queue_with_single_episode() {
        let mut player = with_list(&["a", "b", "c"], 2);

        player.play(make_episode("x"));

        assert_eq!(player.queue().len(), 1);
        assert_eq!(player.queue()[0].id, "x");
        assert_eq!(player.current_index(), Some(0));
        assert!(player.is_playing());
    }

    #[test]
    fn play_list_selects_requested_index() {
        let player = with_list(&["a", "b", "c"], 1);

        assert_eq!(player.queue().len(), 3);
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.current_episode().unwrap().id, "b");
        assert!(player.is_playing());
    }

    #[test]
    fn play_list_rejects_out_of_bounds_index() {
        let mut player = with_list(&["a"], 0);
        player.toggle_play();
        let generation = player.generation();

        let result = player.play_list(make_episodes(&["b", "c"]), 2);

        assert_eq!(
            result,
            Err(PlayerError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(player.queue()[0].id, "a");
        assert_eq!(player.current_index(), Some(0));
        assert!(!player.is_playing());
        assert_eq!(player.generation(), generation);
    }

    #[test]
    fn play_list_rejects_empty_list() {
        let mut player = seeded();

        assert_eq!(player.play_list(Vec::new(), 0), Err(PlayerError::EmptyQueue));
        assert_eq!(player.current_index(), None);
    }

    #[test]
    fn replacing_queue_does_not_affect_earlier_snapshot() {
        let mut player = with_list(&["a", "b", "c"], 0);
        let before = player.state();

        player.play(make_episode("x"));

        assert_eq!(before.queue.len(), 3);
        assert_eq!(before.current_episode().unwrap().id, "a");
        assert_eq!(player.state().queue.len(), 1);
    }

    #[test]
    fn every_play_request_bumps_generation() {
        let mut player = seeded();
        let start = player.generation();

        player.play(make_episode("a"));
        player.play(make_episode("a"));
        player.play_list(make_episodes(&["a", "b"]), 0).unwrap();

        assert_eq!(player.generation(), start + 3);
    }

    #[test]
    fn toggle_play_flips_flag() {
        let mut player = with_list(&["a"], 0);

        player.toggle_play();
        assert!(!player.is_playing());

        player.toggle_play();
        assert!(player.is_playing());
    }

    #[test]
    fn toggle_play_without_selection_stays_paused() {
        let mut player = seeded();

        player.toggle_play();

        assert!(!player.is_playing());
    }

    #[test]
    fn toggle_loop_twice_restores_flag() {
        let mut player = seeded();

        player.toggle_loop();
        assert!(player.is_looping());

        player.toggle_loop();
        assert!(!player.is_looping());
    }

    #[test]
    fn toggle_shuffle_twice_restores_flag() {
        let mut player = seeded();

        player.toggle_shuffle();
        assert!(player.is_shuffling());

        player.toggle_shuffle();
        assert!(!player.is_shuffling());
    }

    #[test]
    fn set_playing_state_follows_device() {
        let mut player = with_list(&["a"], 0);

        player.set_playing_state(false);
        assert!(!player.is_playing());

        player.set_playing_state(true);
        assert!(player.is_playing());
    }

    #[test]
    fn set_playing_state_true_ignored_without_selection() {
        let mut player = seeded();

        player.set_playing_state(true);

        assert!(!player.is_playing());
    }

    #[test]
    fn play_next_advances_sequentially_until_the_end() {
        let ids = ["a", "b", "c", "d"];
        let mut player = with_list(&ids, 0);

        for expected in 1..ids.len() {
            assert!(player.has_next());
            player.play_next();
            assert_eq!(player.current_index(), Some(expected));
        }

        assert!(!player.has_next());
        player.play_next();
        assert_eq!(player.current_index(), Some(ids.len() - 1));
    }

    #[test]
    fn play_next_without_selection_is_noop() {
        let mut player = seeded();
        player.toggle_shuffle();

        player.play_next();

        assert_eq!(player.current_index(), None);
    }

    #[test]
    fn shuffled_next_stays_in_bounds_and_covers_queue() {
        let mut player = with_list(&["a", "b", "c"], 0);
        player.toggle_shuffle();

        let mut seen = [false; 3];
        for _ in 0..200 {
            player.play_next();
            let index = player.current_index().unwrap();
            assert!(index < 3);
            seen[index] = true;
        }

        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn shuffled_next_may_repeat_current_episode() {
        let mut player = with_list(&["a", "b", "c"], 0);
        player.toggle_shuffle();

        let mut repeated = false;
        for _ in 0..200 {
            let before = player.current_index();
            player.play_next();
            repeated |= player.current_index() == before;
        }

        assert!(repeated);
    }

    #[test]
    fn shuffled_next_on_single_episode_does_not_fail() {
        let mut player = seeded();
        player.play(make_episode("x"));
        player.toggle_shuffle();

        assert!(player.has_next());
        player.play_next();

        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.current_episode().unwrap().id, "x");
    }

    #[test]
    fn play_previous_decrements() {
        let mut player = with_list(&["a", "b", "c"], 2);

        assert!(player.has_previous());
        player.play_previous();

        assert_eq!(player.current_index(), Some(1));
    }

    #[test]
    fn play_previous_at_start_leaves_state_unchanged() {
        let mut player = with_list(&["a", "b"], 0);
        let generation = player.generation();

        assert!(!player.has_previous());
        player.play_previous();

        assert_eq!(player.current_index(), Some(0));
        assert!(player.is_playing());
        assert_eq!(player.generation(), generation);
    }

    #[test]
    fn play_previous_ignores_shuffle() {
        let mut player = with_list(&["a", "b", "c"], 2);
        player.toggle_shuffle();

        player.play_previous();
        assert_eq!(player.current_index(), Some(1));

        player.play_previous();
        assert_eq!(player.current_index(), Some(0));
    }

    #[test]
    fn clear_resets_queue_and_selection() {
        let mut player = with_list(&["a", "b", "c"], 1);
        player.toggle_loop();
        player.toggle_shuffle();

        player.clear_player_state();

        assert!(player.queue().is_empty());
        assert_eq!(player.current_index(), None);
        assert!(!player.is_playing());
        assert!(!player.has_next());
        assert!(player.is_looping());
        assert!(player.is_shuffling());
    }

    #[test]
    fn clear_on_empty_player_is_harmless() {
        let mut player = seeded();

        player.clear_player_state();

        assert!(player.queue().is_empty());
        assert_eq!(player.current_index(), None);
        assert!(!player.is_playing());
    }

    #[test]
    fn sequential_scenario_ends_with_clear() {
        let mut player = with_list(&["A", "B", "C"], 0);

        player.play_next();
        assert_eq!(player.current_episode().unwrap().id, "B");

        player.play_next();
        assert_eq!(player.current_episode().unwrap().id, "C");
        assert!(!player.has_next());

        // device "ended" with nothing left
        if player.has_next() {
            player.play_next();
        } else {
            player.clear_player_state();
        }

        assert!(player.queue().is_empty());
    }

    #[test]
    fn observer_receives_changes_in_order() {
        let observer = Arc::new(RecordingObserver::default());
        let mut player = PlayerController::with_observer(observer.clone())
            .with_rng(StdRng::seed_from_u64(1));

        player.play_list(make_episodes(&["a", "b"]), 0).unwrap();
        player.play_next();
        player.toggle_play();
        player.clear_player_state();

        assert_eq!(
            observer.events(),
            vec![
                PlayerEvent::QueueReplaced {
                    queue_len: 2,
                    index: 0
                },
                PlayerEvent::PlayingChanged { is_playing: true },
                PlayerEvent::EpisodeChanged {
                    index: 1,
                    episode_id: "b".to_string()
                },
                PlayerEvent::PlayingChanged { is_playing: false },
                PlayerEvent::Cleared,
            ]
        );
    }

    #[test]
    fn observer_not_notified_for_noops() {
        let observer = Arc::new(RecordingObserver::default());
        let mut player = PlayerController::with_observer(observer.clone());

        player.toggle_play();
        player.play_next();
        player.play_previous();
        player.set_playing_state(true);
        player.clear_player_state();

        assert!(observer.events().is_empty());
    }
}
