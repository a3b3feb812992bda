// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::device::{DeviceEvent, LoadId, PlaybackDevice};
use crate::episode::Episode;
use crate::error::PlayerError;
use crate::player::{PlaybackState, PlayerController};

/// Requests from the rendering layer
#[derive(Debug, Clone)]
pub enum Command {
    Play(Episode),
    PlayList { episodes: Vec<Episode>, index: usize },
    TogglePlay,
    ToggleLoop,
    ToggleShuffle,
    Next,
    Previous,
    /// Jump to a position in seconds
    Seek(u64),
    Clear,
}

/// Playback position of the loaded episode, in whole seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub position: u64,
    pub duration: u64,
}

/// Everything a renderer needs to draw the player
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub progress: Progress,
}

/// Which episode the device currently has loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Loaded {
    load_id: LoadId,
    generation: u64,
    index: usize,
}

/// Connects a [`PlayerController`] to a [`PlaybackDevice`]
///
/// Commands and device events are applied one at a time. After each one the
/// device is brought in line with the controller: a new selection is loaded,
/// an empty selection unloads, and the play and loop flags are mirrored.
pub struct PlayerSession<D> {
    controller: PlayerController,
    device: D,
    progress: Progress,
    loaded: Option<Loaded>,
    next_load_id: LoadId,
    device_playing: bool,
    device_looping: bool,
    updates: watch::Sender<SessionSnapshot>,
}

impl<D: PlaybackDevice> PlayerSession<D> {
    pub fn new(controller: PlayerController, device: D) -> Self {
        let snapshot = SessionSnapshot {
            state: controller.state(),
            progress: Progress::default(),
        };
        let (updates, _) = watch::channel(snapshot);

        Self {
            controller,
            device,
            progress: Progress::default(),
            loaded: None,
            next_load_id: LoadId::first(),
            device_playing: false,
            device_looping: false,
            updates,
        }
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.controller.state(),
            progress: self.progress,
        }
    }

    /// Receive a fresh snapshot after every handled command or device event
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Apply a rendering-layer command
    ///
    /// Only `PlayList` can fail; a rejected command leaves everything as it
    /// was.
    pub fn handle_command(&mut self, command: Command) -> Result<(), PlayerError> {
        debug!(?command, "Handling command");

        match command {
            Command::Play(episode) => self.controller.play(episode),
            Command::PlayList { episodes, index } => self.controller.play_list(episodes, index)?,
            Command::TogglePlay => self.controller.toggle_play(),
            Command::ToggleLoop => self.controller.toggle_loop(),
            Command::ToggleShuffle => self.controller.toggle_shuffle(),
            Command::Next => self.advance(),
            Command::Previous => self.controller.play_previous(),
            Command::Seek(position) => self.seek(position),
            Command::Clear => self.controller.clear_player_state(),
        }

        self.reconcile();
        Ok(())
    }

    /// Apply an event reported by the device
    ///
    /// Events belonging to anything but the currently loaded episode are
    /// dropped.
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        let Some(loaded) = self.loaded else {
            debug!(?event, "Dropping device event, nothing loaded");
            return;
        };
        if event.load_id() != loaded.load_id {
            debug!(?event, current = ?loaded.load_id, "Dropping stale device event");
            return;
        }

        match event {
            DeviceEvent::Started { .. } => {
                self.device_playing = true;
                self.controller.set_playing_state(true);
            }
            DeviceEvent::Paused { .. } => {
                self.device_playing = false;
                self.controller.set_playing_state(false);
            }
            DeviceEvent::TimeUpdate { position, .. } => {
                let seconds = position.max(0.0).floor() as u64;
                self.progress.position = seconds.min(self.progress.duration);
            }
            DeviceEvent::Ended { .. } => {
                self.device_playing = false;
                if self.controller.has_next() {
                    self.advance();
                } else {
                    info!("Queue finished");
                    self.controller.clear_player_state();
                }
            }
        }

        self.reconcile();
    }

    /// Process commands and device events until the command channel closes
    ///
    /// Both sources are serialized on this task, so the last write wins.
    /// Returns the final player state.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut device_events: mpsc::UnboundedReceiver<DeviceEvent>,
    ) -> PlaybackState {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Err(e) = self.handle_command(command) {
                            warn!(error = %e, "Rejected command");
                        }
                    }
                    None => break,
                },
                Some(event) = device_events.recv() => self.handle_device_event(event),
            }
        }

        debug!("Command channel closed, stopping session");
        self.controller.state()
    }

    fn advance(&mut self) {
        let before = self.loaded_identity();
        let shuffled = self.controller.is_shuffling();

        self.controller.play_next();

        // A shuffled pick can land on the episode that is already loaded
        if shuffled && before.is_some() && self.current_identity() == before {
            debug!("Shuffle picked the current episode, restarting it");
            self.progress.position = 0;
            self.device.seek(0);
            self.controller.set_playing_state(true);
        }
    }

    fn seek(&mut self, position: u64) {
        if self.loaded.is_none() {
            return;
        }

        let position = position.min(self.progress.duration);
        self.device.seek(position);
        self.progress.position = position;
    }

    fn current_identity(&self) -> Option<(u64, usize)> {
        self.controller
            .current_index()
            .map(|index| (self.controller.generation(), index))
    }

    fn loaded_identity(&self) -> Option<(u64, usize)> {
        self.loaded.map(|loaded| (loaded.generation, loaded.index))
    }

    fn reconcile(&mut self) {
        if self.current_identity() != self.loaded_identity() {
            self.load_current();
        }

        if self.loaded.is_some() && self.controller.is_playing() != self.device_playing {
            if self.controller.is_playing() {
                self.device.play();
            } else {
                self.device.pause();
            }
            self.device_playing = self.controller.is_playing();
        }

        if self.controller.is_looping() != self.device_looping {
            self.device_looping = self.controller.is_looping();
            self.device.set_looping(self.device_looping);
        }

        self.updates.send_replace(self.snapshot());
    }

    fn load_current(&mut self) {
        let generation = self.controller.generation();

        match (self.controller.current_index(), self.controller.current_episode()) {
            (Some(index), Some(episode)) => {
                let load_id = self.next_load_id;
                self.next_load_id = load_id.next();

                info!(?load_id, episode_id = %episode.id, title = %episode.title, "Loading episode");
                self.device.load(episode, load_id);
                self.progress = Progress {
                    position: 0,
                    duration: episode.duration,
                };
                self.loaded = Some(Loaded {
                    load_id,
                    generation,
                    index,
                });

                // Loading autoplays
                self.device_playing = true;
                self.controller.set_playing_state(true);
            }
            _ => {
                if self.loaded.take().is_some() {
                    self.device.unload();
                }
                self.progress = Progress::default();
                self.device_playing = false;
            }
        }
    }
}
