// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::episode::Episode;

/// Identifies one episode load on a playback device
///
/// Every event a device emits carries the id of the load it belongs to, so
/// events from a replaced episode can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

impl LoadId {
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Signals emitted by a playback device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Playback started or resumed
    Started { load_id: LoadId },

    /// Playback paused, including the implicit pause at the end of media
    Paused { load_id: LoadId },

    /// Playback position moved
    TimeUpdate {
        load_id: LoadId,
        /// Position in seconds
        position: f64,
    },

    /// Media reached its end without looping
    Ended { load_id: LoadId },
}

impl DeviceEvent {
    pub fn load_id(&self) -> LoadId {
        match self {
            DeviceEvent::Started { load_id }
            | DeviceEvent::Paused { load_id }
            | DeviceEvent::TimeUpdate { load_id, .. }
            | DeviceEvent::Ended { load_id } => *load_id,
        }
    }
}

/// Something that can actually play an episode's media
///
/// Calls are fire-and-forget; the device reports what really happened
/// through [`DeviceEvent`]s.
pub trait PlaybackDevice: Send {
    /// Replace whatever is loaded with `episode` and start playing it from 0
    fn load(&mut self, episode: &Episode, load_id: LoadId);

    /// Resume playback. Playing from the end restarts at 0.
    fn play(&mut self);

    fn pause(&mut self);

    /// Move the playback position, in seconds
    fn seek(&mut self, position: u64);

    /// Restart at 0 instead of ending when the media runs out
    fn set_looping(&mut self, looping: bool);

    /// Stop and drop the loaded media
    fn unload(&mut self);
}

/// Shortest tick the simulated device runs with
const MIN_TICK: Duration = Duration::from_millis(1);

/// Options for [`SimulatedDevice`]
#[derive(Debug, Clone)]
pub struct SimulatedDeviceOptions {
    /// Wall-clock time between position updates
    pub tick: Duration,
    /// Media seconds that pass on each tick
    pub step: f64,
}

impl Default for SimulatedDeviceOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            step: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Control {
    Play,
    Pause,
    Seek(u64),
    SetLooping(bool),
}

/// A clock-driven device that "plays" media by advancing a position counter
///
/// Each load runs its own ticker task; loading again or unloading aborts the
/// previous one, so only one task ever reports progress. Must be used from
/// within a tokio runtime.
pub struct SimulatedDevice {
    options: SimulatedDeviceOptions,
    events: mpsc::UnboundedSender<DeviceEvent>,
    looping: bool,
    current: Option<Loaded>,
}

struct Loaded {
    controls: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

impl SimulatedDevice {
    /// Create a device and the receiving end of its event channel
    ///
    /// A tick shorter than a millisecond, zero included, runs at one
    /// millisecond.
    pub fn new(
        mut options: SimulatedDeviceOptions,
    ) -> (Self, mpsc::UnboundedReceiver<DeviceEvent>) {
        options.tick = options.tick.max(MIN_TICK);
        let (events, rx) = mpsc::unbounded_channel();

        let device = Self {
            options,
            events,
            looping: false,
            current: None,
        };

        (device, rx)
    }

    fn send(&self, control: Control) {
        if let Some(loaded) = &self.current {
            // The ticker only goes away together with `current`
            let _ = loaded.controls.send(control);
        }
    }

    fn stop_current(&mut self) {
        if let Some(loaded) = self.current.take() {
            loaded.task.abort();
        }
    }
}

impl PlaybackDevice for SimulatedDevice {
    fn load(&mut self, episode: &Episode, load_id: LoadId) {
        self.stop_current();

        debug!(?load_id, episode_id = %episode.id, "Loading episode on simulated device");

        let (controls, control_rx) = mpsc::unbounded_channel();
        let transport = Transport {
            load_id,
            duration: episode.duration as f64,
            position: 0.0,
            playing: true,
            looping: self.looping,
        };

        let task = tokio::spawn(run_ticker(
            transport,
            self.options.clone(),
            control_rx,
            self.events.clone(),
        ));

        self.current = Some(Loaded { controls, task });
    }

    fn play(&mut self) {
        self.send(Control::Play);
    }

    fn pause(&mut self) {
        self.send(Control::Pause);
    }

    fn seek(&mut self, position: u64) {
        self.send(Control::Seek(position));
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        self.send(Control::SetLooping(looping));
    }

    fn unload(&mut self) {
        debug!("Unloading simulated device");
        self.stop_current();
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.stop_current();
    }
}

struct Transport {
    load_id: LoadId,
    duration: f64,
    position: f64,
    playing: bool,
    looping: bool,
}

impl Transport {
    fn apply(&mut self, control: Control) -> Vec<DeviceEvent> {
        let load_id = self.load_id;

        match control {
            Control::Play if !self.playing => {
                if self.position >= self.duration {
                    self.position = 0.0;
                }
                self.playing = true;
                vec![DeviceEvent::Started { load_id }]
            }
            Control::Pause if self.playing => {
                self.playing = false;
                vec![DeviceEvent::Paused { load_id }]
            }
            Control::Seek(position) => {
                self.position = (position as f64).min(self.duration);
                vec![DeviceEvent::TimeUpdate {
                    load_id,
                    position: self.position,
                }]
            }
            Control::SetLooping(looping) => {
                self.looping = looping;
                Vec::new()
            }
            Control::Play | Control::Pause => Vec::new(),
        }
    }

    fn advance(&mut self, step: f64) -> Vec<DeviceEvent> {
        let load_id = self.load_id;

        if !self.playing {
            return Vec::new();
        }

        self.position += step;
        if self.position < self.duration {
            return vec![DeviceEvent::TimeUpdate {
                load_id,
                position: self.position,
            }];
        }

        if self.looping {
            self.position = 0.0;
            return vec![DeviceEvent::TimeUpdate {
                load_id,
                position: 0.0,
            }];
        }

        self.position = self.duration;
        self.playing = false;
        vec![
            DeviceEvent::TimeUpdate {
                load_id,
                position: self.position,
            },
            DeviceEvent::Paused { load_id },
            DeviceEvent::Ended { load_id },
        ]
    }
}

async fn run_ticker(
    mut transport: Transport,
    options: SimulatedDeviceOptions,
    mut controls: mpsc::UnboundedReceiver<Control>,
    events: mpsc::UnboundedSender<DeviceEvent>,
) {
    let load_id = transport.load_id;
    let mut interval = tokio::time::interval(options.tick);
    // The first tick completes immediately
    interval.tick().await;

    if events.send(DeviceEvent::Started { load_id }).is_err() {
        return;
    }

    loop {
        let emitted = tokio::select! {
            control = controls.recv() => match control {
                Some(control) => transport.apply(control),
                None => break,
            },
            _ = interval.tick() => transport.advance(options.step),
        };

        for event in emitted {
            trace!(?event, "Simulated device event");
            if events.send(event).is_err() {
                return;
            }
        }
    }
}
