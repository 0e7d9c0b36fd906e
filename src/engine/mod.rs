//! Mixing engine
//!
//! Top-level coordinator owning the asset catalog, the one-shot voice set,
//! the streaming slot array, and the maintenance thread. One engine per
//! process is the expected shape, constructed explicitly and torn down
//! explicitly; every public operation may be called from any thread.
//!
//! Two independent locks partition the shared playback state: one for the
//! one-shot set, one for the slot array. They are never held together, and
//! all device calls touching a published handle happen under the owning
//! lock.

mod effects;
mod maintenance;
mod stream;

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::device::{self, AudioDevice, VoiceState};
use crate::engine::effects::ActiveEffect;
use crate::engine::stream::{BoundTrack, StreamSlot, STREAM_SLOTS};
use crate::error::{Error, Result};
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Streaming audio mixing engine
///
/// Owns all playback state for its lifetime. Dropping the engine performs
/// the same deterministic teardown as [`shutdown`](Engine::shutdown):
/// the maintenance thread is joined before any device handle is released.
pub struct Engine {
    device: Arc<dyn AudioDevice>,
    catalog: Catalog,

    /// Live one-shot voices, reclaimed only by the maintenance loop
    effects: Arc<Mutex<Vec<ActiveEffect>>>,

    /// Fixed array of streaming players
    slots: Arc<Mutex<[StreamSlot; STREAM_SLOTS]>>,

    /// Observed once per maintenance iteration
    stop_flag: Arc<AtomicBool>,

    maintenance: Option<JoinHandle<()>>,
}

impl Engine {
    /// Initialize the engine: load the catalog, set up the streaming
    /// voices, and start the maintenance thread
    pub fn new(config: EngineConfig, device: Arc<dyn AudioDevice>) -> Result<Self> {
        info!(
            effects_dir = %config.effects_dir.display(),
            music_dir = %config.music_dir.display(),
            "starting mixing engine"
        );

        let catalog = Catalog::load(&config.effects_dir, &config.music_dir)?;

        if !(0.0..=1.0).contains(&config.initial_gain) {
            return Err(Error::VolumeOutOfRange(config.initial_gain));
        }
        device.set_listener_gain(config.initial_gain);
        device::check(device.as_ref(), "listener setup")?;

        let slots: [StreamSlot; STREAM_SLOTS] = std::array::from_fn(|_| StreamSlot {
            voice: device.create_voice(),
            buffers: std::array::from_fn(|_| device.create_buffer()),
            track: None,
        });
        device::check(device.as_ref(), "stream voice setup")?;

        let effects = Arc::new(Mutex::new(Vec::new()));
        let slots = Arc::new(Mutex::new(slots));
        let stop_flag = Arc::new(AtomicBool::new(false));

        let maintenance = {
            let effects = Arc::clone(&effects);
            let slots = Arc::clone(&slots);
            let device = Arc::clone(&device);
            let stop_flag = Arc::clone(&stop_flag);
            let tick_rate_hz = config.tick_rate_hz;
            std::thread::spawn(move || {
                maintenance::run(effects, slots, device, stop_flag, tick_rate_hz);
            })
        };

        info!("mixing engine started");
        Ok(Self {
            device,
            catalog,
            effects,
            slots,
            stop_flag,
            maintenance: Some(maintenance),
        })
    }

    /// Current listener gain
    pub fn volume(&self) -> Result<f32> {
        let gain = self.device.listener_gain();
        device::check(self.device.as_ref(), "volume query")?;
        Ok(gain)
    }

    /// Set listener gain; values outside [0.0, 1.0] are rejected and the
    /// prior gain is left unchanged
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::VolumeOutOfRange(volume));
        }
        self.device.set_listener_gain(volume);
        device::check(self.device.as_ref(), "set volume")
    }

    /// Fire a one-shot effect by name
    ///
    /// Allocates a fresh voice and buffer, uploads the whole payload, and
    /// starts playback immediately. The pair is reclaimed by the
    /// maintenance loop once the device reports the voice stopped.
    pub fn trigger(&self, name: &str) -> Result<()> {
        let asset = self.catalog.effect(name)?;

        let voice = self.device.create_voice();
        let buffer = self.device.create_buffer();
        self.device
            .upload(buffer, asset.format, &asset.data, asset.sample_rate);
        self.device.queue_buffers(voice, &[buffer]);
        self.device.play(voice);

        if let Err(e) = device::check(self.device.as_ref(), "one-shot trigger") {
            // Device refused the voice; give both handles back
            self.device.destroy_voice(voice);
            self.device.destroy_buffer(buffer);
            self.device.drain_faults();
            return Err(e);
        }

        self.effects
            .lock()
            .unwrap()
            .push(ActiveEffect { voice, buffer });
        Ok(())
    }

    /// Pause every live one-shot voice
    pub fn pause_all_effects(&self) -> Result<()> {
        let set = self.effects.lock().unwrap();
        for effect in set.iter() {
            self.device.pause(effect.voice);
        }
        device::check(self.device.as_ref(), "pause all one-shots")
    }

    /// Resume every live one-shot voice
    pub fn resume_all_effects(&self) -> Result<()> {
        let set = self.effects.lock().unwrap();
        for effect in set.iter() {
            self.device.play(effect.voice);
        }
        device::check(self.device.as_ref(), "resume all one-shots")
    }

    /// Stop every live one-shot voice; reclamation happens later in the
    /// maintenance loop, never here
    pub fn stop_all_effects(&self) -> Result<()> {
        let set = self.effects.lock().unwrap();
        for effect in set.iter() {
            self.device.stop(effect.voice);
        }
        device::check(self.device.as_ref(), "stop all one-shots")
    }

    /// Number of one-shot voices not yet reclaimed
    pub fn active_effects(&self) -> usize {
        self.effects.lock().unwrap().len()
    }

    /// Bind a track to a streaming slot and prime its queue
    ///
    /// Replaces whatever was bound before. The slot is left stopped with a
    /// primed queue; playback starts with an explicit [`play`](Engine::play).
    pub fn bind(&self, index: usize, track_name: &str) -> Result<()> {
        if index >= STREAM_SLOTS {
            return Err(Error::SlotOutOfRange(index));
        }
        let asset = self.catalog.track(track_name)?.clone();
        let file = File::open(self.catalog.track_path(track_name))?;

        self.with_slot(index, |slot, device| {
            slot.track = Some(BoundTrack {
                name: track_name.to_string(),
                asset,
                file,
                cursor: 0,
            });
            slot.refill_queue(device)
        })
    }

    /// Detach a slot from its track, clearing the queue
    ///
    /// The slot's voice and buffer handles survive for reuse. Unbinding an
    /// unbound slot is a no-op.
    pub fn unbind(&self, index: usize) -> Result<()> {
        self.with_slot(index, |slot, device| {
            device.stop(slot.voice);
            device.detach_buffers(slot.voice);
            slot.track = None;
            device::check(device, "stream unbind")
        })
    }

    /// Start or resume a bound slot
    pub fn play(&self, index: usize) -> Result<()> {
        self.with_slot(index, |slot, device| {
            if slot.track.is_none() {
                return Err(Error::SlotNotBound(index));
            }
            device.play(slot.voice);
            device::check(device, "stream play")
        })
    }

    /// Pause a bound slot
    pub fn pause(&self, index: usize) -> Result<()> {
        self.with_slot(index, |slot, device| {
            if slot.track.is_none() {
                return Err(Error::SlotNotBound(index));
            }
            device.pause(slot.voice);
            device::check(device, "stream pause")
        })
    }

    /// Whether the slot's voice is currently in the playing state
    pub fn is_playing(&self, index: usize) -> Result<bool> {
        self.with_slot(index, |slot, device| {
            let playing = device.voice_state(slot.voice) == VoiceState::Playing;
            device::check(device, "stream state query")?;
            Ok(playing)
        })
    }

    /// Seek a bound slot to a time offset in seconds
    ///
    /// The time is clamped to [0, duration] and mapped to a frame-aligned
    /// byte cursor; the queue is rebuilt at the new cursor, discarding any
    /// buffered-but-unplayed audio. Playback is not restarted.
    pub fn seek(&self, index: usize, time_seconds: f32) -> Result<()> {
        self.with_slot(index, |slot, device| {
            let Some(track) = slot.track.as_mut() else {
                return Err(Error::SlotNotBound(index));
            };
            track.cursor = stream::seek_cursor(
                time_seconds,
                track.asset.duration,
                track.asset.data_len,
                track.asset.format.frame_size(),
            );
            slot.refill_queue(device)
        })
    }

    /// Duration of a cataloged track in seconds
    pub fn track_duration(&self, track_name: &str) -> Result<f32> {
        Ok(self.catalog.track(track_name)?.duration)
    }

    /// Byte cursor of the slot's decode position, None when unbound
    pub fn decode_position(&self, index: usize) -> Result<Option<u64>> {
        self.with_slot(index, |slot, _| Ok(slot.track.as_ref().map(|t| t.cursor)))
    }

    /// Stop the maintenance thread and release every device handle
    ///
    /// The thread is joined before any handle is touched, so no residual
    /// device call can race the release sequence.
    pub fn shutdown(mut self) -> Result<()> {
        self.teardown()
    }

    fn with_slot<T>(
        &self,
        index: usize,
        f: impl FnOnce(&mut StreamSlot, &dyn AudioDevice) -> Result<T>,
    ) -> Result<T> {
        if index >= STREAM_SLOTS {
            return Err(Error::SlotOutOfRange(index));
        }
        let mut slots = self.slots.lock().unwrap();
        f(&mut slots[index], self.device.as_ref())
    }

    fn teardown(&mut self) -> Result<()> {
        let Some(handle) = self.maintenance.take() else {
            return Ok(());
        };

        info!("stopping mixing engine");
        self.stop_flag.store(true, Ordering::Relaxed);
        if handle.join().is_err() {
            warn!("maintenance thread panicked before shutdown");
        }

        {
            let mut set = self.effects.lock().unwrap();
            for effect in set.drain(..) {
                self.device.stop(effect.voice);
                self.device.destroy_voice(effect.voice);
                self.device.destroy_buffer(effect.buffer);
            }
        }

        {
            let mut slots = self.slots.lock().unwrap();
            for slot in slots.iter_mut() {
                self.device.stop(slot.voice);
                self.device.detach_buffers(slot.voice);
                self.device.destroy_voice(slot.voice);
                for buffer in slot.buffers {
                    self.device.destroy_buffer(buffer);
                }
                slot.track = None;
            }
        }

        device::check(self.device.as_ref(), "engine shutdown")?;
        info!("mixing engine stopped");
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.maintenance.is_some() {
            if let Err(e) = self.teardown() {
                warn!(error = %e, "engine teardown reported device faults");
            }
        }
    }
}
