//! Audio device facade
//!
//! The engine never talks to audio hardware directly. Everything it needs
//! from a backend is captured by the [`AudioDevice`] trait: voices that
//! consume queued PCM buffers, transport control, playback-state queries,
//! and a pollable fault accumulator in place of per-call error returns.
//!
//! Backends report problems by pushing [`DeviceFault`]s that accumulate
//! until drained. The engine drains after every interaction and converts a
//! non-empty drain into [`Error::Device`](crate::Error::Device), aborting
//! the enclosing operation.

pub mod sim;

use crate::error::{Error, Result};
use crate::wav::SampleFormat;

/// Opaque handle to a hardware playback unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u32);

/// Opaque handle to a device-side sample buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Playback state of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Created, never played
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Fault flag reported by the device, accumulated until drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFault {
    /// Operation referenced a handle the device does not know
    InvalidHandle,
    /// Argument outside the device's accepted range
    InvalidValue,
    /// Operation not valid in the voice's current state
    InvalidOperation,
    /// Device ran out of voices, buffers, or memory
    OutOfMemory,
}

impl std::fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceFault::InvalidHandle => "invalid handle",
            DeviceFault::InvalidValue => "invalid value",
            DeviceFault::InvalidOperation => "invalid operation",
            DeviceFault::OutOfMemory => "out of memory",
        };
        f.write_str(name)
    }
}

/// Capability contract for an audio backend
///
/// Calls do not return errors directly; failures surface through
/// [`drain_faults`](AudioDevice::drain_faults), which yields and clears
/// every fault recorded since the previous drain.
pub trait AudioDevice: Send + Sync {
    /// Current listener gain
    fn listener_gain(&self) -> f32;

    /// Set listener gain; range validation is the caller's job
    fn set_listener_gain(&self, gain: f32);

    fn create_voice(&self) -> VoiceId;
    fn destroy_voice(&self, voice: VoiceId);

    fn create_buffer(&self) -> BufferId;
    fn destroy_buffer(&self, buffer: BufferId);

    /// Upload raw PCM bytes into a buffer, replacing prior contents
    fn upload(&self, buffer: BufferId, format: SampleFormat, data: &[u8], sample_rate: u32);

    fn play(&self, voice: VoiceId);
    fn pause(&self, voice: VoiceId);
    fn stop(&self, voice: VoiceId);

    fn voice_state(&self, voice: VoiceId) -> VoiceState;

    /// Append buffers to the voice's playback queue
    fn queue_buffers(&self, voice: VoiceId, buffers: &[BufferId]);

    /// Remove and return the oldest consumed buffer, if any
    fn unqueue_buffer(&self, voice: VoiceId) -> Option<BufferId>;

    /// Drop every queued buffer from the voice
    fn detach_buffers(&self, voice: VoiceId);

    /// Number of queued buffers the device has finished consuming
    fn processed_buffers(&self, voice: VoiceId) -> usize;

    /// Return and clear all faults recorded since the last drain
    fn drain_faults(&self) -> Vec<DeviceFault>;
}

/// Drain accumulated faults and translate a non-empty set into an error
///
/// Called after every group of device interactions; the named operation is
/// the one being aborted.
pub(crate) fn check(device: &dyn AudioDevice, operation: &'static str) -> Result<()> {
    let faults = device.drain_faults();
    if faults.is_empty() {
        return Ok(());
    }
    let joined = faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(Error::Device {
        operation,
        faults: joined,
    })
}
