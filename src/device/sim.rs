//! Simulated audio device
//!
//! In-memory [`AudioDevice`] used by the test suite and by headless hosts.
//! It tracks the same bookkeeping a real backend would (voice states,
//! buffer queues, processed counts, fault accumulation) but produces no
//! sound; tests drive playback progress explicitly through
//! [`consume_queued`](SimDevice::consume_queued) and
//! [`finish_voice`](SimDevice::finish_voice).

use super::{AudioDevice, BufferId, DeviceFault, VoiceId, VoiceState};
use crate::wav::SampleFormat;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

struct SimVoice {
    state: VoiceState,
    queued: VecDeque<BufferId>,
    processed: VecDeque<BufferId>,
}

struct SimBuffer {
    len: usize,
}

#[derive(Default)]
struct Inner {
    gain: f32,
    next_id: u32,
    voices: HashMap<VoiceId, SimVoice>,
    buffers: HashMap<BufferId, SimBuffer>,
    faults: Vec<DeviceFault>,
}

/// Software stand-in for an audio backend
pub struct SimDevice {
    inner: Mutex<Inner>,
}

impl SimDevice {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                gain: 1.0,
                ..Inner::default()
            }),
        }
    }

    /// Mark a voice as finished, as if its audio ran out
    pub fn finish_voice(&self, voice: VoiceId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(v) = inner.voices.get_mut(&voice) {
            v.state = VoiceState::Stopped;
            let drained: Vec<_> = v.queued.drain(..).collect();
            v.processed.extend(drained);
        }
    }

    /// Simulate playback consuming up to `count` queued buffers
    pub fn consume_queued(&self, voice: VoiceId, count: usize) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(v) = inner.voices.get_mut(&voice) {
            for _ in 0..count {
                match v.queued.pop_front() {
                    Some(b) => v.processed.push_back(b),
                    None => break,
                }
            }
        }
    }

    /// Buffers currently queued (not yet consumed) on a voice
    pub fn queued_len(&self, voice: VoiceId) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.voices.get(&voice).map_or(0, |v| v.queued.len())
    }

    /// Number of live voices
    pub fn voice_count(&self) -> usize {
        self.inner.lock().unwrap().voices.len()
    }

    /// Live voice handles, ordered by creation
    pub fn voice_ids(&self) -> Vec<VoiceId> {
        let inner = self.inner.lock().unwrap();
        let mut ids: Vec<VoiceId> = inner.voices.keys().copied().collect();
        ids.sort_by_key(|v| v.0);
        ids
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> usize {
        self.inner.lock().unwrap().buffers.len()
    }

    /// Byte length last uploaded into a buffer
    pub fn buffer_len(&self, buffer: BufferId) -> Option<usize> {
        let inner = self.inner.lock().unwrap();
        inner.buffers.get(&buffer).map(|b| b.len)
    }
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn voice_mut(&mut self, voice: VoiceId) -> Option<&mut SimVoice> {
        if self.voices.contains_key(&voice) {
            self.voices.get_mut(&voice)
        } else {
            self.faults.push(DeviceFault::InvalidHandle);
            None
        }
    }
}

impl AudioDevice for SimDevice {
    fn listener_gain(&self) -> f32 {
        self.inner.lock().unwrap().gain
    }

    fn set_listener_gain(&self, gain: f32) {
        let mut inner = self.inner.lock().unwrap();
        if (0.0..=1.0).contains(&gain) {
            inner.gain = gain;
        } else {
            inner.faults.push(DeviceFault::InvalidValue);
        }
    }

    fn create_voice(&self) -> VoiceId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = VoiceId(inner.next_id);
        inner.voices.insert(
            id,
            SimVoice {
                state: VoiceState::Initial,
                queued: VecDeque::new(),
                processed: VecDeque::new(),
            },
        );
        id
    }

    fn destroy_voice(&self, voice: VoiceId) {
        let mut inner = self.inner.lock().unwrap();
        if inner.voices.remove(&voice).is_none() {
            inner.faults.push(DeviceFault::InvalidHandle);
        }
    }

    fn create_buffer(&self) -> BufferId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = BufferId(inner.next_id);
        inner.buffers.insert(id, SimBuffer { len: 0 });
        id
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        let mut inner = self.inner.lock().unwrap();
        if inner.buffers.remove(&buffer).is_none() {
            inner.faults.push(DeviceFault::InvalidHandle);
        }
    }

    fn upload(&self, buffer: BufferId, _format: SampleFormat, data: &[u8], _sample_rate: u32) {
        let mut inner = self.inner.lock().unwrap();
        match inner.buffers.get_mut(&buffer) {
            Some(b) => b.len = data.len(),
            None => inner.faults.push(DeviceFault::InvalidHandle),
        }
    }

    fn play(&self, voice: VoiceId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(v) = inner.voice_mut(voice) {
            v.state = VoiceState::Playing;
        }
    }

    fn pause(&self, voice: VoiceId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(v) = inner.voice_mut(voice) {
            v.state = VoiceState::Paused;
        }
    }

    fn stop(&self, voice: VoiceId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(v) = inner.voice_mut(voice) {
            v.state = VoiceState::Stopped;
            let drained: Vec<_> = v.queued.drain(..).collect();
            v.processed.extend(drained);
        }
    }

    fn voice_state(&self, voice: VoiceId) -> VoiceState {
        let mut inner = self.inner.lock().unwrap();
        match inner.voice_mut(voice) {
            Some(v) => v.state,
            None => VoiceState::Stopped,
        }
    }

    fn queue_buffers(&self, voice: VoiceId, buffers: &[BufferId]) {
        let mut inner = self.inner.lock().unwrap();
        for b in buffers {
            if !inner.buffers.contains_key(b) {
                inner.faults.push(DeviceFault::InvalidHandle);
                return;
            }
        }
        if let Some(v) = inner.voice_mut(voice) {
            v.queued.extend(buffers.iter().copied());
        }
    }

    fn unqueue_buffer(&self, voice: VoiceId) -> Option<BufferId> {
        let mut inner = self.inner.lock().unwrap();
        inner.voice_mut(voice).and_then(|v| v.processed.pop_front())
    }

    fn detach_buffers(&self, voice: VoiceId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(v) = inner.voice_mut(voice) {
            v.queued.clear();
            v.processed.clear();
        }
    }

    fn processed_buffers(&self, voice: VoiceId) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner.voice_mut(voice).map_or(0, |v| v.processed.len())
    }

    fn drain_faults(&self) -> Vec<DeviceFault> {
        std::mem::take(&mut self.inner.lock().unwrap().faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_lifecycle() {
        let device = SimDevice::new();
        let voice = device.create_voice();
        assert_eq!(device.voice_state(voice), VoiceState::Initial);

        device.play(voice);
        assert_eq!(device.voice_state(voice), VoiceState::Playing);

        device.pause(voice);
        assert_eq!(device.voice_state(voice), VoiceState::Paused);

        device.stop(voice);
        assert_eq!(device.voice_state(voice), VoiceState::Stopped);
        assert!(device.drain_faults().is_empty());
    }

    #[test]
    fn queue_and_consume() {
        let device = SimDevice::new();
        let voice = device.create_voice();
        let buffers = [device.create_buffer(), device.create_buffer()];
        device.queue_buffers(voice, &buffers);

        assert_eq!(device.queued_len(voice), 2);
        assert_eq!(device.processed_buffers(voice), 0);

        device.consume_queued(voice, 1);
        assert_eq!(device.queued_len(voice), 1);
        assert_eq!(device.processed_buffers(voice), 1);
        assert_eq!(device.unqueue_buffer(voice), Some(buffers[0]));
        assert_eq!(device.unqueue_buffer(voice), None);
    }

    #[test]
    fn faults_accumulate_until_drained() {
        let device = SimDevice::new();
        device.play(VoiceId(999));
        device.destroy_buffer(BufferId(999));

        let faults = device.drain_faults();
        assert_eq!(faults.len(), 2);
        assert!(device.drain_faults().is_empty());
    }

    #[test]
    fn out_of_range_gain_is_a_fault() {
        let device = SimDevice::new();
        device.set_listener_gain(1.5);
        assert_eq!(device.listener_gain(), 1.0);
        assert_eq!(device.drain_faults(), vec![DeviceFault::InvalidValue]);
    }
}
