//! One-shot effect voices
//!
//! Each triggered effect owns a freshly created voice and a single buffer
//! holding the whole payload. Entries live in a growing set guarded by one
//! lock; the maintenance loop is the only place they are released, so
//! transport commands issued from other threads can never race a free.

use crate::device::{AudioDevice, BufferId, VoiceId, VoiceState};
use tracing::{debug, warn};

/// Live one-shot entry: a voice and its single uploaded buffer
pub(crate) struct ActiveEffect {
    pub voice: VoiceId,
    pub buffer: BufferId,
}

/// Release every effect whose voice the device reports as stopped
///
/// Runs under the effects lock from the maintenance thread. A device fault
/// while handling one entry is logged and confined to that entry.
pub(crate) fn reclaim_finished(set: &mut Vec<ActiveEffect>, device: &dyn AudioDevice) {
    set.retain(|effect| {
        if device.voice_state(effect.voice) != VoiceState::Stopped {
            return true;
        }

        device.destroy_voice(effect.voice);
        device.destroy_buffer(effect.buffer);

        let faults = device.drain_faults();
        if faults.is_empty() {
            debug!(voice = effect.voice.0, "reclaimed finished one-shot voice");
        } else {
            warn!(
                voice = effect.voice.0,
                ?faults,
                "device fault while reclaiming one-shot voice"
            );
        }
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::sim::SimDevice;

    fn spawn_effect(device: &SimDevice) -> ActiveEffect {
        let voice = device.create_voice();
        let buffer = device.create_buffer();
        device.queue_buffers(voice, &[buffer]);
        device.play(voice);
        ActiveEffect { voice, buffer }
    }

    #[test]
    fn keeps_live_voices() {
        let device = SimDevice::new();
        let mut set = vec![spawn_effect(&device), spawn_effect(&device)];

        reclaim_finished(&mut set, &device);
        assert_eq!(set.len(), 2);
        assert_eq!(device.voice_count(), 2);
    }

    #[test]
    fn releases_stopped_voices() {
        let device = SimDevice::new();
        let mut set = vec![spawn_effect(&device), spawn_effect(&device)];
        device.finish_voice(set[0].voice);

        reclaim_finished(&mut set, &device);
        assert_eq!(set.len(), 1);
        assert_eq!(device.voice_count(), 1);
        assert_eq!(device.buffer_count(), 1);
    }
}
