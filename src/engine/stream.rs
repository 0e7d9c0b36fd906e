//! Streaming player slots
//!
//! Each slot owns one voice and a fixed ring of four 64 KiB buffers that
//! cycle through the voice's queue. A bound track contributes the decode
//! state: an open file handle and a byte cursor into the track's data
//! region. The cursor is kept frame-aligned at all times so a refill can
//! never split a multi-byte sample across chunk boundaries.

use crate::catalog::StreamAsset;
use crate::device::{self, AudioDevice, BufferId, VoiceId, VoiceState};
use crate::error::Result;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace};

/// Number of concurrent music lines
pub(crate) const STREAM_SLOTS: usize = 4;

/// Buffers cycling through each slot's queue
pub(crate) const BUFFERS_PER_SLOT: usize = 4;

/// Bytes per stream buffer
pub(crate) const STREAM_BUFFER_CAPACITY: u64 = 64 * 1024;

/// Decode state for the track currently bound to a slot
pub(crate) struct BoundTrack {
    pub name: String,
    pub asset: StreamAsset,
    pub file: File,
    /// Byte offset into the data region; always frame-aligned, always
    /// within [0, data_len]. Equal to data_len once the stream is drained.
    pub cursor: u64,
}

impl BoundTrack {
    /// Read `len` bytes from the backing file at the current cursor
    fn read_chunk(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut chunk = vec![0u8; len as usize];
        self.file
            .seek(SeekFrom::Start(self.asset.data_start + self.cursor))?;
        self.file.read_exact(&mut chunk)?;
        Ok(chunk)
    }
}

/// One streaming player: a voice, its buffer ring, and an optional track
pub(crate) struct StreamSlot {
    pub voice: VoiceId,
    pub buffers: [BufferId; BUFFERS_PER_SLOT],
    pub track: Option<BoundTrack>,
}

impl StreamSlot {
    /// Rebuild the queue from the track's cursor (shared by bind and seek)
    ///
    /// Stops the voice, discards whatever was queued, then fills buffer
    /// slots in order until the ring is full or the track runs out. A short
    /// final chunk marks the stream exhausted. Playback is not restarted;
    /// that is always an explicit play call.
    pub(crate) fn refill_queue(&mut self, device: &dyn AudioDevice) -> Result<()> {
        let Some(track) = self.track.as_mut() else {
            return Ok(());
        };

        device.stop(self.voice);
        device.detach_buffers(self.voice);

        let frame = track.asset.format.frame_size();
        let mut filled = 0;
        while filled < BUFFERS_PER_SLOT {
            let chunk_len = chunk_len(track.asset.data_len - track.cursor, frame);
            if chunk_len == 0 {
                // Nothing playable left (at most a partial trailing frame)
                track.cursor = track.asset.data_len;
                break;
            }

            let chunk = track.read_chunk(chunk_len)?;
            device.upload(
                self.buffers[filled],
                track.asset.format,
                &chunk,
                track.asset.sample_rate,
            );
            filled += 1;

            track.cursor += chunk_len;
            if chunk_len < STREAM_BUFFER_CAPACITY {
                track.cursor = track.asset.data_len;
                break;
            }
        }

        device.queue_buffers(self.voice, &self.buffers[..filled]);
        device::check(device, "stream queue refill")?;

        debug!(
            track = %track.name,
            filled,
            cursor = track.cursor,
            "stream queue refilled"
        );
        Ok(())
    }

    /// Maintenance step: recycle consumed buffers back into the queue
    ///
    /// Only acts on a playing voice. Each consumed buffer is detached and,
    /// unless the track is exhausted, refilled from the cursor and queued
    /// again. Exhausted tracks let the queue drain naturally.
    pub(crate) fn service(&mut self, device: &dyn AudioDevice) -> Result<()> {
        let Some(track) = self.track.as_mut() else {
            return Ok(());
        };
        if device.voice_state(self.voice) != VoiceState::Playing {
            return Ok(());
        }

        let frame = track.asset.format.frame_size();
        let processed = device.processed_buffers(self.voice);
        for _ in 0..processed {
            let Some(buffer) = device.unqueue_buffer(self.voice) else {
                break;
            };
            if track.cursor >= track.asset.data_len {
                continue;
            }

            let chunk_len = chunk_len(track.asset.data_len - track.cursor, frame);
            if chunk_len == 0 {
                track.cursor = track.asset.data_len;
                continue;
            }

            let chunk = track.read_chunk(chunk_len)?;
            device.upload(buffer, track.asset.format, &chunk, track.asset.sample_rate);
            device.queue_buffers(self.voice, &[buffer]);

            track.cursor += chunk_len;
            if chunk_len < STREAM_BUFFER_CAPACITY {
                track.cursor = track.asset.data_len;
            }
            trace!(track = %track.name, cursor = track.cursor, "stream buffer recycled");
        }

        device::check(device, "stream service")
    }
}

/// Next chunk length: full capacity when available, truncated to a frame
/// multiple so no sample is split across chunks
pub(crate) fn chunk_len(remaining: u64, frame: u64) -> u64 {
    let len = STREAM_BUFFER_CAPACITY.min(remaining);
    len - len % frame
}

/// Map a seek time to a frame-aligned byte cursor in [0, data_len]
pub(crate) fn seek_cursor(time: f32, duration: f32, data_len: u64, frame: u64) -> u64 {
    if time <= 0.0 {
        return 0;
    }
    if time >= duration {
        return data_len;
    }
    let cursor = (f64::from(time) / f64::from(duration) * data_len as f64) as u64;
    cursor - cursor % frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_boundaries() {
        assert_eq!(seek_cursor(0.0, 5.0, 220500, 4), 0);
        assert_eq!(seek_cursor(-1.0, 5.0, 220500, 4), 0);
        assert_eq!(seek_cursor(5.0, 5.0, 220500, 4), 220500);
        assert_eq!(seek_cursor(99.0, 5.0, 220500, 4), 220500);
    }

    #[test]
    fn seek_midpoint_is_frame_aligned() {
        // 5.0s stereo 16-bit track: midpoint lands at 110250, rounded down
        // to the 4-byte frame boundary
        let cursor = seek_cursor(2.5, 5.0, 220500, 4);
        assert_eq!(cursor, 110248);
        assert_eq!(cursor % 4, 0);
    }

    #[test]
    fn seek_stays_within_bounds_and_aligned() {
        let data_len = 99998u64;
        for frame in [1u64, 2, 4] {
            for tenths in 0..=60 {
                let time = tenths as f32 * 0.1;
                let cursor = seek_cursor(time, 6.0, data_len, frame);
                assert!(cursor <= data_len);
                assert_eq!(cursor % frame, 0, "time={} frame={}", time, frame);
            }
        }
    }

    #[test]
    fn chunk_truncates_to_frame_multiple() {
        assert_eq!(chunk_len(STREAM_BUFFER_CAPACITY + 10, 4), STREAM_BUFFER_CAPACITY);
        assert_eq!(chunk_len(1001, 4), 1000);
        assert_eq!(chunk_len(1001, 2), 1000);
        assert_eq!(chunk_len(1001, 1), 1001);
        assert_eq!(chunk_len(3, 4), 0);
        assert_eq!(chunk_len(0, 4), 0);
    }
}
