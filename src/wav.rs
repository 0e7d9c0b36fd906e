//! RIFF/WAVE container parsing
//!
//! Reads just enough of a WAV header to drive playback: the PCM layout tag,
//! the sample rate, and the byte range of the sample data within the file.
//! Sample bytes themselves are never touched here; one-shot loading and
//! stream refills read them separately through the returned offsets.
//!
//! Only uncompressed PCM in mono/stereo at 8 or 16 bits per sample is
//! accepted. Anything else is a hard failure, never a partial result.

use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// PCM layout of a WAV file, combining channel count and bit depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Mono8,
    Mono16,
    Stereo8,
    Stereo16,
}

impl SampleFormat {
    /// Map a (channels, bits-per-sample) pair from the fmt chunk
    pub fn from_layout(channels: u16, bits_per_sample: u16) -> Result<Self> {
        match (channels, bits_per_sample) {
            (1, 8) => Ok(SampleFormat::Mono8),
            (1, 16) => Ok(SampleFormat::Mono16),
            (2, 8) => Ok(SampleFormat::Stereo8),
            (2, 16) => Ok(SampleFormat::Stereo16),
            _ => Err(Error::UnsupportedFormat(format!(
                "{} channel(s) at {} bits per sample",
                channels, bits_per_sample
            ))),
        }
    }

    pub fn channels(self) -> u16 {
        match self {
            SampleFormat::Mono8 | SampleFormat::Mono16 => 1,
            SampleFormat::Stereo8 | SampleFormat::Stereo16 => 2,
        }
    }

    pub fn bytes_per_sample(self) -> u16 {
        match self {
            SampleFormat::Mono8 | SampleFormat::Stereo8 => 1,
            SampleFormat::Mono16 | SampleFormat::Stereo16 => 2,
        }
    }

    /// Bytes spanned by one frame (all channels at one sample instant)
    pub fn frame_size(self) -> u64 {
        u64::from(self.channels()) * u64::from(self.bytes_per_sample())
    }
}

/// Parsed WAV header: everything needed to play the file, minus the samples
#[derive(Debug, Clone, Copy)]
pub struct WavInfo {
    /// Samples per second
    pub sample_rate: u32,

    /// PCM layout tag
    pub format: SampleFormat,

    /// Byte offset of the first sample byte within the stream
    pub data_start: u64,

    /// Byte length of the sample data region
    pub data_len: u64,

    /// Track length in seconds, derived from data_len / frame rate
    pub duration: f32,
}

/// Parse a WAV header from the start of `reader`
///
/// Walks the RIFF chunk list until the data chunk is found. The fmt chunk
/// must appear before the data chunk; unknown chunks (LIST and friends) are
/// skipped by their declared size.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<WavInfo> {
    let mut tag = [0u8; 4];
    read_bytes(reader, &mut tag, "RIFF tag")?;
    if &tag != b"RIFF" {
        return Err(Error::MalformedContainer("missing RIFF signature".into()));
    }

    read_bytes(reader, &mut tag, "RIFF size")?; // overall size, unused

    read_bytes(reader, &mut tag, "WAVE tag")?;
    if &tag != b"WAVE" {
        return Err(Error::MalformedContainer("missing WAVE signature".into()));
    }

    let mut layout: Option<(SampleFormat, u32)> = None;

    loop {
        let mut chunk_id = [0u8; 4];
        match reader.read_exact(&mut chunk_id) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(Error::MalformedContainer(
                    "end of stream before data chunk".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
        let chunk_len = read_u32(reader, "chunk size")?;

        match &chunk_id {
            b"fmt " => {
                if chunk_len < 16 {
                    return Err(Error::MalformedContainer("fmt chunk too short".into()));
                }
                let codec = read_u16(reader, "codec tag")?;
                if codec != 1 {
                    return Err(Error::UnsupportedFormat(format!(
                        "codec tag {} (only uncompressed PCM)",
                        codec
                    )));
                }
                let channels = read_u16(reader, "channel count")?;
                let sample_rate = read_u32(reader, "sample rate")?;
                let _byte_rate = read_u32(reader, "byte rate")?;
                let _block_align = read_u16(reader, "block align")?;
                let bits_per_sample = read_u16(reader, "bits per sample")?;
                if sample_rate == 0 {
                    return Err(Error::MalformedContainer("sample rate is zero".into()));
                }

                let format = SampleFormat::from_layout(channels, bits_per_sample)?;
                layout = Some((format, sample_rate));

                // Skip extension bytes some encoders append to fmt
                if chunk_len > 16 {
                    reader.seek(SeekFrom::Current(i64::from(chunk_len - 16)))?;
                }
            }
            b"data" => {
                let (format, sample_rate) = layout.ok_or_else(|| {
                    Error::MalformedContainer("data chunk before fmt chunk".into())
                })?;
                let data_start = reader.stream_position()?;
                let data_len = u64::from(chunk_len);
                let frames = data_len / format.frame_size();
                let duration = frames as f32 / sample_rate as f32;
                return Ok(WavInfo {
                    sample_rate,
                    format,
                    data_start,
                    data_len,
                    duration,
                });
            }
            _ => {
                reader.seek(SeekFrom::Current(i64::from(chunk_len)))?;
            }
        }
    }
}

fn read_bytes<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::MalformedContainer(format!("end of stream reading {}", what))
        } else {
            e.into()
        }
    })
}

fn read_u16<R: Read>(reader: &mut R, what: &str) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_bytes(reader, &mut buf, what)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_bytes(reader, &mut buf, what)?;
    Ok(u32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Build a minimal WAV byte stream by hand
    fn wav_bytes(channels: u16, bits: u16, rate: u32, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        let block_align = channels * (bits / 8);
        out.extend_from_slice(&(rate * u32::from(block_align)).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn parses_stereo16_header() {
        let data = vec![0u8; 220500];
        let bytes = wav_bytes(2, 16, 22050, &data);
        let info = read_header(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(info.format, SampleFormat::Stereo16);
        assert_eq!(info.sample_rate, 22050);
        assert_eq!(info.data_start, 44);
        assert_eq!(info.data_len, 220500);
        // 220500 bytes / 4 bytes per frame / 22050 Hz = 2.5s
        assert!((info.duration - 2.5).abs() < 1e-4);
    }

    #[test]
    fn skips_unknown_chunks() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        // LIST chunk before fmt
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&6u32.to_le_bytes());
        bytes.extend_from_slice(b"INFOxx");
        let rest = wav_bytes(1, 8, 8000, &[1, 2, 3, 4]);
        bytes.extend_from_slice(&rest[12..]); // chunks only

        let info = read_header(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(info.format, SampleFormat::Mono8);
        assert_eq!(info.data_len, 4);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = read_header(&mut Cursor::new(b"RIFX\0\0\0\0WAVE".to_vec())).unwrap_err();
        assert!(matches!(err, Error::MalformedContainer(_)));
    }

    #[test]
    fn rejects_unsupported_bit_depth() {
        let bytes = wav_bytes(2, 24, 44100, &[0u8; 12]);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_missing_data_chunk() {
        let bytes = wav_bytes(1, 16, 44100, &[]);
        let truncated = bytes[..bytes.len() - 8].to_vec(); // drop the data chunk
        let err = read_header(&mut Cursor::new(truncated)).unwrap_err();
        assert!(matches!(err, Error::MalformedContainer(_)));
    }

    #[test]
    fn hound_output_round_trips() {
        // Cross-check against the encoder used by the integration tests
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..1000i16 {
                writer.write_sample(i).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);

        let info = read_header(&mut cursor).unwrap();
        assert_eq!(info.format, SampleFormat::Mono16);
        assert_eq!(info.data_len, 2000);
    }

    #[test]
    fn frame_sizes() {
        assert_eq!(SampleFormat::Mono8.frame_size(), 1);
        assert_eq!(SampleFormat::Mono16.frame_size(), 2);
        assert_eq!(SampleFormat::Stereo8.frame_size(), 2);
        assert_eq!(SampleFormat::Stereo16.frame_size(), 4);
    }
}
