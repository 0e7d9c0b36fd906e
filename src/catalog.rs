//! Asset catalog
//!
//! Scans the two asset directories at startup, parses every WAV header, and
//! indexes the results by file name. One-shot effects are small enough to
//! hold fully decoded in memory; music tracks keep only their header
//! metadata, and sample bytes are read from disk on demand during refills.
//!
//! The catalog is built fully or not at all: duplicate names, unrecognized
//! containers, and unsupported PCM layouts abort construction. After `load`
//! it is read-only for the life of the engine.

use crate::error::{Error, Result};
use crate::wav::{self, SampleFormat};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::info;

/// Platform housekeeping files ignored during directory scans
const SKIPPED_FILES: [&str; 2] = [".DS_Store", "Thumbs.db"];

/// One-shot effect: full raw PCM payload held in memory
#[derive(Debug)]
pub struct SoundAsset {
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub data: Vec<u8>,
}

/// Streamable track: header metadata only, bytes stay on disk
#[derive(Debug, Clone)]
pub struct StreamAsset {
    pub sample_rate: u32,
    pub format: SampleFormat,
    /// Byte offset of the sample data within the backing file
    pub data_start: u64,
    /// Byte length of the sample data region
    pub data_len: u64,
    /// Track length in seconds
    pub duration: f32,
}

/// Immutable index of every playable asset, keyed by file name
#[derive(Debug)]
pub struct Catalog {
    effects: HashMap<String, SoundAsset>,
    tracks: HashMap<String, StreamAsset>,
    music_dir: PathBuf,
}

impl Catalog {
    /// Scan both asset directories and build the catalog
    ///
    /// Fails on the first duplicate name, non-`.wav` file, malformed
    /// container, or unsupported PCM layout.
    pub fn load(effects_dir: &Path, music_dir: &Path) -> Result<Self> {
        let mut catalog = Self {
            effects: HashMap::new(),
            tracks: HashMap::new(),
            music_dir: music_dir.to_path_buf(),
        };

        for entry in std::fs::read_dir(effects_dir)? {
            let path = entry?.path();
            let Some(name) = scan_name(&path)? else {
                continue;
            };
            catalog.check_duplicate(&name)?;

            let mut file = File::open(&path)?;
            let info = wav::read_header(&mut file)?;

            let mut data = vec![0u8; info.data_len as usize];
            file.seek(SeekFrom::Start(info.data_start))?;
            file.read_exact(&mut data)?;

            catalog.effects.insert(
                name,
                SoundAsset {
                    sample_rate: info.sample_rate,
                    format: info.format,
                    data,
                },
            );
        }

        for entry in std::fs::read_dir(music_dir)? {
            let path = entry?.path();
            let Some(name) = scan_name(&path)? else {
                continue;
            };
            catalog.check_duplicate(&name)?;

            let mut file = File::open(&path)?;
            let info = wav::read_header(&mut file)?;

            catalog.tracks.insert(
                name,
                StreamAsset {
                    sample_rate: info.sample_rate,
                    format: info.format,
                    data_start: info.data_start,
                    data_len: info.data_len,
                    duration: info.duration,
                },
            );
        }

        info!(
            effects = catalog.effects.len(),
            tracks = catalog.tracks.len(),
            "asset catalog loaded"
        );
        Ok(catalog)
    }

    fn check_duplicate(&self, name: &str) -> Result<()> {
        if self.effects.contains_key(name) || self.tracks.contains_key(name) {
            return Err(Error::DuplicateAsset(name.to_string()));
        }
        Ok(())
    }

    /// Look up a one-shot effect; unknown names are a caller error
    pub fn effect(&self, name: &str) -> Result<&SoundAsset> {
        self.effects
            .get(name)
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))
    }

    /// Look up a streamable track; unknown names are a caller error
    pub fn track(&self, name: &str) -> Result<&StreamAsset> {
        self.tracks
            .get(name)
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))
    }

    /// Full path of a track's backing file
    pub fn track_path(&self, name: &str) -> PathBuf {
        self.music_dir.join(name)
    }
}

/// File name for a scan entry, or None when the entry should be skipped
fn scan_name(path: &Path) -> Result<Option<String>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_default();

    if SKIPPED_FILES.contains(&name.as_str()) {
        return Ok(None);
    }
    if !name.ends_with(".wav") {
        return Err(Error::UnsupportedFormat(format!(
            "{}: expected a .wav file",
            name
        )));
    }
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(dir: &Path, name: &str, channels: u16, frames: u32) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.join(name), spec).unwrap();
        for i in 0..frames * u32::from(channels) {
            writer.write_sample((i % 128) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn asset_dirs() -> (TempDir, PathBuf, PathBuf) {
        let root = TempDir::new().unwrap();
        let sfx = root.path().join("sfx");
        let music = root.path().join("music");
        std::fs::create_dir_all(&sfx).unwrap();
        std::fs::create_dir_all(&music).unwrap();
        (root, sfx, music)
    }

    #[test]
    fn loads_and_indexes_both_categories() {
        let (_root, sfx, music) = asset_dirs();
        write_wav(&sfx, "click.wav", 1, 100);
        write_wav(&music, "theme.wav", 2, 4000);

        let catalog = Catalog::load(&sfx, &music).unwrap();

        let effect = catalog.effect("click.wav").unwrap();
        assert_eq!(effect.format, SampleFormat::Mono16);
        assert_eq!(effect.data.len(), 200);

        let track = catalog.track("theme.wav").unwrap();
        assert_eq!(track.format, SampleFormat::Stereo16);
        assert_eq!(track.data_len, 16000);
        assert!((track.duration - 0.5).abs() < 1e-4);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let (_root, sfx, music) = asset_dirs();
        let catalog = Catalog::load(&sfx, &music).unwrap();

        assert!(matches!(
            catalog.effect("nope.wav"),
            Err(Error::AssetNotFound(_))
        ));
        assert!(matches!(
            catalog.track("nope.wav"),
            Err(Error::AssetNotFound(_))
        ));
    }

    #[test]
    fn duplicate_across_categories_fails() {
        let (_root, sfx, music) = asset_dirs();
        write_wav(&sfx, "same.wav", 1, 10);
        write_wav(&music, "same.wav", 2, 10);

        let err = Catalog::load(&sfx, &music).unwrap_err();
        assert!(matches!(err, Error::DuplicateAsset(name) if name == "same.wav"));
    }

    #[test]
    fn housekeeping_files_are_skipped() {
        let (_root, sfx, music) = asset_dirs();
        std::fs::write(sfx.join(".DS_Store"), b"junk").unwrap();
        write_wav(&sfx, "click.wav", 1, 10);

        let catalog = Catalog::load(&sfx, &music).unwrap();
        assert!(catalog.effect("click.wav").is_ok());
    }

    #[test]
    fn non_wav_extension_fails() {
        let (_root, sfx, music) = asset_dirs();
        std::fs::write(sfx.join("notes.txt"), b"not audio").unwrap();

        let err = Catalog::load(&sfx, &music).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn malformed_container_fails() {
        let (_root, sfx, music) = asset_dirs();
        std::fs::write(music.join("broken.wav"), b"RIFFxxxxJUNK").unwrap();

        let err = Catalog::load(&sfx, &music).unwrap_err();
        assert!(matches!(err, Error::MalformedContainer(_)));
    }
}
