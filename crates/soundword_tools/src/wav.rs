#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use soundword_os::collaborators::{AudioPlayback, ClipId};
use soundword_os::ExecutionError;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum WavError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: not a RIFF/WAVE file")]
    NotWave { path: PathBuf },
    #[error("{path}: missing `{chunk}` chunk")]
    MissingChunk { path: PathBuf, chunk: &'static str },
    #[error("{path}: byte rate is zero")]
    ZeroByteRate { path: PathBuf },
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(<[u8; 4]>::try_from(raw).ok()?))
}

/// Playback length of a PCM WAV file, from the `fmt ` byte rate and the `data` chunk size.
pub fn wav_duration(path: &Path, bytes: &[u8]) -> Result<Duration, WavError> {
    if bytes.get(0..4) != Some(b"RIFF".as_slice()) || bytes.get(8..12) != Some(b"WAVE".as_slice())
    {
        return Err(WavError::NotWave {
            path: path.to_path_buf(),
        });
    }

    let mut byte_rate = None;
    let mut data_len = None;
    let mut pos = 12usize;
    while byte_rate.is_none() || data_len.is_none() {
        let (Some(id), Some(len)) = (bytes.get(pos..pos.saturating_add(4)), le_u32(bytes, pos + 4))
        else {
            break;
        };
        let body = pos + 8;
        match id {
            b"fmt " => byte_rate = le_u32(bytes, body + 8),
            b"data" => data_len = Some(len),
            _ => {}
        }
        // Chunks are word aligned.
        pos = body.saturating_add(len as usize + (len as usize & 1));
    }

    let byte_rate = byte_rate.ok_or_else(|| WavError::MissingChunk {
        path: path.to_path_buf(),
        chunk: "fmt ",
    })?;
    let data_len = data_len.ok_or_else(|| WavError::MissingChunk {
        path: path.to_path_buf(),
        chunk: "data",
    })?;
    if byte_rate == 0 {
        return Err(WavError::ZeroByteRate {
            path: path.to_path_buf(),
        });
    }
    let nanos = u128::from(data_len) * 1_000_000_000 / u128::from(byte_rate);
    Ok(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
}

/// Clip lengths keyed by file name (`glass-1.wav`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundIndex {
    clips: BTreeMap<String, Duration>,
}

impl SoundIndex {
    /// Indexes every `*.wav` directly under `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, WavError> {
        let io_err = |source| WavError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut clips = BTreeMap::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_wav = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_wav || !path.is_file() {
                continue;
            }
            let bytes = fs::read(&path).map_err(|source| WavError::Io {
                path: path.clone(),
                source,
            })?;
            clips.insert(name.to_string(), wav_duration(&path, &bytes)?);
        }
        info!(dir = %dir.display(), clips = clips.len(), "sound index loaded");
        Ok(Self { clips })
    }

    /// Adds `other`'s clips; on a name clash `other` wins.
    pub fn merge(&mut self, other: SoundIndex) {
        self.clips.extend(other.clips);
    }

    pub fn duration(&self, name: &str) -> Option<Duration> {
        self.clips.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Names from `wanted` that are not indexed, sorted and deduplicated.
    pub fn missing<'a>(&self, wanted: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut out: Vec<String> = wanted
            .into_iter()
            .filter(|n| !self.clips.contains_key(*n))
            .map(str::to_string)
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

/// Playback that reports indexed lengths without driving an output device.
#[derive(Debug, Clone)]
pub struct IndexedPlayback {
    index: SoundIndex,
}

impl IndexedPlayback {
    pub fn new(index: SoundIndex) -> Self {
        Self { index }
    }
}

impl AudioPlayback for IndexedPlayback {
    fn play(&mut self, clip: &ClipId) -> Result<Duration, ExecutionError> {
        let length = self
            .index
            .duration(clip.as_str())
            .ok_or_else(|| ExecutionError::Audio(format!("no clip named {clip}")))?;
        debug!(clip = clip.as_str(), length_ms = length.as_millis() as u64, "play");
        Ok(length)
    }
}
