use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;

/// Error types for building track entries from local files
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("Failed to open file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized audio format: {0}")]
    Probe(#[from] symphonia::core::errors::Error),

    #[error("File contains no audio track")]
    NoAudioTrack,
}

/// Where the playable media for a track lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// A remote stream URL, resolved by the host media runtime.
    Stream(String),
    /// A locally imported file.
    Local(PathBuf),
}

/// A single playlist entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    /// Duration in seconds. Zero when unknown.
    pub duration: f32,
    pub source: TrackSource,
}

impl Track {
    /// Builds a track entry from a locally selected audio file.
    ///
    /// The file is probed with symphonia for its duration; decoding and
    /// playback stay with the host media runtime. The entry gets a fresh
    /// ephemeral id, so re-importing the same file yields a distinct track.
    pub fn from_local_file(path: &Path) -> Result<Track, TrackError> {
        let file = File::open(path)?;
        let stream = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe().format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let track = probed
            .format
            .default_track()
            .ok_or(TrackError::NoAudioTrack)?;

        let params = &track.codec_params;
        let duration = match (params.n_frames, params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => frames as f32 / rate as f32,
            _ => 0.0,
        };

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string();

        Ok(Track {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            artist: "LOCAL DATA".to_string(),
            genre: None,
            duration,
            source: TrackSource::Local(path.to_path_buf()),
        })
    }

    pub fn is_local(&self) -> bool {
        matches!(self.source, TrackSource::Local(_))
    }
}

/// The seeded demo playlist shown before any local import.
pub fn seed_playlist() -> Vec<Track> {
    vec![
        Track {
            id: "1".to_string(),
            title: "LUZ ROJA".to_string(),
            artist: "VIBE1 // ORIGINAL".to_string(),
            genre: Some("electronic".to_string()),
            duration: 372.0,
            source: TrackSource::Stream(
                "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3".to_string(),
            ),
        },
        Track {
            id: "2".to_string(),
            title: "RETROGRADE".to_string(),
            artist: "CLASSIC ECHO".to_string(),
            genre: Some("classic".to_string()),
            duration: 425.0,
            source: TrackSource::Stream(
                "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3".to_string(),
            ),
        },
        Track {
            id: "3".to_string(),
            title: "CYBERPULSE".to_string(),
            artist: "NEON DRIFT".to_string(),
            genre: Some("electronic".to_string()),
            duration: 298.0,
            source: TrackSource::Stream(
                "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-3.mp3".to_string(),
            ),
        },
    ]
}
