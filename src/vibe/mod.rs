use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::player::Track;

/// Placeholder shown when the lyrics call fails.
pub const LYRICS_FALLBACK: &str = "Voices lost in the crimson static...";

/// Error types for the annotator boundary. These never escape the boundary:
/// every failure resolves to fallback data.
#[derive(Debug, thiserror::Error)]
pub enum VibeError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Descriptive "vibe" metadata for a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibeAnalysis {
    pub mood: String,
    #[serde(rename = "colorPalette")]
    pub color_palette: Vec<String>,
    pub description: String,
    #[serde(rename = "energyLevel")]
    pub energy_level: u8,
}

impl VibeAnalysis {
    /// The fixed descriptor substituted on any annotator failure.
    pub fn fallback() -> VibeAnalysis {
        VibeAnalysis {
            mood: "Intense & Mysterious".to_string(),
            color_palette: vec![
                "#991B1B".to_string(),
                "#000000".to_string(),
                "#DC2626".to_string(),
            ],
            description: "A deep crimson sonic landscape that thrives in the shadows.".to_string(),
            energy_level: 8,
        }
    }

    /// Clamps the energy level into the valid 1..=10 range.
    pub fn clamped(mut self) -> VibeAnalysis {
        self.energy_level = self.energy_level.clamp(1, 10);
        self
    }

    /// Energy as a 0.1..=1.0 factor for animation scaling.
    pub fn energy_factor(&self) -> f32 {
        f32::from(self.energy_level) / 10.0
    }
}

/// Black-box text/JSON generation collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VibeSource: Send + Sync {
    async fn analyze(&self, track: &Track) -> Result<VibeAnalysis, VibeError>;
    async fn lyrics(&self, track: &Track) -> Result<String, VibeError>;
}

/// HTTP-backed annotator talking to a generative text endpoint.
pub struct HttpAnnotator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpAnnotator {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Builds an annotator from `PULSE_VIBE_URL` / `PULSE_VIBE_KEY`. Without
    /// credentials every request fails and callers fall back, so the player
    /// keeps working offline.
    pub fn from_env() -> Self {
        let endpoint = std::env::var("PULSE_VIBE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.example/v1/annotate".to_string());
        let api_key = std::env::var("PULSE_VIBE_KEY").unwrap_or_default();
        Self::new(endpoint, api_key)
    }
}

#[async_trait]
impl VibeSource for HttpAnnotator {
    async fn analyze(&self, track: &Track) -> Result<VibeAnalysis, VibeError> {
        let prompt = format!(
            "Analyze the vibe of this musical track: \"{}\" by \"{}\". \
             Provide a sensory description of the red-light atmosphere it evokes. \
             Respond with JSON fields mood, colorPalette, description, energyLevel (1-10).",
            track.title, track.artist
        );

        let body = serde_json::json!({
            "prompt": prompt,
            "response_format": "json",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let value: serde_json::Value = response.json().await?;
        let analysis: VibeAnalysis = serde_json::from_value(value)
            .map_err(|e| VibeError::Malformed(e.to_string()))?;

        if analysis.color_palette.is_empty() {
            return Err(VibeError::Malformed("empty color palette".to_string()));
        }

        Ok(analysis.clamped())
    }

    async fn lyrics(&self, track: &Track) -> Result<String, VibeError> {
        let prompt = format!(
            "Generate atmospheric, poetic lyrics for the song \"{}\" by \"{}\". \
             Mysterious, neon-noir, and intense. Approximately 12-16 lines. \
             Return only the lyrics as text with line breaks.",
            track.title, track.artist
        );

        let body = serde_json::json!({
            "prompt": prompt,
            "response_format": "text",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(VibeError::Malformed("empty lyrics response".to_string()));
        }
        Ok(text)
    }
}

/// Requests a vibe descriptor, substituting the fixed fallback on failure.
/// This call cannot fail.
pub async fn resolve_vibe(source: &dyn VibeSource, track: &Track) -> VibeAnalysis {
    match source.analyze(track).await {
        Ok(analysis) => analysis,
        Err(e) => {
            log::warn!("vibe analysis failed for '{}': {}", track.title, e);
            VibeAnalysis::fallback()
        }
    }
}

/// Requests lyrics, substituting the fixed placeholder on failure.
pub async fn resolve_lyrics(source: &dyn VibeSource, track: &Track) -> String {
    match source.lyrics(track).await {
        Ok(lyrics) => lyrics,
        Err(e) => {
            log::warn!("lyrics request failed for '{}': {}", track.title, e);
            LYRICS_FALLBACK.to_string()
        }
    }
}

/// Result of an asynchronous annotator request, tagged with the track it was
/// issued for so stale responses can be dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VibeUpdate {
    Mood { track_id: String, vibe: VibeAnalysis },
    Lyrics { track_id: String, text: String },
}

impl VibeUpdate {
    pub fn track_id(&self) -> &str {
        match self {
            VibeUpdate::Mood { track_id, .. } => track_id,
            VibeUpdate::Lyrics { track_id, .. } => track_id,
        }
    }
}

/// Owns the in-flight annotator requests.
///
/// Requests run as fire-and-forget tasks; a new mood request aborts the
/// previous one. Results arrive over the channel tagged by track id, and the
/// receiver applies them only when that track is still current, so an old
/// request can never overwrite a newer track's mood.
pub struct MoodTracker {
    source: Arc<dyn VibeSource>,
    updates: mpsc::Sender<VibeUpdate>,
    mood_task: Option<JoinHandle<()>>,
    lyrics_task: Option<JoinHandle<()>>,
}

impl MoodTracker {
    pub fn new(source: Arc<dyn VibeSource>, updates: mpsc::Sender<VibeUpdate>) -> Self {
        Self {
            source,
            updates,
            mood_task: None,
            lyrics_task: None,
        }
    }

    /// Kicks off a mood request for the given track, cancelling any request
    /// still in flight.
    pub fn request_mood(&mut self, track: &Track) {
        if let Some(task) = self.mood_task.take() {
            task.abort();
        }

        let source = Arc::clone(&self.source);
        let updates = self.updates.clone();
        let track = track.clone();

        self.mood_task = Some(tokio::spawn(async move {
            let vibe = resolve_vibe(source.as_ref(), &track).await;
            let _ = updates
                .send(VibeUpdate::Mood {
                    track_id: track.id.clone(),
                    vibe,
                })
                .await;
        }));
    }

    /// Kicks off a lyrics request for the given track.
    pub fn request_lyrics(&mut self, track: &Track) {
        if let Some(task) = self.lyrics_task.take() {
            task.abort();
        }

        let source = Arc::clone(&self.source);
        let updates = self.updates.clone();
        let track = track.clone();

        self.lyrics_task = Some(tokio::spawn(async move {
            let text = resolve_lyrics(source.as_ref(), &track).await;
            let _ = updates
                .send(VibeUpdate::Lyrics {
                    track_id: track.id.clone(),
                    text,
                })
                .await;
        }));
    }

    /// Aborts any in-flight requests.
    pub fn cancel(&mut self) {
        if let Some(task) = self.mood_task.take() {
            task.abort();
        }
        if let Some(task) = self.lyrics_task.take() {
            task.abort();
        }
    }
}

impl Drop for MoodTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::seed_playlist;
    use std::time::Duration;

    fn failing_source() -> MockVibeSource {
        let mut mock = MockVibeSource::new();
        mock.expect_analyze().returning(|_| {
            Err(VibeError::Malformed("simulated transport failure".to_string()))
        });
        mock.expect_lyrics().returning(|_| {
            Err(VibeError::Malformed("simulated transport failure".to_string()))
        });
        mock
    }

    #[tokio::test]
    async fn failure_yields_exact_fallback_descriptor() {
        let source = failing_source();
        let track = &seed_playlist()[0];

        let vibe = resolve_vibe(&source, track).await;
        assert_eq!(vibe, VibeAnalysis::fallback());
        assert_eq!(vibe.energy_level, 8);
        assert_eq!(vibe.color_palette.len(), 3);
    }

    #[tokio::test]
    async fn lyrics_failure_yields_placeholder() {
        let source = failing_source();
        let track = &seed_playlist()[0];

        let lyrics = resolve_lyrics(&source, track).await;
        assert_eq!(lyrics, LYRICS_FALLBACK);
    }

    #[tokio::test]
    async fn mood_tracker_tags_results_with_track_id() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut tracker = MoodTracker::new(Arc::new(failing_source()), tx);

        let playlist = seed_playlist();
        tracker.request_mood(&playlist[1]);

        let update = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for mood update")
            .expect("channel closed");

        assert_eq!(update.track_id(), "2");
        match update {
            VibeUpdate::Mood { vibe, .. } => assert_eq!(vibe, VibeAnalysis::fallback()),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    /// Answers slowly for track "1" and immediately for everything else.
    struct SlowForFirstTrack;

    #[async_trait]
    impl VibeSource for SlowForFirstTrack {
        async fn analyze(&self, track: &Track) -> Result<VibeAnalysis, VibeError> {
            if track.id == "1" {
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
            Ok(VibeAnalysis {
                mood: format!("mood-{}", track.id),
                color_palette: vec!["#000000".to_string()],
                description: "test".to_string(),
                energy_level: 5,
            })
        }

        async fn lyrics(&self, _track: &Track) -> Result<String, VibeError> {
            Ok("la la la".to_string())
        }
    }

    #[tokio::test]
    async fn new_request_supersedes_inflight_one() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut tracker = MoodTracker::new(Arc::new(SlowForFirstTrack), tx);

        let playlist = seed_playlist();
        tracker.request_mood(&playlist[0]);
        tracker.request_mood(&playlist[1]);

        let update = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for mood update")
            .expect("channel closed");
        assert_eq!(update.track_id(), "2");

        // The superseded request was aborted: nothing else arrives.
        let extra = tokio::time::timeout(Duration::from_millis(400), rx.recv()).await;
        assert!(extra.is_err(), "stale request still delivered a result");
    }

    #[test]
    fn energy_level_is_clamped() {
        let vibe = VibeAnalysis {
            mood: "x".to_string(),
            color_palette: vec!["#fff".to_string()],
            description: "x".to_string(),
            energy_level: 42,
        }
        .clamped();
        assert_eq!(vibe.energy_level, 10);
    }
}
