pub mod config;

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;

use crate::player::{Player, Track, TrackSource};
use crate::room::{RoomKind, RoomManager};
use crate::vibe::{MoodTracker, VibeAnalysis, VibeSource, VibeUpdate};
use crate::visualizer::Theme;
pub use config::Config;

/// Theme color pair used when a couple room is joined.
const COUPLE_COLORS: (&str, &str) = ("#f472b6", "#831843");
/// Theme color pair used when a group room is joined.
const GROUP_COLORS: (&str, &str) = ("#22d3ee", "#083344");
/// Theme color pair used when the current track is a favorite.
const FAVORITE_COLORS: (&str, &str) = ("#dc2626", "#450a0a");

/// Main application struct that coordinates playback, rooms, theming, and the
/// mood annotator. Owned by the single-threaded event loop; background work
/// reports back over channels.
pub struct App {
    config: Config,
    pub player: Player,
    pub room: RoomManager,
    themes: Vec<Theme>,
    theme_index: usize,
    mood: MoodTracker,
    vibe: Option<VibeAnalysis>,
    lyrics: Option<String>,
    show_lyrics: bool,
}

impl App {
    pub fn new(
        config: Config,
        queue: Vec<Track>,
        source: Arc<dyn VibeSource>,
        vibe_updates: mpsc::Sender<VibeUpdate>,
        room_events: mpsc::Sender<crate::room::RoomEvent>,
    ) -> Self {
        let themes = Theme::builtin();
        let theme_index = themes
            .iter()
            .position(|t| t.id == config.theme)
            .unwrap_or(0);

        Self {
            config,
            player: Player::new(queue),
            room: RoomManager::new(room_events),
            themes,
            theme_index,
            mood: MoodTracker::new(source, vibe_updates),
            vibe: None,
            lyrics: None,
            show_lyrics: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn update_config(&mut self, config: Config) {
        if let Some(index) = self.themes.iter().position(|t| t.id == config.theme) {
            self.theme_index = index;
        }
        self.config = config;
    }

    /// Loads configuration from a file
    pub fn load_config<P: AsRef<Path>>(&mut self, path: P) -> Result<(), String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;

        let config =
            Config::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

        self.update_config(config);
        Ok(())
    }

    /// Saves configuration to a file
    pub fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let content = self.config.to_string();
        fs::write(path, content).map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    pub fn theme(&self) -> &Theme {
        &self.themes[self.theme_index]
    }

    /// Selects the next built-in theme and remembers it in the config.
    pub fn cycle_theme(&mut self) -> &Theme {
        self.theme_index = (self.theme_index + 1) % self.themes.len();
        self.config.theme = self.themes[self.theme_index].id.clone();
        self.theme()
    }

    /// The primary/secondary colors after room and favorite overrides.
    ///
    /// Precedence: joined couple room, joined group room, favorited current
    /// track, then the selected theme.
    pub fn effective_colors(&self) -> (String, String) {
        if self.room.is_joined() {
            match self.room.kind() {
                Some(RoomKind::Couple) => {
                    return (COUPLE_COLORS.0.to_string(), COUPLE_COLORS.1.to_string())
                }
                Some(RoomKind::Group) => {
                    return (GROUP_COLORS.0.to_string(), GROUP_COLORS.1.to_string())
                }
                None => {}
            }
        }
        if self.player.is_current_favorite() {
            return (
                FAVORITE_COLORS.0.to_string(),
                FAVORITE_COLORS.1.to_string(),
            );
        }
        let theme = self.theme();
        (theme.primary.clone(), theme.secondary.clone())
    }

    pub fn vibe(&self) -> Option<&VibeAnalysis> {
        self.vibe.as_ref()
    }

    pub fn lyrics(&self) -> Option<&str> {
        self.lyrics.as_deref()
    }

    pub fn show_lyrics(&self) -> bool {
        self.show_lyrics
    }

    fn current_track_id(&self) -> Option<String> {
        self.player.current_track().map(|t| t.id.clone())
    }

    /// Fires a mood request for the current track, dropping stale state.
    pub fn request_mood(&mut self) {
        let Some(track) = self.player.current_track().cloned() else {
            return;
        };
        self.vibe = None;
        self.lyrics = None;
        self.mood.request_mood(&track);
        if self.show_lyrics {
            self.mood.request_lyrics(&track);
        }
    }

    /// Applies an annotator result if it still belongs to the current track.
    /// Stale results for superseded tracks are dropped.
    pub fn apply_vibe_update(&mut self, update: VibeUpdate) -> bool {
        let current = self.current_track_id();
        if current.as_deref() != Some(update.track_id()) {
            log::debug!("dropping stale vibe update for track {}", update.track_id());
            return false;
        }
        match update {
            VibeUpdate::Mood { vibe, .. } => self.vibe = Some(vibe),
            VibeUpdate::Lyrics { text, .. } => self.lyrics = Some(text),
        }
        true
    }

    pub fn toggle_lyrics(&mut self) {
        self.show_lyrics = !self.show_lyrics;
        if self.show_lyrics && self.lyrics.is_none() {
            if let Some(track) = self.player.current_track().cloned() {
                self.mood.request_lyrics(&track);
            }
        }
    }

    /// Pauses the transport when playback lands on a local track whose file
    /// has gone missing since import. Logged, never surfaced as an error.
    fn check_playable(&mut self) {
        if !self.player.is_playing() {
            return;
        }
        let Some(track) = self.player.current_track() else {
            return;
        };
        if let TrackSource::Local(path) = &track.source {
            if !path.is_file() {
                log::warn!("cannot open {}: pausing playback", path.display());
                self.player.force_pause();
            }
        }
    }

    pub fn toggle_play(&mut self) {
        let playing = self.player.toggle_play();
        self.check_playable();
        self.room
            .broadcast_sync(if playing { "play" } else { "pause" });
    }

    pub fn next_track(&mut self, rng: &mut impl Rng) {
        self.player.next(rng);
        self.check_playable();
        self.room.broadcast_sync("skip-next");
        self.request_mood();
    }

    pub fn previous_track(&mut self, rng: &mut impl Rng) {
        self.player.previous(rng);
        self.check_playable();
        self.room.broadcast_sync("skip-prev");
        self.request_mood();
    }

    pub fn select_track(&mut self, id: &str) {
        if self.player.play_track(id) {
            self.check_playable();
            self.room.broadcast_sync("track-change");
            self.request_mood();
        }
    }

    /// Advances playback time; handles the natural end of a track.
    pub fn advance(&mut self, dt: f32, rng: &mut impl Rng) {
        if self.player.advance(dt) {
            let before = self.current_track_id();
            self.player.track_ended(rng);
            self.check_playable();
            if self.current_track_id() != before {
                self.request_mood();
            }
        }
    }

    pub fn toggle_favorite(&mut self) {
        self.player.toggle_favorite();
    }

    /// Flips the high-fidelity preference and reports the new state. The
    /// flag is advisory for the host media runtime.
    pub fn toggle_high_fi(&mut self) -> bool {
        self.config.high_fi = !self.config.high_fi;
        self.config.high_fi
    }

    /// Flips the loudness normalization preference and reports the new state.
    pub fn toggle_normalization(&mut self) -> bool {
        self.config.normalization = !self.config.normalization;
        self.config.normalization
    }

    /// Imports local audio files as tracks. Files that fail to probe are
    /// skipped with a warning; this never surfaces an error.
    pub fn import_local(&mut self, paths: &[std::path::PathBuf]) -> usize {
        let mut added = Vec::new();
        for path in paths {
            match Track::from_local_file(path) {
                Ok(track) => added.push(track),
                Err(e) => log::warn!("skipping {}: {}", path.display(), e),
            }
        }
        let count = added.len();
        self.player.add_tracks(added);
        count
    }

    pub fn join_room(&mut self, kind: RoomKind, code: &str) -> bool {
        self.room.begin_join(kind, code)
    }

    pub fn leave_room(&mut self) {
        self.room.leave();
    }
}
