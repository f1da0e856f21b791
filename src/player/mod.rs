pub mod track;

pub use track::{seed_playlist, Track, TrackError, TrackSource};

use std::collections::HashSet;

use rand::Rng;

/// What happens when playback reaches the end of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    None,
    All,
    One,
}

impl RepeatMode {
    /// Cycles none -> all -> one -> none.
    pub fn cycle(self) -> RepeatMode {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RepeatMode::None => "off",
            RepeatMode::All => "all",
            RepeatMode::One => "one",
        }
    }
}

/// Holds the playback state: queue, current track, transport flags, and the
/// elapsed position. Media decode/output is the host runtime's job; this
/// struct only issues transitions.
pub struct Player {
    queue: Vec<Track>,
    favorites: HashSet<String>,
    current_id: Option<String>,
    is_playing: bool,
    position: f32,
    shuffle: bool,
    repeat: RepeatMode,
}

impl Player {
    pub fn new(queue: Vec<Track>) -> Self {
        let current_id = queue.first().map(|t| t.id.clone());
        Self {
            queue,
            favorites: HashSet::new(),
            current_id,
            is_playing: false,
            position: 0.0,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }

    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn current_track(&self) -> Option<&Track> {
        let id = self.current_id.as_deref()?;
        self.queue.iter().find(|t| t.id == id)
    }

    fn current_index(&self) -> Option<usize> {
        let id = self.current_id.as_deref()?;
        self.queue.iter().position(|t| t.id == id)
    }

    /// Appends tracks to the queue. The current track is unaffected; if
    /// nothing was queued before, the first new track becomes current.
    pub fn add_tracks(&mut self, tracks: Vec<Track>) {
        self.queue.extend(tracks);
        if self.current_id.is_none() {
            self.current_id = self.queue.first().map(|t| t.id.clone());
        }
    }

    /// Toggles play/pause and reports the new state.
    pub fn toggle_play(&mut self) -> bool {
        self.is_playing = !self.is_playing && self.current_id.is_some();
        self.is_playing
    }

    /// Selects a track by id and starts playing it from the beginning.
    /// Unknown ids are ignored.
    pub fn play_track(&mut self, id: &str) -> bool {
        if self.queue.iter().any(|t| t.id == id) {
            self.current_id = Some(id.to_string());
            self.position = 0.0;
            self.is_playing = true;
            true
        } else {
            false
        }
    }

    /// Forces the transport into a paused state. Used when the host runtime
    /// reports an unplayable source.
    pub fn force_pause(&mut self) {
        self.is_playing = false;
    }

    /// Advances to the next track.
    ///
    /// Shuffle picks a uniformly random index different from the current one
    /// (when more than one track exists). Otherwise advance linearly; at the
    /// end, repeat-all wraps and repeat-off leaves the track in place and
    /// pauses.
    pub fn next(&mut self, rng: &mut impl Rng) {
        let Some(index) = self.current_index() else {
            return;
        };
        let len = self.queue.len();

        let target = if self.shuffle {
            if len > 1 {
                loop {
                    let candidate = rng.gen_range(0..len);
                    if candidate != index {
                        break candidate;
                    }
                }
            } else {
                index
            }
        } else if index + 1 >= len {
            match self.repeat {
                RepeatMode::All => 0,
                _ => {
                    self.is_playing = false;
                    return;
                }
            }
        } else {
            index + 1
        };

        self.current_id = Some(self.queue[target].id.clone());
        self.position = 0.0;
        self.is_playing = true;
    }

    /// Steps back to the previous track. Without repeat-all the first track
    /// clamps in place rather than wrapping.
    pub fn previous(&mut self, rng: &mut impl Rng) {
        let Some(index) = self.current_index() else {
            return;
        };
        let len = self.queue.len();

        let target = if self.shuffle {
            if len > 1 {
                loop {
                    let candidate = rng.gen_range(0..len);
                    if candidate != index {
                        break candidate;
                    }
                }
            } else {
                index
            }
        } else if index == 0 {
            match self.repeat {
                RepeatMode::All => len - 1,
                _ => 0,
            }
        } else {
            index - 1
        };

        self.current_id = Some(self.queue[target].id.clone());
        self.position = 0.0;
        self.is_playing = true;
    }

    /// Handles a natural end of the current track: repeat-one restarts it,
    /// anything else behaves like `next`.
    pub fn track_ended(&mut self, rng: &mut impl Rng) {
        if self.repeat == RepeatMode::One {
            self.position = 0.0;
            self.is_playing = true;
        } else {
            self.next(rng);
        }
    }

    /// Advances the elapsed position by `dt` seconds while playing. Returns
    /// true when the track just reached its natural end.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.is_playing {
            return false;
        }
        let duration = self.current_track().map(|t| t.duration).unwrap_or(0.0);
        if duration <= 0.0 {
            return false;
        }
        self.position += dt;
        self.position >= duration
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        self.repeat
    }

    /// Toggles the favorite flag on the current track.
    pub fn toggle_favorite(&mut self) {
        let Some(id) = self.current_id.clone() else {
            return;
        };
        if !self.favorites.remove(&id) {
            self.favorites.insert(id);
        }
    }

    pub fn is_current_favorite(&self) -> bool {
        self.current_id
            .as_deref()
            .map(|id| self.favorites.contains(id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn player() -> Player {
        Player::new(seed_playlist())
    }

    #[test]
    fn shuffle_next_never_repeats_current() {
        let mut rng = seeded_rng();
        let mut player = player();
        player.toggle_shuffle();

        for _ in 0..200 {
            let before = player.current_track().unwrap().id.clone();
            player.next(&mut rng);
            let after = player.current_track().unwrap().id.clone();
            assert_ne!(before, after);
        }
    }

    #[test]
    fn repeat_off_at_last_track_pauses_in_place() {
        let mut rng = seeded_rng();
        let mut player = player();
        player.toggle_play();

        // Walk to the last track.
        player.next(&mut rng);
        player.next(&mut rng);
        let last = player.current_track().unwrap().id.clone();
        assert!(player.is_playing());

        player.next(&mut rng);
        assert_eq!(player.current_track().unwrap().id, last);
        assert!(!player.is_playing());
    }

    #[test]
    fn repeat_all_wraps_both_directions() {
        let mut rng = seeded_rng();
        let mut player = player();
        player.cycle_repeat();
        assert_eq!(player.repeat(), RepeatMode::All);

        player.previous(&mut rng);
        assert_eq!(player.current_track().unwrap().id, "3");

        player.next(&mut rng);
        assert_eq!(player.current_track().unwrap().id, "1");
    }

    #[test]
    fn repeat_one_restarts_on_natural_end() {
        let mut rng = seeded_rng();
        let mut player = player();
        player.cycle_repeat();
        player.cycle_repeat();
        assert_eq!(player.repeat(), RepeatMode::One);

        player.play_track("2");
        player.advance(10.0);
        assert!(player.position() > 0.0);

        player.track_ended(&mut rng);
        assert_eq!(player.current_track().unwrap().id, "2");
        assert_eq!(player.position(), 0.0);
        assert!(player.is_playing());
    }

    #[test]
    fn advance_detects_natural_end() {
        let mut player = player();
        player.play_track("1");

        assert!(!player.advance(1.0));
        let duration = player.current_track().unwrap().duration;
        assert!(player.advance(duration));
    }

    #[test]
    fn advance_is_inert_while_paused() {
        let mut player = player();
        assert!(!player.advance(100.0));
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn single_track_shuffle_stays_put() {
        let mut rng = seeded_rng();
        let mut player = Player::new(vec![seed_playlist().remove(0)]);
        player.toggle_shuffle();
        player.next(&mut rng);
        assert_eq!(player.current_track().unwrap().id, "1");
    }

    #[test]
    fn favorites_toggle_round_trip() {
        let mut player = player();
        assert!(!player.is_current_favorite());
        player.toggle_favorite();
        assert!(player.is_current_favorite());
        player.toggle_favorite();
        assert!(!player.is_current_favorite());
    }

    #[test]
    fn unknown_track_id_is_ignored() {
        let mut player = player();
        assert!(!player.play_track("missing"));
        assert_eq!(player.current_track().unwrap().id, "1");
        assert!(!player.is_playing());
    }

    #[test]
    fn empty_queue_is_inert() {
        let mut rng = seeded_rng();
        let mut player = Player::new(Vec::new());
        assert!(player.current_track().is_none());
        assert!(!player.toggle_play());
        player.next(&mut rng);
        player.previous(&mut rng);
        assert!(player.current_track().is_none());
    }
}
