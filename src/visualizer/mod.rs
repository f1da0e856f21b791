use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;

/// Number of amplitude samples driving the visualizer shape.
pub const SAMPLE_COUNT: usize = 40;

/// Lowest value a sample may hold. Keeps every bar/dot visible even at rest.
pub const FLOOR: f32 = 5.0;

/// Highest value a sample may hold.
pub const CEILING: f32 = 40.0;

/// Maximum per-tick random excursion while playing.
const JITTER: f32 = 4.0;

/// Geometric decay factor applied while paused.
const DECAY: f32 = 0.92;

/// Offset chosen so the decay fixed point lands exactly on FLOOR:
/// 0.4 / (1.0 - 0.92) == 5.0.
const RESTING_OFFSET: f32 = 0.4;

/// Interval between animation ticks (~30 FPS).
pub const TICK_INTERVAL: Duration = Duration::from_millis(33);

/// Rendering mode selecting how the sample buffer is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualStyle {
    Bars,
    Wave,
    Dots,
}

impl VisualStyle {
    pub fn label(&self) -> &'static str {
        match self {
            VisualStyle::Bars => "bars",
            VisualStyle::Wave => "wave",
            VisualStyle::Dots => "dots",
        }
    }
}

/// A named color pair plus the rendering style it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub primary: String,
    pub secondary: String,
    pub style: VisualStyle,
}

impl Theme {
    fn new(id: &str, name: &str, primary: &str, secondary: &str, style: VisualStyle) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            style,
        }
    }

    /// The built-in theme set. The first entry is the default.
    pub fn builtin() -> Vec<Theme> {
        vec![
            Theme::new("crimson", "Crimson", "#ef4444", "#991B1B", VisualStyle::Bars),
            Theme::new("cyan", "Electric", "#22d3ee", "#0891b2", VisualStyle::Wave),
            Theme::new("violet", "Ghost", "#a855f7", "#7e22ce", VisualStyle::Dots),
        ]
    }

    pub fn by_id(id: &str) -> Option<Theme> {
        Theme::builtin().into_iter().find(|t| t.id == id)
    }
}

/// Parses a `#rrggbb` hex color into an RGB triple.
///
/// Tolerant of arbitrary input: annotator-supplied palette strings pass
/// through here, so anything that is not six ASCII hex digits is `None`,
/// never a panic.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some((r, g, b))
}

/// Fixed-length amplitude buffer animated once per tick.
///
/// The values are decorative: they never observe the real audio signal, only
/// whether playback is active.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// Creates a buffer seeded with random mid-range values.
    pub fn new(rng: &mut impl Rng) -> Self {
        let samples = (0..SAMPLE_COUNT)
            .map(|_| rng.gen_range(10.0..30.0))
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Advances the animation by one frame.
    ///
    /// While playing each sample takes a uniformly random step and is clamped
    /// into `[FLOOR, CEILING]`. While paused each sample decays geometrically
    /// toward FLOOR, so pause/resume transitions stay smooth.
    pub fn tick(&mut self, playing: bool, rng: &mut impl Rng) {
        if playing {
            for v in &mut self.samples {
                let change = rng.gen_range(-JITTER..=JITTER);
                *v = (*v + change).clamp(FLOOR, CEILING);
            }
        } else {
            for v in &mut self.samples {
                *v = (*v * DECAY + RESTING_OFFSET).clamp(FLOOR, CEILING);
            }
        }
    }

    /// Largest distance of any sample from the resting floor.
    pub fn max_distance_from_floor(&self) -> f32 {
        self.samples
            .iter()
            .map(|v| (v - FLOOR).abs())
            .fold(0.0, f32::max)
    }
}

/// Self-rescheduling animation loop ticking a shared [`SampleBuffer`].
///
/// The loop runs as a single tokio task; restarting it aborts the previous
/// task first so two loops never animate the same buffer concurrently.
pub struct AnimationLoop {
    samples: Arc<Mutex<SampleBuffer>>,
    playing: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AnimationLoop {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            samples: Arc::new(Mutex::new(SampleBuffer::new(&mut rng))),
            playing: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Starts (or restarts) the animation task.
    pub fn start(&mut self) {
        self.stop();

        let samples = Arc::clone(&self.samples);
        let playing = Arc::clone(&self.playing);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                let is_playing = playing.load(Ordering::Relaxed);
                let mut rng = rand::thread_rng();
                if let Ok(mut buffer) = samples.lock() {
                    buffer.tick(is_playing, &mut rng);
                }
            }
        });

        self.handle = Some(handle);
    }

    /// Cancels the animation task, if one is running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Updates the play/pause signal observed by the loop.
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }

    /// Takes a copy of the current sample values for rendering.
    pub fn snapshot(&self) -> Vec<f32> {
        self.samples
            .lock()
            .map(|buffer| buffer.samples().to_vec())
            .unwrap_or_default()
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
