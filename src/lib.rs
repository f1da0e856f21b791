pub mod app;
pub mod player;
pub mod room;
pub mod ui;
pub mod vibe;
pub mod visualizer;

pub use app::{App, Config};
pub use player::{Player, RepeatMode, Track};
pub use room::{RoomEvent, RoomKind, RoomManager, RoomPhase};
pub use vibe::{VibeAnalysis, VibeSource, VibeUpdate};
pub use visualizer::{AnimationLoop, SampleBuffer, Theme, VisualStyle};
