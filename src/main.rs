use anyhow::Result;
use crossterm::event::Event;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use pulse::app::{App, Config};
use pulse::player::seed_playlist;
use pulse::room::RoomEvent;
use pulse::ui::{TerminalUI, UiAction};
use pulse::vibe::{HttpAnnotator, VibeSource};
use pulse::visualizer::{AnimationLoop, TICK_INTERVAL};

const CONFIG_PATH: &str = "pulse.conf";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting pulse");

    let mut config = Config::default();
    if let Ok(contents) = std::fs::read_to_string(CONFIG_PATH) {
        match contents.parse::<Config>() {
            Ok(loaded) => config = loaded,
            Err(e) => warn!("Ignoring malformed config: {}", e),
        }
    }

    let local_files: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();

    let (vibe_tx, mut vibe_rx) = mpsc::channel(32);
    let (room_tx, mut room_rx) = mpsc::channel(32);

    let source: Arc<dyn VibeSource> = Arc::new(HttpAnnotator::from_env());
    let mut app = App::new(config, seed_playlist(), source, vibe_tx, room_tx);

    if !local_files.is_empty() {
        let imported = app.import_local(&local_files);
        info!("Imported {} local track(s)", imported);
    }

    // Kick off mood analysis for the opening track.
    app.request_mood();

    let mut animation = AnimationLoop::new();
    if app.config().ui_motion {
        animation.start();
    }

    let mut terminal_ui = TerminalUI::new();
    terminal_ui.initialize()?;

    let mut rng = rand::thread_rng();
    let mut last_frame = Instant::now();
    let mut running = true;

    while running {
        if let Some(Event::Key(key)) = terminal_ui.poll_events(TICK_INTERVAL)? {
            if let Some(action) = terminal_ui.handle_key_event(key.code) {
                if !terminal_ui.handle_internal_action(&action) {
                    match action {
                        UiAction::TogglePlay => app.toggle_play(),
                        UiAction::NextTrack => app.next_track(&mut rng),
                        UiAction::PreviousTrack => app.previous_track(&mut rng),
                        UiAction::ToggleShuffle => {
                            app.player.toggle_shuffle();
                        }
                        UiAction::CycleRepeat => {
                            app.player.cycle_repeat();
                        }
                        UiAction::ToggleFavorite => app.toggle_favorite(),
                        UiAction::CycleTheme => {
                            app.cycle_theme();
                        }
                        UiAction::ToggleLyrics => app.toggle_lyrics(),
                        UiAction::ToggleHighFi => {
                            app.toggle_high_fi();
                        }
                        UiAction::ToggleNormalization => {
                            app.toggle_normalization();
                        }
                        UiAction::JoinRoom(kind, code) => {
                            app.join_room(kind, &code);
                        }
                        UiAction::LeaveRoom => {
                            app.leave_room();
                            terminal_ui.close_chat();
                        }
                        UiAction::SendChat(text) => {
                            app.room.send_message(&text);
                        }
                        UiAction::CopyRoomCode => {}
                        UiAction::Quit => running = false,
                    }
                }
            }
        }

        // Drain background events without blocking the frame.
        while let Ok(update) = vibe_rx.try_recv() {
            app.apply_vibe_update(update);
        }
        while let Ok(event) = room_rx.try_recv() {
            match event {
                RoomEvent::JoinResolved { kind } => app.room.complete_join(kind),
                RoomEvent::SyncExpired { generation } => app.room.expire_sync(generation),
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        app.advance(dt, &mut rng);

        animation.set_playing(app.player.is_playing());
        terminal_ui.update_samples(animation.snapshot());
        terminal_ui.render(&app)?;
    }

    if let Err(e) = app.save_config(CONFIG_PATH) {
        warn!("Failed to save config: {}", e);
    }

    animation.stop();
    terminal_ui.shutdown()?;
    info!("Shutdown complete");

    Ok(())
}
