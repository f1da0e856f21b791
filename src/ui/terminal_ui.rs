use clipboard::{ClipboardContext, ClipboardProvider};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Terminal,
};
use std::io;
use std::time::{Duration, Instant};

use crate::app::App;
use crate::room::{RoomKind, RoomPhase};
use crate::ui::widgets::{ChatPanel, MemberList, VisualizerWidget};
use crate::visualizer::parse_hex_color;

/// Actions emitted by key handling for the event loop to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    TogglePlay,
    NextTrack,
    PreviousTrack,
    ToggleShuffle,
    CycleRepeat,
    ToggleFavorite,
    CycleTheme,
    ToggleLyrics,
    ToggleHighFi,
    ToggleNormalization,
    JoinRoom(RoomKind, String),
    LeaveRoom,
    SendChat(String),
    CopyRoomCode,
    Quit,
}

/// Represents UI notification state
#[derive(Debug, Clone)]
struct Notification {
    message: String,
    start_time: Instant,
    duration: Duration,
}

/// What keystrokes are currently feeding.
#[derive(Debug, Clone, PartialEq)]
enum InputMode {
    Normal,
    RoomCode { kind: RoomKind, input: String },
    Chat { input: String },
}

fn hex_color(hex: &str) -> Color {
    parse_hex_color(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::White)
}

fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0) as u32;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Main UI controller that manages terminal rendering
pub struct TerminalUI {
    terminal: Option<Terminal<CrosstermBackend<io::Stdout>>>,
    samples: Vec<f32>,
    notification: Option<Notification>,
    clipboard: Option<ClipboardContext>,
    input_mode: InputMode,
    room_code: Option<String>,
}

impl TerminalUI {
    pub fn new() -> Self {
        let clipboard = ClipboardProvider::new().ok();

        Self {
            terminal: None,
            samples: Vec::new(),
            notification: None,
            clipboard,
            input_mode: InputMode::Normal,
            room_code: None,
        }
    }

    /// Checks if the terminal UI is initialized
    pub fn is_initialized(&self) -> bool {
        self.terminal.is_some()
    }

    /// Initializes the terminal UI
    pub fn initialize(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        self.terminal = Some(Terminal::new(backend)?);
        Ok(())
    }

    /// Shuts down the terminal UI
    pub fn shutdown(&mut self) -> io::Result<()> {
        if let Some(terminal) = self.terminal.as_mut() {
            disable_raw_mode()?;
            execute!(
                terminal.backend_mut(),
                LeaveAlternateScreen,
                DisableMouseCapture
            )?;
            terminal.show_cursor()?;
        }
        self.terminal = None;
        Ok(())
    }

    /// Updates the visualizer sample snapshot used by the next render.
    pub fn update_samples(&mut self, samples: Vec<f32>) {
        self.samples = samples;
    }

    /// Show a notification message
    pub fn show_notification(&mut self, message: String, duration: Duration) {
        self.notification = Some(Notification {
            message,
            start_time: Instant::now(),
            duration,
        });
    }

    /// Update notification state (remove if expired)
    fn update_notification(&mut self) {
        if let Some(notification) = &self.notification {
            if notification.start_time.elapsed() >= notification.duration {
                self.notification = None;
            }
        }
    }

    /// Copy text to clipboard
    fn copy_to_clipboard(&mut self, text: &str) -> bool {
        if let Some(clipboard) = &mut self.clipboard {
            if clipboard.set_contents(text.to_owned()).is_ok() {
                self.show_notification(
                    "Room code copied to clipboard!".to_string(),
                    Duration::from_secs(2),
                );
                return true;
            }
        }
        self.show_notification("Failed to copy room code!".to_string(), Duration::from_secs(2));
        false
    }

    /// Polls for terminal events
    pub fn poll_events(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if event::poll(timeout)? {
            return Ok(Some(event::read()?));
        }
        Ok(None)
    }

    /// Handles key events, translating them into UI actions.
    pub fn handle_key_event(&mut self, key: KeyCode) -> Option<UiAction> {
        match &mut self.input_mode {
            InputMode::RoomCode { kind, input } => match key {
                KeyCode::Char(c) => {
                    if input.len() < 8 {
                        input.push(c.to_ascii_uppercase());
                    }
                    None
                }
                KeyCode::Backspace => {
                    input.pop();
                    None
                }
                KeyCode::Enter => {
                    let kind = *kind;
                    let code = input.clone();
                    self.room_code = Some(code.clone());
                    self.input_mode = InputMode::Normal;
                    Some(UiAction::JoinRoom(kind, code))
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    None
                }
                _ => None,
            },
            InputMode::Chat { input } => match key {
                KeyCode::Char(c) => {
                    input.push(c);
                    None
                }
                KeyCode::Backspace => {
                    input.pop();
                    None
                }
                KeyCode::Enter => {
                    let text = std::mem::take(input);
                    Some(UiAction::SendChat(text))
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    None
                }
                _ => None,
            },
            InputMode::Normal => match key {
                KeyCode::Char(' ') => Some(UiAction::TogglePlay),
                KeyCode::Char('n') => Some(UiAction::NextTrack),
                KeyCode::Char('p') => Some(UiAction::PreviousTrack),
                KeyCode::Char('s') => Some(UiAction::ToggleShuffle),
                KeyCode::Char('r') => Some(UiAction::CycleRepeat),
                KeyCode::Char('f') => Some(UiAction::ToggleFavorite),
                KeyCode::Char('t') => Some(UiAction::CycleTheme),
                KeyCode::Char('l') => Some(UiAction::ToggleLyrics),
                KeyCode::Char('h') => Some(UiAction::ToggleHighFi),
                KeyCode::Char('z') => Some(UiAction::ToggleNormalization),
                KeyCode::Char('c') => {
                    self.input_mode = InputMode::RoomCode {
                        kind: RoomKind::Couple,
                        input: String::new(),
                    };
                    None
                }
                KeyCode::Char('g') => {
                    self.input_mode = InputMode::RoomCode {
                        kind: RoomKind::Group,
                        input: String::new(),
                    };
                    None
                }
                KeyCode::Char('x') => Some(UiAction::LeaveRoom),
                KeyCode::Char('m') => {
                    self.input_mode = InputMode::Chat {
                        input: String::new(),
                    };
                    None
                }
                KeyCode::Char('k') => Some(UiAction::CopyRoomCode),
                KeyCode::Char('q') => Some(UiAction::Quit),
                _ => None,
            },
        }
    }

    /// Handles actions the UI can resolve on its own (clipboard copies).
    /// Returns true when the action was consumed.
    pub fn handle_internal_action(&mut self, action: &UiAction) -> bool {
        match action {
            UiAction::CopyRoomCode => {
                let code = self.room_code.clone();
                if let Some(code) = code {
                    self.copy_to_clipboard(&code);
                } else {
                    self.show_notification(
                        "No room code to copy".to_string(),
                        Duration::from_secs(2),
                    );
                }
                true
            }
            _ => false,
        }
    }

    pub fn close_chat(&mut self) {
        if matches!(self.input_mode, InputMode::Chat { .. }) {
            self.input_mode = InputMode::Normal;
        }
    }

    /// Renders the UI
    pub fn render(&mut self, app: &App) -> io::Result<()> {
        self.update_notification();

        // Local copies so the draw closure doesn't re-borrow self.
        let samples = self.samples.clone();
        let notification = self.notification.clone();
        let input_mode = self.input_mode.clone();

        let (primary_hex, secondary_hex) = app.effective_colors();
        let primary = hex_color(&primary_hex);
        let secondary = hex_color(&secondary_hex);

        let theme = app.theme().clone();
        let playing = app.player.is_playing();
        let position = app.player.position();
        let track = app.player.current_track().cloned();
        let shuffle = app.player.shuffle();
        let repeat = app.player.repeat();
        let favorite = app.player.is_current_favorite();

        let room_phase = app.room.phase();
        let room_kind = app.room.kind();
        let members = app.room.members().to_vec();
        let messages = app.room.messages().to_vec();
        let sync_status = app.room.sync_status().map(|s| s.to_string());

        let vibe = app.vibe().cloned();
        let lyrics = app.lyrics().map(|s| s.to_string());
        let show_lyrics = app.show_lyrics();
        let high_fi = app.config().high_fi;
        let normalization = app.config().normalization;

        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };

        terminal.draw(|frame| {
            let area = frame.size();

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(5),  // Now playing
                    Constraint::Length(1),  // Progress gauge
                    Constraint::Min(7),     // Visualizer
                    Constraint::Length(9),  // Mood / room panels
                    Constraint::Length(3),  // Status bar
                ])
                .split(area);

            // Now playing
            let (title, artist) = match &track {
                Some(t) => (t.title.clone(), t.artist.clone()),
                None => ("No track".to_string(), "-".to_string()),
            };
            let duration = track.as_ref().map(|t| t.duration).unwrap_or(0.0);
            let fav_marker = if favorite { " ♥" } else { "" };
            let now_playing = Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("{}{}", title, fav_marker),
                    Style::default().fg(primary).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(artist, Style::default().fg(secondary))),
                Line::from(Span::styled(
                    format!("{} / {}", format_time(position), format_time(duration)),
                    Style::default().fg(Color::Gray),
                )),
            ])
            .block(Block::default().title("Now Playing").borders(Borders::ALL));
            frame.render_widget(now_playing, rows[0]);

            // Progress
            let ratio = if duration > 0.0 {
                (position / duration).clamp(0.0, 1.0) as f64
            } else {
                0.0
            };
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(primary).bg(Color::Black))
                .ratio(ratio)
                .label("");
            frame.render_widget(gauge, rows[1]);

            // Visualizer
            let visualizer_title = format!("Visualizer [{}] {}", theme.style.label(), theme.name);
            let visualizer = VisualizerWidget::new(&samples, theme.style)
                .playing(playing)
                .colors(primary, secondary)
                .block(Block::default().title(visualizer_title).borders(Borders::ALL));
            frame.render_widget(visualizer, rows[2]);

            // Mood / lyrics panel on the left, room on the right.
            let panels = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[3]);

            if show_lyrics {
                let text = lyrics.unwrap_or_else(|| "Scanning frequencies...".to_string());
                let lyrics_panel = Paragraph::new(text)
                    .wrap(Wrap { trim: true })
                    .style(Style::default().fg(Color::Gray))
                    .block(Block::default().title("Lyrics").borders(Borders::ALL));
                frame.render_widget(lyrics_panel, panels[0]);
            } else {
                let mood_lines = match &vibe {
                    Some(v) => vec![
                        Line::from(Span::styled(
                            v.mood.clone(),
                            Style::default().fg(primary).add_modifier(Modifier::BOLD),
                        )),
                        Line::from(Span::styled(
                            format!("energy {}", "▮".repeat(v.energy_level as usize)),
                            Style::default().fg(secondary),
                        )),
                        Line::from(Span::raw(v.description.clone())),
                        Line::from(
                            v.color_palette
                                .iter()
                                .map(|hex| Span::styled("■ ", Style::default().fg(hex_color(hex))))
                                .collect::<Vec<Span>>(),
                        ),
                    ],
                    None => vec![Line::from(Span::styled(
                        "Analyzing vibe...",
                        Style::default().fg(Color::DarkGray),
                    ))],
                };
                let mood_panel = Paragraph::new(mood_lines)
                    .wrap(Wrap { trim: true })
                    .block(Block::default().title("Vibe").borders(Borders::ALL));
                frame.render_widget(mood_panel, panels[0]);
            }

            match room_phase {
                RoomPhase::Joined => {
                    let room_rows = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                        .split(panels[1]);

                    let room_title = match room_kind {
                        Some(kind) => format!("Room [{}]", kind.label()),
                        None => "Room".to_string(),
                    };
                    let member_list = MemberList::new(&members)
                        .accent(primary)
                        .block(Block::default().title(room_title).borders(Borders::ALL));
                    frame.render_widget(member_list, room_rows[0]);

                    let chat = ChatPanel::new(&messages)
                        .accent(primary)
                        .block(Block::default().title("Chat").borders(Borders::ALL));
                    frame.render_widget(chat, room_rows[1]);
                }
                RoomPhase::Joining => {
                    let joining = Paragraph::new("Establishing link...")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(secondary))
                        .block(Block::default().title("Room").borders(Borders::ALL));
                    frame.render_widget(joining, panels[1]);
                }
                RoomPhase::Idle => {
                    let idle = Paragraph::new("No room - press 'c' (couple) or 'g' (group) to join")
                        .style(Style::default().fg(Color::DarkGray))
                        .block(Block::default().title("Room").borders(Borders::ALL));
                    frame.render_widget(idle, panels[1]);
                }
            }

            // Status bar
            let status_text = match &sync_status {
                Some(banner) => format!("⚡ {}", banner),
                None => format!(
                    "{} shuffle:{} repeat:{} hifi:{} norm:{} | space play · n/p skip · \
                     s shuffle · r repeat · f fav · t theme · l lyrics · h hifi · z norm · \
                     c/g room · x leave · m chat · q quit",
                    if playing { "▶" } else { "⏸" },
                    if shuffle { "on" } else { "off" },
                    repeat.label(),
                    if high_fi { "on" } else { "off" },
                    if normalization { "on" } else { "off" },
                ),
            };
            let status_bar = Paragraph::new(status_text)
                .style(Style::default())
                .block(Block::default().borders(Borders::ALL).title("Status"));
            frame.render_widget(status_bar, rows[4]);

            // Notification overlay, centered like a popup.
            if let Some(notif) = notification {
                let notif_width = (notif.message.len() as u16 + 4).min(area.width);
                let notif_height = 3u16.min(area.height);
                let notif_x = area.width.saturating_sub(notif_width) / 2;
                let notif_y = area.height.saturating_sub(notif_height) / 2;

                let notif_area = Rect::new(notif_x, notif_y, notif_width, notif_height);
                let notification_widget = Paragraph::new(notif.message)
                    .style(Style::default().fg(Color::White))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .style(Style::default().bg(Color::DarkGray)),
                    );
                frame.render_widget(notification_widget, notif_area);
            }

            // Text input popup for room codes and chat.
            let popup = match &input_mode {
                InputMode::RoomCode { kind, input } => Some((
                    format!("Enter {} room code (4+ chars)", kind.label()),
                    input.clone(),
                )),
                InputMode::Chat { input } => {
                    Some(("Transmit message".to_string(), input.clone()))
                }
                InputMode::Normal => None,
            };

            if let Some((prompt, input)) = popup {
                let input_width = (prompt.len().max(40) as u16 + 4).min(area.width);
                let input_height = 5u16.min(area.height);
                let input_x = area.width.saturating_sub(input_width) / 2;
                let input_y = area.height.saturating_sub(input_height) / 2;

                let input_area = Rect::new(input_x, input_y, input_width, input_height);
                let input_text = format!("{}\n{}", prompt, input);
                let input_widget = Paragraph::new(input_text)
                    .style(Style::default().fg(Color::White))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title("Input")
                            .style(Style::default().bg(Color::Black)),
                    );
                frame.render_widget(input_widget, input_area);

                let cursor_x = input_x + 1 + input.len() as u16;
                let cursor_y = input_y + 2;
                frame.set_cursor(cursor_x, cursor_y);
            }
        })?;

        Ok(())
    }
}
