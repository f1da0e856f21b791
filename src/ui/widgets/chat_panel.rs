// Chat transcript widget
// Shows the tail of the room's local-only chat log

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::room::ChatMessage;

pub struct ChatPanel<'a> {
    block: Option<Block<'a>>,
    messages: &'a [ChatMessage],
    accent: Color,
}

impl<'a> ChatPanel<'a> {
    pub fn new(messages: &'a [ChatMessage]) -> Self {
        Self {
            block: None,
            messages,
            accent: Color::Red,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn accent(mut self, accent: Color) -> Self {
        self.accent = accent;
        self
    }
}

impl<'a> Widget for ChatPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_height = self
            .block
            .as_ref()
            .map(|b| b.inner(area).height)
            .unwrap_or(area.height) as usize;

        // Keep only the lines that fit; newest at the bottom.
        let start = self.messages.len().saturating_sub(inner_height);
        let lines: Vec<Line> = self.messages[start..]
            .iter()
            .map(|msg| {
                let user_style = match msg.user.as_str() {
                    "You" => Style::default().fg(self.accent),
                    "SERVER" => Style::default().fg(Color::DarkGray),
                    _ => Style::default().fg(Color::White),
                };
                Line::from(vec![
                    Span::styled(format!("{}: ", msg.user), user_style),
                    Span::raw(msg.text.clone()),
                ])
            })
            .collect();

        let mut paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}
