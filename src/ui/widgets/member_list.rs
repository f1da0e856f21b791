// Room member list widget
// Displays the simulated members of the joined listening room

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Span,
    widgets::{Block, List, ListItem, Widget},
};

use crate::room::Member;

pub struct MemberList<'a> {
    block: Option<Block<'a>>,
    members: &'a [Member],
    accent: Color,
}

impl<'a> MemberList<'a> {
    pub fn new(members: &'a [Member]) -> Self {
        Self {
            block: None,
            members,
            accent: Color::Cyan,
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

impl<'a> Widget for MemberList<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block.unwrap_or_default();
        let inner_area = block.inner(area);
        block.render(area, buf);

        if inner_area.height < 1 {
            return;
        }

        let items: Vec<ListItem> = self
            .members
            .iter()
            .map(|m| {
                let marker = if m.active { "● " } else { "○ " };
                let style = if m.active {
                    Style::default().fg(self.accent)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Span::styled(format!("{}{}", marker, m.name), style))
            })
            .collect();

        List::new(items).render(inner_area, buf);
    }
}
