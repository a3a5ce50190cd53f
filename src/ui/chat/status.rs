use crate::events::{StatusLevel, StatusNotice};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Single-line transient status display: a spinner while a turn is in
/// flight, and the most recent notice from the retry flow.
pub struct StatusLine {
    notice: Option<StatusNotice>,
    thinking: bool,
    spinner_frame: usize,
}

impl StatusLine {
    pub fn new() -> Self {
        Self {
            notice: None,
            thinking: false,
            spinner_frame: 0,
        }
    }

    pub fn set_notice(&mut self, notice: StatusNotice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn set_thinking(&mut self, thinking: bool) {
        self.thinking = thinking;
        if !thinking {
            self.spinner_frame = 0;
        }
    }

    /// Advance the spinner animation. Called on every UI tick.
    pub fn tick(&mut self) {
        if self.thinking {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        // A notice takes priority: during a backoff wait the warning explains
        // what the spinner alone would not.
        let line = if let Some(ref notice) = self.notice {
            notice_line(notice)
        } else if self.thinking {
            Line::from(vec![
                Span::styled(
                    SPINNER_FRAMES[self.spinner_frame],
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(" ⚡ Thinking...", Style::default().fg(Color::Cyan)),
            ])
        } else {
            return;
        };

        buf.set_line(area.x, area.y, &line, area.width);
    }
}

fn notice_line(notice: &StatusNotice) -> Line<'static> {
    match notice.level {
        StatusLevel::Info => Line::from(vec![
            Span::styled("ℹ️ ", Style::default().fg(Color::Blue)),
            Span::raw(notice.text.clone()),
        ]),
        StatusLevel::Warning => Line::from(vec![
            Span::styled("⚠️ ", Style::default().fg(Color::Yellow)),
            Span::styled(notice.text.clone(), Style::default().fg(Color::Yellow)),
        ]),
        StatusLevel::Error => Line::from(vec![
            Span::styled("❌ ", Style::default().fg(Color::Red)),
            Span::styled(notice.text.clone(), Style::default().fg(Color::Red)),
        ]),
    }
}
