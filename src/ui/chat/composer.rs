use crate::ui::chat::commands::{self, CommandEntry, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::cell::{Cell, RefCell};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
struct TextAreaState {
    content: String,
    cursor_position: usize,
}

/// Input composer for the chat screen
pub struct Composer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl Composer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder: placeholder.into(),
            command_entries: commands::command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else if self.show_command_palette.get() {
                    // Enter runs the highlighted command; none of the
                    // commands take arguments.
                    if let Some(command) = self.apply_selected_command(&mut state) {
                        state.content.clear();
                        state.cursor_position = 0;
                        return ComposerResult::Command(command);
                    }
                } else if !state.content.trim().is_empty() {
                    let content = state.content.clone();
                    state.content.clear();
                    state.cursor_position = 0;
                    self.close_command_palette();
                    drop(state);
                    if let Some(command) = commands::parse_slash_command(&content) {
                        return ComposerResult::Command(command);
                    } else {
                        return ComposerResult::Submitted(content);
                    }
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette.get() {
                    self.close_command_palette();
                }
            }
            KeyCode::Tab => {
                // Tab only completes the text; Enter runs it.
                if self.show_command_palette.get() {
                    let _ = self.apply_selected_command(&mut state);
                }
            }
            KeyCode::Char(c) => {
                self.insert_char(&mut state, c);

                if self.show_command_palette.get() {
                    if state.content.starts_with('/') && !c.is_whitespace() {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                } else if state.content == "/" {
                    self.open_command_palette(&state);
                }
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) && self.show_command_palette.get() {
                    if state.content.starts_with('/') {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Delete => {
                self.delete(&mut state);
            }
            KeyCode::Left => {
                state.cursor_position = prev_boundary(&state.content, state.cursor_position);
            }
            KeyCode::Right => {
                state.cursor_position = next_boundary(&state.content, state.cursor_position);
            }
            KeyCode::Home => {
                state.cursor_position = 0;
            }
            KeyCode::End => {
                state.cursor_position = state.content.len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        state.content.insert(state.cursor_position, c);
        state.cursor_position += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position > 0 {
            state.cursor_position = prev_boundary(&state.content, state.cursor_position);
            state.content.remove(state.cursor_position);
            true
        } else {
            false
        }
    }

    /// Delete character at cursor
    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position < state.content.len() {
            state.content.remove(state.cursor_position);
            true
        } else {
            false
        }
    }

    fn open_command_palette(&self, state: &TextAreaState) {
        self.show_command_palette.set(true);
        self.refresh_command_palette(state);
        self.selected_command.set(Some(0));
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();

        for entry in &self.command_entries {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            self.selected_command.set(Some(index.min(filtered.len() - 1)));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let current = self.selected_command.get().unwrap_or(0) as isize;
        let len = filtered.len() as isize;
        let mut next = current + delta;

        if next < 0 {
            next = len - 1;
        } else if next >= len {
            next = 0;
        }

        self.selected_command.set(Some(next as usize));
    }

    /// Complete the highlighted palette entry into the input.
    fn apply_selected_command(&self, state: &mut TextAreaState) -> Option<SlashCommand> {
        let filtered = self.filtered_commands.borrow();
        let index = self.selected_command.get()?;

        if index >= filtered.len() {
            return None;
        }

        let entry = filtered[index];
        state.content = format!("/{}", entry.keyword);
        state.cursor_position = state.content.len();
        drop(filtered);
        self.close_command_palette();
        Some(entry.command)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Your question")
            .style(Style::default().fg(Color::Green));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                &self.placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = state.content.clone();
            content.insert(state.cursor_position.min(content.len()), '▌');

            for (i, line_text) in content.split('\n').enumerate() {
                if i < inner_area.height as usize {
                    let line = Line::from(vec![Span::raw(line_text)]);
                    buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
                }
            }
        }

        if self.show_command_palette.get() {
            self.render_command_palette(inner_area, buf);
        }
    }

    fn render_command_palette(&self, inner_area: Rect, buf: &mut Buffer) {
        let filtered = self.filtered_commands.borrow();
        let palette_height = (filtered.len().min(5) + 2) as u16;
        let palette_area = Rect {
            x: inner_area.x,
            y: inner_area.y.saturating_sub(palette_height),
            width: inner_area.width,
            height: palette_height,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().fg(Color::Blue));
        let inner = block.inner(palette_area);
        block.render(palette_area, buf);

        let selected = self.selected_command.get();
        for (index, entry) in filtered.iter().enumerate() {
            if index >= inner.height as usize {
                break;
            }

            let style = if selected == Some(index) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("/{}", entry.keyword), style),
                Span::styled(" — ", Style::default().fg(Color::DarkGray)),
                Span::styled(entry.description, Style::default().fg(Color::Gray)),
            ]);

            buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
        }
    }
}

fn prev_boundary(content: &str, position: usize) -> usize {
    let mut candidate = position.saturating_sub(1);
    while candidate > 0 && !content.is_char_boundary(candidate) {
        candidate -= 1;
    }
    candidate
}

fn next_boundary(content: &str, position: usize) -> usize {
    if position >= content.len() {
        return content.len();
    }
    let mut candidate = position + 1;
    while candidate < content.len() && !content.is_char_boundary(candidate) {
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &Composer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_typed_text() {
        let composer = Composer::new("placeholder");
        type_text(&composer, "What is your pricing?");
        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(
            result,
            ComposerResult::Submitted("What is your pricing?".to_string())
        );
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let composer = Composer::new("placeholder");
        type_text(&composer, "   ");
        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::None);
    }

    #[test]
    fn slash_input_becomes_a_command() {
        let composer = Composer::new("placeholder");
        type_text(&composer, "/clear");
        // The palette is open with "clear" selected; Enter runs it.
        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Command(SlashCommand::Clear));
    }

    #[test]
    fn closed_palette_still_parses_typed_commands() {
        let composer = Composer::new("placeholder");
        type_text(&composer, "/bye");
        composer.handle_key(press(KeyCode::Esc));
        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Command(SlashCommand::Bye));
    }

    #[test]
    fn backspace_handles_multibyte_input() {
        let composer = Composer::new("placeholder");
        type_text(&composer, "café");
        composer.handle_key(press(KeyCode::Backspace));
        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Submitted("caf".to_string()));
    }
}
