use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::info;

use crate::config::Config;
use crate::llm::CompletionClient;
use crate::tui::{self, EventHandler, Tui, TuiEvent};
use crate::ui::chat::{ChatAction, ChatManager};

/// Top-level application state and event loop.
pub struct App {
    manager: ChatManager,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, api_key: String) -> Self {
        let client = CompletionClient::new(config, api_key);
        Self {
            manager: ChatManager::new(client),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = tui::init()?;
        let result = self.main_loop(&mut terminal).await;
        tui::restore()?;
        result
    }

    async fn main_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut events = EventHandler::new();

        while !self.should_quit {
            self.manager.poll_turn_events();

            terminal.draw(|frame| {
                let area = frame.size();
                self.manager.render(area, frame.buffer_mut());
            })?;

            if let Some(event) = events.next().await {
                match event {
                    TuiEvent::Key(key) => self.handle_key(key),
                    TuiEvent::Tick => self.manager.tick(),
                    TuiEvent::Resize(..) => {}
                }
            }
        }

        info!("exiting");
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return;
        }

        if self.manager.handle_key(key) == ChatAction::Exit {
            self.should_quit = true;
        }
    }
}
