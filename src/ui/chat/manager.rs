use crate::conversation::Conversation;
use crate::events::{StatusNotice, TurnEvent};
use crate::llm::CompletionClient;
use crate::prompts;
use crate::retry::{self, RetryPolicy, TokioSleeper, TurnError};
use crate::ui::chat::commands::{self, SlashCommand};
use crate::ui::chat::composer::{Composer, ComposerResult};
use crate::ui::chat::history::HistoryView;
use crate::ui::chat::status::StatusLine;
use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
};
use tokio::sync::mpsc;
use tracing::info;

/// Actions that can be requested by the chat manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    None,
    Exit,
}

/// Manages the chat flow and UI components.
///
/// Owns the conversation store; the renderer borrows it each frame and the
/// in-flight turn task reports back over a channel, so the store is only ever
/// appended to from this one place.
pub struct ChatManager {
    conversation: Conversation,
    composer: Composer,
    history: HistoryView,
    status: StatusLine,
    client: CompletionClient,
    turn_rx: Option<mpsc::UnboundedReceiver<TurnEvent>>,
}

impl ChatManager {
    pub fn new(client: CompletionClient) -> Self {
        let mut status = StatusLine::new();
        status.set_notice(StatusNotice::info(
            "Type a question and press Enter. /help lists commands.",
        ));

        Self {
            conversation: Conversation::new(),
            composer: Composer::new("Ask about Vedaniti services, pricing, timeline..."),
            history: HistoryView,
            status,
            client,
            turn_rx: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ChatAction {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.submit(input);
                ChatAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ChatAction::None,
        }
    }

    /// Start a turn for the submitted question.
    fn submit(&mut self, input: String) {
        // One turn at a time; the previous retry loop must finish first.
        if self.turn_rx.is_some() {
            self.status.set_notice(StatusNotice::warning(
                "Still working on the previous question...",
            ));
            return;
        }

        info!(chars = input.len(), "user submitted a question");
        self.status.clear_notice();
        self.conversation.push_user(input.clone());
        self.status.set_thinking(true);

        let (tx, rx) = mpsc::unbounded_channel();
        self.turn_rx = Some(rx);

        let client = self.client.clone();
        tokio::spawn(async move {
            run_turn(client, input, tx).await;
        });
    }

    /// Drain events from the in-flight turn (called from the main loop).
    pub fn poll_turn_events(&mut self) {
        let Some(turn_rx) = self.turn_rx.as_mut() else {
            return;
        };

        let mut finished = false;
        loop {
            match turn_rx.try_recv() {
                Ok(TurnEvent::Reply(text)) => {
                    self.conversation.push_assistant(text);
                }
                Ok(TurnEvent::Notice(notice)) => {
                    self.status.set_notice(notice);
                }
                Err(mpsc::error::TryRecvError::Empty) => {
                    break;
                }
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            // Turn over; accept input again.
            self.turn_rx = None;
            self.status.set_thinking(false);
        }
    }

    /// Advance spinner animation.
    pub fn tick(&mut self) {
        self.status.tick();
    }

    fn handle_slash_command(&mut self, command: SlashCommand) -> ChatAction {
        match command {
            SlashCommand::Clear => {
                info!(messages = self.conversation.len(), "clearing conversation");
                self.conversation.reset();
                self.status.clear_notice();
                ChatAction::None
            }
            SlashCommand::Help => {
                self.conversation.push_system(commands::get_help_text());
                ChatAction::None
            }
            SlashCommand::Bye => ChatAction::Exit,
        }
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),   // History
                Constraint::Length(1), // Status line
                Constraint::Length(3), // Composer
            ])
            .split(area);

        self.history.render(&self.conversation, chunks[0], buf);
        self.status.render(chunks[1], buf);
        self.composer.render(chunks[2], buf);
    }

    #[cfg(test)]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

/// Run one turn through the retry policy and report the outcome.
///
/// Dropping `tx` at the end is what tells the manager the turn is over.
async fn run_turn(
    client: CompletionClient,
    user_message: String,
    tx: mpsc::UnboundedSender<TurnEvent>,
) {
    let notify_tx = tx.clone();
    let result = retry::complete_with_retry(
        RetryPolicy::default(),
        &TokioSleeper,
        || {
            let client = client.clone();
            let user_message = user_message.clone();
            async move {
                client
                    .complete(prompts::SYSTEM_PROMPT.as_str(), &user_message)
                    .await
            }
        },
        |notice| {
            let _ = notify_tx.send(TurnEvent::Notice(StatusNotice::warning(format!(
                "Rate limit. Retrying in {}s... ({}/{})",
                notice.delay.as_secs(),
                notice.attempt,
                notice.max_attempts
            ))));
        },
    )
    .await;

    match result {
        Ok(text) => {
            let _ = tx.send(TurnEvent::Reply(text));
        }
        Err(TurnError::Busy) => {
            let _ = tx.send(TurnEvent::Notice(StatusNotice::error(
                "Service temporarily busy. Please wait a moment.",
            )));
        }
        Err(TurnError::Provider(message)) => {
            let _ = tx.send(TurnEvent::Notice(StatusNotice::error(format!(
                "Error: {message}"
            ))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::conversation::Role;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn manager() -> ChatManager {
        let config = Config::default();
        let client = CompletionClient::new(&config, "gsk_test".to_string());
        ChatManager::new(client)
    }

    fn type_and_submit(manager: &mut ChatManager, text: &str) -> ChatAction {
        for c in text.chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        manager.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn submitting_appends_the_user_message_and_blocks_reentry() {
        let mut manager = manager();
        type_and_submit(&mut manager, "What is your pricing?");

        assert_eq!(manager.conversation().len(), 2);
        assert_eq!(manager.conversation().messages()[1].role, Role::User);
        assert!(manager.turn_rx.is_some());

        // A second submission while the turn is in flight is refused.
        type_and_submit(&mut manager, "hello again?");
        assert_eq!(manager.conversation().len(), 2);
    }

    #[tokio::test]
    async fn reply_event_appends_exactly_one_assistant_message() {
        let mut manager = manager();
        type_and_submit(&mut manager, "What is your pricing?");

        // Stand in for the spawned turn task.
        let (tx, rx) = mpsc::unbounded_channel();
        manager.turn_rx = Some(rx);
        tx.send(TurnEvent::Reply("Flexible packages...".to_string()))
            .unwrap();
        drop(tx);

        manager.poll_turn_events();

        let messages = manager.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "Flexible packages...");
        assert!(manager.turn_rx.is_none());
    }

    #[tokio::test]
    async fn failed_turn_appends_no_assistant_message() {
        let mut manager = manager();
        type_and_submit(&mut manager, "What is your pricing?");

        let (tx, rx) = mpsc::unbounded_channel();
        manager.turn_rx = Some(rx);
        tx.send(TurnEvent::Notice(StatusNotice::error(
            "Service temporarily busy. Please wait a moment.",
        )))
        .unwrap();
        drop(tx);

        manager.poll_turn_events();

        // Only the greeting and the user's own message remain.
        assert_eq!(manager.conversation().len(), 2);
        assert!(manager.turn_rx.is_none());
    }

    #[tokio::test]
    async fn clear_command_resets_to_a_single_greeting() {
        let mut manager = manager();
        type_and_submit(&mut manager, "hello");

        // Let the pending turn finish before clearing.
        manager.turn_rx = None;
        let action = type_and_submit(&mut manager, "/clear");

        assert_eq!(action, ChatAction::None);
        assert_eq!(manager.conversation().len(), 1);
        assert_eq!(manager.conversation().messages()[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn bye_command_requests_exit() {
        let mut manager = manager();
        let action = type_and_submit(&mut manager, "/bye");
        assert_eq!(action, ChatAction::Exit);
    }
}
