//! In-memory view state: the editable inputs and the conversations streamed
//! back for the current run. Nothing here survives a restart.

use log::{debug, info};
use thiserror::Error;

use crate::api::connection::RequestSink;
use crate::api::events::{ClientRequest, ServerEvent};
use crate::api::models::{
    Conversation, ConversationStatus, ConversationSummary, Message, PromptId, UserPromptEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Simulating,
    /// Every announced conversation finished. Still locked until reset.
    Completed,
}

/// Start rejections. `Display` is what the user sees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("A simulation is already running. Reset before starting another.")]
    AlreadyRunning,
    #[error("Please enter an agent prompt")]
    MissingAgentPrompt,
    #[error("Please select at least one user prompt")]
    NoSelectedPrompt,
    #[error("WebSocket connection not ready. Please try again.")]
    NotConnected,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub agent_prompt: String,
    prompts: Vec<UserPromptEntry>,
    conversations: Vec<Conversation>,
    phase: SessionPhase,
    next_prompt_id: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            agent_prompt: String::new(),
            prompts: vec![UserPromptEntry::empty(PromptId(1))],
            conversations: Vec::new(),
            phase: SessionPhase::Idle,
            next_prompt_id: 2,
        }
    }

    pub fn prompts(&self) -> &[UserPromptEntry] {
        &self.prompts
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Inputs are editable only between runs.
    pub fn is_locked(&self) -> bool {
        self.phase != SessionPhase::Idle
    }

    pub fn can_delete_prompt(&self) -> bool {
        self.prompts.len() > 1
    }

    pub fn set_agent_prompt(&mut self, text: impl Into<String>) {
        self.agent_prompt = text.into();
    }

    pub fn add_prompt(&mut self) -> PromptId {
        let id = PromptId(self.next_prompt_id);
        self.next_prompt_id += 1;
        self.prompts.push(UserPromptEntry::empty(id));
        id
    }

    pub fn toggle_prompt(&mut self, id: PromptId) {
        if let Some(prompt) = self.prompts.iter_mut().find(|p| p.id == id) {
            prompt.selected = !prompt.selected;
        }
    }

    pub fn update_prompt_text(&mut self, id: PromptId, text: impl Into<String>) {
        if let Some(prompt) = self.prompts.iter_mut().find(|p| p.id == id) {
            prompt.content = text.into();
        }
    }

    /// Refuses to remove the last remaining prompt. Returns whether anything was removed.
    pub fn delete_prompt(&mut self, id: PromptId) -> bool {
        if !self.can_delete_prompt() {
            return false;
        }
        let before = self.prompts.len();
        self.prompts.retain(|p| p.id != id);
        self.prompts.len() != before
    }

    fn runnable_prompts(&self) -> Vec<UserPromptEntry> {
        self.prompts.iter().filter(|p| p.is_runnable()).cloned().collect()
    }

    /// Validates the inputs, sends exactly one start request and enters
    /// `Simulating`. On rejection nothing changes.
    pub fn start_simulation(&mut self, link: &dyn RequestSink) -> Result<(), StartError> {
        if self.phase != SessionPhase::Idle {
            return Err(StartError::AlreadyRunning);
        }
        if self.agent_prompt.trim().is_empty() {
            return Err(StartError::MissingAgentPrompt);
        }
        let user_prompts = self.runnable_prompts();
        if user_prompts.is_empty() {
            return Err(StartError::NoSelectedPrompt);
        }
        if !link.is_open() {
            return Err(StartError::NotConnected);
        }

        let count = user_prompts.len();
        let request = ClientRequest::StartConversation {
            agent_prompt: self.agent_prompt.clone(),
            user_prompts,
        };
        link.send(&request).map_err(|e| {
            debug!("Start request not sent: {}", e);
            StartError::NotConnected
        })?;

        self.conversations.clear();
        self.phase = SessionPhase::Simulating;
        info!("Simulation started with {} user prompt(s)", count);
        Ok(())
    }

    /// Backs out of a run whose start request never reached the server.
    /// Once conversations arrive the run is real and is left alone.
    pub fn abort_start(&mut self) -> bool {
        if self.phase != SessionPhase::Simulating || !self.conversations.is_empty() {
            return false;
        }
        info!("Start request lost, back to idle");
        self.phase = SessionPhase::Idle;
        true
    }

    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::ConversationsCreated { conversations } => {
                self.apply_conversations_created(conversations)
            }
            ServerEvent::Message { conversation_id, message } => {
                self.apply_message(&conversation_id, message)
            }
            ServerEvent::Completion { conversation_id } => self.apply_completion(&conversation_id),
            ServerEvent::Unknown => {}
        }
    }

    pub fn apply_conversations_created(&mut self, created: Vec<ConversationSummary>) {
        self.conversations.extend(created.into_iter().map(Conversation::from));
        self.refresh_phase();
    }

    pub fn apply_message(&mut self, conversation_id: &str, message: Message) {
        match self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            Some(conv) => conv.messages.push(message),
            None => debug!("Message for unknown conversation {}", conversation_id),
        }
    }

    pub fn apply_completion(&mut self, conversation_id: &str) {
        match self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            Some(conv) => conv.status = ConversationStatus::Completed,
            None => debug!("Completion for unknown conversation {}", conversation_id),
        }
        self.refresh_phase();
    }

    fn refresh_phase(&mut self) {
        let all_done =
            !self.conversations.is_empty() && self.conversations.iter().all(Conversation::is_completed);
        self.phase = match (self.phase, all_done) {
            (SessionPhase::Simulating, true) => {
                info!("All {} conversations completed", self.conversations.len());
                SessionPhase::Completed
            }
            (SessionPhase::Completed, false) => SessionPhase::Simulating,
            (phase, _) => phase,
        };
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
