use crate::api::models::{ConnectionStatus, Conversation, ConversationStatus};
use crate::state::SessionPhase;

const CSS: &str = r#"
.status-badge { padding: 2px 10px; border-radius: 6px; color: white; font-weight: bold; }
.status-badge.connected { background-color: @success_color; }
.status-badge.disconnected { background-color: @error_color; }
.status-badge.pending { background-color: @warning_color; }
.conversation-card { padding: 16px; }
.bubble { padding: 10px 14px; border-radius: 10px; }
.bubble.agent { background-color: alpha(@accent_bg_color, 0.18); }
.bubble.user { background-color: alpha(@success_color, 0.18); }
.bubble-time { font-size: smaller; opacity: 0.7; }
"#;

pub fn install_css() {
    let provider = gtk4::CssProvider::new();
    provider.load_from_data(CSS);
    if let Some(display) = gtk4::gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

pub fn apply_theme(dark: bool) {
    let scheme = if dark { adw::ColorScheme::ForceDark } else { adw::ColorScheme::ForceLight };
    adw::StyleManager::default().set_color_scheme(scheme);
}

pub fn theme_button_label(dark: bool) -> &'static str {
    if dark { "Light Mode" } else { "Dark Mode" }
}

/// Label and css class for the connection badge.
pub fn connection_badge(status: ConnectionStatus) -> (&'static str, &'static str) {
    match status {
        ConnectionStatus::Connected => ("Connected", "connected"),
        ConnectionStatus::Disconnected => ("Disconnected", "disconnected"),
        ConnectionStatus::Connecting => ("Connecting...", "pending"),
        ConnectionStatus::Error => ("Connection Error", "pending"),
    }
}

pub fn start_button_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "Start Simulation",
        SessionPhase::Simulating => "Simulating...",
        SessionPhase::Completed => "Simulation Complete",
    }
}

/// Which run controls accept input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub reset: bool,
    pub editors_locked: bool,
}

pub fn controls_for(phase: SessionPhase, status: ConnectionStatus) -> Controls {
    Controls {
        start: phase == SessionPhase::Idle && status == ConnectionStatus::Connected,
        reset: phase != SessionPhase::Simulating,
        editors_locked: phase != SessionPhase::Idle,
    }
}

pub fn conversation_title(conv: &Conversation) -> String {
    let short: String = conv.id.chars().take(8).collect();
    format!("Conversation #{}...", short)
}

pub fn conversation_badge(status: ConversationStatus) -> (&'static str, &'static str) {
    match status {
        ConversationStatus::Completed => ("Completed", "connected"),
        ConversationStatus::InProgress => ("In Progress", "pending"),
    }
}
