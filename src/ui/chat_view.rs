use gtk4::prelude::*;
use gtk4 as gtk;

use crate::api::models::{Conversation, Message};
use crate::state::SessionPhase;
use crate::ui::style;

/// Stack of conversation cards, rebuilt from the store on every update.
pub struct ConversationList {
    root: gtk::Box,
}

impl Default for ConversationList {
    fn default() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 16);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        Self { root }
    }
}

impl ConversationList {
    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn render(&self, conversations: &[Conversation], phase: SessionPhase) {
        while let Some(child) = self.root.first_child() {
            self.root.remove(&child);
        }
        if conversations.is_empty() && phase == SessionPhase::Idle {
            let empty = gtk::Label::new(Some(
                "No conversations yet. Configure your prompts and start a simulation.",
            ));
            empty.add_css_class("card");
            empty.add_css_class("conversation-card");
            empty.add_css_class("dim-label");
            self.root.append(&empty);
            return;
        }
        for conv in conversations {
            self.root.append(&conversation_card(conv));
        }
    }
}

fn conversation_card(conv: &Conversation) -> gtk::Widget {
    let card = gtk::Box::new(gtk::Orientation::Vertical, 12);
    card.add_css_class("card");
    card.add_css_class("conversation-card");

    let header = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let title = gtk::Label::new(Some(&style::conversation_title(conv)));
    title.add_css_class("heading");
    title.set_halign(gtk::Align::Start);
    title.set_hexpand(true);
    let (badge_text, badge_class) = style::conversation_badge(conv.status);
    let badge = gtk::Label::new(Some(badge_text));
    badge.add_css_class("status-badge");
    badge.add_css_class(badge_class);
    header.append(&title);
    header.append(&badge);
    card.append(&header);

    let origin = gtk::Label::new(Some(&format!("User Prompt {}", conv.user_prompt_id)));
    origin.add_css_class("caption");
    origin.add_css_class("dim-label");
    origin.set_halign(gtk::Align::Start);
    card.append(&origin);

    if conv.messages.is_empty() {
        let waiting = gtk::Label::new(Some("Waiting for messages..."));
        waiting.add_css_class("dim-label");
        card.append(&waiting);
    } else {
        for msg in &conv.messages {
            card.append(&bubble(msg));
        }
    }
    card.upcast()
}

fn bubble(msg: &Message) -> gtk::Widget {
    let bubble = gtk::Box::new(gtk::Orientation::Vertical, 4);
    bubble.add_css_class("bubble");
    if msg.is_agent() {
        bubble.add_css_class("agent");
        bubble.set_halign(gtk::Align::Start);
    } else {
        bubble.add_css_class("user");
        bubble.set_halign(gtk::Align::End);
    }

    let role = gtk::Label::new(Some(&msg.role));
    role.add_css_class("caption-heading");
    role.set_halign(gtk::Align::Start);

    let content = gtk::Label::new(Some(&msg.content));
    content.set_wrap(true);
    content.set_wrap_mode(gtk::pango::WrapMode::WordChar);
    content.set_max_width_chars(60);
    content.set_xalign(0.0);
    content.set_selectable(true);

    let time = gtk::Label::new(Some(&msg.timestamp.display_time()));
    time.add_css_class("bubble-time");
    time.set_halign(gtk::Align::Start);

    bubble.append(&role);
    bubble.append(&content);
    bubble.append(&time);
    bubble.upcast()
}
