use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::state::ViewState;

/// Agent prompt text area plus the editable list of user prompts.
pub struct PromptEditor {
    root: gtk::Box,
    agent_view: gtk::TextView,
    rows: gtk::Box,
    add_btn: gtk::Button,
    store: Rc<RefCell<ViewState>>,
}

impl PromptEditor {
    pub fn new(store: Rc<RefCell<ViewState>>) -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 12);

        let agent_view = gtk::TextView::builder()
            .wrap_mode(gtk::WrapMode::WordChar)
            .top_margin(8)
            .bottom_margin(8)
            .left_margin(8)
            .right_margin(8)
            .build();
        let agent_scroller = gtk::ScrolledWindow::builder()
            .min_content_height(96)
            .hexpand(true)
            .child(&agent_view)
            .build();
        agent_scroller.add_css_class("card");
        let agent_title = gtk::Label::new(Some("Agent Prompt"));
        agent_title.add_css_class("heading");
        agent_title.set_halign(gtk::Align::Start);
        root.append(&agent_title);
        root.append(&agent_scroller);

        let prompts_title = gtk::Label::new(Some("User Prompts"));
        prompts_title.add_css_class("title-4");
        prompts_title.set_halign(gtk::Align::Start);
        prompts_title.set_margin_top(12);
        root.append(&prompts_title);

        let rows = gtk::Box::new(gtk::Orientation::Vertical, 8);
        root.append(&rows);

        let add_btn = gtk::Button::with_label("Add New Prompt");
        add_btn.set_halign(gtk::Align::Start);
        root.append(&add_btn);

        {
            let store = store.clone();
            agent_view.buffer().connect_changed(move |buffer| {
                let text = buffer.text(&buffer.start_iter(), &buffer.end_iter(), false);
                store.borrow_mut().set_agent_prompt(text.as_str());
            });
        }

        let editor = Rc::new(Self { root, agent_view, rows, add_btn, store });
        {
            let weak = Rc::downgrade(&editor);
            editor.add_btn.connect_clicked(move |_| {
                if let Some(editor) = weak.upgrade() {
                    editor.store.borrow_mut().add_prompt();
                    editor.rebuild_rows();
                }
            });
        }
        editor.rebuild_rows();
        editor
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn set_locked(&self, locked: bool) {
        self.agent_view.set_editable(!locked);
        self.agent_view.set_sensitive(!locked);
        self.rows.set_sensitive(!locked);
        self.add_btn.set_sensitive(!locked);
    }

    /// Pulls every input back out of the store, e.g. after a reset.
    pub fn sync_from_store(self: &Rc<Self>) {
        let (text, locked) = {
            let state = self.store.borrow();
            (state.agent_prompt.clone(), state.is_locked())
        };
        let buffer = self.agent_view.buffer();
        let current = buffer.text(&buffer.start_iter(), &buffer.end_iter(), false);
        if current.as_str() != text {
            buffer.set_text(&text);
        }
        self.rebuild_rows();
        self.set_locked(locked);
    }

    pub fn rebuild_rows(self: &Rc<Self>) {
        while let Some(child) = self.rows.first_child() {
            self.rows.remove(&child);
        }
        let state = self.store.borrow();
        let can_delete = state.can_delete_prompt();
        for prompt in state.prompts() {
            let id = prompt.id;
            let row = gtk::Box::new(gtk::Orientation::Horizontal, 12);

            let check = gtk::CheckButton::new();
            check.set_active(prompt.selected);
            let entry = gtk::Entry::new();
            entry.set_hexpand(true);
            entry.set_text(&prompt.content);
            entry.set_placeholder_text(Some(&format!("User Prompt {}", id)));
            let delete_btn = gtk::Button::from_icon_name("user-trash-symbolic");
            delete_btn.add_css_class("flat");
            delete_btn.add_css_class("destructive-action");
            delete_btn.set_sensitive(can_delete);

            // handlers go on after the initial values so they don't fire under the borrow
            {
                let store = self.store.clone();
                check.connect_toggled(move |_| store.borrow_mut().toggle_prompt(id));
            }
            {
                let store = self.store.clone();
                entry.connect_changed(move |e| store.borrow_mut().update_prompt_text(id, e.text().as_str()));
            }
            {
                let weak = Rc::downgrade(self);
                delete_btn.connect_clicked(move |_| {
                    if let Some(editor) = weak.upgrade() {
                        let removed = editor.store.borrow_mut().delete_prompt(id);
                        if removed {
                            editor.rebuild_rows();
                        }
                    }
                });
            }

            row.append(&check);
            row.append(&entry);
            row.append(&delete_btn);
            self.rows.append(&row);
        }
    }
}
