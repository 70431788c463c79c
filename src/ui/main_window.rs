use adw::prelude::*;
use adw::Application;
use log::{error, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use url::Url;

use crate::api::client::ApiClient;
use crate::api::connection::{ConnectionEvent, ConnectionHandle, ConnectionManager};
use crate::api::error::ClientError;
use crate::api::models::{ClientId, ConnectionStatus};
use crate::app::AppConfig;
use crate::state::{SessionPhase, StartError, ViewState};
use crate::ui::chat_view::ConversationList;
use crate::ui::prompt_editor::PromptEditor;
use crate::ui::style;

struct Simulator {
    config: RefCell<AppConfig>,
    store: Rc<RefCell<ViewState>>,
    connection: Option<ConnectionHandle>,
    status: Cell<ConnectionStatus>,
    overlay: adw::ToastOverlay,
    badge: gtk4::Label,
    theme_btn: gtk4::Button,
    start_btn: gtk4::Button,
    reset_btn: gtk4::Button,
    editor: Rc<PromptEditor>,
    conversations: ConversationList,
}

impl Simulator {
    fn toast(&self, text: &str) {
        self.overlay.add_toast(adw::Toast::new(text));
    }

    fn render(&self) {
        self.render_badge();
        self.editor.sync_from_store();
        self.render_run();
    }

    fn render_badge(&self) {
        let (label, class) = style::connection_badge(self.status.get());
        self.badge.set_label(label);
        for c in ["connected", "disconnected", "pending"] {
            self.badge.remove_css_class(c);
        }
        self.badge.add_css_class(class);
    }

    /// Controls and conversation cards; leaves the prompt rows alone.
    fn render_run(&self) {
        let state = self.store.borrow();
        let phase = state.phase();
        let controls = style::controls_for(phase, self.status.get());
        self.start_btn.set_label(style::start_button_label(phase));
        self.start_btn.set_sensitive(controls.start);
        self.reset_btn.set_sensitive(controls.reset);
        self.editor.set_locked(controls.editors_locked);
        self.conversations.render(state.conversations(), phase);
    }

    fn handle_event(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Status(status) => {
                self.status.set(status);
                self.render_badge();
                self.render_run();
            }
            ConnectionEvent::Server(event) => {
                self.store.borrow_mut().apply(event);
                self.render_run();
            }
            ConnectionEvent::RetriesExhausted { attempts } => {
                self.toast(&format!("Gave up reconnecting after {} attempts.", attempts));
            }
            ConnectionEvent::RequestLost(request) => {
                warn!("Request never reached the server: {:?}", request);
                if self.store.borrow_mut().abort_start() {
                    self.render_run();
                }
                self.toast("Connection dropped before the simulation could start. Please try again.");
            }
        }
    }

    fn start(&self) {
        let result = {
            let mut store = self.store.borrow_mut();
            match &self.connection {
                Some(link) => store.start_simulation(link),
                None => Err(StartError::NotConnected),
            }
        };
        match result {
            Ok(()) => self.render_run(),
            Err(e) => {
                info!("Start rejected: {}", e);
                self.toast(&e.to_string());
            }
        }
    }

    fn reset(&self) {
        if self.store.borrow().phase() == SessionPhase::Simulating {
            return;
        }
        self.store.borrow_mut().reset();
        self.render();
    }

    fn toggle_theme(&self) {
        let mut config = self.config.borrow_mut();
        config.dark_mode = !config.dark_mode;
        style::apply_theme(config.dark_mode);
        self.theme_btn.set_label(style::theme_button_label(config.dark_mode));
        if let Err(e) = config.save() {
            warn!("Could not save theme preference: {}", e);
        }
    }

    fn check_server(self: &Rc<Self>, endpoint: Url) {
        let weak = Rc::downgrade(self);
        crate::utils::run_async_to_main(
            probe(endpoint),
            move |res| {
                let Some(sim) = weak.upgrade() else { return };
                match res {
                    Ok(status) => sim.toast(&format!("Server health: {}", status)),
                    Err(e) => sim.toast(&format!("Server check failed: {}", e)),
                }
            },
        );
    }
}

async fn probe(endpoint: Url) -> Result<String, ClientError> {
    ApiClient::new()?.health(&endpoint).await
}

fn open_connection(
    endpoint: &Url,
    config: &AppConfig,
) -> Option<(ConnectionHandle, tokio::sync::mpsc::UnboundedReceiver<ConnectionEvent>)> {
    let client_id = ClientId::generate();
    info!("Client id {}", client_id);
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    match ConnectionManager::connect(endpoint, &client_id, config.reconnect.policy(), events_tx) {
        Ok((handle, task)) => {
            crate::utils::spawn_async(task);
            Some((handle, events_rx))
        }
        Err(e) => {
            error!("Cannot connect to {}: {}", endpoint, e);
            None
        }
    }
}

pub fn show_main_window(app: &Application, config: AppConfig) {
    style::install_css();
    style::apply_theme(config.dark_mode);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("AI Conversation Simulator")
        .default_width(960)
        .default_height(720)
        .build();

    let overlay = adw::ToastOverlay::new();

    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some("Conversation Simulator"));
    header.set_title_widget(Some(&title));
    let badge = gtk4::Label::new(None);
    badge.add_css_class("status-badge");
    header.pack_start(&badge);
    let theme_btn = gtk4::Button::with_label(style::theme_button_label(config.dark_mode));
    header.pack_end(&theme_btn);
    let health_btn = gtk4::Button::with_label("Check Server");
    header.pack_end(&health_btn);

    let store = Rc::new(RefCell::new(ViewState::new()));
    let editor = PromptEditor::new(store.clone());

    let controls = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    let start_btn = gtk4::Button::with_label(style::start_button_label(SessionPhase::Idle));
    start_btn.add_css_class("suggested-action");
    start_btn.set_hexpand(true);
    let reset_btn = gtk4::Button::with_label("Reset");
    reset_btn.add_css_class("destructive-action");
    controls.append(&start_btn);
    controls.append(&reset_btn);

    let conversations = ConversationList::default();

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 18);
    content.set_margin_top(16);
    content.set_margin_bottom(16);
    content.set_margin_start(16);
    content.set_margin_end(16);
    content.append(&editor.widget());
    content.append(&controls);
    content.append(&conversations.widget());

    let clamp = adw::Clamp::builder().maximum_size(960).child(&content).build();
    let scroller = gtk4::ScrolledWindow::builder().vexpand(true).child(&clamp).build();
    overlay.set_child(Some(&scroller));

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));

    let endpoint = match crate::utils::normalize_ws_url(&config.endpoint) {
        Ok(url) => Some(url),
        Err(e) => {
            error!("Invalid endpoint {:?}: {}", config.endpoint, e);
            overlay.add_toast(adw::Toast::new(&format!("Invalid simulator endpoint: {}", e)));
            None
        }
    };
    let (connection, events_rx) = match endpoint.as_ref().and_then(|url| open_connection(url, &config)) {
        Some((handle, rx)) => (Some(handle), Some(rx)),
        None => (None, None),
    };
    let initial_status =
        if connection.is_some() { ConnectionStatus::Connecting } else { ConnectionStatus::Disconnected };

    let sim = Rc::new(Simulator {
        config: RefCell::new(config),
        store,
        connection,
        status: Cell::new(initial_status),
        overlay,
        badge,
        theme_btn: theme_btn.clone(),
        start_btn: start_btn.clone(),
        reset_btn: reset_btn.clone(),
        editor,
        conversations,
    });
    sim.render();

    if let Some(mut events_rx) = events_rx {
        let weak = Rc::downgrade(&sim);
        glib::MainContext::default().spawn_local(async move {
            while let Some(event) = events_rx.recv().await {
                let Some(sim) = weak.upgrade() else { break };
                sim.handle_event(event);
            }
        });
    }

    {
        let weak = Rc::downgrade(&sim);
        start_btn.connect_clicked(move |_| {
            if let Some(sim) = weak.upgrade() {
                sim.start();
            }
        });
    }
    {
        let weak = Rc::downgrade(&sim);
        reset_btn.connect_clicked(move |_| {
            if let Some(sim) = weak.upgrade() {
                sim.reset();
            }
        });
    }
    {
        let weak = Rc::downgrade(&sim);
        theme_btn.connect_clicked(move |_| {
            if let Some(sim) = weak.upgrade() {
                sim.toggle_theme();
            }
        });
    }
    {
        let weak = Rc::downgrade(&sim);
        health_btn.connect_clicked(move |_| {
            let Some(sim) = weak.upgrade() else { return };
            match endpoint.clone() {
                Some(url) => sim.check_server(url),
                None => sim.toast("No valid simulator endpoint configured."),
            }
        });
    }

    // the window owns the simulator; tear the socket down with it
    window.connect_close_request(move |_| {
        if let Some(link) = &sim.connection {
            link.close();
        }
        glib::Propagation::Proceed
    });

    window.present();
}
