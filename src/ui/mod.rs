pub mod chat_view;
pub mod main_window;
pub mod prompt_editor;
pub mod style;
