pub mod document;
pub mod lock;
pub mod settings;
