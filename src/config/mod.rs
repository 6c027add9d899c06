pub mod knowledge;
pub mod prompt;
pub mod settings;
