pub mod catalog;
pub mod format;
pub mod loader;
pub mod manifest;
pub mod scanner;
