pub mod env;
mod loader;

pub use env::{AppConfig, ClassifierConfig, DirectoryConfig, PageConfig, PayloadStyle};
pub use loader::load_config;
