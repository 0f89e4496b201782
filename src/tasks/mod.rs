pub mod lobby;
pub mod scheduler;
pub mod watcher;
