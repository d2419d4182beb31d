pub mod prompt;
pub mod providers;
pub mod reaper;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod storage;
