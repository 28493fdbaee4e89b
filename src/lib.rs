pub mod commands;
pub mod context;
pub mod feedback;
pub mod filter;
pub mod output;
pub mod plist;
pub mod scan;
pub mod types;
pub mod updater;
