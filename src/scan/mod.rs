pub mod library;
pub mod root;
mod scanner;

pub use library::{find_library, reference_version};
pub use root::find_workflows_dir;
pub use scanner::{ScanEntry, ScanOptions, SkipReason, inspect, scan_workflows};

#[cfg(test)]
pub(crate) use scanner::tests::make_workflow;
