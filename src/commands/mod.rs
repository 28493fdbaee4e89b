pub mod fix;
pub mod list;
pub mod update;

pub use fix::fix;
pub use list::list;
pub use update::check_update;
