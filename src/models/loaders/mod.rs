pub mod json_loader;

pub use json_loader::{list_raw_files, load_group_database, load_raw_batch, save_group_database};
