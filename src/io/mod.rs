pub mod config_io;
pub mod day_io;
pub mod inventory_io;
pub mod journal_io;
pub mod lock;
pub mod paths;
pub mod state;
pub mod watcher;

pub use day_io::StoreError;
pub use paths::DataPaths;
