pub mod block;
pub mod config;
pub mod inventory;
pub mod schedule;
pub mod time;

pub use block::*;
pub use config::*;
pub use inventory::*;
pub use schedule::*;
pub use time::*;
