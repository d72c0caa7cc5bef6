pub mod block_ops;
pub mod quick_command;
pub mod task_ops;
