pub mod check;
pub mod move_cmd;
pub mod tree;

pub use check::check_command;
pub use move_cmd::move_command;
pub use tree::tree_command;
