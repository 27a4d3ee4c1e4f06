pub mod help;
pub mod parser;
pub mod types;

pub use parser::parse_command;
pub use types::{
    CalendarAddArgs, Command, EmailCommand, EmailTarget, FileCommand, TodoAddArgs,
};
