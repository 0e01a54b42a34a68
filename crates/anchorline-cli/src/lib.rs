pub mod chat;
pub mod cli;
pub mod config;

pub use chat::{run_chat, run_turn, EchoModel, Input, TurnReport};
pub use cli::{Cli, Commands, ConfigArgs};
