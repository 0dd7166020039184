mod command_def;
mod command_handler;

pub use command_def::FeedCommand;
pub use command_handler::handle_feed_command;
