pub mod callbacks;
pub mod commands;
pub mod files;
pub mod messages;
pub mod replies;
