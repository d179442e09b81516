pub mod backend;
pub mod chat;
pub mod commands;
pub mod docs;
pub mod health;
pub mod prompt;
pub mod render;
pub mod state;
#[cfg(test)]
mod testing;
