pub mod config;
pub mod logchamp;
pub mod message_queue;
pub mod telegram_chat;
pub mod transient_store;

#[cfg(test)]
pub mod test_fixtures;
