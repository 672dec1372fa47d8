pub mod catalog;
pub mod collection_log;
pub mod completion;
pub mod health;
