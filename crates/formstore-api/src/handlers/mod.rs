pub mod health;
pub mod storage;
pub mod submission;
