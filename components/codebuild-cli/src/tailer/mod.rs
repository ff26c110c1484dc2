pub mod models;
pub mod tailer;
