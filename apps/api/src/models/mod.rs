pub mod content;
pub mod counter;
pub mod download;
pub mod order;
pub mod resume;
