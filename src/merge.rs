pub mod job;
pub mod pack;
pub mod pipeline;
