pub mod error;
pub mod geo;
pub mod sample;
