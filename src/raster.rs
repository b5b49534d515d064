pub mod image;
pub mod memory;
