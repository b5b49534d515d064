pub mod image;
pub mod kernel;
