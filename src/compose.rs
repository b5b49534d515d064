pub mod compound;
pub mod mask;
pub mod mirror;
