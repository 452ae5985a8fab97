pub mod color;
pub mod geom;
pub mod kernel;
