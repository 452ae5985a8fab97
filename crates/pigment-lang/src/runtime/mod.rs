pub mod interpreter;
pub mod iterate;
pub mod ops;
pub mod value;
