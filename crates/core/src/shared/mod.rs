pub mod constants;
pub mod detection;
pub mod dimensions;
pub mod frame;
