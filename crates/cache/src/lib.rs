pub mod market;
pub mod mem;
