pub mod migrate;
pub mod transform;
