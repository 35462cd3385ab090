pub mod common;
pub mod expr;
pub mod insert;
pub mod select;
