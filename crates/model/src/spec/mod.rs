pub mod rule;
pub mod table;
