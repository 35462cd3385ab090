pub mod insert;
pub mod select;
pub mod table;
