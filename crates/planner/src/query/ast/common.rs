//! Defines common, reusable AST nodes for building SQL queries.

pub use model::spec::table::TableRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}
