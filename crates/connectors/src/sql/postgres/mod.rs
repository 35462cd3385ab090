pub mod adapter;
pub mod coercion;
pub mod data_type;
pub mod destination;
pub mod params;
pub mod row;
pub mod source;
pub mod utils;
