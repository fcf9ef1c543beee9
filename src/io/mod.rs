pub mod csv;
pub mod glob;
