pub mod fuzzy;
pub mod unicode;
