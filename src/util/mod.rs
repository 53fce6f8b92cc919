pub mod eol;
pub mod unicode;
