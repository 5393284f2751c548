pub mod ranges;
pub mod tables;
pub mod token_file;
