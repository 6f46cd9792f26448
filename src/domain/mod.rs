pub mod enumeration;
pub mod errors;
pub mod reads;
pub mod records;
