pub mod resolver;

pub use resolver::{EnumerationSource, ManufacturerEnumeration, ManufacturerResolver};
