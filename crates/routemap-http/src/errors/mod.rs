pub mod lookup_error;
pub mod mapping_error;

pub use lookup_error::*;
pub use mapping_error::*;
