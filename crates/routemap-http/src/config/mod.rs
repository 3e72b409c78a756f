pub mod defaults;
pub mod mapping_config;

pub use defaults::*;
pub use mapping_config::*;
