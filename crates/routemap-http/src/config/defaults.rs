//! Default configuration values

pub struct MappingDefaults;

impl MappingDefaults {
    pub const TRAILING_SLASH_MATCH: bool = true;
    pub const CASE_SENSITIVE_MATCH: bool = true;
    pub const PATH_PREFIXES: &'static str = "";
}
