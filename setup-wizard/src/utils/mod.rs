pub mod logging;
pub mod path_resolver;
pub mod placeholders;
pub mod privilege;
