//! Command implementations.

pub mod clear;
pub mod extract;
pub mod graph;
pub mod health;
pub mod import;
pub mod search;
pub mod settings;

pub use self::clear::execute_clear;
pub use self::extract::execute_extract;
pub use self::graph::{execute_graph, execute_triples};
pub use self::health::execute_health;
pub use self::import::execute_import;
pub use self::search::execute_search;
pub use self::settings::execute_settings;
