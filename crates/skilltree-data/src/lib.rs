pub mod loader;
pub mod schema;

pub use loader::{
    DataLoadError, Format, load_config, load_definition, load_engine, load_graph, parse_tree_json,
};
pub use schema::TreeData;
