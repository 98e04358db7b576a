mod component;
mod deferred;
mod edge_path;
mod graph;
mod highlight;
mod layout;
mod render;
mod state;
mod theme;
mod types;
mod viewport;

pub use component::FlowCanvas;
pub use types::GraphConfig;
