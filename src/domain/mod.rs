// Domain module: graph, formulation and result models

pub mod coloring;
pub mod graph;
pub mod instance;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use coloring::*;
pub use graph::*;
pub use instance::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
