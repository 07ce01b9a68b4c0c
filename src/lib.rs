pub mod collect;
pub mod distance_matrix;
pub mod fetch;
pub mod grid;
pub mod persist;
pub mod table;
pub mod traffic_model;
