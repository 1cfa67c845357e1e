pub mod dash_map_store;
pub mod parallelism;
pub mod shared_store_state;
