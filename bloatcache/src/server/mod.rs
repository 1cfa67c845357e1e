pub mod main;
pub mod timer;
