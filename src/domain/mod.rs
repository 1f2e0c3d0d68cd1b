pub mod grid_logic;
pub mod models;
pub mod registry_model;
