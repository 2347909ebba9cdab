pub mod models;
pub mod template;
pub mod symmetry;
pub mod matcher;
pub mod session;
pub mod grid;
