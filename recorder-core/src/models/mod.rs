pub mod config;
pub mod descriptor;
pub mod error;
pub mod state;
pub mod status;
