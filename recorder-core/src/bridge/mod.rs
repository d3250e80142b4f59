pub mod callback;
pub mod devices;
pub mod exports;
pub mod marshal;
pub mod session;
