pub mod frame_handler;
pub mod library_loader;
