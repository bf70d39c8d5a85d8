pub mod proc_loader;
pub mod proc_validator;
pub mod session;
pub mod settings;
pub mod sources;
