#[cfg(test)]
pub mod common;

mod renewer_lifecycle;
mod status_endpoint;
