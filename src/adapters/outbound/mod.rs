/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod archive;
pub mod console;
pub mod converter;
pub mod filesystem;
pub mod network;
