pub mod host;
pub mod library;
pub mod remote;
