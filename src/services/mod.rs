pub mod archive;
pub mod conversion;
pub mod converter;
pub mod error;
pub mod naming;
pub mod progress;
pub mod session;
pub mod transcoder;
pub mod worker;
pub mod workspace;
