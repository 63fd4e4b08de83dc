pub(crate) mod download;
pub mod error;
pub mod policy;
pub mod store;
