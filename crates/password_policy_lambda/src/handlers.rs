pub mod credentials;
pub mod entry;
pub mod lifecycle;
pub mod policy;
