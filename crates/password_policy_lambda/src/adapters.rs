pub mod identity;
pub mod password_policy;
pub mod response;
