pub mod admin_key;

pub use admin_key::{admin_key_middleware, ADMIN_KEY_HEADER};
