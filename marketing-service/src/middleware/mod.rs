pub mod api_key_auth;
pub mod master_key;

pub use api_key_auth::{api_key_auth_middleware, CurrentApiKey, API_KEY_HEADER};
pub use master_key::{master_key_middleware, MASTER_KEY_HEADER};
