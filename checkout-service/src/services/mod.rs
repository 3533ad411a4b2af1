pub mod database;
pub mod email;
pub mod fulfilment;
pub mod pricing;
pub mod stripe;

pub use database::CheckoutDb;
pub use email::{build_provider as build_email_provider, EmailProvider};
pub use stripe::StripeClient;
