pub mod product;
pub mod user;
pub mod user_identity;
pub mod user_secret;
