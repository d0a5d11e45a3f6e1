pub mod admin;
pub mod category;
pub mod contact;
pub mod health;
pub mod product;
pub mod rate_limit;
pub mod session;
