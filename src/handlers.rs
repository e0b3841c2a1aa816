pub mod admin;
pub mod applications;
pub mod appointments;
pub mod auth;
pub mod coupons;
pub mod partners;
pub mod products;
pub mod revenues;
pub mod tickets;
