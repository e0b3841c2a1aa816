pub mod status;

pub mod application;
pub mod appointment;
pub mod auth;
pub mod coupon;
pub mod finance;
pub mod intent;
pub mod partner;
pub mod product;
pub mod ticket;
