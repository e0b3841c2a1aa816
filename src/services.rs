pub mod intent_log;
pub mod mail;
pub mod mirror;
pub mod projection;
pub mod storage_service;

pub mod application_service;
pub mod appointment_service;
pub mod auth;
pub mod coupon_service;
pub mod document_service;
pub mod finance_service;
pub mod product_service;
pub mod profile_service;
pub mod ticket_service;
