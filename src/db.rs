pub mod store;
pub mod collections;
pub mod memory_store;
pub mod pg_store;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod ticket_repo;
pub use ticket_repo::TicketRepository;
pub mod application_repo;
pub use application_repo::ApplicationRepository;
pub mod appointment_repo;
pub use appointment_repo::AppointmentRepository;
pub mod coupon_repo;
pub use coupon_repo::CouponRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod partner_repo;
pub use partner_repo::PartnerRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
