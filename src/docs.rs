// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::upload_photo,
        handlers::coupons::list_user_coupons,

        // --- Admin ---
        handlers::admin::list_users,
        handlers::admin::set_claims,
        handlers::admin::resume_intents,

        // --- Tickets ---
        handlers::tickets::list_tickets,
        handlers::tickets::stream_tickets,
        handlers::tickets::open_ticket,
        handlers::tickets::get_ticket,
        handlers::tickets::update_ticket_status,
        handlers::tickets::batch_delete_tickets,
        handlers::tickets::list_messages,
        handlers::tickets::post_message,

        // --- Applications ---
        handlers::applications::submit_application,
        handlers::applications::list_applications,
        handlers::applications::get_application,
        handlers::applications::update_application_status,

        // --- Appointments ---
        handlers::appointments::list_appointments,
        handlers::appointments::get_appointment,
        handlers::appointments::confirm_appointment,
        handlers::appointments::cancel_appointment,
        handlers::appointments::reschedule_appointment,
        handlers::appointments::appointment_qr,

        // --- Coupons ---
        handlers::coupons::lookup_coupon,
        handlers::coupons::redeem_coupon,
        handlers::coupons::delete_coupon,

        // --- Partners ---
        handlers::partners::list_partners,
        handlers::partners::get_partner,
        handlers::partners::upload_logo,

        // --- Products ---
        handlers::products::create_product,
        handlers::products::list_my_products,
        handlers::products::list_partner_products,
        handlers::products::delete_product,
        handlers::products::review_product,

        // --- Revenues ---
        handlers::revenues::record_payment,
        handlers::revenues::list_revenues,
        handlers::revenues::revenue_summary,
        handlers::revenues::revenue_statement,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::UserAccount,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UpdateClaimsPayload,

            // --- Status ---
            models::status::StatusBadge,

            // --- Tickets ---
            models::ticket::AppointmentRef,
            models::ticket::Ticket,
            models::ticket::ConversationMessage,
            models::ticket::TicketListItem,
            models::ticket::TicketListResponse,
            models::ticket::BatchDeleteResponse,
            services::ticket_service::TicketStatusReport,
            services::projection::TicketFilter,
            services::projection::TicketSortKey,
            services::projection::SortOrder,
            handlers::tickets::OpenTicketPayload,
            handlers::tickets::UpdateTicketStatusPayload,
            handlers::tickets::BatchDeletePayload,
            handlers::tickets::PostMessagePayload,

            // --- Applications ---
            models::application::ApplicantInfo,
            models::application::BusinessInfo,
            models::application::PartnerApplication,
            models::application::ApplicationListItem,
            models::application::ApplicationStatusReport,
            services::projection::NameSearch,
            handlers::applications::SubmitApplicationPayload,
            handlers::applications::UpdateApplicationStatusPayload,

            // --- Appointments ---
            models::appointment::Appointment,
            models::appointment::AppointmentOutcomeKind,
            models::appointment::AppointmentOutcome,
            handlers::appointments::ScanPayload,
            handlers::appointments::ReschedulePayload,

            // --- Coupons ---
            models::coupon::CouponDetails,
            models::coupon::SurveyCoupon,
            models::coupon::CouponView,
            models::coupon::RedeemOutcomeKind,
            models::coupon::RedeemOutcome,
            handlers::coupons::CouponScanPayload,
            handlers::coupons::DeleteCouponPayload,

            // --- Partners / Products ---
            models::partner::Partner,
            models::product::Product,
            models::product::ProductView,
            services::product_service::CreateProductPayload,
            handlers::products::ReviewProductPayload,

            // --- Revenues ---
            models::finance::Payment,
            models::finance::RevenueSummary,
            services::finance_service::RecordPaymentPayload,

            // --- Intents ---
            services::intent_log::IntentReport,
            services::intent_log::ResumeSummary,
            handlers::admin::UserListParams,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Admin", description = "Usuários, papéis e intenções pendentes"),
        (name = "Tickets", description = "Atendimento ao cliente e conversas"),
        (name = "Applications", description = "Candidaturas de novos parceiros"),
        (name = "Appointments", description = "Agendamentos e confirmação por QR code"),
        (name = "Coupons", description = "Cupons de pesquisa e resgate"),
        (name = "Partners", description = "Parceiros e logos"),
        (name = "Products", description = "Catálogo dos parceiros e moderação"),
        (name = "Revenues", description = "Receitas dos parceiros e extratos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
