// Middleware modules for the realty back office

pub mod auth;
pub mod auth_middleware;
pub mod cors;
pub mod realtor_guard;

// Re-export auth types
pub use auth::AuthenticatedUser;
pub use auth_middleware::auth_middleware;
pub use cors::dynamic_cors_middleware;
pub use realtor_guard::require_realtor;
