//! service-core: shared configuration, errors, observability and HTTP middleware.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
