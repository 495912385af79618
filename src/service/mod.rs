//! Service layer containing business logic orchestration.

mod adapter;
mod rewrite_service;

pub use rewrite_service::RewriteService;
