//! Tiered response cache.
//!
//! - [`l1`] - exact tier: fingerprint-keyed Valkey/Redis store with TTL.
//! - [`l2`] - semantic tier: embedding-similarity store with context
//!   filters, polymorphic over OpenSearch and pgvector.
//!
//! Both tiers are best-effort: every transport failure is logged and
//! downgraded to a miss (reads) or a silent drop (writes). A cache
//! outage must never change a request's observable outcome.

pub mod l1;
pub mod l2;
