/// Read-through and forced access to the codes of a game.
pub mod codes_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// User preferences keyed by name.
pub mod prefs_service;
/// Redeemed codes ledger.
pub mod redeemed_service;
/// Per-game fetch, diff and change emission.
pub mod refresh_pipeline;
/// Periodic background refresh.
pub mod scheduler;
/// Server-Sent Events streaming of change events.
pub mod sse_service;
/// Storage backend supervision and degraded mode handling.
pub mod storage_supervisor;
