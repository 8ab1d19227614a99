//! API constants

/// Route prefix shared by every artefact endpoint
pub const API_PREFIX: &str = "/api/artefacts";

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
