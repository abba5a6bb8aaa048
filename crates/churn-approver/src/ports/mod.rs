//! Port definitions: the inbound API surface and the outbound capability
//! traits the service depends on.

pub mod inbound;
pub mod outbound;
