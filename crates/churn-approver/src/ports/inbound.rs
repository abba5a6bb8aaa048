//! # Inbound Port (Driving Port / API)
//!
//! The request/response contract exposed to the transport layer. The RPC
//! framework carrying it is out of scope; any server that can decode a
//! `ChurnRequest` and encode a `ChurnReply` can front this trait.

use crate::domain::entities::{ChurnReply, ChurnRequest};
use crate::domain::errors::ChurnError;

/// Primary churn approval API.
///
/// Implementations must be thread-safe; the transport invokes this
/// concurrently, one task per inbound call. Failures are structured
/// `ChurnError` kinds — no partial replies.
#[async_trait::async_trait]
pub trait ChurnApi: Send + Sync {
    /// Validate, decide, and sign one churn request.
    async fn churn(&self, request: ChurnRequest) -> Result<ChurnReply, ChurnError>;
}
