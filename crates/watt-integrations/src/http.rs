//! HTTP utilities shared by sink implementations.

use crate::traits::SinkError;

/// Extension trait for `reqwest::Response` to handle the store's write
/// contract.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Treat anything other than HTTP 200 or 201 as a rejected write,
    /// capturing the status code and response body.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Rejected` for any other status
    async fn ensure_saved(self, sink: &'static str) -> Result<Self, SinkError>
    where
        Self: Sized;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn ensure_saved(self, sink: &'static str) -> Result<Self, SinkError> {
        let status = self.status();
        if matches!(status.as_u16(), 200 | 201) {
            Ok(self)
        } else {
            let body = self.text().await.unwrap_or_default();
            Err(SinkError::Rejected { sink, status, body })
        }
    }
}
