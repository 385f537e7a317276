use std::future::Future;

use crate::error::BoxError;

/// The single HTTP capability the content client needs.
pub trait HttpClient: Send + Sync {
    fn send(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response, BoxError>> + Send;
}

impl HttpClient for reqwest::Client {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        let response = self.execute(request).await?;
        Ok(response)
    }
}
