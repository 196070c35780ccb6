use crate::common::error::Result;
use async_trait::async_trait;

// Fetch-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<HttpResponse>;
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Best-effort phone number lookup. `None` is the expected common case.
#[async_trait]
pub trait PhoneLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Option<String>;
}
