use crate::app::ports::{HttpClientPort, HttpResponse};
use crate::common::error::Result;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;

/// reqwest-backed client shared by every source and the phone lookup
pub struct ReqwestHttp {
    client: reqwest::Client,
    user_agent: String,
}

impl ReqwestHttp {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: user_agent.into(),
        }
    }

    async fn into_response(resp: reqwest::Response) -> Result<HttpResponse> {
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?.to_vec();
        tracing::debug!("HTTP response: status={}, size={} bytes", status, bytes.len());
        Ok(HttpResponse { status, bytes })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        tracing::debug!("HTTP GET request to: {}", url);
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;
        Self::into_response(resp).await
    }

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<HttpResponse> {
        tracing::debug!("HTTP POST form to: {}", url);
        let resp = self
            .client
            .post(url)
            .header(USER_AGENT, &self.user_agent)
            .form(form)
            .send()
            .await?;
        Self::into_response(resp).await
    }
}
