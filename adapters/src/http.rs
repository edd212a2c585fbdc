//! reqwest-backed implementation of `HttpTransport`.
//!
//! This file contains the production transport: one shared `reqwest::Client`
//! with a cookie jar (so session cookies set by the API accompany every later
//! request), JSON default headers, and the conversion from `ApiRequest` to a
//! reqwest request, multipart bodies included.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart;

use crate::errors::AdapterError;
use crate::models::{ApiRequest, ApiResponse, Method, MultipartForm, RequestBody};
use crate::HttpTransport;

pub struct ReqwestTransport {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AdapterError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(AdapterError::Request("base URL must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Joins a base URL and a request path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn build_form(form: &MultipartForm) -> Result<multipart::Form, AdapterError> {
    let mut out = multipart::Form::new();
    for (name, value) in &form.fields {
        out = out.text(name.clone(), value.clone());
    }
    if let Some(file) = &form.file {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|err| AdapterError::Request(format!("Invalid file content type: {}", err)))?;
        out = out.part(file.field.clone(), part);
    }
    Ok(out)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, AdapterError> {
        let url = self.url_for(&request.path);
        let mut builder = self.client.request(to_reqwest_method(request.method), &url);

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            // reqwest sets the multipart boundary header, which wins over the
            // JSON default.
            RequestBody::Multipart(form) => builder.multipart(build_form(form)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        tracing::debug!("{} {} -> {}", request.method, url, status);

        Ok(ApiResponse::new(status, body.to_vec()))
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilePart;

    #[test]
    fn test_join_url_single_slash() {
        let base = "http://localhost:8000/api/v1/";
        assert_eq!(join_url(base, "/elections"), "http://localhost:8000/api/v1/elections");
        assert_eq!(join_url(base, "elections/3"), "http://localhost:8000/api/v1/elections/3");
        assert_eq!(
            join_url("http://localhost:8000/api/v1", "/auth/me"),
            "http://localhost:8000/api/v1/auth/me"
        );
    }

    #[test]
    fn test_join_url_empty_path() {
        assert_eq!(join_url("http://api", ""), "http://api");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            ReqwestTransport::new("  "),
            Err(AdapterError::Request(_))
        ));
    }

    #[test]
    fn test_bad_file_content_type_rejected() {
        let form = MultipartForm::new().file(FilePart {
            field: "pdfFile".to_string(),
            file_name: "rules.pdf".to_string(),
            content_type: "not a mime".to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        });
        assert!(matches!(build_form(&form), Err(AdapterError::Request(_))));
    }
}
