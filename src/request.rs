//! Request dispatcher.
//!
//! From a resolved invocation this module builds the single outbound HTTP
//! call: GET and DELETE carry the resolved options as a query string, POST
//! and PUT as a form-encoded body. The response is either relayed to the
//! pluggable [`ResponseHandler`] or, when a `file` option was resolved,
//! written verbatim to that path. Transport failures are terminal; there is
//! no retry.

use crate::catalog::HttpMethod;
use crate::resolve::Invocation;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid request URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("API call failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to write output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Receives the response when no output file captures it.
pub trait ResponseHandler {
    fn handle(&self, status: StatusCode, body: &str);
}

/// Default handler: relays status and body verbatim to standard output.
pub struct LogResponseHandler;

impl ResponseHandler for LogResponseHandler {
    fn handle(&self, status: StatusCode, body: &str) {
        println!("{}", status);
        println!("{}", body);
    }
}

#[derive(Debug, PartialEq)]
pub enum RequestOutcome {
    /// The response was relayed to the handler.
    Handled(StatusCode),
    /// The response body was written to the given path; the handler was
    /// not invoked.
    WroteFile(PathBuf),
}

/// Issue the HTTP call for a resolved invocation.
pub async fn dispatch(
    client: &Client,
    base_url: &str,
    invocation: &Invocation,
    handler: &dyn ResponseHandler,
) -> Result<RequestOutcome, DispatchError> {
    let mut options = invocation.options.clone();

    // A resolved `file` option names a local output path and is never
    // transmitted.
    let output_file = options
        .remove("file")
        .map(|value| PathBuf::from(value_to_string(&value)));

    let url = match &invocation.task.route {
        Some(route) => format!("{}{}", base_url, route),
        None => base_url.to_string(),
    };
    url::Url::parse(&url).map_err(|source| DispatchError::InvalidUrl {
        url: url.clone(),
        source,
    })?;

    let pairs: Vec<(String, String)> = options
        .iter()
        .map(|(name, value)| (name.clone(), value_to_string(value)))
        .collect();

    let method = invocation.method;
    let mut request = client.request(reqwest_method(method), &url);
    if method.uses_query() {
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }
    } else {
        request = request.form(&pairs);
    }

    debug!("Dispatching {} {}", method, url);
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    debug!("Received {} ({} bytes)", status, body.len());

    match output_file {
        Some(path) => {
            std::fs::write(&path, &body).map_err(|source| DispatchError::OutputFile {
                path: path.clone(),
                source,
            })?;
            println!("Output written to {}", path.display());
            Ok(RequestOutcome::WroteFile(path))
        }
        None => {
            handler.handle(status, &body);
            Ok(RequestOutcome::Handled(status))
        }
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Post => reqwest::Method::POST,
    }
}

/// Render an option value for transmission. Scalars keep their natural
/// textual form; nested structures are sent as compact JSON.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
