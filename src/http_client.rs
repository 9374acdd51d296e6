use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::{ScraperConfig, base_headers};

const BODY_SNIPPET_CHARS: usize = 220;

/// One session for the whole run: base headers plus a fixed per-request deadline.
pub fn http_client(cfg: &ScraperConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in base_headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name {name}"))?;
        headers.insert(name, HeaderValue::from_static(value));
    }
    Client::builder()
        .default_headers(headers)
        .timeout(cfg.request_timeout)
        .build()
        .context("failed to build http client")
}

/// GET `url` and return the body, failing on any non-2xx status.
/// Headers passed here take precedence over the session defaults.
pub fn get_json_body(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
    extra_headers: &[(&str, String)],
) -> Result<String> {
    let mut req = client.get(url).query(query);
    for (name, value) in extra_headers {
        req = req.header(*name, value.as_str());
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body_snippet(&body)));
    }
    Ok(body)
}

fn body_snippet(body: &str) -> String {
    body.trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(BODY_SNIPPET_CHARS)
        .collect()
}
