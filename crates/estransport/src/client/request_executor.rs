use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use estransport_types::models::TransportConfig;
use estransport_types::TransportError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use super::request::Request;

/// Per-client values attached to every outgoing request.
#[derive(Debug, Clone)]
pub(crate) struct RequestSettings {
    authorization: Option<HeaderValue>,
    user_agent: HeaderValue,
}

impl RequestSettings {
    pub(crate) fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let authorization = match (&config.api_key, &config.username) {
            (Some(key), _) => Some(header_value(&format!("ApiKey {key}"))?),
            (None, Some(user)) => Some(basic_auth(user, config.password.as_deref())?),
            (None, None) => None,
        };
        let user_agent = header_value(&config.user_agent)?;
        Ok(Self { authorization, user_agent })
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, TransportError> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|e| TransportError::InvalidRequest { message: e.to_string() })?;
    value.set_sensitive(true);
    Ok(value)
}

fn basic_auth(username: &str, password: Option<&str>) -> Result<HeaderValue, TransportError> {
    let encoded = STANDARD.encode(format!("{}:{}", username, password.unwrap_or_default()));
    header_value(&format!("Basic {encoded}"))
}

/// Join `path` and `query` onto the connection URL.
///
/// A path prefix on the connection URL (proxy mounts such as
/// `http://gateway/es/`) is kept in front of the request path. Userinfo is
/// stripped; it travels in the `Authorization` header instead.
pub fn build_url(base: &Url, path: &str, query: &[(String, String)]) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    url.set_path(&format!("{prefix}/{path}"));
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_fragment(None);

    if query.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(query);
    }
    url
}

/// Headers for `request` sent to `base`.
///
/// Authorization precedence: header set on the request, then credentials
/// embedded in the connection URL, then the configured API key or basic auth.
pub(crate) fn build_headers(
    base: &Url,
    request: &Request,
    settings: &RequestSettings,
) -> Result<HeaderMap, TransportError> {
    let mut headers = request.headers().clone();

    if !headers.contains_key(header::AUTHORIZATION) {
        if !base.username().is_empty() {
            let value = basic_auth(base.username(), base.password())?;
            headers.insert(header::AUTHORIZATION, value);
        } else if let Some(value) = &settings.authorization {
            headers.insert(header::AUTHORIZATION, value.clone());
        }
    }

    if !headers.contains_key(header::USER_AGENT) {
        headers.insert(header::USER_AGENT, settings.user_agent.clone());
    }

    if request.body().is_some() && !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(headers)
}

/// Bind `request` to the connection at `base`.
pub(crate) fn build_request(
    base: &Url,
    request: &Request,
    settings: &RequestSettings,
) -> Result<reqwest::Request, TransportError> {
    let url = build_url(base, request.path(), request.query());
    let mut outgoing = reqwest::Request::new(request.method().clone(), url);
    *outgoing.headers_mut() = build_headers(base, request, settings)?;
    if let Some(body) = request.body() {
        *outgoing.body_mut() = Some(body.clone().into());
    }
    Ok(outgoing)
}
