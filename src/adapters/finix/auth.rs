use {
    super::signature::{self, SIGNATURE_HEADER},
    crate::{
        config::{GatewayConfig, WebhookCredentials},
        domain::error::PipelineError,
    },
    axum::http::{HeaderMap, header},
    base64::{Engine, engine::general_purpose::STANDARD},
    sha2::{Digest, Sha256},
    subtle::{Choice, ConstantTimeEq},
};

/// Where the `Authorization` value may end up depending on the proxy in
/// front of us. Checked in order before the catch-all scan.
pub const AUTHORIZATION_HEADERS: [&str; 3] = [
    "authorization",
    "x-forwarded-authorization",
    "x-original-authorization",
];

const BASIC_PREFIX: &str = "Basic ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials checked and matched.
    Verified,
    /// No credentials configured and the legacy allow policy is on.
    Unconfigured,
}

pub fn authorization_value(headers: &HeaderMap) -> Option<&str> {
    AUTHORIZATION_HEADERS
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .or_else(|| {
            headers
                .iter()
                .find(|(name, _)| {
                    name.as_str().ends_with("authorization")
                        && *name != header::PROXY_AUTHORIZATION
                })
                .and_then(|(_, v)| v.to_str().ok())
        })
}

/// Splits `Basic <base64(user:pass)>` on the first colon only, so passwords
/// may contain `:`.
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix(BASIC_PREFIX)?;
    let decoded = STANDARD.decode(encoded.trim_end()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Compares SHA-256 digests so neither content nor length leaks through timing.
fn digest_eq(expected: &[u8], given: &[u8]) -> Choice {
    let expected = Sha256::digest(expected);
    let given = Sha256::digest(given);
    expected.as_slice().ct_eq(given.as_slice())
}

/// Both comparisons always run; the results are combined without
/// short-circuiting.
pub(crate) fn credentials_match_with<F>(
    mut eq: F,
    expected: &WebhookCredentials,
    username: &str,
    password: &str,
) -> bool
where
    F: FnMut(&[u8], &[u8]) -> Choice,
{
    let username_ok = eq(expected.username.as_bytes(), username.as_bytes());
    let password_ok = eq(expected.password.as_bytes(), password.as_bytes());
    (username_ok & password_ok).into()
}

pub fn credentials_match(expected: &WebhookCredentials, username: &str, password: &str) -> bool {
    credentials_match_with(digest_eq, expected, username, password)
}

/// Checks the Basic credentials. Needs only the headers, so it runs before
/// the body is read. Errors are always `PipelineError::Unauthorized` and map
/// to a 401 challenge.
pub fn authenticate(
    headers: &HeaderMap,
    config: &GatewayConfig,
) -> Result<AuthOutcome, PipelineError> {
    let expected = config.active_credentials();
    if !expected.is_configured() {
        if config.allow_unconfigured {
            tracing::warn!(
                mode = ?config.mode,
                "webhook credentials not configured, accepting unauthenticated delivery"
            );
            return Ok(AuthOutcome::Unconfigured);
        }
        return Err(PipelineError::Unauthorized(
            "webhook credentials not configured".into(),
        ));
    }

    let header = authorization_value(headers)
        .ok_or_else(|| PipelineError::Unauthorized("missing Authorization header".into()))?;
    let (username, password) = parse_basic(header)
        .ok_or_else(|| PipelineError::Unauthorized("malformed Basic credentials".into()))?;

    if credentials_match(expected, &username, &password) {
        Ok(AuthOutcome::Verified)
    } else {
        Err(PipelineError::Unauthorized("credentials mismatch".into()))
    }
}

/// Enforces `finix-signature` when a signing secret is configured. A no-op
/// otherwise.
pub fn verify_signature(
    headers: &HeaderMap,
    body: &[u8],
    config: &GatewayConfig,
    now: i64,
) -> Result<(), PipelineError> {
    let Some(secret) = config.signing_secret.as_deref() else {
        return Ok(());
    };
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PipelineError::Unauthorized("missing Finix-Signature header".into()))?;
    signature::verify(header, body, secret, now)
}
