use std::time::Duration;

use sha2::{Digest, Sha256};

use super::dispatch::{DeliveryError, DeliveryHandler, DeliveryResponse};
use crate::model::{Webhook, WebhookPayload};

/// Default per-request timeout for webhook endpoints.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Stored response bodies are truncated to this many bytes.
const MAX_STORED_BODY: usize = 2048;

/// Blocking HTTP delivery: JSON POST with event and signature headers.
///
/// When the webhook carries a secret, the request includes
/// `x-flux-signature: sha256=<hex>` computed over the secret concatenated
/// with the body, so receivers can verify origin and integrity.
pub struct HttpDeliveryHandler {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpDeliveryHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_DELIVERY_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpDeliveryHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryHandler for HttpDeliveryHandler {
    fn deliver(
        &self,
        webhook: &Webhook,
        payload: &WebhookPayload,
    ) -> Result<DeliveryResponse, DeliveryError> {
        let body = serde_json::to_string(payload)?;

        let mut request = self
            .client
            .post(&webhook.url)
            .header("content-type", "application/json")
            .header("user-agent", concat!("flux/", env!("CARGO_PKG_VERSION")))
            .header("x-flux-event", payload.event.as_str())
            .timeout(self.timeout);
        if let Some(secret) = webhook.secret.as_deref() {
            request = request.header("x-flux-signature", compute_signature(secret, &body));
        }

        let response = request
            .body(body)
            .send()
            .map_err(|err| DeliveryError::Request(err.to_string()))?;

        let status_code = response.status().as_u16();
        let mut body = response.text().unwrap_or_default();
        truncate_in_place(&mut body, MAX_STORED_BODY);
        Ok(DeliveryResponse { status_code, body })
    }
}

/// `sha256=<hex>` over secret + body.
fn compute_signature(secret: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(body.as_bytes());
    format!("sha256={:x}", hasher.finalize())
}

/// Truncate on a char boundary at or below `max_bytes`.
fn truncate_in_place(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::{compute_signature, truncate_in_place};

    #[test]
    fn signature_is_hex_with_scheme_prefix() {
        let sig = compute_signature("secret", "body");
        assert!(sig.starts_with("sha256="));
        assert_eq!(sig.len(), "sha256=".len() + 64);
        assert!(sig["sha256=".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_secret_and_body() {
        let base = compute_signature("secret", "body");
        assert_ne!(compute_signature("other", "body"), base);
        assert_ne!(compute_signature("secret", "other"), base);
        assert_eq!(compute_signature("secret", "body"), base);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut text = "héllo wörld".repeat(400);
        truncate_in_place(&mut text, 2048);
        assert!(text.len() <= 2048);
        assert!(text.is_char_boundary(text.len()));

        let mut short = "ok".to_string();
        truncate_in_place(&mut short, 2048);
        assert_eq!(short, "ok");
    }
}
