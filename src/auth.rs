// Identity assertion verification: HMAC-SHA256 over the sorted init-data
// fields, keyed by the SHA-256 of the bot token.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::api::{json_error, AppState};
use crate::gateway::types::{TrustDecision, VerifiedUser, VerifyRequest};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("TELEGRAM_BOT_TOKEN is not configured")]
    NotConfigured,
    #[error("Missing hash in init_data")]
    MissingHash,
    #[error("Invalid init_data hash")]
    InvalidHash,
}

impl VerifyError {
    pub fn status(&self) -> StatusCode {
        match self {
            VerifyError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            VerifyError::MissingHash => StatusCode::BAD_REQUEST,
            VerifyError::InvalidHash => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Parse URL-encoded init data. The first occurrence of a key wins.
pub fn parse_init_data(init_data: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(init_data.as_bytes()) {
        fields
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    fields
}

/// `key=value` lines sorted by key, joined with `\n`.
pub fn data_check_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn mac_for(bot_token: &str, check_string: &str) -> HmacSha256 {
    let secret = Sha256::digest(bot_token.as_bytes());
    let mut mac = HmacSha256::new_from_slice(&secret).expect("HMAC can take key of any size");
    mac.update(check_string.as_bytes());
    mac
}

/// Verify `init_data` against `bot_token` and return its fields without `hash`.
pub fn verify_init_data(
    init_data: &str,
    bot_token: &str,
) -> Result<BTreeMap<String, String>, VerifyError> {
    let mut fields = parse_init_data(init_data);
    let received = fields
        .remove("hash")
        .filter(|h| !h.trim().is_empty())
        .ok_or(VerifyError::MissingHash)?;
    let received = hex::decode(received.trim()).map_err(|_| VerifyError::InvalidHash)?;

    mac_for(bot_token, &data_check_string(&fields))
        .verify_slice(&received)
        .map_err(|_| VerifyError::InvalidHash)?;

    Ok(fields)
}

/// Build a signed init-data string, as the host would. Used to produce
/// dev-mode assertions for a locally configured bot token.
pub fn sign_init_data(pairs: &[(&str, &str)], bot_token: &str) -> String {
    let fields: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let hash = hex::encode(
        mac_for(bot_token, &data_check_string(&fields))
            .finalize()
            .into_bytes(),
    );

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in &fields {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("hash", &hash);
    serializer.finish()
}

/// The `user` field of verified init data. Empty or unexpected user metadata
/// does not invalidate an otherwise valid signature; it is dropped.
pub fn verified_user(fields: &BTreeMap<String, String>) -> Option<VerifiedUser> {
    let raw = fields.get("user").filter(|raw| !raw.trim().is_empty())?;
    match serde_json::from_str::<VerifiedUser>(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!("Ignoring unexpected user in verified init_data: {e}");
            None
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn tg_verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> impl IntoResponse {
    let Some(token) = state.bot_token.as_deref() else {
        let e = VerifyError::NotConfigured;
        return json_error(e.status(), &e.to_string()).into_response();
    };

    let fields = match verify_init_data(&req.init_data, token) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Identity verification rejected: {e}");
            return json_error(e.status(), &e.to_string()).into_response();
        }
    };

    (
        StatusCode::OK,
        Json(TrustDecision {
            ok: true,
            user: verified_user(&fields),
            auth_date: fields.get("auth_date").cloned(),
            query_id: fields.get("query_id").cloned(),
        }),
    )
        .into_response()
}
