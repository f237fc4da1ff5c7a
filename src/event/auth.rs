// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Publisher bearer tokens.
//!
//! Compact three-segment tokens (`header.claims.signature`, base64url, no
//! padding) signed with HMAC-SHA256 under the project's sign key. The claims
//! payload carries the issuing project's id; the dispatcher compares it to
//! the project the event arrived on.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::errors::DispatchError;
use crate::model::ProjectView;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    /// Unix seconds after which the token is rejected.
    pub exp: i64,
    /// Decimal project id of the issuing project.
    pub payload: String,
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn sign(key: &str, signing_input: &str) -> Vec<u8> {
    // new_from_slice only fails on zero-size output, which Sha256 never has
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("hmac key");
    mac.update(signing_input.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Mint a publisher token under the project's sign key.
pub fn issue_token(project: &ProjectView) -> String {
    let header = TokenHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = TokenClaims {
        iss: project.issuer.clone(),
        exp: now_unix() + project.exp_in as i64,
        payload: project.project_id.to_string(),
    };

    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).expect("header json"));
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("claims json"));
    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let signature = URL_SAFE_NO_PAD.encode(sign(&project.sign_key, &signing_input));

    format!("{}.{}", signing_input, signature)
}

/// Verify `token` against the project's sign key and return the embedded
/// project id.
///
/// Malformed tokens, bad signatures, and expired claims are all
/// `InvalidAuthValue`; a valid token whose project-id claim cannot be parsed
/// is `InvalidAuthProjectId`. The caller decides whether the returned id is
/// the permitted one.
pub fn verify_token(project: &ProjectView, token: &str) -> Result<u64, DispatchError> {
    if token.is_empty() {
        return Err(DispatchError::InvalidAuthValue);
    }

    let mut parts = token.split('.');
    let (header_b64, claims_b64, sig_b64) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s)) if parts.next().is_none() => (h, c, s),
        _ => return Err(DispatchError::InvalidAuthValue),
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let provided = URL_SAFE_NO_PAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| DispatchError::InvalidAuthValue)?;

    let mut mac = HmacSha256::new_from_slice(project.sign_key.as_bytes()).expect("hmac key");
    mac.update(signing_input.as_bytes());
    if mac.verify_slice(&provided).is_err() {
        return Err(DispatchError::InvalidAuthValue);
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64.as_bytes())
        .map_err(|_| DispatchError::InvalidAuthValue)?;
    let claims: TokenClaims =
        serde_json::from_slice(&claims_json).map_err(|_| DispatchError::InvalidAuthValue)?;

    if claims.exp < now_unix() {
        return Err(DispatchError::InvalidAuthValue);
    }

    claims
        .payload
        .parse::<u64>()
        .map_err(|_| DispatchError::InvalidAuthProjectId)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: u64, sign_key: &str) -> ProjectView {
        ProjectView {
            project_id: id,
            name: format!("proj-{}", id),
            issuer: "wasmgate".to_string(),
            exp_in: 3600,
            sign_key: sign_key.to_string(),
            database: None,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let p = project(10, "secret-a");
        let token = issue_token(&p);
        assert_eq!(verify_token(&p, &token).unwrap(), 10);
    }

    #[test]
    fn empty_token_is_invalid() {
        let p = project(10, "secret-a");
        assert_eq!(
            verify_token(&p, ""),
            Err(DispatchError::InvalidAuthValue)
        );
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() {
        let signer = project(10, "secret-a");
        let verifier = project(10, "secret-b");
        let token = issue_token(&signer);
        assert_eq!(
            verify_token(&verifier, &token),
            Err(DispatchError::InvalidAuthValue)
        );
    }

    #[test]
    fn tampered_claims_are_invalid() {
        let p = project(10, "secret-a");
        let token = issue_token(&p);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&TokenClaims {
                iss: "wasmgate".to_string(),
                exp: now_unix() + 600,
                payload: "11".to_string(),
            })
            .unwrap(),
        );
        parts[1] = &forged;
        let token = parts.join(".");
        assert_eq!(
            verify_token(&p, &token),
            Err(DispatchError::InvalidAuthValue)
        );
    }

    #[test]
    fn expired_token_is_invalid() {
        let mut p = project(10, "secret-a");
        p.exp_in = 0;
        let token = issue_token(&p);
        // exp == now; push past it
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(
            verify_token(&p, &token),
            Err(DispatchError::InvalidAuthValue)
        );
    }

    #[test]
    fn non_numeric_project_claim_is_bad_project_id() {
        let p = project(10, "secret-a");
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&TokenClaims {
                iss: "wasmgate".to_string(),
                exp: now_unix() + 600,
                payload: "not-a-number".to_string(),
            })
            .unwrap(),
        );
        let signing_input = format!("{}.{}", header, claims);
        let sig = URL_SAFE_NO_PAD.encode(sign(&p.sign_key, &signing_input));
        let token = format!("{}.{}", signing_input, sig);
        assert_eq!(
            verify_token(&p, &token),
            Err(DispatchError::InvalidAuthProjectId)
        );
    }
}
