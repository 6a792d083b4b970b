use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::common::email::Email;

#[cfg(test)]
const TEST_ASSERTION_PREFIX: &str = "verified:";

/// An opaque identity assertion from the external identity provider,
/// carried in the submission payload.
///
/// The token is deliberately not public, so the address it vouches for can
/// only be obtained via [`verify`](Self::verify). Tokens are single-use and
/// must be re-presented with every submission attempt; nothing is stored
/// server-side between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityAssertion {
    token: String,
}

impl IdentityAssertion {
    /// Exchange the assertion for a verified email address.
    ///
    /// The provider call has a bounded timeout and fails closed: if the
    /// provider is unreachable or answers anything but success, the
    /// submission is rejected, never waved through.
    pub async fn verify(self, config: &Config, http: &reqwest::Client) -> Result<Email, Error> {
        if self.token.is_empty() {
            return Err(Error::Unverified(
                "No identity token supplied".to_string(),
            ));
        }

        // In test mode, accept tokens of the form `verified:<email>`.
        #[cfg(test)]
        {
            let _ = (config, http);
            match self.token.strip_prefix(TEST_ASSERTION_PREFIX) {
                Some(address) => address.parse().map_err(|_| {
                    Error::Unverified("Identity assertion was rejected".to_string())
                }),
                None => Err(Error::Unverified(
                    "Identity assertion was rejected".to_string(),
                )),
            }
        }
        // When doing it for real, contact the identity provider.
        #[cfg(not(test))]
        {
            let request = VerifyRequest {
                assertion: &self.token,
                audience: config.hostname(),
            };
            let response = http
                .post(config.verifier_url())
                .bearer_auth(config.verifier_secret())
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    warn!("Identity provider unreachable: {e}");
                    Error::Unverified("Identity provider unreachable".to_string())
                })?;

            if !response.status().is_success() {
                return Err(Error::Unverified(
                    "Identity assertion was rejected".to_string(),
                ));
            }

            let verdict: VerifyResponse = response.json().await.map_err(|e| {
                warn!("Malformed identity provider response: {e}");
                Error::Unverified("Identity provider unreachable".to_string())
            })?;
            Ok(verdict.email)
        }
    }
}

/// The verification request sent to the identity provider.
#[derive(Serialize)]
#[cfg_attr(test, allow(dead_code))]
struct VerifyRequest<'a> {
    assertion: &'a str,
    audience: &'a str,
}

/// The identity provider's answer for a valid assertion.
/// Parsing through [`Email`] normalises the address on arrival.
#[derive(Deserialize)]
#[cfg_attr(test, allow(dead_code))]
struct VerifyResponse {
    email: Email,
}
