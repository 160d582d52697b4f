//! OIDC identity token inspection

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Claims of an Actions OIDC token that matter to a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject, e.g. `repo:owner/name:environment:github-pages`
    pub sub: String,

    /// Repository as `owner/name`
    #[serde(default)]
    pub repository: Option<String>,

    /// Git ref the workflow ran on
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,

    /// Deployment environment
    #[serde(default)]
    pub environment: Option<String>,

    /// Issuer
    #[serde(default)]
    pub iss: Option<String>,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: Option<i64>,
}

/// A decoded identity token
#[derive(Debug, Clone)]
pub struct IdentityToken {
    pub claims: IdentityClaims,
}

impl IdentityToken {
    /// Decode the claims of a JWT.
    /// The signature is not verified; the Pages API does that.
    pub fn from_raw(raw: &str) -> Result<Self, DeployError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<IdentityClaims>(raw, &DecodingKey::from_secret(b""), &validation)
            .map_err(|e| DeployError::TokenError(format!("Failed to decode identity token: {}", e)))?;

        Ok(Self {
            claims: token_data.claims,
        })
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        match self.claims.exp {
            Some(exp) => exp < Utc::now().timestamp(),
            None => false,
        }
    }

    /// Get expiration time
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims
            .exp
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}
