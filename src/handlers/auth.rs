use crate::errors::DecodeError;
use crate::models::all_models::Claims;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

/// Turns login tokens into [`Claims`].
///
/// Decoding is pure: no clock is consulted, so `exp` comes back as issued and
/// is enforced later by the access policy.
#[derive(Clone)]
pub struct TokenDecoder {
    key: DecodingKey,
    validation: Validation,
    verify_signature: bool,
}

impl TokenDecoder {
    /// Reads the claims without checking who signed the token.
    pub fn unverified() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        TokenDecoder {
            key: DecodingKey::from_secret(&[]),
            validation: relax(validation),
            verify_signature: false,
        }
    }

    /// Reads the claims and rejects tokens not signed with `secret` (HS256).
    pub fn with_secret(secret: &[u8]) -> Self {
        TokenDecoder {
            key: DecodingKey::from_secret(secret),
            validation: relax(Validation::new(Algorithm::HS256)),
            verify_signature: true,
        }
    }

    pub fn from_optional_secret(secret: Option<&str>) -> Self {
        match secret {
            Some(secret) => Self::with_secret(secret.as_bytes()),
            None => Self::unverified(),
        }
    }

    pub fn verifies_signature(&self) -> bool {
        self.verify_signature
    }

    pub fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DecodeError::Empty);
        }

        let token_data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(token_data.claims)
    }
}

// Expiry belongs to the access policy, and the portal never sets an audience.
fn relax(mut validation: Validation) -> Validation {
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}
