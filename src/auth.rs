use argon2::{self, Config as ArgonConfig};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

use crate::error::ApiError;
use crate::models::{Claims, Subject};

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();

    argon2::hash_encoded(password.as_bytes(), &salt, &config)
        .map_err(|e| ApiError::internal("Password hashing failed", e))
}

/// False for a wrong password and for a stored value that is not an encoded hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// The authenticated caller, attached to request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

/// Signs and verifies the tokens carried in the `auth-token` header.
///
/// User and admin tokens share one key; the role is told apart by the claim key.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: Option<i64>,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: Option<i64>) -> Self {
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    pub fn issue(&self, role: Role, id: &str) -> Result<String, ApiError> {
        let subject = Some(Subject { id: id.to_string() });
        let exp = self.ttl_hours.and_then(|hours| {
            chrono::Utc::now()
                .checked_add_signed(chrono::Duration::hours(hours))
                .map(|t| t.timestamp() as usize)
        });
        let claims = match role {
            Role::User => Claims { user: subject, admin: None, exp },
            Role::Admin => Claims { user: None, admin: subject, exp },
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal("Failed to encode token", e))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is only present when an expiration is configured
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                log::debug!("Rejected token: {}", e);
                ApiError::Unauthorized
            })?
            .claims;

        match (claims.user, claims.admin) {
            (Some(user), None) => Ok(Identity { id: user.id, role: Role::User }),
            (None, Some(admin)) => Ok(Identity { id: admin.id, role: Role::Admin }),
            _ => Err(ApiError::Unauthorized),
        }
    }
}
