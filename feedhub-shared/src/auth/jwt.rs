/// JWT token generation and validation module
///
/// FeedHub issues three kinds of tokens, all signed with HS256:
///
/// | Purpose | Audience | Extra claims |
/// |---|---|---|
/// | Access | `feedhub:auth` | none |
/// | Reset password | `feedhub:reset` | `password_fgpt` |
/// | Email verification | `feedhub:verify` | `email` |
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validation**: Signature, expiration, not-before, issuer and audience checks
/// - **Secrets**: One secret per purpose, each at least 32 bytes
/// - **Reset tokens**: Bound to a fingerprint of the password hash they were
///   issued against, so they stop working once the password changes
///
/// # Example
///
/// ```
/// use feedhub_shared::auth::jwt::{create_access_token, validate_access_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let token = create_access_token(user_id, "your-secret-key", 3600)?;
///
/// let claims = validate_access_token(&token, "your-secret-key")?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Issuer stamped into every token
pub const ISSUER: &str = "feedhub";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was minted for a different purpose
    #[error("Token audience does not match {expected}")]
    WrongPurpose { expected: &'static str },

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: &'static str },
}

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Bearer authentication on API requests
    Access,

    /// Completing the forgot-password flow
    ResetPassword,

    /// Completing the email verification flow
    Verification,
}

impl TokenPurpose {
    /// Audience claim for this purpose
    pub fn audience(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "feedhub:auth",
            TokenPurpose::ResetPassword => "feedhub:reset",
            TokenPurpose::Verification => "feedhub:verify",
        }
    }

    /// Default lifetime for this purpose
    pub fn default_lifetime(&self) -> Duration {
        match self {
            TokenPurpose::Access => Duration::hours(1),
            TokenPurpose::ResetPassword => Duration::hours(1),
            TokenPurpose::Verification => Duration::hours(1),
        }
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Audience - always `feedhub:auth`
    pub aud: String,

    /// Issuer - always "feedhub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

/// Claims carried by a password reset token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordClaims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Audience - always `feedhub:reset`
    pub aud: String,

    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,

    /// SHA-256 fingerprint of the password hash at issue time
    pub password_fgpt: String,
}

impl ResetPasswordClaims {
    /// Whether the token was issued against the given (current) password hash
    pub fn matches_password(&self, hashed_password: &str) -> bool {
        self.password_fgpt == password_fingerprint(hashed_password)
    }
}

/// Claims carried by an email verification token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationClaims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Email address being verified
    pub email: String,

    /// Audience - always `feedhub:verify`
    pub aud: String,

    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

/// (iat, exp) for a token issued now
fn issue_window(lifetime: Duration) -> (i64, i64) {
    let now = Utc::now();
    (now.timestamp(), (now + lifetime).timestamp())
}

/// Hex-encoded SHA-256 of a stored password hash
pub fn password_fingerprint(hashed_password: &str) -> String {
    hex::encode(Sha256::digest(hashed_password.as_bytes()))
}

/// Signs any claims structure with HS256
pub fn encode_claims<T: Serialize>(claims: &T, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, expiry, issuer and audience, then returns the claims
///
/// # Errors
///
/// - `JwtError::Expired` if `exp` has passed
/// - `JwtError::WrongPurpose` if the audience belongs to another purpose
/// - `JwtError::InvalidIssuer` if the issuer is not "feedhub"
/// - `JwtError::ValidationError` for bad signatures and malformed tokens
pub fn decode_claims<T: DeserializeOwned>(
    token: &str,
    secret: &str,
    purpose: TokenPurpose,
) -> Result<T, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_audience(&[purpose.audience()]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<T>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::WrongPurpose {
            expected: purpose.audience(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
            JwtError::InvalidIssuer { expected: ISSUER }
        }
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Builds access claims expiring after `lifetime`
pub fn access_claims(user_id: Uuid, lifetime: Duration) -> AccessClaims {
    let (iat, exp) = issue_window(lifetime);
    AccessClaims {
        sub: user_id,
        aud: TokenPurpose::Access.audience().to_string(),
        iss: ISSUER.to_string(),
        iat,
        exp,
        nbf: iat,
    }
}

/// Issues an access token valid for `lifetime_seconds`
///
/// # Example
///
/// ```
/// use feedhub_shared::auth::jwt::create_access_token;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let token = create_access_token(Uuid::new_v4(), "your-secret-key-at-least-32-bytes", 3600)?;
/// assert!(!token.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn create_access_token(
    user_id: Uuid,
    secret: &str,
    lifetime_seconds: i64,
) -> Result<String, JwtError> {
    encode_claims(&access_claims(user_id, Duration::seconds(lifetime_seconds)), secret)
}

/// Validates a bearer token for API access
pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims, JwtError> {
    decode_claims(token, secret, TokenPurpose::Access)
}

/// Issues a password reset token bound to the user's current password hash
pub fn create_reset_password_token(
    user_id: Uuid,
    hashed_password: &str,
    secret: &str,
) -> Result<String, JwtError> {
    let (iat, exp) = issue_window(TokenPurpose::ResetPassword.default_lifetime());
    let claims = ResetPasswordClaims {
        sub: user_id,
        aud: TokenPurpose::ResetPassword.audience().to_string(),
        iss: ISSUER.to_string(),
        iat,
        exp,
        nbf: iat,
        password_fgpt: password_fingerprint(hashed_password),
    };

    encode_claims(&claims, secret)
}

/// Validates a password reset token
///
/// The caller must still check [`ResetPasswordClaims::matches_password`]
/// against the user's stored hash.
pub fn validate_reset_password_token(
    token: &str,
    secret: &str,
) -> Result<ResetPasswordClaims, JwtError> {
    decode_claims(token, secret, TokenPurpose::ResetPassword)
}

/// Issues an email verification token for `email`
pub fn create_verification_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
) -> Result<String, JwtError> {
    let (iat, exp) = issue_window(TokenPurpose::Verification.default_lifetime());
    let claims = VerificationClaims {
        sub: user_id,
        email: email.to_string(),
        aud: TokenPurpose::Verification.audience().to_string(),
        iss: ISSUER.to_string(),
        iat,
        exp,
        nbf: iat,
    };

    encode_claims(&claims, secret)
}

/// Validates an email verification token
pub fn validate_verification_token(
    token: &str,
    secret: &str,
) -> Result<VerificationClaims, JwtError> {
    decode_claims(token, secret, TokenPurpose::Verification)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &str = "access-secret-key-at-least-32-bytes";
    const RESET_SECRET: &str = "reset-secret-key-at-least-32-bytes!";
    const VERIFY_SECRET: &str = "verify-secret-key-at-least-32-bytes";

    #[test]
    fn test_purpose_audiences_are_distinct() {
        assert_ne!(
            TokenPurpose::Access.audience(),
            TokenPurpose::ResetPassword.audience()
        );
        assert_ne!(
            TokenPurpose::Access.audience(),
            TokenPurpose::Verification.audience()
        );
        assert_ne!(
            TokenPurpose::ResetPassword.audience(),
            TokenPurpose::Verification.audience()
        );
    }

    #[test]
    fn test_create_and_validate_access_token() {
        let user_id = Uuid::new_v4();

        let token = create_access_token(user_id, ACCESS_SECRET, 3600).expect("Should create token");
        let claims = validate_access_token(&token, ACCESS_SECRET).expect("Should validate token");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.aud, "feedhub:auth");
        assert!(claims.exp - claims.iat == 3600);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_access_token(Uuid::new_v4(), ACCESS_SECRET, 3600).unwrap();

        let result = validate_access_token(&token, "wrong-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        // Expired well beyond the default validation leeway
        let claims = access_claims(Uuid::new_v4(), Duration::seconds(-3600));
        let token = encode_claims(&claims, ACCESS_SECRET).unwrap();

        let result = validate_access_token(&token, ACCESS_SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_garbage_token() {
        let result = validate_access_token("not.a.token", ACCESS_SECRET);
        assert!(result.is_err());
    }

    #[test]
    fn test_access_token_rejected_as_reset_token() {
        // Same secret, different audience
        let token = create_access_token(Uuid::new_v4(), RESET_SECRET, 3600).unwrap();

        let result = validate_reset_password_token(&token, RESET_SECRET);
        assert!(matches!(result, Err(JwtError::WrongPurpose { .. })));
    }

    #[test]
    fn test_verification_token_rejected_as_access_token() {
        let token =
            create_verification_token(Uuid::new_v4(), "a@example.com", ACCESS_SECRET).unwrap();

        let result = validate_access_token(&token, ACCESS_SECRET);
        assert!(matches!(result, Err(JwtError::WrongPurpose { .. })));
    }

    #[test]
    fn test_reset_token_fingerprint() {
        let user_id = Uuid::new_v4();
        let hash = "$argon2id$v=19$m=65536,t=3,p=4$c2FsdA$aGFzaA";

        let token = create_reset_password_token(user_id, hash, RESET_SECRET).unwrap();
        let claims = validate_reset_password_token(&token, RESET_SECRET).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.matches_password(hash));
        assert!(!claims.matches_password("$argon2id$v=19$m=65536,t=3,p=4$c2FsdA$b3RoZXI"));
    }

    #[test]
    fn test_reset_token_needs_reset_secret() {
        let token = create_reset_password_token(Uuid::new_v4(), "hash", RESET_SECRET).unwrap();

        assert!(validate_reset_password_token(&token, VERIFY_SECRET).is_err());
    }

    #[test]
    fn test_verification_token_carries_email() {
        let user_id = Uuid::new_v4();

        let token = create_verification_token(user_id, "someone@example.com", VERIFY_SECRET).unwrap();
        let claims = validate_verification_token(&token, VERIFY_SECRET).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "someone@example.com");
        assert_eq!(claims.aud, "feedhub:verify");
    }

    #[test]
    fn test_password_fingerprint_is_stable_hex() {
        let a = password_fingerprint("hash");
        let b = password_fingerprint("hash");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, password_fingerprint("other"));
    }
}
