/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and password policy
/// - [`jwt`]: Purpose-scoped JWTs (access, password reset, email verification)
/// - [`middleware`]: Bearer token extraction and the per-request `AuthContext`
///
/// # Token Purposes
///
/// Every token purpose carries its own audience and is signed with its own
/// secret, so an access token can never be replayed as a reset or
/// verification token (and vice versa).
///
/// # Example
///
/// ```no_run
/// use feedhub_shared::auth::password::{hash_password, verify_password};
/// use feedhub_shared::auth::jwt::{create_access_token, validate_access_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery staple")?;
/// assert!(verify_password("correct horse battery staple", &hash)?);
///
/// let user_id = Uuid::new_v4();
/// let token = create_access_token(user_id, "access-secret-at-least-32-bytes!", 3600)?;
/// let claims = validate_access_token(&token, "access-secret-at-least-32-bytes!")?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
