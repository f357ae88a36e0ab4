/// Authentication primitives
///
/// - [`password`]: Argon2id hashing for owner passwords
/// - [`jwt`]: access/refresh token issuance and validation
/// - [`api_key`]: project API key generation and hashing
/// - [`middleware`]: header parsing and request context types
///
/// # Example
///
/// ```no_run
/// use waitlistr_shared::auth::jwt::issue_token_pair;
/// use waitlistr_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("owner-password")?;
/// assert!(verify_password("owner-password", &hash)?);
///
/// let tokens = issue_token_pair(1, "owner", "a-secret-that-is-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod api_key;
pub mod jwt;
pub mod middleware;
pub mod password;
