use crate::error::Result;
use crate::identity::Principal;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Credential verification and token issuance, supplied by the embedding
/// application. Implementations fail with `Unauthenticated` for bad
/// credentials or tokens; the content graph only ever sees the resolved
/// `Principal`.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    /// Checks inbound credentials and resolves the acting user.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal>;

    /// Verifies a bearer credential from a later request.
    async fn verify(&self, token: &str) -> Result<Principal>;
}
