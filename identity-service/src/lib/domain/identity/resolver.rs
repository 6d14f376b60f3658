use std::sync::Arc;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::PrincipalId;
use crate::domain::identity::models::PrincipalKind;
use crate::domain::identity::ports::PrincipalRepository;

/// Finds principals across the three identity stores.
///
/// A missing principal is `Ok(None)`, not an error: callers decide what
/// "not found" means for their flow.
pub struct IdentityResolver<PR>
where
    PR: PrincipalRepository,
{
    repository: Arc<PR>,
}

impl<PR> IdentityResolver<PR>
where
    PR: PrincipalRepository,
{
    pub fn new(repository: Arc<PR>) -> Self {
        Self { repository }
    }

    /// Role-less lookup: probe student, faculty and admin stores in that order
    /// and return the first hit.
    ///
    /// When the same email exists in several stores the student record always
    /// wins, so callers that know the expected role should use
    /// [`IdentityResolver::resolve_with_role`].
    pub async fn resolve(&self, email: &EmailAddress) -> Result<Option<Principal>, AuthError> {
        for kind in PrincipalKind::SEARCH_ORDER {
            if let Some(principal) = self.repository.find_by_email(kind, email).await? {
                return Ok(Some(principal));
            }
        }

        Ok(None)
    }

    /// Role-hinted lookup against the single store for `kind`.
    ///
    /// Admin role strings all map to [`PrincipalKind::Admin`] through
    /// [`crate::domain::identity::models::Role::kind`].
    pub async fn resolve_with_role(
        &self,
        email: &EmailAddress,
        kind: PrincipalKind,
    ) -> Result<Option<Principal>, AuthError> {
        self.repository.find_by_email(kind, email).await
    }

    /// Either of the above depending on whether a hint is available.
    pub async fn resolve_hinted(
        &self,
        email: &EmailAddress,
        kind: Option<PrincipalKind>,
    ) -> Result<Option<Principal>, AuthError> {
        match kind {
            Some(kind) => self.resolve_with_role(email, kind).await,
            None => self.resolve(email).await,
        }
    }

    pub async fn resolve_by_id(
        &self,
        id: PrincipalId,
        kind: PrincipalKind,
    ) -> Result<Option<Principal>, AuthError> {
        self.repository.find_by_id(kind, id).await
    }
}
