use std::sync::Arc;

use tracing::{info, warn};

use lingo_core::model::{AuthSession, NewProfile, SignUpForm};

use crate::backend::{AuthBackend, ProfileStore};
use crate::error::{ProfileWriteError, RegistrationError};

/// Creates accounts: identity first, then the profile row on the free tier.
#[derive(Clone)]
pub struct AccountService {
    auth: Arc<dyn AuthBackend>,
    profiles: Arc<dyn ProfileStore>,
}

impl AccountService {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthBackend>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { auth, profiles }
    }

    /// Register a new learner.
    ///
    /// Returns the session if the identity service signed the user in right
    /// away, `None` when it waits for email confirmation.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Invalid` listing every form problem,
    /// `RegistrationError::Auth` if sign-up is refused, and
    /// `RegistrationError::Profile` if the profile row cannot be written.
    pub async fn register(
        &self,
        form: &SignUpForm,
    ) -> Result<Option<AuthSession>, RegistrationError> {
        let problems = form.validate();
        if !problems.is_empty() {
            return Err(RegistrationError::Invalid(problems));
        }

        let full_name = form.full_name.trim();
        let outcome = self
            .auth
            .sign_up(&form.email, &form.password, full_name)
            .await?;

        let profile = NewProfile::free(outcome.user.id, full_name, outcome.user.email.clone());
        match self.profiles.insert_profile(&profile).await {
            Ok(()) => {}
            // A database trigger may have created the row already.
            Err(ProfileWriteError::Conflict) => {
                warn!(user_id = %profile.id, "profile row already existed");
            }
            Err(err) => return Err(err.into()),
        }

        info!(user_id = %profile.id, "account registered");
        Ok(outcome.session)
    }
}
