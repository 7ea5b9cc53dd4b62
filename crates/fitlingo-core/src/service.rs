//! Registration flow: validate, insert, generate, store the plan.

use serde_json::Value;
use tracing::{info, warn};

use fitlingo_db::StoreError;
use fitlingo_db::models::{NewUser, User, UserValidationError};

use crate::planner::{GenerationError, PlanGenerator};
use crate::profile::UserProfile;
use crate::store::UserStore;

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Validation(#[from] UserValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// A registered user together with their freshly stored plan.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub plan: Value,
}

/// Register the user described by `document` and generate their plan.
///
/// Validation and the insert happen before the generator is called, so a
/// rejected registration never costs a generation. If generation or storing
/// the plan fails, the inserted user is removed again so the same document
/// can be registered on a later attempt.
pub async fn register_user(
    store: &dyn UserStore,
    planner: &PlanGenerator,
    document: &Value,
) -> Result<Registration, RegisterError> {
    let new_user = NewUser::from_document(document)?;
    let mut user = store.insert_user(&new_user).await?;
    info!(username = %user.username, "user registered");

    let plan = match generate_and_store(store, planner, &new_user).await {
        Ok(plan) => plan,
        Err(e) => {
            discard_user(store, &user.username).await;
            return Err(e);
        }
    };

    user.plan = Some(plan.clone());
    Ok(Registration { user, plan })
}

async fn generate_and_store(
    store: &dyn UserStore,
    planner: &PlanGenerator,
    new_user: &NewUser,
) -> Result<Value, RegisterError> {
    let profile = UserProfile::from(new_user);
    let plan = match planner.generate(&profile).await {
        Ok(plan) => plan,
        Err(e) => {
            warn!(username = %new_user.username, error = %e.error, "plan generation failed");
            return Err(e.into());
        }
    };

    store.set_user_plan(&new_user.username, &plan).await?;
    info!(username = %new_user.username, "plan stored");
    Ok(plan)
}

async fn discard_user(store: &dyn UserStore, username: &str) {
    match store.delete_user(username).await {
        Ok(_) => info!(username, "registration rolled back"),
        Err(e) => warn!(username, error = %e, "could not roll back registration"),
    }
}
