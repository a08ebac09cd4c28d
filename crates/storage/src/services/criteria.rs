use uuid::Uuid;
use validator::Validate;

use crate::dto::vote::CreateCriteriaRequest;
use crate::error::{BattleError, EngineResult, StorageError};
use crate::models::Criteria;
use crate::repository::Store;

pub async fn create_criteria<S: Store + ?Sized>(
    store: &S,
    request: &CreateCriteriaRequest,
) -> EngineResult<Criteria> {
    request
        .validate()
        .map_err(|e| BattleError::Validation(e.to_string()))?;

    let criteria = Criteria {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        description: request.description.clone(),
    };

    store.insert_criteria(&criteria).await.map_err(|e| match e {
        StorageError::ConstraintViolation(msg) => BattleError::Validation(msg),
        other => BattleError::Storage(other),
    })
}

pub async fn list_criteria<S: Store + ?Sized>(store: &S) -> EngineResult<Vec<Criteria>> {
    Ok(store.list_criteria().await?)
}
