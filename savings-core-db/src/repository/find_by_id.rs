use async_trait::async_trait;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Generic repository trait for finding a single entity by its ID
///
/// Returns an Option to handle cases where the entity might not exist.
/// A missing entity is not an error at this layer; the ledger decides
/// which typed error it becomes.
///
/// # Type Parameters
/// * `T` - The entity type that must implement Identifiable trait
///
/// # Example
/// ```ignore
/// impl FindById<AccountModel> for AccountRepositoryImpl {
///     async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountModel>, Box<dyn Error + Send + Sync>> {
///         // Implementation
///     }
/// }
/// ```
#[async_trait]
pub trait FindById<T: Identifiable>: Send + Sync {
    /// Find an entity by its unique identifier
    ///
    /// # Arguments
    /// * `id` - The UUID of the entity to find
    ///
    /// # Returns
    /// * `Ok(Some(T))` - The found entity
    /// * `Ok(None)` - If the entity does not exist
    /// * `Err` - An error if the query could not be executed
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, Box<dyn std::error::Error + Send + Sync>>;
}
