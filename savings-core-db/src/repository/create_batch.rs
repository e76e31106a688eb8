use async_trait::async_trait;

use crate::models::identifiable::Identifiable;

/// Generic repository trait for creating multiple entities in a batch
///
/// All creates are performed atomically: either every item is stored or none is.
/// Creating an item whose ID already exists is an error.
///
/// # Type Parameters
/// * `T` - The entity type that must implement Identifiable trait
///
/// # Example
/// ```ignore
/// impl CreateBatch<TransactionModel> for TransactionRepositoryImpl {
///     async fn create_batch(&self, items: Vec<TransactionModel>) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
///         // Implementation
///     }
/// }
/// ```
#[async_trait]
pub trait CreateBatch<T: Identifiable>: Send + Sync {
    /// Save multiple items atomically
    ///
    /// # Arguments
    /// * `items` - A vector of entities to create
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - The created entities
    /// * `Err` - An error if the write could not be executed
    async fn create_batch(
        &self,
        items: Vec<T>,
    ) -> Result<Vec<T>, Box<dyn std::error::Error + Send + Sync>>;
}
