pub mod cancellation_claim;
pub mod compare_and_swap;
pub mod create_batch;
pub mod find_by_id;
pub mod find_by_reference;
pub mod load_batch;
pub mod load_history;
pub mod pagination;
pub mod scan_accounts;
pub mod scan_transactions;
pub mod store;
pub mod update_status;

// Re-exports
pub use cancellation_claim::*;
pub use compare_and_swap::*;
pub use create_batch::*;
pub use find_by_id::*;
pub use find_by_reference::*;
pub use load_batch::*;
pub use load_history::*;
pub use pagination::*;
pub use scan_accounts::*;
pub use scan_transactions::*;
pub use store::*;
pub use update_status::*;
