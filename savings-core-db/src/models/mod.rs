pub mod account;
pub mod identifiable;
pub mod transaction;

// Re-exports
pub use account::*;
pub use identifiable::*;
pub use transaction::*;
