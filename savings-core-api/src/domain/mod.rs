pub mod enums;
pub mod reports;
pub mod requests;
pub mod views;

pub use enums::*;
pub use reports::*;
pub use requests::*;
pub use views::*;
