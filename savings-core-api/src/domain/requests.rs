use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::enums::AccountStatus;

pub const MAX_REFERENCE_LEN: usize = 64;
pub const MAX_TEXT_LEN: usize = 255;

/// A deposit or a withdrawal against one account.
///
/// `reference` is a client generated idempotency key, unique per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MovementRequest {
    pub account_id: Uuid,
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
    pub actor: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub reference: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

impl MovementRequest {
    pub fn new(account_id: Uuid, amount: i64, actor: Uuid) -> Self {
        Self {
            account_id,
            amount,
            actor,
            reference: None,
            description: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CancellationRequest {
    pub transaction_id: Uuid,
    pub actor: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_opening_balance"))]
pub struct OpenAccountRequest {
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub opening_balance: i64,
    #[validate(range(min = 0))]
    pub minimum_balance: i64,
    pub interest_rate: Decimal,
    pub is_verified: bool,
    pub actor: Uuid,
}

fn validate_opening_balance(request: &OpenAccountRequest) -> Result<(), ValidationError> {
    if request.opening_balance < request.minimum_balance {
        return Err(ValidationError::new("opening_balance_below_minimum"));
    }
    if request.interest_rate.is_sign_negative() {
        return Err(ValidationError::new("negative_interest_rate"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatusRequest {
    pub account_id: Uuid,
    pub status: AccountStatus,
    pub actor: Uuid,
}
