use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Manual correction applied on top of computed holdings.
///
/// Adjustments are keyed by symbol and survive every recompute; deleting one
/// restores the computed values on the next pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ManualAdjustment {
    /// Replace the computed holding wholesale. Total cost is derived as
    /// quantity times average cost; computed lots are discarded, never
    /// blended with these values.
    Override {
        quantity: Decimal,
        average_cost: Decimal,
    },

    /// Hide the symbol from the portfolio until the adjustment is deleted.
    Removed,
}

impl ManualAdjustment {
    /// Overrides must carry non-negative values; `Removed` always passes.
    ///
    /// A zero-quantity override is allowed and simply drops the holding from
    /// the final view.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ManualAdjustment::Override {
                quantity,
                average_cost,
            } => {
                if quantity.is_sign_negative() {
                    return Err(ValidationError::NegativeQuantity(*quantity));
                }
                if average_cost.is_sign_negative() {
                    return Err(ValidationError::NegativeAverageCost(*average_cost));
                }
                Ok(())
            }
            ManualAdjustment::Removed => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_serde_tags() {
        let adjustment = ManualAdjustment::Override {
            quantity: dec!(12),
            average_cost: dec!(101.5),
        };
        let json = serde_json::to_value(&adjustment).unwrap();
        assert_eq!(json["type"], "OVERRIDE");
        assert!(json.get("averageCost").is_some());

        let removed = serde_json::to_value(&ManualAdjustment::Removed).unwrap();
        assert_eq!(removed["type"], "REMOVED");
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        let err = ManualAdjustment::Override {
            quantity: dec!(-1),
            average_cost: dec!(10),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ValidationError::NegativeQuantity(_)));

        let err = ManualAdjustment::Override {
            quantity: dec!(1),
            average_cost: dec!(-10),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ValidationError::NegativeAverageCost(_)));

        assert!(ManualAdjustment::Removed.validate().is_ok());
        assert!(ManualAdjustment::Override {
            quantity: dec!(0),
            average_cost: dec!(0),
        }
        .validate()
        .is_ok());
    }
}
