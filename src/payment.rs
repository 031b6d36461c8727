// Payment capture and the charge capability used when a booking is committed.
// Only masked card metadata is ever kept.

use crate::store::{PaymentStore, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid card details: {0}")]
    InvalidCard(String),

    #[error("Payment storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    MockCard,
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Amex => "Amex",
            CardBrand::MockCard => "MockCard",
        };
        f.write_str(name)
    }
}

// Saved payment method as the booking flow sees it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentInfo {
    pub has_payment: bool,
    pub card_last4: String,
    pub card_brand: CardBrand,
    #[serde(default)]
    pub token_id: Option<String>,
    pub auto_book_allowed: bool,
}

impl PaymentInfo {
    pub fn can_auto_book(&self) -> bool {
        self.has_payment && self.auto_book_allowed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub charged_amount_idr: u64,
    pub card_last4: String,
}

pub fn infer_card_brand(digits: &str) -> CardBrand {
    if digits.starts_with('4') {
        CardBrand::Visa
    } else if ["51", "52", "53", "54", "55"]
        .iter()
        .any(|prefix| digits.starts_with(prefix))
    {
        CardBrand::Mastercard
    } else if digits.starts_with("34") || digits.starts_with("37") {
        CardBrand::Amex
    } else {
        CardBrand::MockCard
    }
}

/// Last four digits of the card number, or `0000` when it holds no digits.
pub fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return "0000".to_string();
    }
    digits[digits.len().saturating_sub(4)..].iter().collect()
}

/// Stores masked card metadata with a mock token for later auto-booking.
/// The full card number, expiry and CVV are never persisted.
pub fn save_payment(
    store: &dyn PaymentStore,
    card_number: &str,
    expiry: &str,
    cvv: &str,
    auto_book_allowed: bool,
) -> Result<PaymentInfo, PaymentError> {
    if card_number.trim().is_empty() || expiry.trim().is_empty() || cvv.trim().is_empty() {
        return Err(PaymentError::InvalidCard(
            "card number, expiry and CVV are all required".to_string(),
        ));
    }

    let digits: String = card_number.chars().filter(char::is_ascii_digit).collect();
    let info = PaymentInfo {
        has_payment: true,
        card_last4: mask_card_number(&digits),
        card_brand: infer_card_brand(&digits),
        token_id: Some(format!("tok_demo_{:032x}", rand::random::<u128>())),
        auto_book_allowed,
    };

    store.save_payment(&info)?;
    info!(
        card_brand = %info.card_brand,
        card_last4 = %info.card_last4,
        auto_book_allowed,
        "Saved payment method"
    );
    Ok(info)
}

// Charge capability. A real processor can decline or be unreachable; both
// come back as distinct errors.
pub trait PaymentGateway: Send + Sync + 'static {
    fn charge(&self, amount_idr: u64, payment: &PaymentInfo)
        -> Result<PaymentReceipt, PaymentError>;
}

/// Gateway that approves every charge with a fresh transaction id.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedGateway;

impl PaymentGateway for SimulatedGateway {
    fn charge(
        &self,
        amount_idr: u64,
        payment: &PaymentInfo,
    ) -> Result<PaymentReceipt, PaymentError> {
        Ok(PaymentReceipt {
            transaction_id: format!("pay_{:032x}", rand::random::<u128>()),
            charged_amount_idr: amount_idr,
            card_last4: payment.card_last4.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use test_case::test_case;

    #[test_case("4111111111111111", CardBrand::Visa)]
    #[test_case("5500000000000004", CardBrand::Mastercard)]
    #[test_case("340000000000009", CardBrand::Amex)]
    #[test_case("370000000000002", CardBrand::Amex)]
    #[test_case("6011000000000004", CardBrand::MockCard)]
    #[test_case("", CardBrand::MockCard)]
    fn test_infer_card_brand(digits: &str, expected: CardBrand) {
        assert_eq!(infer_card_brand(digits), expected);
    }

    #[test_case("4111 1111 1111 1111", "1111")]
    #[test_case("12", "12")]
    #[test_case("no digits", "0000")]
    fn test_mask_card_number(card_number: &str, expected: &str) {
        assert_eq!(mask_card_number(card_number), expected);
    }

    #[test]
    fn test_save_payment_persists_masked_details() {
        let store = InMemoryStore::default();

        let info = save_payment(&store, "4111-1111-1111-1234", "12/29", "123", true).unwrap();
        assert_eq!(info.card_last4, "1234");
        assert_eq!(info.card_brand, CardBrand::Visa);
        assert!(info.can_auto_book());
        assert!(info
            .token_id
            .as_deref()
            .is_some_and(|token| token.starts_with("tok_demo_")));

        assert_eq!(store.load_payment(), Some(info));
    }

    #[test]
    fn test_save_payment_requires_all_fields() {
        let store = InMemoryStore::default();

        let result = save_payment(&store, "4111111111111111", "", "123", true);
        assert!(matches!(result, Err(PaymentError::InvalidCard(_))));
        assert_eq!(store.load_payment(), None);
    }

    #[test]
    fn test_simulated_gateway_echoes_amount_and_card() {
        let info = PaymentInfo {
            has_payment: true,
            card_last4: "1111".to_string(),
            card_brand: CardBrand::Visa,
            token_id: None,
            auto_book_allowed: true,
        };

        let first = SimulatedGateway.charge(1_500_000, &info).unwrap();
        let second = SimulatedGateway.charge(1_500_000, &info).unwrap();

        assert_eq!(first.charged_amount_idr, 1_500_000);
        assert_eq!(first.card_last4, "1111");
        assert!(first.transaction_id.starts_with("pay_"));
        assert_ne!(first.transaction_id, second.transaction_id);
    }
}
