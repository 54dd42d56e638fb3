//! Order lifecycle, address kinds, and checkout choices.

use serde::{Deserialize, Serialize};

use crate::define_choice;

/// Length of an order reference code.
pub const REF_CODE_LEN: usize = 20;

/// Characters an order reference code is drawn from.
pub const REF_CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Whether `code` has the shape of an order reference code.
#[must_use]
pub fn is_valid_ref_code(code: &str) -> bool {
    code.len() == REF_CODE_LEN && code.bytes().all(|b| REF_CODE_ALPHABET.contains(&b))
}

define_choice!(
    /// Whether an address is used for billing or shipping.
    AddressType {
        Billing => ("B", "Billing"),
        Shipping => ("S", "Shipping"),
    }
);

define_choice!(
    /// Payment method picked at checkout.
    PaymentOption {
        Stripe => ("S", "Stripe"),
        PayPal => ("P", "PayPal"),
    }
);

impl PaymentOption {
    /// Path segment of the payment page for this option.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::PayPal => "paypal",
        }
    }
}

/// The raw lifecycle flags stored on an order row.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFlags {
    pub ordered: bool,
    pub being_delivered: bool,
    pub received: bool,
    pub refund_requested: bool,
    pub refund_granted: bool,
}

/// Order status derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Still being assembled; not paid.
    #[default]
    Open,
    Paid,
    BeingDelivered,
    Received,
    RefundRequested,
    RefundGranted,
}

impl OrderStatus {
    /// Derive the status from order flags; later lifecycle stages win.
    #[must_use]
    pub const fn from_flags(flags: OrderFlags) -> Self {
        if flags.refund_granted {
            Self::RefundGranted
        } else if flags.refund_requested {
            Self::RefundRequested
        } else if flags.received {
            Self::Received
        } else if flags.being_delivered {
            Self::BeingDelivered
        } else if flags.ordered {
            Self::Paid
        } else {
            Self::Open
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Paid => "Paid",
            Self::BeingDelivered => "Being delivered",
            Self::Received => "Received",
            Self::RefundRequested => "Refund requested",
            Self::RefundGranted => "Refunded",
        }
    }

    /// Whether a customer may still ask for a refund.
    #[must_use]
    pub const fn refundable(self) -> bool {
        matches!(self, Self::Paid | Self::BeingDelivered | Self::Received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_precedence() {
        let mut flags = OrderFlags::default();
        assert_eq!(OrderStatus::from_flags(flags), OrderStatus::Open);

        flags.ordered = true;
        assert_eq!(OrderStatus::from_flags(flags), OrderStatus::Paid);

        flags.being_delivered = true;
        assert_eq!(OrderStatus::from_flags(flags), OrderStatus::BeingDelivered);

        flags.received = true;
        assert_eq!(OrderStatus::from_flags(flags), OrderStatus::Received);

        flags.refund_requested = true;
        assert_eq!(OrderStatus::from_flags(flags), OrderStatus::RefundRequested);

        flags.refund_granted = true;
        assert_eq!(OrderStatus::from_flags(flags), OrderStatus::RefundGranted);
    }

    #[test]
    fn test_only_paid_orders_are_refundable() {
        assert!(!OrderStatus::Open.refundable());
        assert!(OrderStatus::Paid.refundable());
        assert!(OrderStatus::Received.refundable());
        assert!(!OrderStatus::RefundRequested.refundable());
    }

    #[test]
    fn test_ref_code_shape() {
        assert!(is_valid_ref_code("abcdefghij0123456789"));
        assert!(!is_valid_ref_code("ABCDEFGHIJ0123456789"));
        assert!(!is_valid_ref_code("short"));
        assert!(!is_valid_ref_code("abcdefghij012345678-"));
    }

    #[test]
    fn test_payment_option_paths() {
        assert_eq!(PaymentOption::Stripe.path_segment(), "stripe");
        assert_eq!(PaymentOption::PayPal.path_segment(), "paypal");
    }
}
