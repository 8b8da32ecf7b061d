//! # Order reference format
//!
//! When a payment attempt is created from a [`PaymentLink`](crate::db_types::PaymentLink), the order reference sent
//! to the gateway is a composite of the originating link id and a uniqueness suffix:
//!
//! ```text
//!    pl_<hex>_<suffix>
//! ```
//!
//! The gateway echoes this reference back verbatim in its callback, and it is the *only* way the callback state
//! machine can find its way back to the originating link. The link id is recovered by taking the first
//! [`ORDER_REF_LINK_SEGMENTS`] `_`-delimited segments. That count is a protocol constant fixed by the construction
//! convention above; it is never inferred from the string itself.

use thiserror::Error;

use crate::db_types::{LinkId, OrderId};

/// The number of leading `_`-delimited segments of an order reference that make up the payment link id.
/// Link ids are generated as `pl_<hex>` (see [`LinkId::random`]), so the count is 2.
pub const ORDER_REF_LINK_SEGMENTS: usize = 2;

#[derive(Debug, Clone, Error)]
#[error("Invalid order reference: {0}")]
pub struct OrderReferenceError(pub String);

/// Builds a fresh order reference for a payment attempt against the given link.
pub fn new_order_reference(link_id: &LinkId) -> OrderId {
    OrderId(format!("{}_{:08x}", link_id, rand::random::<u32>()))
}

/// Recovers the payment link id embedded in a gateway-echoed order reference.
pub fn extract_link_id(order_ref: &str) -> Result<LinkId, OrderReferenceError> {
    let segments = order_ref.split('_').collect::<Vec<_>>();
    if segments.len() <= ORDER_REF_LINK_SEGMENTS {
        return Err(OrderReferenceError(format!(
            "{order_ref} has {} segments, expected more than {ORDER_REF_LINK_SEGMENTS}",
            segments.len()
        )));
    }
    if segments[..ORDER_REF_LINK_SEGMENTS].iter().any(|s| s.is_empty()) {
        return Err(OrderReferenceError(format!("{order_ref} contains an empty link id segment")));
    }
    Ok(LinkId(segments[..ORDER_REF_LINK_SEGMENTS].join("_")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let link_id = LinkId::random();
        let order_ref = new_order_reference(&link_id);
        assert_eq!(extract_link_id(order_ref.as_str()).unwrap(), link_id);
    }

    #[test]
    fn extracts_the_fixed_prefix() {
        let link = extract_link_id("pl_0a1b2c3d_66f2a9b1").unwrap();
        assert_eq!(link.as_str(), "pl_0a1b2c3d");
        // Extra suffix segments belong to the suffix, not the link id
        let link = extract_link_id("pl_0a1b2c3d_retry_2").unwrap();
        assert_eq!(link.as_str(), "pl_0a1b2c3d");
    }

    #[test]
    fn rejects_malformed_references() {
        assert!(extract_link_id("pl_0a1b2c3d").is_err());
        assert!(extract_link_id("noseparator").is_err());
        assert!(extract_link_id("__suffix").is_err());
        assert!(extract_link_id("").is_err());
    }
}
