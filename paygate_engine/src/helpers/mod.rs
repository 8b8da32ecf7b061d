pub mod canonical;
pub mod order_reference;

pub use canonical::{sign_fields, verify_fields};
pub use order_reference::{extract_link_id, new_order_reference, OrderReferenceError, ORDER_REF_LINK_SEGMENTS};
