use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use pg_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
/// A payment method identifier ("jkopay", "linepay", ...). Methods are declared by provider configuration rather
/// than an enum, since the set of enabled gateways is a deployment concern. Normalised to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    pub fn new<S: AsRef<str>>(method: S) -> Self {
        Self(method.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: AsRef<str>> From<S> for PaymentMethod {
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

//--------------------------------------       Region        ---------------------------------------------------------
/// A market/country code ("TW", "SG", ...) used to select which providers are applicable. Normalised to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new<S: AsRef<str>>(region: S) -> Self {
        Self(region.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: AsRef<str>> From<S> for Region {
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

//--------------------------------------       OrderId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------       LinkId        ---------------------------------------------------------
/// The id of a [`PaymentLink`]. Link ids are two `_`-delimited segments (`pl_<hex>`); this shape is load-bearing,
/// see [`crate::helpers::order_reference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct LinkId(pub String);

impl LinkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates a fresh link id in the canonical `pl_<hex>` shape.
    pub fn random() -> Self {
        Self(format!("pl_{:08x}", rand::random::<u32>()))
    }
}

impl From<String> for LinkId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// A payment attempt has begun, and no callback has arrived yet.
    Pending,
    /// The gateway reported a successful settlement.
    Completed,
    /// Fulfilment statuses, driven by admin action rather than the callback state machine.
    Processing,
    Shipped,
    Delivered,
    /// The gateway reported a failed settlement, or an admin voided the order.
    Cancelled,
    Refunded,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     LinkStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum LinkStatus {
    /// The link can be used to start new payment attempts.
    Active,
    /// A settlement against this link succeeded (or its usage cap was reached).
    Completed,
    /// The most recent settlement attempt against this link failed.
    Failed,
    Expired,
}

impl Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinkStatus::Active => "Active",
            LinkStatus::Completed => "Completed",
            LinkStatus::Failed => "Failed",
            LinkStatus::Expired => "Expired",
        };
        write!(f, "{s}")
    }
}

impl FromStr for LinkStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid payment link status: {s}"))),
        }
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

//--------------------------------------    PaymentLink      ---------------------------------------------------------
/// A reusable payment request template, created by a user action. Only the callback state machine (or expiry)
/// mutates its status; links are never deleted while referenced by an order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentLink {
    pub id: LinkId,
    pub user_id: i64,
    pub amount: Money,
    pub currency: String,
    pub description: Option<String>,
    pub method: PaymentMethod,
    pub status: LinkStatus,
    pub usage_cap: Option<i64>,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentLink {
    /// A link is exhausted once its usage cap (if any) has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.usage_cap.map(|cap| self.usage_count >= cap).unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct NewPaymentLink {
    pub id: LinkId,
    pub user_id: i64,
    pub amount: Money,
    pub currency: String,
    pub description: Option<String>,
    pub method: PaymentMethod,
    pub usage_cap: Option<i64>,
}

impl NewPaymentLink {
    pub fn new(user_id: i64, amount: Money, currency: &str, method: PaymentMethod) -> Self {
        Self {
            id: LinkId::random(),
            user_id,
            amount,
            currency: currency.to_string(),
            description: None,
            method,
            usage_cap: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_usage_cap(mut self, cap: i64) -> Self {
        self.usage_cap = Some(cap);
        self
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
/// A concrete purchase instance. `amount` is immutable after creation; only status and gateway-linkage fields
/// change post-creation, and those transitions are driven exclusively by the callback state machine or an
/// administrative override.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: i64,
    pub amount: Money,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_link_id: Option<LinkId>,
    pub method: Option<PaymentMethod>,
    pub provider_tx_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: i64,
    pub amount: Money,
    pub currency: String,
    pub payment_link_id: Option<LinkId>,
    pub method: Option<PaymentMethod>,
}

impl NewOrder {
    pub fn new(id: OrderId, user_id: i64, amount: Money, currency: &str) -> Self {
        Self { id, user_id, amount, currency: currency.to_string(), payment_link_id: None, method: None }
    }

    pub fn for_link(mut self, link: &PaymentLink) -> Self {
        self.payment_link_id = Some(link.id.clone());
        self.method = Some(link.method.clone());
        self
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
/// An immutable-once-written record of one settlement attempt against one order. Multiple payments may exist per
/// order (retries); exactly one should end in success for a completed order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub provider_tx_id: String,
    pub currency: String,
    pub resp_code: Option<String>,
    pub resp_msg: Option<String>,
    /// False when the settlement was accepted under the `AcceptUnverified` signature policy and needs manual review.
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub provider_tx_id: String,
    pub currency: String,
    pub resp_code: Option<String>,
    pub resp_msg: Option<String>,
    pub verified: bool,
}
