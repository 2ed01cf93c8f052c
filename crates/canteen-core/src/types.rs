//! # Domain Types
//!
//! Core domain types used throughout the canteen POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MenuItem     │   │      Order      │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  customer       │   │  order_id (FK)  │       │
//! │  │  price          │   │  status         │   │  tax / total    │       │
//! │  │  available      │   │  lines[]        │   │  refunded       │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │ 1:1                                                         │
//! │  ┌────────▼────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryRecord │   │  WalletAccount  │   │ LoyaltyAccount  │       │
//! │  │  quantity ≥ 0   │   │  balance ≥ 0    │   │  points ≥ 0     │       │
//! │  └─────────────────┘   │  + ledger       │   │  + ledger       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::GUEST_CUSTOMER_ID;

/// Generates a fresh entity id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Catalog
// =============================================================================

/// A dish or drink on the canteen menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the biller and on bills.
    pub name: String,

    /// Current selling price.
    pub price: Money,

    /// Whether billers may put this item on new orders.
    pub available: bool,
}

/// Stock counter paired 1:1 with a [`MenuItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    pub item_id: String,
    pub quantity: i64,
    pub low_stock_threshold: i64,
}

impl InventoryRecord {
    /// True once quantity has fallen to or below the threshold.
    pub fn is_low(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

/// A menu item joined with its stock counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockedItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub available: bool,
    pub quantity: i64,
    pub low_stock_threshold: i64,
}

// =============================================================================
// Customers
// =============================================================================

/// Who an order belongs to.
///
/// Guests are walk-in customers. They own no wallet, so a wallet bill for a
/// guest debits nothing, and they earn no loyalty points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum CustomerRef {
    Guest,
    Registered(String),
}

impl CustomerRef {
    /// Parses a raw customer id, mapping the sentinel to [`CustomerRef::Guest`].
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        if id.eq_ignore_ascii_case(GUEST_CUSTOMER_ID) {
            CustomerRef::Guest
        } else {
            CustomerRef::Registered(id.to_string())
        }
    }

    /// Restores a customer from its persisted (nullable) column.
    pub fn from_column(id: Option<String>) -> Self {
        match id {
            Some(id) => CustomerRef::Registered(id),
            None => CustomerRef::Guest,
        }
    }

    /// The value stored in the `customer_id` column (NULL for guests).
    pub fn as_column(&self) -> Option<&str> {
        match self {
            CustomerRef::Guest => None,
            CustomerRef::Registered(id) => Some(id),
        }
    }

    /// The registered id, if any.
    pub fn registered_id(&self) -> Option<&str> {
        self.as_column()
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, CustomerRef::Guest)
    }
}

impl fmt::Display for CustomerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomerRef::Guest => f.write_str(GUEST_CUSTOMER_ID),
            CustomerRef::Registered(id) => f.write_str(id),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ```text
///            cancel_order
///   pending ─────────────► canceled
///      │
///      │ generate_bill (claim, same transaction)
///      ▼
///  in_progress ──────────► completed
///      │
///      └── rollback on any failure ──► pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, stock reserved, awaiting settlement.
    Pending,
    /// Claimed by a settlement that has not committed yet.
    InProgress,
    /// Settled; exactly one bill exists.
    Completed,
    /// Canceled before settlement.
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A requested line before prices are snapshotted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// A line on an order.
/// Uses the snapshot pattern to freeze catalog data at order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub item_id: String,
    /// Item name at order time (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price at order time (frozen).
    pub unit_price: Money,
}

impl OrderLine {
    /// unit price × quantity
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer: CustomerRef,
    pub status: OrderStatus,
    /// Sum of line totals, snapshotted at creation.
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Set of distinct item ids on the order (used for combo matching).
    pub fn item_ids(&self) -> BTreeSet<String> {
        self.lines.iter().map(|l| l.item_id.clone()).collect()
    }
}

/// Which orders a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderFilter {
    #[default]
    All,
    Pending,
    Completed,
    Canceled,
}

impl OrderFilter {
    pub fn status(&self) -> Option<OrderStatus> {
        match self {
            OrderFilter::All => None,
            OrderFilter::Pending => Some(OrderStatus::Pending),
            OrderFilter::Completed => Some(OrderStatus::Completed),
            OrderFilter::Canceled => Some(OrderStatus::Canceled),
        }
    }
}

// =============================================================================
// Discounts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` percent off the subtotal.
    Percentage,
    /// `value` currency units off the subtotal, floored at zero.
    Fixed,
    /// Fixed reduction that applies only when every combo item is ordered.
    Combo,
}

/// A time-boxed promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: String,
    pub name: String,
    pub kind: DiscountKind,
    pub value: f64,
    /// Inclusive start of the active window.
    pub starts_at: DateTime<Utc>,
    /// Exclusive end of the active window.
    pub ends_at: DateTime<Utc>,
    pub combo_item_ids: BTreeSet<String>,
}

impl Discount {
    /// `starts_at <= now < ends_at`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now < self.ends_at
    }
}

/// Fields an operator supplies when creating or editing a discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountDraft {
    pub name: String,
    pub kind: DiscountKind,
    pub value: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub combo_item_ids: BTreeSet<String>,
}

/// Encodes a combo item set for the `combo_item_ids` TEXT column.
pub fn encode_item_set(ids: &BTreeSet<String>) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes the `combo_item_ids` column. Empty or malformed text yields an
/// empty set, which never satisfies a combo.
pub fn decode_item_set(raw: Option<&str>) -> BTreeSet<String> {
    raw.filter(|s| !s.trim().is_empty())
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

// =============================================================================
// Wallets
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WalletAccount {
    pub customer_id: String,
    pub balance: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum WalletEntryReason {
    /// Initial balance when the wallet was opened.
    Opening,
    TopUp,
    /// Debit for a bill.
    Payment,
    /// Credit when a wallet-paid bill is refunded.
    Refund,
}

/// Immutable record of a signed wallet balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WalletLedgerEntry {
    pub id: String,
    pub customer_id: String,
    pub delta: Money,
    pub reason: WalletEntryReason,
    /// Bill id for payments and refunds.
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Loyalty
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltyAccount {
    pub customer_id: String,
    pub points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyReason {
    Earned,
    Redeemed,
}

/// Immutable record of a signed loyalty balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltyLedgerEntry {
    pub id: String,
    pub customer_id: String,
    pub delta: i64,
    pub reason: LoyaltyReason,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Bills
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debit from the customer's prepaid wallet.
    Wallet,
    Cash,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The settlement record of a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: String,
    pub order_id: String,
    /// Pre-tax amount after discount and loyalty reductions.
    pub subtotal: Money,
    pub discount_amount: Money,
    pub loyalty_discount: Money,
    pub points_redeemed: i64,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub issued_by: String,
    pub created_at: DateTime<Utc>,
    /// Flips false → true exactly once.
    pub refunded: bool,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refunded_by: Option<String>,
}

/// Totals over bills that have not been refunded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesSummary {
    pub total_sales: Money,
    pub bill_count: i64,
}

/// Quantity sold of one menu item across non-refunded bills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopItem {
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
}

// =============================================================================
// Settings
// =============================================================================

/// Operator-tunable business settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Fraction applied to the pre-tax amount (0.08 = 8%).
    pub tax_rate: f64,
    /// Currency units spent per loyalty point earned.
    pub loyalty_earn_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tax_rate: crate::DEFAULT_TAX_RATE,
            loyalty_earn_rate: crate::DEFAULT_LOYALTY_EARN_RATE,
        }
    }
}

// =============================================================================
// Activity Log
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ActivityEntry {
    pub id: String,
    pub actor_id: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
