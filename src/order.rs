//! Order payload decoding and event extraction.
//!
//! The order notification arrives as loosely structured JSON in which every
//! interesting field may be absent. The model makes that explicit with
//! `Option` fields and documented defaults instead of probing a dynamic
//! value. Only the first coupon and the first line item are considered even
//! when more are present; known limitation, kept deliberately.

use serde::Deserialize;

/// Placeholder when the billing first name is missing or empty.
pub const DEFAULT_CUSTOMER: &str = "Someone";

/// Placeholder when the order has no line items.
pub const DEFAULT_PRODUCT: &str = "something";

/// Placeholder when the order total is missing.
pub const DEFAULT_TOTAL: &str = "0";

/// Placeholder when the currency code is missing.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Inbound order notification, WooCommerce-shaped.
///
/// Unknown fields are ignored; every recognized field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderNotification {
    /// Coupons applied at checkout, in application order.
    #[serde(default)]
    pub coupon_lines: Option<Vec<CouponLine>>,
    /// Billing contact details.
    #[serde(default)]
    pub billing: Option<Billing>,
    /// Purchased products, in cart order.
    #[serde(default)]
    pub line_items: Option<Vec<LineItem>>,
    /// Order total as a decimal string.
    #[serde(default)]
    pub total: Option<String>,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency: Option<String>,
}

/// One applied coupon.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponLine {
    /// Coupon code as entered at checkout.
    #[serde(default)]
    pub code: Option<String>,
}

/// Billing contact details.
#[derive(Debug, Clone, Deserialize)]
pub struct Billing {
    /// Customer first name.
    #[serde(default)]
    pub first_name: Option<String>,
}

/// One purchased product.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    /// Product display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Fields extracted from one order, valid for the duration of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEvent {
    /// First coupon code, upper-cased; the directory lookup key.
    pub coupon_code: String,
    /// Customer first name, defaulted when absent.
    pub customer: String,
    /// First line item name, defaulted when absent.
    pub product: String,
    /// Order total, defaulted when absent.
    pub total: String,
    /// Currency code, defaulted when absent.
    pub currency: String,
}

/// Extracts an order event from a decoded notification.
///
/// Returns `None` when the order carries no usable coupon code, in which
/// case the dispatch pipeline is a no-op.
pub fn extract_event(notification: &OrderNotification) -> Option<OrderEvent> {
    let coupon_code = notification
        .coupon_lines
        .as_deref()
        .and_then(<[CouponLine]>::first)
        .and_then(|line| line.code.as_deref())
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_uppercase)?;

    let customer = notification
        .billing
        .as_ref()
        .and_then(|billing| billing.first_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CUSTOMER)
        .to_string();

    let product = notification
        .line_items
        .as_deref()
        .and_then(<[LineItem]>::first)
        .and_then(|item| item.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_PRODUCT)
        .to_string();

    let total = notification.total.clone().unwrap_or_else(|| DEFAULT_TOTAL.to_string());
    let currency = notification.currency.clone().unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Some(OrderEvent { coupon_code, customer, product, total, currency })
}

/// Decodes raw body bytes and extracts an order event in one step.
///
/// Undecodable JSON is treated exactly like an order without coupons:
/// no event, no error.
pub fn extract_from_bytes(body: &[u8]) -> Option<OrderEvent> {
    let notification: OrderNotification = serde_json::from_slice(body).ok()?;
    extract_event(&notification)
}
