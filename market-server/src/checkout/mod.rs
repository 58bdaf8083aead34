//! Checkout orchestration
//!
//! Converts a buyer's cart into one Order per seller. Each seller group is
//! its own all-or-nothing unit: stock decrement plus Order/OrderLine/
//! Payment creation succeed or fail together, and one group's failure
//! never rolls back another group's committed order.
//!
//! # Flow
//!
//! ```text
//! checkout(user, request)
//!     ├─ 1. Resolve + ownership-check the shipping address
//!     ├─ 2. Load cart lines (empty cart rejected)
//!     ├─ 3. Re-fetch live products, group lines by seller
//!     ├─ 4. Price every group (pure; no mutation)
//!     ├─ 5. Enforce the client-confirmed total
//!     ├─ 6. Per group: decrement stock, persist Order+Lines+Payment,
//!     │     compensating decrements on failure
//!     ├─ 7. Remove converted cart lines
//!     └─ 8. Emit one placement notification per order
//! ```

use crate::auth::CurrentUser;
use crate::db::repository::{
    address as address_repo, cart as cart_repo, order as order_repo, payment as payment_repo,
    product as product_repo,
};
use crate::notify::Notifier;
use crate::pricing;
use crate::stock::StockLedger;
use crate::stock::retry::with_retry;
use crate::utils::codes::generate_order_code;
use crate::utils::money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::{
    Address, CartLine, Order, OrderDetail, OrderLine, OrderStatus, Payment, PaymentMethod,
    PaymentState, Product, Role,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Re-draw attempts for a unique order code
const CODE_DRAW_ATTEMPTS: u32 = 5;

/// Checkout input
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: i64,
    pub payment_method: PaymentMethod,
    /// Gateway id; required for online payment
    pub gateway: Option<String>,
    pub notes: Option<String>,
    pub purchase_order_number: Option<String>,
    /// Client-confirmed grand total; checked against the server-computed
    /// total before any stock is touched
    pub expected_total: Option<f64>,
}

/// A seller group that was not converted into an order, and why
#[derive(Debug, Clone, Serialize)]
pub struct SellerGroupRejection {
    pub seller_id: i64,
    pub code: String,
    pub message: String,
    /// Present for out-of-stock rejections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

impl SellerGroupRejection {
    fn from_error(seller_id: i64, err: &AppError) -> Self {
        let available = match err {
            AppError::OutOfStock { available, .. } => Some(*available),
            _ => None,
        };
        Self {
            seller_id,
            code: err.code().to_string(),
            message: err.to_string(),
            available,
        }
    }
}

/// Checkout result: committed orders plus precise per-seller rejections
#[derive(Debug, Serialize)]
pub struct CheckoutOutcome {
    pub orders: Vec<OrderDetail>,
    pub rejections: Vec<SellerGroupRejection>,
}

/// One priced cart line
#[derive(Clone)]
struct PricedLine {
    cart_line_id: i64,
    product_id: i64,
    product_name: String,
    unit: String,
    unit_price: f64,
    quantity: i64,
    line_total: f64,
}

/// One priced seller group, ready to commit
#[derive(Clone)]
struct PricedGroup {
    seller_id: i64,
    lines: Vec<PricedLine>,
    subtotal: f64,
    shipping_fee: f64,
    discount: f64,
    total_amount: f64,
}

#[derive(Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    ledger: StockLedger,
    notifier: Notifier,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool, notifier: Notifier) -> Self {
        let ledger = StockLedger::new(pool.clone());
        Self {
            pool,
            ledger,
            notifier,
        }
    }

    /// Convert the buyer's cart into per-seller orders.
    pub async fn checkout(
        &self,
        user: &CurrentUser,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutOutcome> {
        if user.role != Role::Buyer {
            return Err(AppError::forbidden("Only buyers can check out"));
        }
        if request.payment_method == PaymentMethod::Gateway && request.gateway.is_none() {
            return Err(AppError::invalid("Gateway is required for online payment"));
        }

        // 1. Shipping address; not owning it looks the same as it not existing
        let address = address_repo::find_by_id(&self.pool, request.address_id)
            .await
            .map_err(AppError::from)?
            .filter(|a| a.is_owned_by(user.id))
            .ok_or_else(|| AppError::not_found(format!("Address {}", request.address_id)))?;

        // 2. Cart snapshot
        let cart_lines = cart_repo::list_by_buyer(&self.pool, user.id)
            .await
            .map_err(AppError::from)?;
        if cart_lines.is_empty() {
            return Err(AppError::invalid("Cart is empty"));
        }

        // 3. Live products, grouped by seller (cart caches are never trusted)
        let groups = self.group_by_seller(&cart_lines).await?;

        // 4. Pure pricing pass; no stock has been touched yet
        let mut priced: Vec<PricedGroup> = Vec::new();
        let mut failures: Vec<(i64, AppError)> = Vec::new();
        for (seller_id, group) in &groups {
            match self.price_group(user, &address, *seller_id, group).await {
                Ok(p) => priced.push(p),
                Err(e) => failures.push((*seller_id, e)),
            }
        }

        // 5. Price-tampering guard: the client-confirmed total must match
        //    the server-computed grand total
        if let Some(expected) = request.expected_total {
            money::validate_price(expected, "expected_total")?;
            let computed = money::to_f64(
                priced
                    .iter()
                    .map(|g| money::to_decimal(g.total_amount))
                    .sum::<Decimal>(),
            );
            if !money::money_eq(computed, expected) {
                return Err(AppError::invalid(format!(
                    "Order total {computed:.2} does not match confirmed total {expected:.2}"
                )));
            }
        }

        // 6. Commit each group as its own saga. The retry combinator wraps
        //    the whole group: a conflict that survives the ledger's own
        //    retries re-runs the group from a clean slate (compensation in
        //    commit_group keeps attempts idempotent).
        let mut orders: Vec<Order> = Vec::new();
        let mut consumed_line_ids: Vec<i64> = Vec::new();
        for group in priced {
            let seller_id = group.seller_id;
            let line_ids: Vec<i64> = group.lines.iter().map(|l| l.cart_line_id).collect();
            let committed = {
                let svc = self.clone();
                let user = user.clone();
                let address = address.clone();
                let request = request.clone();
                with_retry("checkout.group", move || {
                    let svc = svc.clone();
                    let user = user.clone();
                    let address = address.clone();
                    let request = request.clone();
                    let group = group.clone();
                    async move { svc.commit_group(&user, &address, &request, &group).await }
                })
                .await
            };
            match committed {
                Ok(order) => {
                    orders.push(order);
                    consumed_line_ids.extend(line_ids);
                }
                Err(e) => {
                    tracing::warn!(
                        seller_id,
                        buyer_id = user.id,
                        error = %e,
                        "Seller group rejected during checkout"
                    );
                    failures.push((seller_id, e));
                }
            }
        }

        // A checkout that produced nothing surfaces its typed failure
        if orders.is_empty() {
            let (seller_id, err) = failures
                .into_iter()
                .next()
                .unwrap_or_else(|| (0, AppError::internal("Checkout produced no orders")));
            tracing::warn!(seller_id, buyer_id = user.id, "Checkout failed for all seller groups");
            return Err(err);
        }

        // 7. Remove only the converted lines
        cart_repo::remove_lines(&self.pool, &consumed_line_ids)
            .await
            .map_err(AppError::from)?;

        // 8. Placement notifications, then reload full details
        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            self.notifier.notify_order_placed(&order);
            tracing::info!(
                order_code = %order.code,
                buyer_id = order.buyer_id,
                seller_id = order.seller_id,
                total = order.total_amount,
                "Order placed"
            );
            let lines = order_repo::find_lines(&self.pool, order.id)
                .await
                .map_err(AppError::from)?;
            let payments = payment_repo::list_by_order(&self.pool, order.id)
                .await
                .map_err(AppError::from)?;
            details.push(OrderDetail {
                order,
                lines,
                payments,
            });
        }

        Ok(CheckoutOutcome {
            orders: details,
            rejections: failures
                .iter()
                .map(|(seller_id, err)| SellerGroupRejection::from_error(*seller_id, err))
                .collect(),
        })
    }

    /// Re-fetch every cart line's product and group by seller.
    ///
    /// A vanished product fails the whole checkout here, before any stock
    /// mutation: without its live row the line cannot even be grouped.
    async fn group_by_seller(
        &self,
        cart_lines: &[CartLine],
    ) -> AppResult<BTreeMap<i64, Vec<(CartLine, Product)>>> {
        let mut groups: BTreeMap<i64, Vec<(CartLine, Product)>> = BTreeMap::new();
        for line in cart_lines {
            money::validate_quantity(line.quantity)?;
            let product = product_repo::find_by_id(&self.pool, line.product_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| {
                    AppError::invalid(format!("Product {} is no longer available", line.product_id))
                })?;
            groups
                .entry(product.seller_id)
                .or_default()
                .push((line.clone(), product));
        }
        Ok(groups)
    }

    /// Price one seller group. Pure with respect to stock: availability is
    /// pre-checked here, the authoritative check is the ledger's CAS.
    async fn price_group(
        &self,
        user: &CurrentUser,
        address: &Address,
        seller_id: i64,
        group: &[(CartLine, Product)],
    ) -> AppResult<PricedGroup> {
        let class = user.buyer_class;
        let seller_region = &group
            .first()
            .ok_or_else(|| AppError::internal("Empty seller group"))?
            .1
            .region;

        // Cross-region wholesale is rejected before any stock mutation
        let shipping_fee = pricing::shipping_fee(seller_region, &address.region, class)?;

        let mut lines = Vec::with_capacity(group.len());
        let mut subtotal = Decimal::ZERO;
        for (cart_line, product) in group {
            if !product.is_sellable() {
                return Err(AppError::invalid(format!(
                    "Product {} is not available for sale",
                    product.name
                )));
            }
            if cart_line.quantity > product.stock_quantity {
                return Err(AppError::out_of_stock(&product.name, product.stock_quantity));
            }

            let tiers = if class == shared::models::OrderClass::Wholesale
                && product.wholesale_enabled
            {
                product_repo::find_tiers(&self.pool, product.id)
                    .await
                    .map_err(AppError::from)?
            } else {
                Vec::new()
            };
            let quote = pricing::price(product, &tiers, cart_line.quantity, class);
            money::validate_price(quote.unit_price, "unit price")?;

            let line_total = money::line_total(quote.unit_price, cart_line.quantity);
            subtotal += money::to_decimal(line_total);
            lines.push(PricedLine {
                cart_line_id: cart_line.id,
                product_id: product.id,
                product_name: product.name.clone(),
                unit: quote.unit,
                unit_price: quote.unit_price,
                quantity: cart_line.quantity,
                line_total,
            });
        }

        let subtotal = money::to_f64(subtotal);
        let discount = pricing::discount_for(class, subtotal);
        let total_amount = money::order_total(subtotal, shipping_fee, discount);

        Ok(PricedGroup {
            seller_id,
            lines,
            subtotal,
            shipping_fee,
            discount,
            total_amount,
        })
    }

    /// Commit one priced group: decrement stock, then persist the order
    /// with its lines and initial payment. Already-applied decrements are
    /// compensated when a later step fails.
    async fn commit_group(
        &self,
        user: &CurrentUser,
        address: &Address,
        request: &CheckoutRequest,
        group: &PricedGroup,
    ) -> AppResult<Order> {
        let mut decremented: Vec<(i64, i64)> = Vec::new();
        for line in &group.lines {
            match self.ledger.decrement(line.product_id, line.quantity).await {
                Ok(()) => decremented.push((line.product_id, line.quantity)),
                Err(e) => {
                    self.compensate(&decremented).await;
                    return Err(e);
                }
            }
        }

        let order = match self.build_order(user, address, request, group).await {
            Ok(order) => order,
            Err(e) => {
                self.compensate(&decremented).await;
                return Err(e);
            }
        };

        let order_lines: Vec<OrderLine> = group
            .lines
            .iter()
            .map(|line| OrderLine {
                id: snowflake_id(),
                order_id: order.id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                unit: line.unit.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_total: line.line_total,
            })
            .collect();

        let payment = Payment {
            id: snowflake_id(),
            order_id: order.id,
            amount: order.total_amount,
            gateway: match request.payment_method {
                PaymentMethod::Gateway => request
                    .gateway
                    .clone()
                    .unwrap_or_else(|| "sandbox".to_string()),
                PaymentMethod::CashOnDelivery => "cash".to_string(),
                PaymentMethod::PurchaseOrder => "invoice".to_string(),
            },
            transaction_code: None,
            status: PaymentState::Pending,
            payment_time: None,
            gateway_message: None,
            created_at: now_millis(),
        };

        if let Err(e) = order_repo::create_with_lines(&self.pool, &order, &order_lines, &payment)
            .await
            .map_err(AppError::from)
        {
            self.compensate(&decremented).await;
            return Err(e);
        }

        Ok(order)
    }

    /// Assemble the Order row, drawing a globally-unique code
    async fn build_order(
        &self,
        user: &CurrentUser,
        address: &Address,
        request: &CheckoutRequest,
        group: &PricedGroup,
    ) -> AppResult<Order> {
        let code = self.draw_order_code().await?;
        let now = now_millis();
        Ok(Order {
            id: snowflake_id(),
            code,
            buyer_id: user.id,
            seller_id: group.seller_id,
            order_class: user.buyer_class,
            status: OrderStatus::Pending,
            payment_method: request.payment_method,
            payment_status: request.payment_method.initial_payment_status(),
            subtotal: group.subtotal,
            shipping_fee: group.shipping_fee,
            discount: group.discount,
            total_amount: group.total_amount,
            ship_to_name: address.recipient.clone(),
            ship_to_phone: address.phone.clone(),
            ship_to_line: address.line.clone(),
            ship_to_region: address.region.clone(),
            notes: request.notes.clone(),
            purchase_order_number: request.purchase_order_number.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn draw_order_code(&self) -> AppResult<String> {
        for _ in 0..CODE_DRAW_ATTEMPTS {
            let code = generate_order_code();
            if !order_repo::code_exists(&self.pool, &code)
                .await
                .map_err(AppError::from)?
            {
                return Ok(code);
            }
        }
        Err(AppError::internal("Failed to allocate a unique order code"))
    }

    /// Undo the decrements of a failed group. Failures here are logged:
    /// the group's order never existed, so the worst case is stock held
    /// back until manual reconciliation.
    async fn compensate(&self, decremented: &[(i64, i64)]) {
        for (product_id, quantity) in decremented {
            if let Err(e) = self.ledger.restore(*product_id, *quantity).await {
                tracing::error!(
                    product_id,
                    quantity,
                    error = %e,
                    "Failed to compensate stock decrement"
                );
            }
        }
    }
}
