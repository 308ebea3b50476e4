//! Indexed fact model built once per analysis run
//!
//! Joins are derived a single time into lookup indexes (order to lines,
//! order to reviews, order to payments, product to category) so every engine
//! queries the same structures instead of re-scanning the raw vectors. The
//! model is read-only after build; engines share it by reference.

use super::records::{Category, Customer, Order, OrderLine, Payment, Product, Review, Seller};
use crate::error::AnalysisError;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};

/// The input bundle handed over by the external loader.
#[derive(Debug, Default)]
pub struct FactSnapshot {
    pub customers: Vec<Customer>,
    pub sellers: Vec<Seller>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub orders: Vec<Order>,
    pub order_lines: Vec<OrderLine>,
    pub payments: Vec<Payment>,
    pub reviews: Vec<Review>,
}

/// Per-person rollup over delivered orders, shared by the segmentation and
/// cohort engines. Only persons with at least one delivered order appear.
#[derive(Debug, Clone)]
pub struct CustomerActivity {
    pub person_id: String,
    pub first_purchase: NaiveDateTime,
    pub last_purchase: NaiveDateTime,
    pub order_count: usize,
    pub monetary: f64,
}

/// Immutable, indexed view over the snapshot.
#[derive(Debug)]
pub struct FactModel {
    snapshot: FactSnapshot,
    customers_by_id: HashMap<String, usize>,
    products_by_id: HashMap<String, usize>,
    categories_by_name: HashMap<String, usize>,
    orders_by_id: HashMap<String, usize>,
    lines_by_order: HashMap<String, Vec<usize>>,
    payments_by_order: HashMap<String, Vec<usize>>,
    reviews_by_order: HashMap<String, Vec<usize>>,
    activity: Vec<CustomerActivity>,
    never_purchased: usize,
}

impl FactModel {
    /// Build the indexed model, validating referential integrity.
    ///
    /// Any violation aborts the run: silently dropping or repairing rows would
    /// corrupt downstream revenue totals.
    pub fn build(snapshot: FactSnapshot) -> Result<Self, AnalysisError> {
        let customers_by_id: HashMap<String, usize> = snapshot
            .customers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let sellers_by_id: HashMap<String, usize> = snapshot
            .sellers
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        let products_by_id: HashMap<String, usize> = snapshot
            .products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let categories_by_name: HashMap<String, usize> = snapshot
            .categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        let orders_by_id: HashMap<String, usize> = snapshot
            .orders
            .iter()
            .enumerate()
            .map(|(i, o)| (o.id.clone(), i))
            .collect();

        for order in &snapshot.orders {
            if !customers_by_id.contains_key(&order.customer_id) {
                return Err(AnalysisError::integrity(
                    format!("order({})", order.id),
                    format!("references unknown customer {}", order.customer_id),
                ));
            }
        }

        let mut lines_by_order: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, line) in snapshot.order_lines.iter().enumerate() {
            let record = || format!("order_line({},{})", line.order_id, line.line_no);
            if !orders_by_id.contains_key(&line.order_id) {
                return Err(AnalysisError::integrity(
                    record(),
                    "references unknown order",
                ));
            }
            if !products_by_id.contains_key(&line.product_id) {
                return Err(AnalysisError::integrity(
                    record(),
                    format!("references unknown product {}", line.product_id),
                ));
            }
            if !sellers_by_id.contains_key(&line.seller_id) {
                return Err(AnalysisError::integrity(
                    record(),
                    format!("references unknown seller {}", line.seller_id),
                ));
            }
            lines_by_order
                .entry(line.order_id.clone())
                .or_default()
                .push(i);
        }

        let mut payments_by_order: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, payment) in snapshot.payments.iter().enumerate() {
            if !orders_by_id.contains_key(&payment.order_id) {
                return Err(AnalysisError::integrity(
                    format!("payment({},{})", payment.order_id, payment.sequence),
                    "references unknown order",
                ));
            }
            payments_by_order
                .entry(payment.order_id.clone())
                .or_default()
                .push(i);
        }

        let mut reviews_by_order: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, review) in snapshot.reviews.iter().enumerate() {
            if !orders_by_id.contains_key(&review.order_id) {
                return Err(AnalysisError::integrity(
                    format!("review({})", review.id),
                    "references unknown order",
                ));
            }
            if !(1..=5).contains(&review.score) {
                return Err(AnalysisError::integrity(
                    format!("review({})", review.id),
                    format!("score {} outside [1,5]", review.score),
                ));
            }
            reviews_by_order
                .entry(review.order_id.clone())
                .or_default()
                .push(i);
        }

        let mut model = Self {
            snapshot,
            customers_by_id,
            products_by_id,
            categories_by_name,
            orders_by_id,
            lines_by_order,
            payments_by_order,
            reviews_by_order,
            activity: Vec::new(),
            never_purchased: 0,
        };
        model.build_customer_activity();

        log::info!(
            "fact model built: {} orders, {} lines, {} customers, {} products, {} reviews",
            model.snapshot.orders.len(),
            model.snapshot.order_lines.len(),
            model.snapshot.customers.len(),
            model.snapshot.products.len(),
            model.snapshot.reviews.len(),
        );
        Ok(model)
    }

    fn build_customer_activity(&mut self) {
        let mut by_person: HashMap<String, CustomerActivity> = HashMap::new();
        for order in self.delivered_orders() {
            let Some(customer) = self.customer_of_order(&order.id) else {
                continue;
            };
            let revenue = self.order_revenue(&order.id);
            let entry = by_person
                .entry(customer.unique_id.clone())
                .or_insert_with(|| CustomerActivity {
                    person_id: customer.unique_id.clone(),
                    first_purchase: order.purchased_at,
                    last_purchase: order.purchased_at,
                    order_count: 0,
                    monetary: 0.0,
                });
            entry.first_purchase = entry.first_purchase.min(order.purchased_at);
            entry.last_purchase = entry.last_purchase.max(order.purchased_at);
            entry.order_count += 1;
            entry.monetary += revenue;
        }

        let persons: HashSet<&str> = self
            .snapshot
            .customers
            .iter()
            .map(|c| c.unique_id.as_str())
            .collect();
        self.never_purchased = persons.len() - by_person.len();

        let mut activity: Vec<CustomerActivity> = by_person.into_values().collect();
        activity.sort_by(|a, b| a.person_id.cmp(&b.person_id));
        self.activity = activity;
    }

    pub fn orders(&self) -> &[Order] {
        &self.snapshot.orders
    }

    pub fn order_lines(&self) -> &[OrderLine] {
        &self.snapshot.order_lines
    }

    pub fn products(&self) -> &[Product] {
        &self.snapshot.products
    }

    pub fn customers(&self) -> &[Customer] {
        &self.snapshot.customers
    }

    pub fn payments(&self) -> &[Payment] {
        &self.snapshot.payments
    }

    pub fn reviews(&self) -> &[Review] {
        &self.snapshot.reviews
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders_by_id
            .get(order_id)
            .map(|&i| &self.snapshot.orders[i])
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products_by_id
            .get(product_id)
            .map(|&i| &self.snapshot.products[i])
    }

    /// Orders with delivered status. Delivery-date analytics must additionally
    /// check for a non-null delivered timestamp.
    pub fn delivered_orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.snapshot
            .orders
            .iter()
            .filter(|o| o.status.is_delivered())
    }

    pub fn lines_for_order(&self, order_id: &str) -> impl Iterator<Item = &OrderLine> + '_ {
        self.lines_by_order
            .get(order_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.snapshot.order_lines[i])
    }

    pub fn payments_for_order(&self, order_id: &str) -> impl Iterator<Item = &Payment> + '_ {
        self.payments_by_order
            .get(order_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.snapshot.payments[i])
    }

    pub fn reviews_for_order(&self, order_id: &str) -> impl Iterator<Item = &Review> + '_ {
        self.reviews_by_order
            .get(order_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.snapshot.reviews[i])
    }

    pub fn customer_of_order(&self, order_id: &str) -> Option<&Customer> {
        let order = self.order(order_id)?;
        self.customers_by_id
            .get(&order.customer_id)
            .map(|&i| &self.snapshot.customers[i])
    }

    /// Resolve a product's category; `None` when the product carries no
    /// category reference or the reference does not resolve.
    pub fn category_of_product(&self, product_id: &str) -> Option<&Category> {
        let product = self.product(product_id)?;
        let name = product.category.as_deref()?;
        self.categories_by_name
            .get(name)
            .map(|&i| &self.snapshot.categories[i])
    }

    /// Full order revenue: sum of price + freight over its lines.
    pub fn order_revenue(&self, order_id: &str) -> f64 {
        self.lines_for_order(order_id)
            .map(|line| line.contribution())
            .sum()
    }

    /// Per-person delivered-order rollups, ordered by person id.
    pub fn customer_activity(&self) -> &[CustomerActivity] {
        &self.activity
    }

    /// Count of distinct persons with no delivered order. Reported separately
    /// from churn bands; these customers have no last-purchase date to band.
    pub fn never_purchased(&self) -> usize {
        self.never_purchased
    }
}
