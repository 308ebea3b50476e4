//! End-to-end scenarios over a hand-built snapshot
//!
//! Each test builds a small fact snapshot, runs the full analysis and checks
//! the assembled report: segmentation arithmetic, Pareto cut-off walk,
//! minimum-sample omissions, review-absence handling and run determinism.

use chrono::{NaiveDate, NaiveDateTime};
use orderlens::facts::{
    Category, Customer, FactModel, FactSnapshot, Order, OrderLine, OrderStatus, Product, Review,
    Seller,
};
use orderlens::{run_analysis, AnalysisConfig, AnalysisError};

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap()
}

/// Snapshot builder mirroring the loader's handoff shape.
#[derive(Default)]
struct Fixture {
    snapshot: FactSnapshot,
    seq: usize,
}

impl Fixture {
    fn new() -> Self {
        let mut fixture = Self::default();
        fixture.snapshot.sellers.push(Seller {
            id: "s1".to_string(),
            city: "sao paulo".to_string(),
            state: "SP".to_string(),
        });
        fixture
    }

    fn category(&mut self, name: &str, display: &str) -> &mut Self {
        self.snapshot.categories.push(Category {
            name: name.to_string(),
            display_name: display.to_string(),
        });
        self
    }

    fn product(&mut self, id: &str, category: Option<&str>) -> &mut Self {
        self.snapshot.products.push(Product {
            id: id.to_string(),
            category: category.map(|c| c.to_string()),
            weight_g: Some(500.0),
            length_cm: None,
            height_cm: None,
            width_cm: None,
        });
        self
    }

    /// Delivered order for an existing person (registered on first use),
    /// one line, optional review.
    fn delivered_order(
        &mut self,
        person_id: &str,
        state: &str,
        product_id: &str,
        purchased: NaiveDateTime,
        price: f64,
        freight: f64,
        review: Option<u8>,
    ) -> &mut Self {
        self.seq += 1;
        let order_id = format!("o{}", self.seq);
        let customer_id = format!("c{}", self.seq);

        self.snapshot.customers.push(Customer {
            id: customer_id.clone(),
            unique_id: person_id.to_string(),
            city: "city".to_string(),
            state: state.to_string(),
        });
        self.snapshot.orders.push(Order {
            id: order_id.clone(),
            customer_id,
            status: OrderStatus::Delivered,
            purchased_at: purchased,
            approved_at: Some(purchased),
            shipped_at: Some(purchased),
            delivered_at: Some(purchased),
            estimated_delivery_at: purchased,
        });
        self.snapshot.order_lines.push(OrderLine {
            order_id: order_id.clone(),
            line_no: 1,
            product_id: product_id.to_string(),
            seller_id: "s1".to_string(),
            price,
            freight,
        });
        if let Some(score) = review {
            self.snapshot.reviews.push(Review {
                id: format!("r{}", self.seq),
                order_id,
                score,
                created_at: purchased,
                answered_at: None,
            });
        }
        self
    }

    fn build(self) -> FactModel {
        FactModel::build(self.snapshot).unwrap()
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_scenario_rfm_inputs_for_single_customer() {
    init_logging();

    // 1. Three delivered orders for one person, 10.0 freight each
    let mut fixture = Fixture::new();
    fixture.product("p1", None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 1, 10), 100.0, 10.0, None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 2, 10), 50.0, 10.0, None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 3, 10), 200.0, 10.0, None);
    let model = fixture.build();

    // 2. As-of date exactly 100 days after the last purchase
    let config = AnalysisConfig::new(NaiveDate::from_ymd_opt(2018, 6, 18).unwrap());
    let report = run_analysis(&model, &config).unwrap();

    // 3. Frequency, monetary (price + freight) and recency line up
    assert_eq!(report.segmentation.customers.len(), 1);
    let person = &report.segmentation.customers[0];
    assert_eq!(person.person_id, "u1");
    assert_eq!(person.frequency, 3);
    assert_eq!(person.monetary, 380.0);
    assert_eq!(person.recency_days, 100);

    // 4. 100 days of inactivity lands in the medium churn band
    assert_eq!(report.segmentation.churn_rollups.len(), 1);
    assert_eq!(report.segmentation.churn_rollups[0].segment, "Medium Risk");
}

#[test]
fn test_scenario_pareto_cutoff_at_80_pct() {
    init_logging();

    // Ten products with revenues 100, 90, ... 10 (total 550)
    let mut fixture = Fixture::new();
    for i in 0..10 {
        let product_id = format!("p{:02}", i);
        fixture.product(&product_id, None);
        let revenue = 100.0 - 10.0 * i as f64;
        fixture.delivered_order(
            &format!("u{}", i),
            "SP",
            &product_id,
            ts(2018, 3, 1),
            revenue,
            0.0,
            None,
        );
    }
    let model = fixture.build();
    let config = AnalysisConfig::new(NaiveDate::from_ymd_opt(2018, 9, 1).unwrap());

    let report = run_analysis(&model, &config).unwrap();
    let pareto = report.pareto.unwrap();

    // Cumulative revenue crosses 440 (80% of 550) at the sixth product
    assert_eq!(pareto.products, 6);
    assert_eq!(pareto.catalog, 10);
    assert_eq!(pareto.catalog_pct, 60.0);
    assert_eq!(pareto.revenue_share_pct, 81.82);
}

#[test]
fn test_scenario_category_below_sample_floor_is_omitted_not_an_error() {
    init_logging();

    // Two qualifying cheap five-star products in an eight-product category:
    // quartile 1 holds exactly those two, below the default floor of three
    let mut fixture = Fixture::new();
    fixture.category("housewares", "Housewares");
    for (product_id, price, score) in [("pa", 10.0, 5), ("pb", 11.0, 5)] {
        fixture.product(product_id, Some("housewares"));
        for i in 0..12 {
            fixture.delivered_order(
                &format!("u_{}_{}", product_id, i),
                "SP",
                product_id,
                ts(2018, 3, 1),
                price,
                0.0,
                Some(score),
            );
        }
    }
    for i in 0..6 {
        let product_id = format!("px{}", i);
        fixture.product(&product_id, Some("housewares"));
        for j in 0..12 {
            fixture.delivered_order(
                &format!("u_{}_{}", product_id, j),
                "SP",
                &product_id,
                ts(2018, 3, 1),
                60.0 + 5.0 * i as f64,
                0.0,
                Some(3),
            );
        }
    }
    let model = fixture.build();
    let config = AnalysisConfig::new(NaiveDate::from_ymd_opt(2018, 9, 1).unwrap());

    let report = run_analysis(&model, &config).unwrap();

    // The category is dropped, tallied, and the run still succeeds
    assert!(report.pricing.is_empty());
    assert_eq!(report.omissions.categories_below_sample, 1);
}

#[test]
fn test_scenario_missing_reviews_are_absent_not_zero() {
    init_logging();

    // Two delivered orders in one state; only one carries a review
    let mut fixture = Fixture::new();
    fixture.product("p1", None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 3, 1), 80.0, 0.0, Some(5));
    fixture.delivered_order("u2", "SP", "p1", ts(2018, 3, 2), 90.0, 0.0, None);
    let model = fixture.build();
    let config = AnalysisConfig::new(NaiveDate::from_ymd_opt(2018, 9, 1).unwrap());

    let report = run_analysis(&model, &config).unwrap();

    // A zero-counted missing review would drag this down to 2.5
    let sp = report.markets.iter().find(|row| row.state == "SP").unwrap();
    assert_eq!(sp.avg_review_score, Some(5.0));
}

#[test]
fn test_integrity_violation_aborts_the_run() {
    let mut fixture = Fixture::new();
    fixture.product("p1", None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 3, 1), 80.0, 0.0, None);
    // A line pointing at an order that does not exist
    fixture.snapshot.order_lines.push(OrderLine {
        order_id: "ghost".to_string(),
        line_no: 1,
        product_id: "p1".to_string(),
        seller_id: "s1".to_string(),
        price: 10.0,
        freight: 0.0,
    });

    let err = FactModel::build(fixture.snapshot).unwrap_err();
    match err {
        AnalysisError::DataIntegrity { record, .. } => {
            assert_eq!(record, "order_line(ghost,1)");
        }
        other => panic!("expected a data integrity error, got {}", other),
    }
}

#[test]
fn test_configuration_error_aborts_before_computation() {
    let mut fixture = Fixture::new();
    fixture.product("p1", None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 3, 1), 80.0, 0.0, None);
    let model = fixture.build();

    let mut config = AnalysisConfig::new(NaiveDate::from_ymd_opt(2018, 9, 1).unwrap());
    config.min_orders_for_pricing = 0;

    let err = run_analysis(&model, &config).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration { .. }));
}

#[test]
fn test_identical_runs_produce_identical_reports() {
    init_logging();

    let build = || {
        let mut fixture = Fixture::new();
        fixture.category("toys", "Toys");
        fixture.product("p1", Some("toys"));
        fixture.product("p2", Some("toys"));
        fixture.delivered_order("u1", "SP", "p1", ts(2018, 1, 10), 100.0, 10.0, Some(5));
        fixture.delivered_order("u1", "SP", "p2", ts(2018, 2, 10), 50.0, 5.0, Some(4));
        fixture.delivered_order("u2", "RJ", "p1", ts(2018, 2, 15), 70.0, 7.0, None);
        fixture.delivered_order("u3", "MG", "p2", ts(2018, 3, 20), 30.0, 3.0, Some(3));
        fixture.build()
    };
    let config = AnalysisConfig::new(NaiveDate::from_ymd_opt(2018, 9, 1).unwrap());

    let first = serde_json::to_string(&run_analysis(&build(), &config).unwrap()).unwrap();
    let second = serde_json::to_string(&run_analysis(&build(), &config).unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_cohort_matrix_over_full_run() {
    init_logging();

    let mut fixture = Fixture::new();
    fixture.product("p1", None);
    // u1 returns in month 1 and month 3; u2 never returns
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 1, 5), 50.0, 0.0, None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 2, 5), 50.0, 0.0, None);
    fixture.delivered_order("u1", "SP", "p1", ts(2018, 4, 5), 50.0, 0.0, None);
    fixture.delivered_order("u2", "SP", "p1", ts(2018, 1, 25), 40.0, 0.0, None);
    let model = fixture.build();
    let config = AnalysisConfig::new(NaiveDate::from_ymd_opt(2018, 9, 1).unwrap());

    let report = run_analysis(&model, &config).unwrap();

    assert_eq!(report.cohorts.len(), 1);
    let cohort = &report.cohorts[0];
    assert_eq!(cohort.size, 2);
    assert_eq!(cohort.active, [2, 1, 0, 1]);
    assert_eq!(cohort.retention_pct[1], Some(50.0));
    // One-time u2 counts at offset 0 only; no offset exceeds the cohort size
    assert!(cohort.active.iter().all(|&count| count <= cohort.size));
}
