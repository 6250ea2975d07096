//! Concurrency properties: distinct order numbers under parallel creation,
//! coupon usage limits under contention, serialized per-order transitions,
//! and no overselling through the conditional stock decrement.

use std::collections::HashSet;

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;

use order_server::orders::CreateOrderInput;
use order_server::pricing::LineItemInput;
use order_server::{AppError, Config, ServerState};
use shared::catalog::ProductSnapshot;
use shared::coupon::{Coupon, DiscountRule};
use shared::order::{OrderKind, OrderStatus, RejectionCode};
use shared::types::{Actor, Role};

fn test_state() -> ServerState {
    let state = ServerState::initialize(&Config::from_env());
    state.directory.register("s1", "t1");
    state.catalog.upsert(
        "s1",
        ProductSnapshot {
            product_id: "noodles".to_string(),
            name: "Dan Dan Noodles".to_string(),
            base_price: 60.0,
            is_available: true,
            stock: None,
            variants: vec![],
            addons: vec![],
        },
    );
    state
}

fn customer(n: usize) -> Actor {
    Actor::new(format!("cust-{}", n), "t1", format!("Guest {}", n), Role::Customer)
}

fn order_input(coupon: Option<&str>, quantity: u32) -> CreateOrderInput {
    CreateOrderInput {
        store_id: "s1".to_string(),
        kind: OrderKind::Takeout,
        items: vec![LineItemInput {
            product_id: "noodles".to_string(),
            variant_id: None,
            quantity,
            addons: vec![],
            note: None,
        }],
        coupon_code: coupon.map(|c| c.to_string()),
        table_no: None,
        note: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creations_get_distinct_numbers() {
    let state = test_state();

    let tasks: Vec<_> = (0..32)
        .map(|n| {
            let state = state.clone();
            tokio::spawn(async move {
                let jitter = rand::random::<u64>() % 5;
                tokio::time::sleep(std::time::Duration::from_millis(jitter)).await;
                state
                    .orders
                    .create_order(&customer(n), order_input(None, 1))
                    .await
                    .unwrap()
                    .order_no
            })
        })
        .collect();

    let mut numbers = HashSet::new();
    for result in join_all(tasks).await {
        let number = result.unwrap();
        assert!(numbers.insert(number), "duplicate order number under concurrency");
    }
    assert_eq!(numbers.len(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coupon_limit_holds_under_contention() {
    let state = test_state();
    let now = Utc::now();
    let limit = 3u32;
    state.coupons.upsert(Coupon {
        code: "SCARCE".to_string(),
        store_id: "s1".to_string(),
        rule: DiscountRule::FixedAmount { amount: 5.0 },
        min_order_amount: None,
        max_discount: None,
        valid_from: now - ChronoDuration::days(1),
        valid_until: now + ChronoDuration::days(1),
        is_active: true,
        used_count: 0,
        usage_limit: Some(limit),
    });

    // U+1 concurrent creations against limit U
    let tasks: Vec<_> = (0..(limit + 1) as usize)
        .map(|n| {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .orders
                    .create_order(&customer(n), order_input(Some("SCARCE"), 1))
                    .await
            })
        })
        .collect();

    let results = join_all(tasks).await;
    let successes = results
        .iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();
    let limit_rejections = results
        .iter()
        .filter(|r| {
            matches!(
                r.as_ref().unwrap(),
                Err(AppError::Reject(rejection))
                    if rejection.code == RejectionCode::CouponLimitReached
            )
        })
        .count();

    assert_eq!(successes, limit as usize);
    assert_eq!(limit_rejections, 1);
    // The counter never exceeds the limit
    assert_eq!(state.coupons.used_count("s1", "SCARCE"), Some(limit));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transitions_cannot_both_succeed() {
    let state = test_state();
    let staff = Actor::new("staff-1", "t1", "Luis", Role::Staff);
    let order = state
        .orders
        .create_order(&customer(0), order_input(None, 1))
        .await
        .unwrap();

    // Two racing requests from the same prior state
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let state = state.clone();
            let staff = staff.clone();
            let order_id = order.id;
            tokio::spawn(async move {
                state
                    .orders
                    .transition(&staff, order_id, OrderStatus::Confirmed, None)
                    .await
            })
        })
        .collect();

    let results = join_all(tasks).await;
    let successes = results
        .iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one racing transition may win");

    let history = state.orders.get_history(&staff, order.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().unwrap().status, OrderStatus::Confirmed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_oversell_on_low_stock() {
    let state = test_state();
    state.catalog.upsert(
        "s1",
        ProductSnapshot {
            product_id: "cake".to_string(),
            name: "Basque Cheesecake".to_string(),
            base_price: 30.0,
            is_available: true,
            stock: Some(5),
            variants: vec![],
            addons: vec![],
        },
    );

    let make_input = || CreateOrderInput {
        store_id: "s1".to_string(),
        kind: OrderKind::Takeout,
        items: vec![LineItemInput {
            product_id: "cake".to_string(),
            variant_id: None,
            quantity: 2,
            addons: vec![],
            note: None,
        }],
        coupon_code: None,
        table_no: None,
        note: None,
    };

    let tasks: Vec<_> = (0..3)
        .map(|n| {
            let state = state.clone();
            let input = make_input();
            tokio::spawn(async move { state.orders.create_order(&customer(n), input).await })
        })
        .collect();

    let results = join_all(tasks).await;
    let successes = results
        .iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();

    // 5 in stock, three concurrent takers of 2: only two can succeed
    assert_eq!(successes, 2);
    assert_eq!(state.catalog.remaining_stock("s1", "cake"), Some(1));
}
