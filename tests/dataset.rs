use chrono::{Duration, NaiveDate};
use salesdash::data::{generate, PRODUCTS, REGIONS, SALES_FLOOR};

#[test]
fn hundred_consecutive_days() {
    let records = generate();
    assert_eq!(records.len(), 100);
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    for pair in records.windows(2) {
        assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
    }
}

#[test]
fn sales_never_below_floor() {
    let records = generate();
    assert!(records.iter().all(|r| r.sales >= SALES_FLOOR));
    // the floor is actually hit somewhere in the series
    assert!(records.iter().any(|r| r.sales == SALES_FLOOR));
}

#[test]
fn generation_is_deterministic() {
    assert_eq!(generate(), generate());
}

#[test]
fn labels_follow_day_index() {
    for (i, r) in generate().iter().enumerate() {
        assert_eq!(r.product, PRODUCTS[i % 3], "day {}", i);
        assert_eq!(r.region, REGIONS[i % 4], "day {}", i);
    }
}

#[test]
fn known_total() {
    let total: i64 = generate().iter().map(|r| r.sales).sum();
    assert_eq!(total, 95_760);
}
