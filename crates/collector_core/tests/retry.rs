use std::time::Duration;

use collector_core::{Query, RetryPolicy};

#[test]
fn backoff_grows_linearly() {
    let policy = RetryPolicy {
        max_attempts: 4,
        base_delay: Duration::from_millis(500),
    };

    assert_eq!(policy.delay_for(1), Duration::from_millis(500));
    assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
    assert_eq!(policy.delay_for(3), Duration::from_millis(1500));
}

#[test]
fn retry_budget_is_bounded() {
    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
    };

    assert!(policy.allows_retry(1));
    assert!(policy.allows_retry(2));
    assert!(!policy.allows_retry(3));
    assert!(!policy.allows_retry(10));
}

#[test]
fn zero_attempts_still_means_one_try() {
    let policy = RetryPolicy {
        max_attempts: 0,
        base_delay: Duration::from_millis(10),
    };

    assert!(!policy.allows_retry(1));
    assert_eq!(policy.delay_for(0), Duration::from_millis(10));
}

#[test]
fn default_policy_is_conservative() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert!(policy.base_delay >= Duration::from_millis(100));
}

#[test]
fn effective_page_size_honours_source_cap() {
    let query = Query::new(500);
    assert_eq!(query.effective_page_size(None), 500);
    assert_eq!(query.effective_page_size(Some(51)), 51);
    // A cap above the request changes nothing.
    assert_eq!(query.effective_page_size(Some(1000)), 500);
    // A nonsense zero cap is ignored rather than wedging the run.
    assert_eq!(query.effective_page_size(Some(0)), 500);
}

#[test]
fn query_params_preserve_insertion_order() {
    let query = Query::new(50)
        .with_param("timabil_fra", "01.01.2025")
        .with_param("timabil_til", "31.12.2025")
        .with_param("org_id", "1401");

    let keys: Vec<&str> = query.params().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["timabil_fra", "timabil_til", "org_id"]);
    assert_eq!(query.page_size(), 50);
}
