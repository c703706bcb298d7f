//! Ordering and exhaustion properties of the fallback locator.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use smokeprobe::{
    Element, Locator, MockNode, MockPage, MockSession, Selector, SelectorList, Session,
    SmokeError,
};

const URL: &str = "http://app/login";

fn candidates(n: usize) -> SelectorList {
    SelectorList::new(
        "generated",
        (0..n).map(|i| Selector::test_id(format!("c{i}"))).collect(),
    )
}

fn page_with_only(k: usize) -> MockSession {
    let session = MockSession::new().with_page(
        URL,
        MockPage::new("Login")
            .node(MockNode::new("input").attr("data-testid", format!("c{k}"))),
    );
    session.navigate(URL).unwrap();
    session
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_only_visible_candidate_is_returned(n in 1usize..6, pick in 0usize..6) {
        let k = pick % n;
        let session = page_with_only(k);
        let locator = Locator::new(&session).with_poll_interval(Duration::from_millis(1));

        let element = locator.locate(&candidates(n), Duration::from_millis(3)).unwrap();
        element.type_text("hit").unwrap();
        prop_assert_eq!(
            session.value_of(&Selector::test_id(format!("c{k}"))),
            Some("hit".to_string())
        );

        for later in (k + 1)..n {
            let entry = format!("query:[data-testid=\"c{later}\"]");
            prop_assert_eq!(session.count(&entry), 0);
        }
        for earlier in 0..k {
            let entry = format!("query:[data-testid=\"c{earlier}\"]");
            prop_assert!(session.count(&entry) >= 1);
        }
    }
}

#[test]
fn exhaustion_waits_for_the_sum_of_timeouts() {
    let session = MockSession::new().with_page(URL, MockPage::new("Empty"));
    session.navigate(URL).unwrap();
    let locator = Locator::new(&session).with_poll_interval(Duration::from_millis(5));

    let start = Instant::now();
    let err = locator
        .locate(&candidates(4), Duration::from_millis(25))
        .unwrap_err();
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(matches!(
        err,
        SmokeError::LocateTimeout { attempted: 4, ref last_selector, .. }
            if *last_selector == Selector::test_id("c3")
    ));
}

#[test]
fn late_candidate_beats_timeout_of_earlier_ones() {
    let session = MockSession::new().with_page(
        URL,
        MockPage::new("Login").node(
            MockNode::new("input")
                .attr("data-testid", "c2")
                .visible_after(Duration::from_millis(10)),
        ),
    );
    session.navigate(URL).unwrap();
    let locator = Locator::new(&session).with_poll_interval(Duration::from_millis(2));

    let element = locator
        .locate(&candidates(3), Duration::from_millis(50))
        .unwrap();
    assert!(element.is_visible().unwrap());
}
