// Full-country page walk over the HR read API

use hub_api::upstream::{collect_all, UpstreamError};

mod test_helpers;
use test_helpers::*;

#[tokio::test]
async fn test_collects_every_page_in_order() {
    let source = FakeSource::new(usa_employees(250));

    let employees = collect_all(&source, "USA", 100).await.unwrap();

    assert_eq!(source.requested_pages(), vec![1, 2, 3]);
    assert_eq!(employees.len(), 250);
    let ids: Vec<i64> = employees.iter().map(|e| e.id).collect();
    assert_eq!(ids, (1..=250).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_exact_multiple_of_page_size() {
    let source = FakeSource::new(usa_employees(200));

    let employees = collect_all(&source, "USA", 100).await.unwrap();

    assert_eq!(source.requested_pages(), vec![1, 2]);
    assert_eq!(employees.len(), 200);
}

#[tokio::test]
async fn test_empty_country_still_fetches_first_page() {
    let source = FakeSource::new(Vec::new());

    let employees = collect_all(&source, "Atlantis", 100).await.unwrap();

    assert_eq!(source.requested_pages(), vec![1]);
    assert!(employees.is_empty());
}

#[tokio::test]
async fn test_missing_metadata_stops_after_first_page() {
    let source = FakeSource::new(usa_employees(250)).with_last_page(LastPage::Missing);

    let employees = collect_all(&source, "USA", 100).await.unwrap();

    assert_eq!(source.requested_pages(), vec![1]);
    assert_eq!(employees.len(), 100);
}

#[tokio::test]
async fn test_non_positive_last_page_counts_as_one() {
    for last in [0, -3] {
        let source = FakeSource::new(usa_employees(250)).with_last_page(LastPage::Fixed(last));

        collect_all(&source, "USA", 100).await.unwrap();

        assert_eq!(source.requested_pages(), vec![1], "last_page = {}", last);
    }
}

#[tokio::test]
async fn test_upstream_error_aborts_the_walk() {
    let source = FakeSource::new(usa_employees(250)).failing_on(2);

    let result = collect_all(&source, "USA", 100).await;

    assert!(matches!(
        result,
        Err(UpstreamError::Status { status: 500, .. })
    ));
    assert_eq!(source.requested_pages(), vec![1, 2]);
}
