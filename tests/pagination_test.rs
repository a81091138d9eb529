//! Paging across list operations.

mod common;

use common::*;
use metrics_advisor::client::{collect_all, AdministrationClient, ListOptions};
use metrics_advisor::models::DataSourceCredential;

#[tokio::test]
async fn test_continuation_tokens_walk_every_item_once() {
    let client = client_with_page_size(3);
    for i in 0..8 {
        client
            .create_credential(DataSourceCredential::service_principal(
                format!("principal-{:02}", i),
                "client",
                "secret",
                "tenant",
            ))
            .await
            .unwrap();
    }

    let first = client.list_credentials(&ListOptions::default()).await.unwrap();
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.continuation_token.as_deref(), Some("3"));

    let all = collect_all(ListOptions::default(), |options| {
        let client = &client;
        async move { client.list_credentials(&options).await }
    })
    .await
    .unwrap();
    let names: Vec<&str> = all.iter().map(DataSourceCredential::name).collect();
    let expected: Vec<String> = (0..8).map(|i| format!("principal-{:02}", i)).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_skip_and_page_size() {
    let client = client_with_page_size(3);
    for name in ["a", "b", "c", "d", "e"] {
        client
            .create_data_feed(TestDataFeedBuilder::new(name).build())
            .await
            .unwrap();
    }

    let options = ListOptions::default().with_skip(1).with_max_page_size(2);
    let page = client.list_data_feeds(&Default::default(), &options).await.unwrap();
    let names: Vec<&str> = page.items.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);
    assert!(page.has_more());

    let past_end = ListOptions::default().with_skip(10);
    let page = client.list_data_feeds(&Default::default(), &past_end).await.unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more());

    let zero = ListOptions::default().with_max_page_size(0);
    let err = client.list_data_feeds(&Default::default(), &zero).await.unwrap_err();
    assert!(err.is_client_error());

    let garbage = ListOptions::default().with_continuation_token("next");
    assert!(client.list_data_feeds(&Default::default(), &garbage).await.is_err());
}
