//! Metric feedback through the administration client.

mod common;

use common::*;
use metrics_advisor::client::{AdministrationClient, FeedbackFilter, InMemoryAdministrationClient, ListOptions};
use metrics_advisor::core::{DetectionConfigurationId, MetricId};
use metrics_advisor::models::feedback::{AnomalyValue, ChangePointValue, PeriodType};
use metrics_advisor::models::{FeedbackKind, FeedbackType, MetricFeedback};

fn anomaly(metric_id: &MetricId, city: &str, start: u32, end: u32) -> MetricFeedback {
    MetricFeedback::new(
        metric_id.clone(),
        key(&[("city", city)]),
        FeedbackKind::Anomaly {
            start_time: day(start),
            end_time: day(end),
            value: AnomalyValue::Anomaly,
            detection_configuration_id: None,
        },
    )
}

#[tokio::test]
async fn test_add_and_get_feedback() {
    let client = InMemoryAdministrationClient::default();
    let (_, metric_id) = create_feed(&client, "sales").await;

    let added = client.add_feedback(anomaly(&metric_id, "redmond", 2, 4)).await.unwrap();
    let id = added.common.id.clone().unwrap();
    assert!(added.common.created_time.is_some());

    let fetched = client.get_feedback(&id).await.unwrap();
    assert_eq!(fetched, added);
    assert_eq!(fetched.feedback_type(), FeedbackType::Anomaly);
}

#[tokio::test]
async fn test_feedback_validation() {
    let client = InMemoryAdministrationClient::default();
    let (_, metric_id) = create_feed(&client, "sales").await;

    let unknown_metric = anomaly(&MetricId::new("ghost").unwrap(), "redmond", 1, 2);
    assert_eq!(client.add_feedback(unknown_metric).await.unwrap_err().category(), "not_found");

    let reversed = anomaly(&metric_id, "redmond", 5, 1);
    assert_eq!(client.add_feedback(reversed).await.unwrap_err().category(), "validation");

    let unknown_dimension = MetricFeedback::new(
        metric_id.clone(),
        key(&[("region", "west")]),
        FeedbackKind::ChangePoint {
            start_time: day(1),
            value: ChangePointValue::ChangePoint,
        },
    );
    assert_eq!(client.add_feedback(unknown_dimension).await.unwrap_err().category(), "validation");

    let empty_filter = MetricFeedback::new(
        metric_id,
        key(&[]),
        FeedbackKind::Comment {
            start_time: None,
            end_time: None,
            comment: "looks odd".to_string(),
        },
    );
    assert!(client.add_feedback(empty_filter).await.is_err());
}

#[tokio::test]
async fn test_list_feedback_filters() {
    let client = InMemoryAdministrationClient::default();
    let (_, metric_id) = create_feed(&client, "sales").await;

    client.add_feedback(anomaly(&metric_id, "redmond", 1, 3)).await.unwrap();
    client.add_feedback(anomaly(&metric_id, "seattle", 10, 12)).await.unwrap();
    client
        .add_feedback(MetricFeedback::new(
            metric_id.clone(),
            key(&[("city", "redmond"), ("category", "shoes")]),
            FeedbackKind::Period {
                period_type: PeriodType::AssignValue,
                period_value: Some(7),
            },
        ))
        .await
        .unwrap();
    client
        .add_feedback(MetricFeedback::new(
            metric_id.clone(),
            key(&[("city", "redmond")]),
            FeedbackKind::Comment {
                start_time: Some(day(2)),
                end_time: None,
                comment: "promotion week".to_string(),
            },
        ))
        .await
        .unwrap();

    let all = client
        .list_feedback(&metric_id, &FeedbackFilter::default(), &ListOptions::default())
        .await
        .unwrap();
    assert_eq!(all.items.len(), 4);
    let times: Vec<_> = all.items.iter().map(|f| f.common.created_time).collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted);

    let redmond = FeedbackFilter {
        dimension_filter: Some(key(&[("city", "redmond")])),
        ..FeedbackFilter::default()
    };
    let page = client.list_feedback(&metric_id, &redmond, &ListOptions::default()).await.unwrap();
    assert_eq!(page.items.len(), 3);

    let window = FeedbackFilter {
        start_time: Some(day(3)),
        end_time: Some(day(5)),
        ..FeedbackFilter::default()
    };
    let page = client.list_feedback(&metric_id, &window, &ListOptions::default()).await.unwrap();
    // the anomaly ending on day 3 and the open-ended comment overlap; period feedback has no range
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|f| f.feedback_type() != FeedbackType::Period));

    let periods = FeedbackFilter {
        feedback_type: Some(FeedbackType::Period),
        ..FeedbackFilter::default()
    };
    let page = client.list_feedback(&metric_id, &periods, &ListOptions::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_feedback_removed_with_data_feed() {
    let client = InMemoryAdministrationClient::default();
    let (feed, metric_id) = create_feed(&client, "sales").await;
    let added = client.add_feedback(anomaly(&metric_id, "redmond", 1, 2)).await.unwrap();

    client.delete_data_feed(feed.id.as_ref().unwrap()).await.unwrap();
    assert!(client.get_feedback(added.common.id.as_ref().unwrap()).await.is_err());
    assert_eq!(client.stats().feedback, 0);
}

#[tokio::test]
async fn test_anomaly_feedback_detection_reference() {
    let client = InMemoryAdministrationClient::default();
    let (_, metric_id) = create_feed(&client, "sales").await;
    let (_, other_metric) = create_feed(&client, "inventory").await;
    let detection = create_detection(&client, &metric_id, "default").await;
    let foreign = create_detection(&client, &other_metric, "default").await;

    let with_detection = |id: Option<DetectionConfigurationId>| {
        let mut feedback = anomaly(&metric_id, "redmond", 1, 2);
        if let FeedbackKind::Anomaly {
            detection_configuration_id,
            ..
        } = &mut feedback.kind
        {
            *detection_configuration_id = id;
        }
        feedback
    };

    let ghost = with_detection(Some(DetectionConfigurationId::new("ghost").unwrap()));
    assert_eq!(client.add_feedback(ghost).await.unwrap_err().category(), "not_found");

    let mismatched = with_detection(foreign.id.clone());
    assert_eq!(client.add_feedback(mismatched).await.unwrap_err().category(), "validation");

    let added = client.add_feedback(with_detection(detection.id.clone())).await.unwrap();
    match added.kind {
        FeedbackKind::Anomaly {
            detection_configuration_id,
            ..
        } => assert_eq!(detection_configuration_id, detection.id),
        other => panic!("unexpected feedback {:?}", other),
    }
    assert_eq!(client.stats().feedback, 1);
}
