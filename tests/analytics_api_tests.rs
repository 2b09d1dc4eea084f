// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics API tests.

use axum::http::StatusCode;
use chrono::{Datelike, Duration, Utc};
use lead_desk::models::Attended;
use lead_desk::time_utils::format_utc_rfc3339;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_weekly_metrics_boundaries_inclusive() {
    let rows = vec![
        common::lead(1, "new", "2024-01-08T00:00:00.000Z"),
        common::lead(2, "qualified", "2024-01-14T23:59:59.000Z"),
        common::lead(3, "new", "2024-01-07T23:59:59.000Z"),
        common::lead(4, "new", "2024-01-15T00:00:00.000Z"),
    ];
    let (app, state, _) = common::create_test_app(rows);

    let response = app
        .oneshot(common::authed_get(
            &state,
            "/api/analytics/weekly-metrics?startDate=2024-01-08T00:00:00Z&endDate=2024-01-14T23:59:59Z",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["statusCounts"]["new"], 1);
    assert_eq!(body["statusCounts"]["qualified"], 1);
    assert_eq!(body["dailyStats"].as_array().unwrap().len(), 2);
    assert_eq!(body["dateRange"]["startDate"], "2024-01-08T00:00:00.000Z");
    assert_eq!(body["dateRange"]["endDate"], "2024-01-14T23:59:59.000Z");
}

#[tokio::test]
async fn test_weekly_metrics_bare_end_day_includes_final_instant() {
    let rows = vec![
        common::lead(1, "new", "2024-03-07T23:59:59.999500Z"),
        common::lead(2, "new", "2024-03-08T00:00:00Z"),
    ];
    let (app, state, _) = common::create_test_app(rows);

    let body = common::body_json(
        app.oneshot(common::authed_get(
            &state,
            "/api/analytics/weekly-metrics?startDate=2024-03-01&endDate=2024-03-07",
        ))
        .await
        .unwrap(),
    )
    .await;

    assert_eq!(body["statusCounts"]["new"], 1);
    assert_eq!(body["dateRange"]["endDate"], "2024-03-07T23:59:59.999Z");
}

#[tokio::test]
async fn test_weekly_metrics_daily_buckets_chronological() {
    let rows = vec![
        common::lead(1, "new", "2024-01-10T10:00:00Z"),
        common::lead(2, "lead", "2024-01-08T10:00:00Z"),
        common::lead(3, "invalid", "2024-01-09T10:00:00Z"),
        common::lead(4, "unqualified", "2024-01-08T07:00:00Z"),
    ];
    let (app, state, _) = common::create_test_app(rows);

    let body = common::body_json(
        app.oneshot(common::authed_get(
            &state,
            "/api/analytics/weekly-metrics?startDate=2024-01-08&endDate=2024-01-14",
        ))
        .await
        .unwrap(),
    )
    .await;

    let days = body["dailyStats"].as_array().unwrap();
    let labels: Vec<&str> = days.iter().map(|d| d["day"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["Mon, Jan 8", "Tue, Jan 9", "Wed, Jan 10"]);

    // The legacy "lead" row is bucketed but not counted per status.
    assert_eq!(days[0]["unqualified"], 1);
    assert_eq!(days[0]["new"], 0);
    assert_eq!(days[0]["date"], "2024-01-08T07:00:00.000Z");
    assert_eq!(body["statusCounts"]["lead"], 1);
}

#[tokio::test]
async fn test_weekly_metrics_attendance_on_qualified_rows() {
    let mut rows: Vec<_> = (1..=5)
        .map(|id| common::lead(id, "qualified", "2024-01-09T10:00:00Z"))
        .collect();
    rows[0].attended = Some(Attended::Flag(true));
    rows[1].attended = Some(Attended::Text("true".to_string()));
    rows[2].attended = Some(Attended::Flag(false));
    rows[3].attended = None;
    rows[4].status = None;
    rows[4].attended = Some(Attended::Flag(true));
    let (app, state, _) = common::create_test_app(rows);

    let body = common::body_json(
        app.oneshot(common::authed_get(
            &state,
            "/api/analytics/weekly-metrics?startDate=2024-01-08&endDate=2024-01-14",
        ))
        .await
        .unwrap(),
    )
    .await;

    assert_eq!(body["attendanceCounts"]["attended"], 2);
    assert_eq!(body["attendanceCounts"]["notAttended"], 2);
    assert_eq!(body["onboardingCounts"]["notOnboarded"], 4);
    assert_eq!(body["typeDistribution"]["free"], 4);
    assert_eq!(body["statusCounts"]["unknown"], 1);
}

#[tokio::test]
async fn test_weekly_metrics_default_window() {
    let now = Utc::now();
    let rows = vec![
        common::lead(1, "new", &format_utc_rfc3339(now - Duration::days(2))),
        common::lead(2, "new", &format_utc_rfc3339(now - Duration::days(30))),
    ];
    let (app, state, _) = common::create_test_app(rows);

    let body = common::body_json(
        app.oneshot(common::authed_get(&state, "/api/analytics/weekly-metrics"))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(body["statusCounts"]["new"], 1);
}

#[tokio::test]
async fn test_weekly_metrics_invalid_date_is_bad_request() {
    let (app, state, _) = common::create_test_app(vec![]);

    let response = app
        .oneshot(common::authed_get(
            &state,
            "/api/analytics/weekly-metrics?startDate=last-week",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_onboarding_stats() {
    let mut rows = vec![
        common::lead(1, "new", "2024-01-09T10:00:00Z"),
        common::lead(2, "qualified", "2024-01-09T10:00:00Z"),
        common::lead(3, "unqualified", "2024-01-09T10:00:00Z"),
        common::lead(4, "qualified", "2024-01-09T10:00:00Z"),
    ];
    rows[1].onboarding = Some(true);
    rows[1].lead_type = Some("paid".to_string());
    rows[2].phone_number = None;
    rows[3].lead_type = None;
    let (app, state, _) = common::create_test_app(rows);

    let body = common::body_json(
        app.oneshot(common::authed_get(&state, "/api/analytics/onboarding-stats"))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(body["totalUsers"], 3);
    assert_eq!(body["onboardingStats"]["completed"], 1);
    assert_eq!(body["onboardingStats"]["pending"], 2);
    assert_eq!(body["qualificationStats"]["qualified"], 1);
    assert_eq!(body["qualificationStats"]["unqualified"], 1);
    assert_eq!(body["qualificationStats"]["new"], 1);
    assert_eq!(body["phoneNumberStats"]["withPhone"], 2);
    assert_eq!(body["phoneNumberStats"]["withoutPhone"], 1);
    assert_eq!(body["typeDistribution"]["paid"], 1);
    assert_eq!(body["typeDistribution"]["free"], 2);
}

#[tokio::test]
async fn test_user_trends_recent_months_only() {
    let now = Utc::now();
    let rows = vec![
        common::lead(1, "new", &format_utc_rfc3339(now - Duration::days(1))),
        common::lead(2, "qualified", &format_utc_rfc3339(now - Duration::days(1))),
        common::lead(3, "new", &format_utc_rfc3339(now - Duration::days(400))),
    ];
    let (app, state, _) = common::create_test_app(rows);

    let body = common::body_json(
        app.oneshot(common::authed_get(&state, "/api/analytics/user-trends"))
            .await
            .unwrap(),
    )
    .await;

    let months = body.as_array().unwrap();
    assert_eq!(months.len(), 1);

    let recent = now - Duration::days(1);
    assert_eq!(
        months[0]["key"],
        format!("{:04}-{:02}", recent.year(), recent.month())
    );
    assert_eq!(months[0]["total"], 2);
    assert_eq!(months[0]["new"], 1);
    assert_eq!(months[0]["qualified"], 1);
}
