use criterion::{criterion_group, criterion_main, Criterion};
use lead_desk::models::stats::DateRange;
use lead_desk::models::{Attended, LeadStatus, User};
use lead_desk::services::analytics::{fold_user_trends, fold_weekly_metrics};
use std::hint::black_box;

/// A week of leads spread over every hour, with a mix of statuses and
/// attendance encodings.
fn synthetic_week(count: i64) -> Vec<User> {
    let statuses = ["new", "qualified", "unqualified", "invalid", "follow", "lead"];
    (0..count)
        .map(|i| {
            let day = 8 + (i % 7);
            let hour = i % 24;
            let created = format!("2024-01-{:02}T{:02}:{:02}:00Z", day, hour, i % 60);
            User {
                userid: i + 1,
                username: Some(format!("tg_{}", i)),
                first_name: format!("Lead {}", i),
                last_name: None,
                language_code: Some("ru".to_string()),
                phone_number: (i % 3 != 0).then(|| format!("+99890{:07}", i)),
                onboarding: Some(i % 2 == 0),
                status: Some(LeadStatus::from(statuses[(i as usize) % statuses.len()].to_string())),
                lead_type: Some(if i % 4 == 0 { "paid" } else { "free" }.to_string()),
                attended: match i % 3 {
                    0 => Some(Attended::Flag(true)),
                    1 => Some(Attended::Text("true".to_string())),
                    _ => None,
                },
                remarks: None,
                created_at: created.clone(),
                updated_at: created,
            }
        })
        .collect()
}

fn benchmark_folds(c: &mut Criterion) {
    let rows = synthetic_week(5_000);
    let range = DateRange {
        start_date: "2024-01-08T00:00:00.000Z".to_string(),
        end_date: "2024-01-14T23:59:59.000Z".to_string(),
    };

    let mut group = c.benchmark_group("analytics_folds");

    group.bench_function("weekly_metrics_5k", |b| {
        b.iter(|| fold_weekly_metrics(black_box(&rows), range.clone()))
    });

    group.bench_function("user_trends_5k", |b| {
        b.iter(|| fold_user_trends(black_box(&rows)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_folds);
criterion_main!(benches);
