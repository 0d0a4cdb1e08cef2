//! Funnel analytics for a quiz: viewed / started / completed / lead counts,
//! completions grouped by day, and the primary-result distribution.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::ResultCountRow;
use crate::extractors::AdminGuard;
use crate::rejections::{AppError, ResultExt};
use crate::AppState;

const COMPLETIONS_WINDOW_DAYS: i64 = 30;

pub fn routes() -> Router<AppState> {
    Router::new().route("/analytics", get(quiz_analytics))
}

#[derive(Deserialize)]
struct AnalyticsQuery {
    quiz_id: Option<i64>,
}

#[derive(Serialize)]
struct Funnel {
    viewed: i64,
    started: i64,
    completed: i64,
    leads: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DateCount {
    date: NaiveDate,
    count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsResponse {
    funnel: Funnel,
    completions_by_date: Vec<DateCount>,
    result_distribution: Vec<ResultCountRow>,
    total_sessions: i64,
    conversion_rate: f64,
}

async fn quiz_analytics(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let Some(quiz_id) = query.quiz_id else {
        return Err(AppError::Input("quiz_id is required"));
    };

    let (viewed, started, completed, leads) = tokio::join!(
        state.db.sessions_viewed_count(quiz_id),
        state.db.sessions_started_count(quiz_id),
        state.db.sessions_completed_count(quiz_id),
        state.db.sessions_lead_count(quiz_id),
    );
    let viewed = viewed.reject("failed to count viewed sessions")?;
    let started = started.reject("failed to count started sessions")?;
    let completed = completed.reject("failed to count completed sessions")?;
    let leads = leads.reject("failed to count leads")?;

    let since = Utc::now() - Duration::days(COMPLETIONS_WINDOW_DAYS);
    let times = state
        .db
        .completion_times(quiz_id, since)
        .await
        .reject("failed to load completion times")?;
    let distribution = state
        .db
        .result_distribution(quiz_id)
        .await
        .reject("failed to load result distribution")?;

    let conversion_rate = if viewed > 0 {
        completed as f64 / viewed as f64 * 100.0
    } else {
        0.0
    };

    Ok(Json(AnalyticsResponse {
        funnel: Funnel {
            viewed,
            started,
            completed,
            leads,
        },
        completions_by_date: group_by_date(&times),
        result_distribution: distribution,
        total_sessions: viewed,
        conversion_rate,
    }))
}

fn group_by_date(times: &[DateTime<Utc>]) -> Vec<DateCount> {
    let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for t in times {
        *counts.entry(t.date_naive()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn completions_group_by_calendar_date_in_order() {
        let times = vec![
            Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 8, 1, 23, 59, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 8, 2, 14, 30, 0).unwrap(),
        ];

        let grouped = group_by_date(&times);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].date, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(grouped[0].count, 1);
        assert_eq!(grouped[1].date, NaiveDate::from_ymd_opt(2026, 8, 2).unwrap());
        assert_eq!(grouped[1].count, 2);
    }

    #[test]
    fn empty_input_groups_to_nothing() {
        assert!(group_by_date(&[]).is_empty());
    }

    use axum::response::IntoResponse;

    use crate::db::models::QuizSettings;
    use crate::db::Db;
    use crate::email::ResendEmailSender;
    use crate::extractors::AdminGuard;
    use crate::services::admin_auth::AdminAuthService;
    use crate::services::scoring::ScoringPolicy;
    use crate::stytch::{ProviderSession, StytchClient};

    async fn analytics_state(name: &str) -> AppState {
        let path = std::env::temp_dir().join(format!(
            "leadquiz-analytics-{name}-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        AppState {
            db: Db::new(&format!("sqlite://{}", path.display())).await.unwrap(),
            auth: AdminAuthService::new(
                StytchClient::new("project-test-00000000".to_string(), "secret".to_string()),
                "quiz_admin".to_string(),
            ),
            email: ResendEmailSender::new(None, "noreply@resend.dev".into(), "Quiz".into()),
            scoring_policy: ScoringPolicy::Weighted,
            secure_cookies: false,
            notify_admin_default: false,
            admin_notification_email: None,
        }
    }

    fn admin() -> AdminGuard {
        AdminGuard(ProviderSession {
            session_token: "tok".into(),
            session_jwt: String::new(),
            roles: vec!["quiz_admin".into()],
            user: None,
        })
    }

    #[tokio::test]
    async fn conversion_rate_is_a_percentage_of_viewed_sessions() {
        let state = analytics_state("rate").await;
        let quiz = state
            .db
            .create_quiz("Quiz", None, None, "quiz", QuizSettings::default())
            .await
            .unwrap();

        // Two sessions viewed, one completed: 50%.
        state.db.create_session(quiz.id).await.unwrap();
        let completed = state.db.create_session(quiz.id).await.unwrap();
        state.db.mark_completed(completed.id, 1.0, false).await.unwrap();

        let response = quiz_analytics(
            admin(),
            State(state),
            Query(AnalyticsQuery {
                quiz_id: Some(quiz.id),
            }),
        )
        .await
        .unwrap()
        .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["conversionRate"], 50.0);
        assert_eq!(json["funnel"]["viewed"], 2);
        assert_eq!(json["funnel"]["completed"], 1);
        assert_eq!(json["totalSessions"], 2);
    }

    #[tokio::test]
    async fn conversion_rate_is_zero_without_sessions() {
        let state = analytics_state("empty").await;
        let quiz = state
            .db
            .create_quiz("Empty", None, None, "empty", QuizSettings::default())
            .await
            .unwrap();

        let response = quiz_analytics(
            admin(),
            State(state),
            Query(AnalyticsQuery {
                quiz_id: Some(quiz.id),
            }),
        )
        .await
        .unwrap()
        .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["conversionRate"], 0.0);
    }
}
