//! Dashboard report endpoint.
//!
//! `GET /reports/summary?from=YYYY-MM-DD&to=YYYY-MM-DD`. Both bounds or
//! neither; no bounds means all time.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use billdesk_core::period::DateRange;
use billdesk_core::validation::{optional_text, parse_date};
use billdesk_db::SummaryReport;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl SummaryQuery {
    fn range(self) -> ApiResult<Option<DateRange>> {
        match (optional_text(self.from), optional_text(self.to)) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) => {
                let range = DateRange::new(parse_date("from", &from)?, parse_date("to", &to)?)?;
                Ok(Some(range))
            }
            _ => Err(ApiError::bad_request("Both from and to are required")),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reports/summary", get(summary))
}

async fn summary(
    State(state): State<AppState>,
    _user: CurrentUser,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<Json<SummaryReport>> {
    let Query(query) = query?;
    let report = state.db.reports().summary(query.range()?).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(from: Option<&str>, to: Option<&str>) -> SummaryQuery {
        SummaryQuery {
            from: from.map(String::from),
            to: to.map(String::from),
        }
    }

    #[test]
    fn test_range_parsing() {
        assert!(query(None, None).range().unwrap().is_none());

        let range = query(Some("2024-05-01"), Some("2024-05-31"))
            .range()
            .unwrap()
            .unwrap();
        assert_eq!(range.from.to_string(), "2024-05-01");

        assert!(query(Some("2024-05-01"), None).range().is_err());
        assert!(query(Some("2024-06-01"), Some("2024-05-01")).range().is_err());
        assert!(query(Some("May 1"), Some("2024-05-01")).range().is_err());
    }
}
