//! Optional HTTP surface exposing the plan JSON projection (C14). Gated
//! behind the `http` feature since the core has no opinion on whether or
//! how an embedder serves this; enabling the feature just adds the routes
//! teacher services wire with `axum`.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use crate::plan::{Plan, plan_summary};

#[derive(Clone)]
struct PlanState {
    plan: Arc<Plan>,
}

async fn get_plan(State(state): State<PlanState>) -> Json<crate::plan::PlanSummary> {
    Json(plan_summary(&state.plan))
}

/// Builds a router exposing `GET /plan` (fixed per router instance, since
/// plans don't carry a lookup registry in this crate). Callers nest this
/// under their own router, the way a larger service composes sub-routers
/// from its constituent parts.
pub fn plan_router(plan: Arc<Plan>) -> Router {
    Router::new()
        .route("/plan", get(get_plan))
        .with_state(PlanState { plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Phase, Step, Strategy};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn plan_route_returns_json_summary() {
        let plan = Arc::new(Plan::new(
            "plan1",
            vec![Phase::new("p1", vec![Step::new("s1", None)], Strategy::Serial)],
            Strategy::Serial,
        ));
        let router = plan_router(plan);
        let response = router
            .oneshot(Request::builder().uri("/plan").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
