use crate::heartbeat::{HeartbeatSnapshot, HeartbeatState};
use axum::{Json, Router, extract::State, routing::get};
use logger::warn;
use rest_task::BindScope;
use std::sync::Arc;

/// Route builder for the REST task. `/heartbeat` is only mounted on loopback listeners.
pub fn internal_routes(
    state: Arc<HeartbeatState>,
) -> impl Fn(Router, BindScope) -> Router + Send + Sync + 'static {
    move |router: Router, scope: BindScope| {
        if !scope.is_loopback() {
            warn!("REST listener is not loopback-bound, internal routes disabled");
            return router;
        }

        router.merge(
            Router::new()
                .route("/heartbeat", get(heartbeat))
                .with_state(state.clone()),
        )
    }
}

async fn heartbeat(State(state): State<Arc<HeartbeatState>>) -> Json<HeartbeatSnapshot> {
    Json(state.snapshot())
}
