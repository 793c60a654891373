use crate::error::Result;
use crate::messages::{ApprovalMessage, MessageRoute};
use axum::Json;
use serde_json::Value;

/// POST /messages - Classify an approval message envelope.
pub async fn route_message_handler(Json(body): Json<Value>) -> Result<Json<MessageRoute>> {
    let message = ApprovalMessage::from_value(body)?;
    let route = message.route();

    tracing::debug!(
        kind = route.kind,
        request_id = %route.request_id,
        requires_decision = route.requires_decision,
        "Approval message routed"
    );

    Ok(Json(route))
}
