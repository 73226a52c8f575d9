//! Google Assistant fulfillment route (Dialogflow-style payload)

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::routes::alexa::parse_action;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FulfillmentReq {
    #[serde(rename = "originalRequest", default)]
    pub original_request: OriginalReq,
    #[serde(default)]
    pub result: ResultReq,
}

#[derive(Debug, Default, Deserialize)]
pub struct OriginalReq {
    #[serde(default)]
    pub data: DataReq,
}

#[derive(Debug, Default, Deserialize)]
pub struct DataReq {
    #[serde(default)]
    pub user: UserReq,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserReq {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultReq {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub parameters: ParametersReq,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParametersReq {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub lang: String,
}

#[derive(Debug, Serialize)]
pub struct FulfillmentResp {
    pub speech: String,
    #[serde(rename = "displayText")]
    pub display_text: String,
}

pub async fn fulfill(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FulfillmentReq>,
) -> ApiResult<Json<FulfillmentResp>> {
    let Some(intent) = parse_action(
        &req.result.action,
        &req.result.parameters.number,
        &req.result.parameters.lang,
    ) else {
        return Err(ApiError::BadRequest(format!(
            "unknown fulfillment action: {}",
            req.result.action
        )));
    };

    let access_token = req
        .original_request
        .data
        .user
        .access_token
        .as_deref()
        .filter(|t| !t.is_empty());

    if access_token.is_none() && intent.requires_access_token() {
        return Err(ApiError::NotAuthorized);
    }

    let fulfillment = state.handler.handle(intent, access_token).await?;
    let built = fulfillment.build();
    info!("Answering {} action", req.result.action);

    Ok(Json(FulfillmentResp {
        speech: format!("<speak>{}</speak>", built.speech),
        display_text: built.display_text,
    }))
}
