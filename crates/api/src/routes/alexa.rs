//! Alexa webhook route
//!
//! The signature check runs against the raw body bytes before any JSON
//! parsing; the same `Bytes` buffer is then handed to the parser, so the
//! signed payload and the parsed payload are byte-identical.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use common::models::Intent;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use verifier::{CERT_CHAIN_URL_HEADER, SIGNATURE_HEADER};

/// Required in the JSON response
const ALEXA_VERSION: &str = "1.0";

/// Forces a link-account card to appear in the Alexa app
const CARD_TYPE_LINK: &str = "LinkAccount";

const INTENT_TYPE_LAUNCH: &str = "LaunchRequest";

const HELP_INTENT: &str = "AMAZON.HelpIntent";
const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
const STOP_INTENT: &str = "AMAZON.StopIntent";

const SUMMARY_INTENT: &str = "input.summary";
const TRENDING_INTENT: &str = "input.trending";
const NOTIFICATIONS_INTENT: &str = "input.notifications";
const ASSIGNED_ISSUES_INTENT: &str = "input.assigned_issues";

const HELP_TEXT: &str = "You can ask for a summary of your Github profile, a list of \
     trending repos, a list of your notifications, or a list of issues assigned to you.";
const WELCOME_TEXT: &str = "Welcome to DailyGithub! Let's get started. Ask for a summary \
     of your Github profile, a list of trending repos, a list of your notifications, or a \
     list of issues assigned to you.";
const AUTH_REQUIRED_TEXT: &str =
    "This task requires linking your Github account to this skill.";

#[derive(Debug, Default, Deserialize)]
pub struct AlexaRequest {
    #[serde(default)]
    pub session: AlexaSession,
    #[serde(default)]
    pub request: AlexaRequestDetails,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlexaSession {
    #[serde(default)]
    pub user: AlexaUser,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlexaUser {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlexaRequestDetails {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub intent: AlexaIntent,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlexaIntent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slots: AlexaSlots,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlexaSlots {
    #[serde(default)]
    pub number: AlexaSlot,
    #[serde(default)]
    pub lang: AlexaSlot,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlexaSlot {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AlexaResponse {
    pub version: &'static str,
    pub response: AlexaResponseDetails,
}

#[derive(Debug, Serialize)]
pub struct AlexaResponseDetails {
    #[serde(rename = "outputSpeech")]
    pub output_speech: AlexaOutputSpeech,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<AlexaCard>,
    #[serde(rename = "shouldEndSession")]
    pub should_end_session: bool,
}

#[derive(Debug, Serialize)]
pub struct AlexaCard {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AlexaOutputSpeech {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub ssml: String,
}

impl AlexaResponse {
    fn speak(speech: &str) -> Self {
        Self {
            version: ALEXA_VERSION,
            response: AlexaResponseDetails {
                output_speech: AlexaOutputSpeech {
                    kind: "SSML",
                    ssml: wrap_ssml(speech),
                },
                card: None,
                should_end_session: true,
            },
        }
    }
}

/// Alexa won't read SSML containing '&'
fn wrap_ssml(speech: &str) -> String {
    format!("<speak>{}</speak>", speech.replace('&', "and"))
}

/// Map an Alexa intent name plus slots onto a domain intent.
/// `None` means the name is unknown.
fn parse_intent(name: &str, slots: &AlexaSlots) -> Option<Intent> {
    match name {
        SUMMARY_INTENT => Some(Intent::Summary),
        TRENDING_INTENT => {
            let count = slots.number.value.parse::<usize>().ok().filter(|&n| n != 0);
            let language = (!slots.lang.value.is_empty()).then(|| slots.lang.value.clone());
            Some(Intent::Trending { count, language })
        }
        NOTIFICATIONS_INTENT => Some(Intent::Notifications),
        ASSIGNED_ISSUES_INTENT => Some(Intent::AssignedIssues),
        _ => None,
    }
}

/// Shared with the Google Assistant route, whose actions use the same
/// names as the Alexa custom intents
pub(crate) fn parse_action(action: &str, number: &str, lang: &str) -> Option<Intent> {
    let slots = AlexaSlots {
        number: AlexaSlot {
            value: number.to_string(),
        },
        lang: AlexaSlot {
            value: lang.to_string(),
        },
    };
    parse_intent(action, &slots)
}

pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<AlexaResponse>> {
    // Development bypass; never set in production
    let bypass = params.get("_dev").is_some_and(|v| !v.is_empty());

    if !bypass {
        let cert_url = headers
            .get(CERT_CHAIN_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("Missing {} header", CERT_CHAIN_URL_HEADER);
                ApiError::NotAuthorized
            })?;
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("Missing {} header", SIGNATURE_HEADER);
                ApiError::NotAuthorized
            })?;

        if let Err(e) = state.verifier.verify(cert_url, signature, &body).await {
            warn!("Request verification failed: {}", e);
            return Err(ApiError::NotAuthorized);
        }
    }

    // The verifier only borrowed the body; parse the same bytes it hashed
    let alexa_req: AlexaRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;

    if alexa_req.request.kind == INTENT_TYPE_LAUNCH {
        let mut resp = AlexaResponse::speak(WELCOME_TEXT);
        resp.response.should_end_session = false;
        return Ok(Json(resp));
    }

    let intent_name = alexa_req.request.intent.name.as_str();

    // Built-ins first
    match intent_name {
        HELP_INTENT => {
            let mut resp = AlexaResponse::speak(HELP_TEXT);
            resp.response.should_end_session = false;
            return Ok(Json(resp));
        }
        CANCEL_INTENT | STOP_INTENT => {
            // Just stop whatever is going on
            return Ok(Json(AlexaResponse::speak("")));
        }
        _ => {}
    }

    let Some(intent) = parse_intent(intent_name, &alexa_req.request.intent.slots) else {
        return Err(ApiError::BadRequest(format!(
            "unknown intent: {intent_name}"
        )));
    };

    let access_token = alexa_req
        .session
        .user
        .access_token
        .as_deref()
        .filter(|t| !t.is_empty());

    // Token-requiring intent without a linked account: prompt with a card
    if access_token.is_none() && intent.requires_access_token() {
        let mut resp = AlexaResponse::speak(AUTH_REQUIRED_TEXT);
        resp.response.card = Some(AlexaCard {
            kind: CARD_TYPE_LINK,
        });
        return Ok(Json(resp));
    }

    let fulfillment = state.handler.handle(intent, access_token).await?;
    let built = fulfillment.build();
    info!("Answering {} intent", intent_name);

    Ok(Json(AlexaResponse::speak(&built.speech)))
}
