//! Entry page, authorization callback and logout.

use axum::{
    Form, Router,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;
use webui_common::{AppError, AppResult};
use webui_core::{AuthorizationStep, CallbackParams, Session};
use webui_remote::TimelinePage;

use crate::{
    extractors::MaybeSession,
    middleware::AppState,
    response::{NeedInstance, TimelineResponse, found},
};

/// Query accepted by `GET /`.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub instance: Option<String>,
    pub max_id: Option<String>,
    pub since_id: Option<String>,
    pub min_id: Option<String>,
    pub limit: Option<u32>,
}

impl HomeQuery {
    fn page(&self) -> TimelinePage {
        TimelinePage {
            max_id: self.max_id.clone(),
            since_id: self.since_id.clone(),
            min_id: self.min_id.clone(),
            limit: self.limit,
        }
    }
}

/// Form accepted by `POST /`.
#[derive(Debug, Default, Deserialize)]
pub struct InstanceForm {
    pub instance: Option<String>,
}

/// Query the instance sends back to `/callback`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl From<CallbackQuery> for CallbackParams {
    fn from(query: CallbackQuery) -> Self {
        Self {
            code: query.code,
            state: query.state,
            error: query.error,
        }
    }
}

/// Show the timeline, or start authorization.
async fn home(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    jar: CookieJar,
    query: Result<Query<HomeQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let page = query.page();
    entry(&state, session, jar, query.instance.as_deref(), &page).await
}

/// Same as `GET /` with the instance submitted as a form.
async fn submit_instance(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    jar: CookieJar,
    form: Result<Form<InstanceForm>, FormRejection>,
) -> AppResult<Response> {
    let instance = form.ok().and_then(|Form(form)| form.instance);
    entry(
        &state,
        session,
        jar,
        instance.as_deref(),
        &TimelinePage::default(),
    )
    .await
}

async fn entry(
    state: &AppState,
    session: Option<Session>,
    jar: CookieJar,
    instance: Option<&str>,
    page: &TimelinePage,
) -> AppResult<Response> {
    if let Some(session) = session {
        let timeline = state.gateway.fetch_home_timeline(&session, page).await?;
        return Ok(TimelineResponse::new(session.server, timeline).into_response());
    }

    match state.authorization.begin(instance).await? {
        AuthorizationStep::NeedInstance => Ok(NeedInstance::default().into_response()),
        AuthorizationStep::Redirect(redirect) => {
            let jar = state.sessions.remember_pending(jar, &redirect.nonce);
            Ok((jar, found(redirect.url.as_str())).into_response())
        }
    }
}

/// Finish authorization and set the session cookies.
///
/// Once the pending authorization is spent, the nonce cookie is dropped
/// whether or not the exchange succeeded.
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let nonce = state.sessions.pending_nonce(&jar);
    match state
        .authorization
        .complete(&query.into(), nonce.as_deref())
        .await
    {
        Ok(session) => {
            let jar = state.sessions.save(jar, &session);
            let jar = state.sessions.forget_pending(jar);
            (jar, found("/")).into_response()
        }
        // The pending record is untouched, the browser may still retry.
        Err(err @ AppError::MissingCode) => err.into_response(),
        Err(err) => (state.sessions.forget_pending(jar), err).into_response(),
    }
}

/// Drop the session cookies.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Response) {
    info!("Session cleared");
    (state.sessions.clear(jar), found("/"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home).post(submit_instance))
        .route("/callback", get(callback))
        .route("/logout", post(logout))
}
