//! Mastodon API data types.
//!
//! Only the fields this service reads are modelled. Unknown fields are
//! ignored and missing optional fields fall back to defaults, since
//! Mastodon, GoToSocial and friends differ in what they send.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::instance::Instance;

/// Parameters sent when registering a client application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRegistration {
    /// Client name shown to the user on the authorization page.
    pub client_name: String,
    /// Redirect URI, byte-for-byte identical at registration and exchange.
    pub redirect_uri: String,
    /// Space-separated scopes.
    pub scopes: String,
    /// Optional website of the client.
    pub website: Option<String>,
}

/// A client application registered with one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Instance the application was registered with.
    pub instance: Instance,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Redirect URI the application was registered with.
    pub redirect_uri: String,
    /// Granted scopes.
    pub scopes: String,
    /// Authorization endpoint, parameterised with this client.
    pub authorization_url: Url,
}

impl Application {
    /// Build an application from a registration response.
    pub fn from_registered(
        instance: Instance,
        registered: RegisteredApp,
        registration: &AppRegistration,
    ) -> Result<Self, url::ParseError> {
        let redirect_uri = registered
            .redirect_uri
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| registration.redirect_uri.clone());
        let authorization_url = authorization_url(
            &instance,
            &registered.client_id,
            &redirect_uri,
            &registration.scopes,
        )?;

        Ok(Self {
            instance,
            client_id: registered.client_id,
            client_secret: registered.client_secret,
            redirect_uri,
            scopes: registration.scopes.clone(),
            authorization_url,
        })
    }

    /// Authorization URL carrying a per-interaction `state` value.
    #[must_use]
    pub fn authorization_url_with_state(&self, state: &str) -> Url {
        let mut url = self.authorization_url.clone();
        url.query_pairs_mut().append_pair("state", state);
        url
    }
}

/// Build the `/oauth/authorize` URL for a client.
pub fn authorization_url(
    instance: &Instance,
    client_id: &str,
    redirect_uri: &str,
    scopes: &str,
) -> Result<Url, url::ParseError> {
    let mut url = instance.endpoint(&["oauth", "authorize"])?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", scopes);
    Ok(url)
}

/// Response of `POST /api/v1/apps`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredApp {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// Response of `POST /oauth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Post visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Direct => "direct",
        }
    }
}

/// Body of `POST /api/v1/statuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to_id: Option<String>,
    pub visibility: Visibility,
}

impl NewStatus {
    /// A public reply to `in_reply_to_id`.
    #[must_use]
    pub fn public_reply(in_reply_to_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            status: text.into(),
            in_reply_to_id: Some(in_reply_to_id.into()),
            visibility: Visibility::Public,
        }
    }
}

/// Account that authored a status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Media attached to a status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A status (post) as delivered by the remote API.
///
/// `content` is remote HTML and is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub account: Account,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub spoiler_text: String,
    #[serde(default)]
    pub sensitive: bool,
    /// Kept as sent: servers extend the set (`local`, `list`, `mutuals_only`).
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub in_reply_to_id: Option<String>,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
    #[serde(default)]
    pub reblog: Option<Box<Status>>,
    #[serde(default)]
    pub replies_count: u64,
    #[serde(default)]
    pub reblogs_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
    #[serde(default)]
    pub favourited: Option<bool>,
    #[serde(default)]
    pub reblogged: Option<bool>,
}

/// Opaque pagination tokens for the home timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// One fetch of the home timeline.
///
/// Statuses keep the order the remote delivered them in. The value is
/// consumed when iterated; fetch again for a fresh page.
#[derive(Debug)]
pub struct Timeline {
    statuses: Vec<Status>,
    /// `max_id` for the next (older) page, if the remote advertised one.
    pub next: Option<String>,
    /// `min_id` for the previous (newer) page, if the remote advertised one.
    pub prev: Option<String>,
}

impl Timeline {
    /// Create a timeline page.
    #[must_use]
    pub const fn new(statuses: Vec<Status>, next: Option<String>, prev: Option<String>) -> Self {
        Self {
            statuses,
            next,
            prev,
        }
    }

    /// Build a page from statuses and a raw `Link` header value.
    #[must_use]
    pub fn from_link_header(statuses: Vec<Status>, link: Option<&str>) -> Self {
        let (next, prev) = link.map(parse_link_header).unwrap_or_default();
        Self::new(statuses, next, prev)
    }

    /// Number of statuses in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Whether the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

impl IntoIterator for Timeline {
    type Item = Status;
    type IntoIter = std::vec::IntoIter<Status>;

    fn into_iter(self) -> Self::IntoIter {
        self.statuses.into_iter()
    }
}

/// Extract `(next max_id, prev min_id)` from a Mastodon `Link` header.
fn parse_link_header(header: &str) -> (Option<String>, Option<String>) {
    let mut next = None;
    let mut prev = None;

    for part in header.split(',') {
        let mut pieces = part.split(';');
        let Some(target) = pieces.next() else {
            continue;
        };
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let Ok(url) = Url::parse(target) else {
            continue;
        };
        let rel = pieces
            .filter_map(|p| p.trim().strip_prefix("rel="))
            .map(|r| r.trim_matches('"'))
            .next();

        let find = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        };

        match rel {
            Some("next") => next = find("max_id"),
            Some("prev") => prev = find("min_id").or_else(|| find("since_id")),
            _ => {}
        }
    }

    (next, prev)
}
