//! Client identity extraction.
//!
//! The origin address comes from a configured proxy header when one is set,
//! otherwise from the TCP peer address. Together with the User-Agent it
//! derives the pseudo-anonymous [`UserId`] a vote is recorded under.

use crate::state::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;
use tally_core::UserId;

/// The user a request acts on behalf of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIdentity(pub UserId);

impl FromRequestParts<AppState> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let address = client_address(
            &parts.headers,
            state.config.server.client_ip_header.as_deref(),
            peer,
        );
        let agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok());

        Ok(Self(UserId::derive(address.as_deref(), agent)))
    }
}

/// Resolve the client address for a request.
///
/// Returns `None` when neither the configured header nor the peer address
/// is available; the caller substitutes a placeholder.
pub fn client_address(
    headers: &HeaderMap,
    trusted_header: Option<&str>,
    peer: Option<SocketAddr>,
) -> Option<String> {
    if let Some(name) = trusted_header
        && let Some(value) = headers.get(name)
        && let Ok(s) = value.to_str()
        && let Some(first) = s.split(',').next()
    {
        // Forwarding chains list the original client first
        let first = first.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }

    peer.map(|addr| addr.ip().to_string())
}
