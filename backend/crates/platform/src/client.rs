//! Client identification utilities
//!
//! Extracts the client metadata (IP address, user agent) that every
//! store call records for audit purposes.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Client metadata captured from request headers
///
/// Attached to pending-user, session, and challenge writes so the
/// store's audit records carry the originating client.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// User-Agent header, if present
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    /// Get IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }

    /// User agent, empty string when absent (audit column is NOT NULL)
    pub fn user_agent_or_empty(&self) -> &str {
        self.user_agent.as_deref().unwrap_or("")
    }
}

/// Extract client metadata from request headers
pub fn extract_client_meta(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> ClientMeta {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    ClientMeta::new(extract_client_ip(headers, direct_ip), user_agent)
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // Check X-Forwarded-For header (first IP in the list)
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}
