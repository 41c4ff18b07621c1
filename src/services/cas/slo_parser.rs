//! Extracts the session index from a CAS single-sign-out push.
//!
//! CAS posts a form field `logoutRequest` holding a SAML-ish envelope:
//!
//! ```text
//! <samlp:LogoutRequest ID="LR-1" Version="2.0" IssueInstant="...">
//!   <saml:NameID>@NOT_USED@</saml:NameID>
//!   <samlp:SessionIndex>ST-1-abc</samlp:SessionIndex>
//! </samlp:LogoutRequest>
//! ```
//!
//! Namespace declarations are frequently missing, so the envelope is read with a
//! plain (non namespace-aware) streaming reader, matching local names. Payloads
//! the reader rejects as not well-formed get one more chance through a lenient
//! pattern. Anything else resolves to `None`; nothing here returns an error.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use tracing::debug;

use crate::services::cas::SessionIndex;

/// Payloads above this size are not logout requests.
pub const MAX_NOTIFICATION_BYTES: usize = 64 * 1024;

static LENIENT_LOGOUT_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<(?:[A-Za-z_][\w.\-]*:)?LogoutRequest\b.*?<(?:[A-Za-z_][\w.\-]*:)?SessionIndex>(.*?)</(?:[A-Za-z_][\w.\-]*:)?SessionIndex>",
    )
    .expect("lenient LogoutRequest pattern is valid")
});

#[derive(Debug, PartialEq, Eq)]
struct NotWellFormed;

/// Parse a logout notification.
///
/// - `content_type`: raw `Content-Type` header, if any.
/// - `is_post`: whether the request method was POST.
/// - `raw_body`: the `logoutRequest` value.
pub fn parse(content_type: Option<&str>, is_post: bool, raw_body: &str) -> Option<SessionIndex> {
    if is_multipart(content_type) {
        debug!("logout notification ignored: multipart body");
        return None;
    }

    if !is_post {
        debug!("logout notification ignored: method is not POST");
        return None;
    }

    if raw_body.len() > MAX_NOTIFICATION_BYTES {
        debug!(len = raw_body.len(), "logout notification ignored: body too large");
        return None;
    }

    let value = match session_index_from_xml(raw_body) {
        Ok(value) => value,
        Err(NotWellFormed) => {
            debug!("logout notification is not well-formed XML, trying lenient match");
            session_index_lenient(raw_body)
        }
    };

    if value.is_none() {
        debug!("logout notification ignored: no LogoutRequest/SessionIndex found");
    }
    value.map(SessionIndex::new)
}

pub fn is_multipart(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            ct.trim_start()
                .get(..10)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"))
        })
        .unwrap_or(false)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// First SessionIndex text found inside a LogoutRequest element.
fn session_index_from_xml(body: &str) -> Result<Option<String>, NotWellFormed> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    // depth at which the enclosing LogoutRequest was opened
    let mut request_depth: Option<usize> = None;
    let mut in_session_index = false;
    let mut value = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"LogoutRequest" if request_depth.is_none() => request_depth = Some(depth),
                    b"SessionIndex" if request_depth.is_some() && !in_session_index => {
                        in_session_index = true;
                        value.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) if in_session_index => {
                let text = t.unescape().map_err(|_| NotWellFormed)?;
                value.push_str(&text);
            }
            Ok(Event::CData(c)) if in_session_index => {
                value.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::End(e)) => {
                if in_session_index && e.local_name().as_ref() == b"SessionIndex" {
                    in_session_index = false;
                    if let Some(found) = non_empty(&value) {
                        return Ok(Some(found));
                    }
                }
                if request_depth == Some(depth) {
                    request_depth = None;
                }
                depth = depth.checked_sub(1).ok_or(NotWellFormed)?;
            }
            Ok(Event::Eof) => {
                return if depth == 0 { Ok(None) } else { Err(NotWellFormed) };
            }
            Err(_) => return Err(NotWellFormed),
            _ => {}
        }
    }
}

fn session_index_lenient(body: &str) -> Option<String> {
    LENIENT_LOGOUT_REQUEST
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| non_empty(m.as_str()))
}
