//! CAS 2.0 `serviceValidate` response parsing.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::services::cas::client::{CasError, CasPrincipal};

/// Parse a `<cas:serviceResponse>` document.
///
/// - `authenticationSuccess/user` (+ optional `attributes/*`) => principal
/// - `authenticationFailure code="..."` => `CasError::Rejected`
pub fn parse_service_response(xml: &str) -> Result<CasPrincipal, CasError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // local names of the currently open elements
    let mut path: Vec<String> = Vec::new();
    let mut user: Option<String> = None;
    let mut attributes = BTreeMap::new();
    let mut failure: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if local == "authenticationFailure" {
                    let code = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.local_name().as_ref() == b"code")
                        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
                        .unwrap_or_else(|| "UNKNOWN".to_string());
                    failure = Some((code, String::new()));
                }
                path.push(local);
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"authenticationFailure" {
                    failure = Some(("UNKNOWN".to_string(), String::new()));
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| CasError::InvalidResponse(e.to_string()))?
                    .to_string();
                match path.as_slice() {
                    [.., parent, leaf] if parent == "authenticationSuccess" && leaf == "user" => {
                        user = Some(text);
                    }
                    [.., parent, name] if parent == "attributes" => {
                        attributes.insert(name.clone(), text);
                    }
                    [.., leaf] if leaf == "authenticationFailure" => {
                        if let Some((_, message)) = failure.as_mut() {
                            *message = text;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CasError::InvalidResponse(e.to_string())),
            _ => {}
        }
    }

    if let Some((code, message)) = failure {
        return Err(CasError::Rejected { code, message });
    }

    match user {
        Some(user) if !user.is_empty() => Ok(CasPrincipal { user, attributes }),
        _ => Err(CasError::InvalidResponse(
            "no authenticationSuccess/user element".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_with_attributes() {
        let xml = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationSuccess>
    <cas:user>alice</cas:user>
    <cas:attributes>
      <cas:email>alice@example.com</cas:email>
      <cas:displayName>Alice</cas:displayName>
    </cas:attributes>
  </cas:authenticationSuccess>
</cas:serviceResponse>"#;

        let principal = parse_service_response(xml).unwrap();
        assert_eq!(principal.user, "alice");
        assert_eq!(principal.attributes["email"], "alice@example.com");
        assert_eq!(principal.attributes["displayName"], "Alice");
    }

    #[test]
    fn failure_carries_code_and_message() {
        let xml = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationFailure code="INVALID_TICKET">Ticket ST-1 not recognized</cas:authenticationFailure>
</cas:serviceResponse>"#;

        match parse_service_response(xml) {
            Err(CasError::Rejected { code, message }) => {
                assert_eq!(code, "INVALID_TICKET");
                assert_eq!(message, "Ticket ST-1 not recognized");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_user_is_invalid() {
        let xml = "<cas:serviceResponse><cas:authenticationSuccess/></cas:serviceResponse>";
        assert!(matches!(
            parse_service_response(xml),
            Err(CasError::InvalidResponse(_))
        ));
    }

    #[test]
    fn broken_xml_is_invalid() {
        assert!(matches!(
            parse_service_response("<cas:serviceResponse><cas:user>x</cas:oops>"),
            Err(CasError::InvalidResponse(_))
        ));
    }
}
