// Encoding and decoding between local types and request/response bodies.
//
// JSON payloads go through serde; the HuJSON policy file is passed through
// as text so comments and formatting survive.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::types::{Acl, AclFormat, AclPolicy};

const PREVIEW_LEN: usize = 200;

/// A request body ready to be sent, tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Json(Vec<u8>),
    HuJson(String),
}

impl RequestBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => AclFormat::Json.media_type(),
            Self::HuJson(_) => AclFormat::HuJson.media_type(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Json(bytes) => bytes,
            Self::HuJson(text) => text.into_bytes(),
        }
    }
}

/// Encode a value as a JSON request body.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<RequestBody, Error> {
    serde_json::to_vec(value)
        .map(RequestBody::Json)
        .map_err(|e| Error::Serialization {
            message: e.to_string(),
        })
}

/// Decode a JSON response body, keeping a preview of the body on failure.
pub fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(PREVIEW_LEN).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

/// Encode a policy file in whichever representation it carries.
pub fn encode_policy(policy: &AclPolicy) -> Result<RequestBody, Error> {
    match policy {
        AclPolicy::Structured(acl) => encode_json(acl),
        AclPolicy::HuJson(text) => Ok(RequestBody::HuJson(text.clone())),
    }
}

/// Decode a policy file body fetched in `format`.
pub fn decode_policy(format: AclFormat, body: &str) -> Result<AclPolicy, Error> {
    match format {
        AclFormat::Json => decode_json::<Acl>(body).map(AclPolicy::Structured),
        AclFormat::HuJson => Ok(AclPolicy::HuJson(body.to_owned())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::AclRule;

    #[test]
    fn structured_policy_round_trips() {
        let acl = Acl {
            acls: vec![AclRule::accept(["*"], ["*:*"])],
            ..Acl::default()
        };
        let body = encode_policy(&AclPolicy::Structured(acl.clone())).unwrap();
        assert_eq!(body.content_type(), "application/json");

        let bytes = body.into_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            json!({ "acls": [{ "action": "accept", "src": ["*"], "dst": ["*:*"] }] })
        );
        assert_eq!(
            decode_policy(AclFormat::Json, &text).unwrap(),
            AclPolicy::Structured(acl)
        );
    }

    #[test]
    fn hujson_policy_is_passed_through() {
        let text = "// comment\n{\"acls\": [],}\n";
        let body = encode_policy(&AclPolicy::HuJson(text.into())).unwrap();
        assert_eq!(body.content_type(), "application/hujson");
        assert_eq!(body.clone().into_bytes(), text.as_bytes());
        assert_eq!(
            decode_policy(AclFormat::HuJson, text).unwrap(),
            AclPolicy::HuJson(text.into())
        );
    }

    #[test]
    fn decode_failure_keeps_body() {
        let err = decode_json::<Acl>("not json").unwrap_err();
        match err {
            Error::Deserialization { body, message } => {
                assert_eq!(body, "not json");
                assert!(message.contains("body preview"));
            }
            other => panic!("expected Deserialization, got: {other:?}"),
        }
    }
}
