use serde_json::{Value, json};

/// An upstream response body, decoded as far as it allows.
#[derive(Clone, PartialEq, Debug)]
pub enum ParsedBody {
    Empty,
    Json(Value),
    /// Text that was not valid JSON.
    Text(String),
}

impl ParsedBody {
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        if raw.is_empty() {
            return ParsedBody::Empty;
        }

        match serde_json::from_str(raw) {
            Ok(value) => ParsedBody::Json(value),
            Err(_) => ParsedBody::Text(raw.to_owned()),
        }
    }

    /// The JSON to hand back to the browser. Plain text is wrapped as
    /// `{"message": text}` and an empty body becomes `null`.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            ParsedBody::Empty => Value::Null,
            ParsedBody::Json(value) => value,
            ParsedBody::Text(text) => json!({ "message": text }),
        }
    }

    /// Like [`ParsedBody::into_json`], but an empty body becomes
    /// `{"error": fallback}`.
    #[must_use]
    pub fn into_json_or_error(self, fallback: &str) -> Value {
        match self {
            ParsedBody::Empty => json!({ "error": fallback }),
            body => body.into_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::body::ParsedBody;
    use serde_json::json;

    #[test]
    fn decodes_json() {
        assert_eq!(
            ParsedBody::decode(r#"{"data": [1, 2]}"#),
            ParsedBody::Json(json!({"data": [1, 2]}))
        );
    }

    #[test]
    fn keeps_non_json_text() {
        let body = ParsedBody::decode("<html>Bad Gateway</html>");
        assert_eq!(body, ParsedBody::Text("<html>Bad Gateway</html>".to_owned()));
        assert_eq!(body.into_json(), json!({"message": "<html>Bad Gateway</html>"}));
    }

    #[test]
    fn whitespace_is_text() {
        let body = ParsedBody::decode(" \n");
        assert_eq!(body, ParsedBody::Text(" \n".to_owned()));
        assert_eq!(body.into_json_or_error("fallback"), json!({"message": " \n"}));
    }

    #[test]
    fn empty_is_not_an_error() {
        assert_eq!(ParsedBody::decode(""), ParsedBody::Empty);
        assert_eq!(ParsedBody::Empty.into_json(), json!(null));
        assert_eq!(
            ParsedBody::Empty.into_json_or_error("Unable to load profile"),
            json!({"error": "Unable to load profile"})
        );
        assert_eq!(
            ParsedBody::Json(json!({"error": "nope"})).into_json_or_error("fallback"),
            json!({"error": "nope"})
        );
    }
}
