use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What part of the parsed response is posted back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// The whole parsed body
    #[default]
    Full,
    /// Only `body.content`, unwrapped
    Content,
}

impl ResponseShape {
    /// Project a parsed body. Missing `content` yields `null`.
    pub fn apply(self, body: Value) -> Value {
        match self {
            ResponseShape::Full => body,
            ResponseShape::Content => match body {
                Value::Object(mut fields) => fields.remove("content").unwrap_or(Value::Null),
                _ => Value::Null,
            },
        }
    }
}
