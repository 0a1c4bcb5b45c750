use serde_json::{Map, Value};

use crate::error::RecordParseFailure;

/// Key dropped from every record before export.
pub const HTML_KEY: &str = "html";
pub const ID_KEY: &str = "id";
pub const COORD_KEY: &str = "coord_gps";

/// One bookcase as embedded in the page. Field order is the source order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    id: i64,
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Strict JSON parse of one embedded literal.
    pub fn parse(text: &str) -> Result<Self, RecordParseFailure> {
        let fail = |error: String| RecordParseFailure {
            error,
            text: text.to_string(),
        };

        let fields = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(fail("not a JSON object".into())),
            Err(e) => return Err(fail(e.to_string())),
        };

        let id = fields
            .get(ID_KEY)
            .and_then(integer_id)
            .ok_or_else(|| fail(format!("missing or non-integer \"{ID_KEY}\"")))?;

        Ok(Self { id, fields })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Raw `coord_gps` text, if present and a string.
    pub fn coord_gps(&self) -> Option<&str> {
        self.fields.get(COORD_KEY).and_then(Value::as_str)
    }

    /// Export properties: every field except `html`, order kept.
    pub fn into_properties(self) -> Map<String, Value> {
        let mut fields = self.fields;
        fields.shift_remove(HTML_KEY);
        fields
    }
}

fn integer_id(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
