//! Cache Key Module
//!
//! Derives deterministic cache keys from a resource name and its request
//! parameters.

use serde_json::{Map, Value};

/// Separates the resource name and each `name=value` pair.
pub const KEY_DELIMITER: char = ':';

// == Param Value ==
/// A single request parameter value as it takes part in a cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Structured(Value),
}

impl ParamValue {
    // == Canonical Form ==
    /// Renders the value in its canonical textual form.
    ///
    /// Numeric text and numbers collapse to one form (`"1"`, `1` and `1.0`
    /// all render as `1`), structured values render as JSON with object keys
    /// sorted at every depth.
    pub fn canonical(&self) -> String {
        match self {
            ParamValue::Text(text) => canonical_text(text),
            ParamValue::Integer(n) => n.to_string(),
            ParamValue::Float(f) => canonical_float(*f),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Structured(value) => canonical_json(value),
        }
    }

    /// Renders the value for a query string. Text is sent as given; other
    /// variants use their canonical form.
    pub fn to_query_value(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            other => other.canonical(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ParamValue::Text(s),
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Integer(i),
                None => ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            other => ParamValue::Structured(other),
        }
    }
}

// == Build Key ==
/// Builds the cache key for `resource_type` and its parameters.
///
/// Parameters whose value is `None` are left out, so omitting a parameter
/// and passing it as absent produce the same key. Names are ordered
/// lexicographically; when a name repeats, the last value wins.
///
/// # Example
/// ```
/// use nasa_gateway::cache::{build_key, ParamValue};
///
/// let a = build_key("apod", [("date", Some(ParamValue::from("2024-01-01"))), ("thumbs", None)]);
/// let b = build_key("apod", [("date", Some(ParamValue::from("2024-01-01")))]);
/// assert_eq!(a, b);
/// assert_eq!(a, "apod:date=2024-01-01");
/// ```
pub fn build_key<'a, I>(resource_type: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<ParamValue>)>,
{
    let normalized: std::collections::BTreeMap<&str, String> = params
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.canonical())))
        .collect();

    let mut key = escape(resource_type);
    for (name, value) in normalized {
        key.push(KEY_DELIMITER);
        key.push_str(&escape(name));
        key.push('=');
        key.push_str(&escape(&value));
    }
    key
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | ':' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn canonical_text(text: &str) -> String {
    if let Ok(n) = text.parse::<i64>() {
        return n.to_string();
    }
    if looks_decimal(text) {
        if let Ok(f) = text.parse::<f64>() {
            return canonical_float(f);
        }
    }
    text.to_string()
}

// Only plain decimal notation counts as numeric; "inf", "NaN" and exponent
// forms stay text.
fn looks_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next().unwrap_or("");
    !(whole.is_empty() && frac.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
}

fn canonical_float(f: f64) -> String {
    const SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= SAFE_INTEGER {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

fn canonical_json(value: &Value) -> String {
    sorted(value).to_string()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), sorted(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
