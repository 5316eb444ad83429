use std::collections::BTreeMap;

use departmental_tally::normalize::parse_decimal;
use serde::{Deserialize, Deserializer};
use snafu::prelude::*;

use crate::escrutinio::*;

/// Reads a vote counter. Numbers and numeric strings are accepted; anything else counts
/// as zero.
pub fn read_js_count(x: &JSValue) -> u64 {
    match x {
        JSValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(non_negative))
            .unwrap_or(0),
        JSValue::String(s) => s
            .trim()
            .parse::<u64>()
            .ok()
            .or_else(|| non_negative(parse_decimal(s)))
            .unwrap_or(0),
        _ => 0,
    }
}

fn non_negative(x: f64) -> Option<u64> {
    if x.is_finite() && x >= 0.0 {
        Some(x as u64)
    } else {
        None
    }
}

pub fn read_js_text(x: &JSValue) -> String {
    match x {
        JSValue::String(s) => s.clone(),
        JSValue::Number(n) => n.to_string(),
        JSValue::Bool(b) => b.to_string(),
        _ => "".to_string(),
    }
}

pub fn read_js_flag(x: &JSValue) -> bool {
    match x {
        JSValue::Bool(b) => *b,
        JSValue::Number(_) => read_js_count(x) > 0,
        JSValue::String(s) => matches!(
            s.trim().to_uppercase().as_str(),
            "TRUE" | "1" | "S" | "SI"
        ),
        _ => false,
    }
}

/// A vote counter as found in the published files.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Count(pub u64);

impl Count {
    pub fn as_id(&self) -> u32 {
        u32::try_from(self.0).unwrap_or(u32::MAX)
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let x = JSValue::deserialize(deserializer)?;
        Ok(Count(read_js_count(&x)))
    }
}

/// A label that may have been published as a number, or not at all.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Text(pub String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let x = JSValue::deserialize(deserializer)?;
        Ok(Text(read_js_text(&x)))
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let x = JSValue::deserialize(deserializer)?;
        Ok(Flag(read_js_flag(&x)))
    }
}

/// Resolves a path found in a configuration file against the directory of that file.
pub fn resolve_path(root: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        root.join(p).display().to_string()
    }
}

pub fn read_json_file(path: &str) -> EscrutinioResult<(String, JSValue)> {
    info!("Attempting to read JSON file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("Read {} bytes from {:?}", contents.len(), path);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok((contents, js))
}

/// Reads the party alias table. A missing file is not an error: the table is then empty.
pub fn read_party_aliases(path: &str) -> EscrutinioResult<PartyAliases> {
    if !Path::new(path).exists() {
        warn!("Party alias file {:?} not found, using an empty table", path);
        return Ok(PartyAliases::empty());
    }
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let pairs: BTreeMap<String, String> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("Read {} party aliases from {:?}", pairs.len(), path);
    Ok(PartyAliases::new(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_are_lenient() {
        assert_eq!(read_js_count(&json!(12)), 12);
        assert_eq!(read_js_count(&json!(" 34 ")), 34);
        assert_eq!(read_js_count(&json!("7,0")), 7);
        assert_eq!(read_js_count(&json!(3.9)), 3);
        assert_eq!(read_js_count(&json!(-2)), 0);
        assert_eq!(read_js_count(&json!("n/d")), 0);
        assert_eq!(read_js_count(&json!(null)), 0);
        assert_eq!(read_js_count(&json!([1])), 0);
    }

    #[test]
    fn texts_and_flags() {
        assert_eq!(read_js_text(&json!(4)), "4");
        assert_eq!(read_js_text(&json!(null)), "");
        assert!(read_js_flag(&json!(true)));
        assert!(read_js_flag(&json!("S")));
        assert!(read_js_flag(&json!(1)));
        assert!(!read_js_flag(&json!("N")));
    }

    #[test]
    fn typed_fields() {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Row {
            #[serde(rename = "A")]
            a: Count,
            #[serde(rename = "B")]
            b: Text,
            #[serde(rename = "C")]
            c: Count,
        }
        let r: Row = serde_json::from_value(json!({"A": "15", "B": 3})).unwrap();
        assert_eq!((r.a, r.b, r.c), (Count(15), Text("3".to_string()), Count(0)));
    }

    #[test]
    fn relative_paths_follow_the_config() {
        let root = Path::new("/data/2020");
        assert_eq!(resolve_path(root, "results.json"), "/data/2020/results.json");
        assert_eq!(resolve_path(root, "/tmp/x.json"), "/tmp/x.json");
    }

    #[test]
    fn missing_alias_file_gives_an_empty_table() {
        let aliases = read_party_aliases("/nonexistent/party_aliases.json").unwrap();
        assert!(aliases.is_empty());
    }
}
