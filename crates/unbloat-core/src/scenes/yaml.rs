/// Document splitting for Unity's YAML dialect.
///
/// Unity writes scenes as a stream of documents, each introduced by a
/// `--- !u!<classID> &<fileID> [stripped]` header and holding one top-level
/// mapping (`GameObject:`, `MonoBehaviour:`, ...). The `!u!` tag and anchor
/// carry the class and object id, so headers are read here and each body is
/// handed to `serde_yml` on its own.
///
/// A document that cannot be parsed is skipped and counted; it does not
/// invalidate the rest of the file.
use serde_yml::Value;
use tracing::debug;

/// One `--- !u!` document.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlDocument {
    pub class_id: u32,
    pub file_id: i64,
    /// Prefab-instance placeholder without its own data.
    pub stripped: bool,
    pub type_name: String,
    /// The mapping under `type_name`; empty when the document has no fields.
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct ParsedFile {
    pub documents: Vec<YamlDocument>,
    /// Documents that could not be parsed: (header line, reason).
    pub skipped: Vec<(usize, String)>,
}

/// Split `text` into documents and parse each one.
///
/// Directives (`%YAML`, `%TAG`) and anything before the first header are
/// ignored.
pub fn parse_documents(text: &str) -> ParsedFile {
    let mut parsed = ParsedFile::default();
    let mut header: Option<(usize, &str)> = None;
    let mut body = String::new();

    for (i, line) in text.lines().enumerate() {
        if line.starts_with("---") {
            if let Some((no, h)) = header.take() {
                finish_document(no, h, &body, &mut parsed);
            }
            body.clear();
            header = Some((i + 1, line));
            continue;
        }
        if header.is_some() {
            body.push_str(line);
            body.push('\n');
        }
    }
    if let Some((no, h)) = header {
        finish_document(no, h, &body, &mut parsed);
    }
    parsed
}

fn finish_document(line: usize, header: &str, body: &str, out: &mut ParsedFile) {
    match parse_document(header, body) {
        Ok(doc) => out.documents.push(doc),
        Err(reason) => {
            debug!("skipping document at line {line}: {reason}");
            out.skipped.push((line, reason));
        }
    }
}

fn parse_document(header: &str, body: &str) -> Result<YamlDocument, String> {
    let (class_id, file_id, stripped) =
        parse_header(header).ok_or_else(|| format!("unrecognised document header `{header}`"))?;

    let value: Value = serde_yml::from_str(body).map_err(|e| format!("invalid YAML: {e}"))?;
    let (type_name, body) = match value {
        Value::Null => (String::new(), empty_mapping()),
        Value::Mapping(top) if top.len() == 1 => {
            let Some((key, inner)) = top.into_iter().next() else {
                return Err("empty document".to_string());
            };
            let type_name = key
                .as_str()
                .ok_or_else(|| "type name is not a string".to_string())?
                .to_string();
            let inner = match inner {
                Value::Null => empty_mapping(),
                other => other,
            };
            (type_name, inner)
        }
        _ => return Err("expected a single `TypeName:` mapping".to_string()),
    };

    Ok(YamlDocument {
        class_id,
        file_id,
        stripped,
        type_name,
        body,
    })
}

fn empty_mapping() -> Value {
    Value::Mapping(serde_yml::Mapping::new())
}

/// `--- !u!114 &123456789 stripped` → (114, 123456789, true).
fn parse_header(header: &str) -> Option<(u32, i64, bool)> {
    let rest = header.strip_prefix("--- !u!")?;
    let mut parts = rest.split_whitespace();
    let class_id = parts.next()?.parse().ok()?;
    let file_id = parts.next()?.strip_prefix('&')?.parse().ok()?;
    let stripped = parts.next() == Some("stripped");
    Some((class_id, file_id, stripped))
}

/// Scalar rendered as Unity wrote it. An empty value (`m_Name:`) is `""`;
/// mappings and sequences have no text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// `fileID` of a reference mapping such as `{fileID: 11500000, guid: ..., type: 3}`.
pub fn file_id(value: &Value) -> Option<i64> {
    match value.get("fileID")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn guid(value: &Value) -> Option<String> {
    value
        .get("guid")
        .and_then(scalar_text)
        .filter(|g| !g.is_empty())
}

/// `true` for a mapping that looks like an object reference.
pub fn is_reference(value: &Value) -> bool {
    value.get("fileID").is_some()
}
