//! Recognise tagged driver output lines and split them into `key: value` pairs.

use thiserror::Error;

/// Separator between fields on a tagged line.
pub const FIELD_SEPARATOR: &str = "; ";
/// Separator between a field's key and its value.
pub const KEY_VALUE_SEPARATOR: &str = ": ";

/// Class tag carried by a recognised log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    /// `[D]` run-wide declarations (domain, heuristics, weight, epsilon).
    Declaration,
    /// `[I]` per-instance information (id, instance label).
    Info,
    /// `[R]` result fields; terminates a record.
    Result,
}

impl LineTag {
    fn marker(self) -> &'static str {
        match self {
            LineTag::Declaration => "[D]",
            LineTag::Info => "[I]",
            LineTag::Result => "[R]",
        }
    }

    fn detect(line: &str) -> Option<Self> {
        [LineTag::Declaration, LineTag::Info, LineTag::Result]
            .into_iter()
            .find(|tag| line.starts_with(tag.marker()))
    }
}

/// A recognised line with its ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedLine {
    pub tag: LineTag,
    pub fields: Vec<(String, String)>,
}

impl TaggedLine {
    pub fn terminates_record(&self) -> bool {
        self.tag == LineTag::Result
    }
}

/// Reason a tagged line could not be split; the caller attaches file and line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MalformedLine(pub String);

/// Classify one line of driver output.
///
/// Returns `Ok(None)` for lines without a recognised tag (`[L]` command echoes,
/// solver chatter, blank lines).
pub fn classify_line(line: &str) -> Result<Option<TaggedLine>, MalformedLine> {
    let Some(tag) = LineTag::detect(line) else {
        return Ok(None);
    };
    let body = line[tag.marker().len()..].trim();
    if body.is_empty() {
        return Err(MalformedLine(format!(
            "{} line carries no fields",
            tag.marker()
        )));
    }
    let mut fields = Vec::new();
    for token in body.split(FIELD_SEPARATOR) {
        let (key, value) = token.split_once(KEY_VALUE_SEPARATOR).ok_or_else(|| {
            MalformedLine(format!(
                "field '{token}' lacks the '{KEY_VALUE_SEPARATOR}' separator"
            ))
        })?;
        fields.push((key.to_string(), value.to_string()));
    }
    Ok(Some(TaggedLine { tag, fields }))
}
