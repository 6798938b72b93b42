use std::fmt;

use serde::{Deserialize, Serialize};

/// A catalog entry in its canonical, normalized shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub text: String,
    pub description: String,
    #[serde(default)]
    pub summary: String,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
    pub institution: String,
}

impl Prompt {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive substring match against the name.
    /// `needle` must already be lowercased.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }
}

/// A prompt record exactly as the remote API sends it.
///
/// The upstream shape has drifted over time: the identity has been sent as
/// `ID` and `id`, as a string and as a number; tags have arrived as an array
/// or as one comma-joined string; the author field may be a bare string.
/// Convert with `Prompt::from` so none of that reaches the view.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrompt {
    #[serde(alias = "ID")]
    pub id: RawId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<OneOrMany>,
    #[serde(default)]
    pub meta: Option<RawMeta>,
    #[serde(default, alias = "author")]
    pub authors: Option<OneOrMany>,
    #[serde(default)]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMeta {
    #[serde(default)]
    pub author: Option<OneOrMany>,
    #[serde(default)]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Text(s) => f.write_str(s),
            RawId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A field that is sometimes a single string and sometimes a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// A single tag that contains a comma is really a comma-joined list.
/// Any other tag list passes through untouched.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    if tags.len() == 1 && tags[0].contains(',') {
        tags[0].split(',').map(|t| t.trim().to_string()).collect()
    } else {
        tags
    }
}

impl From<RawPrompt> for Prompt {
    fn from(raw: RawPrompt) -> Self {
        let meta = raw.meta.unwrap_or_default();
        let authors = meta
            .author
            .or(raw.authors)
            .map(OneOrMany::into_vec)
            .unwrap_or_default();
        let institution = meta.institution.or(raw.institution).unwrap_or_default();

        Prompt {
            id: raw.id.to_string(),
            name: raw.name,
            text: raw.text.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            summary: raw.summary.unwrap_or_default(),
            tags: normalize_tags(raw.tags.map(OneOrMany::into_vec).unwrap_or_default()),
            authors,
            institution,
        }
    }
}

/// Decode a `GET /prompts` payload into canonical prompts.
pub fn decode_prompts(body: &str) -> Result<Vec<Prompt>, serde_json::Error> {
    let raw: Vec<RawPrompt> = serde_json::from_str(body)?;
    Ok(raw.into_iter().map(Prompt::from).collect())
}
