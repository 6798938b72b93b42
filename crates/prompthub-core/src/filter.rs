use std::cmp::Ordering;
use std::fmt;

use crate::catalog::Catalog;
use crate::prompt::Prompt;

/// Sentinel value meaning "no tag restriction".
pub const ALL_TAGS: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Tag(String),
}

impl TagFilter {
    pub fn parse(s: &str) -> Self {
        if s == ALL_TAGS {
            TagFilter::All
        } else {
            TagFilter::Tag(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TagFilter::All => ALL_TAGS,
            TagFilter::Tag(t) => t,
        }
    }

    pub fn admits(&self, prompt: &Prompt) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Tag(t) => prompt.has_tag(t),
        }
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFilter::All => f.write_str("All Tags"),
            TagFilter::Tag(t) => f.write_str(t),
        }
    }
}

/// Search box plus tag picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFilter {
    pub query: String,
    pub tag: TagFilter,
}

impl PromptFilter {
    pub fn apply<'a>(&self, prompts: &'a [Prompt]) -> Vec<&'a Prompt> {
        filter(prompts, &self.query, &self.tag)
    }
}

/// Prompts whose name contains `query` (ignoring case) and which carry `tag`,
/// sorted by name.
pub fn filter<'a>(prompts: &'a [Prompt], query: &str, tag: &TagFilter) -> Vec<&'a Prompt> {
    let needle = query.to_lowercase();
    let mut out: Vec<&Prompt> = prompts
        .iter()
        .filter(|p| p.name_contains(&needle) && tag.admits(p))
        .collect();
    out.sort_by(|a, b| by_name(a, b));
    out
}

/// Case-insensitive ascending by name; exact name then id break ties so the
/// order is total and does not flicker between polls.
fn by_name(a: &Prompt, b: &Prompt) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Options for the tag picker: `All` first, then every loaded tag.
pub fn tag_options(catalog: &Catalog) -> Vec<TagFilter> {
    std::iter::once(TagFilter::All)
        .chain(catalog.tags().iter().cloned().map(TagFilter::Tag))
        .collect()
}
