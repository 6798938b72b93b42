use std::collections::{BTreeSet, HashMap};

use crate::prompt::Prompt;

/// An immutable snapshot of the prompt list as last fetched.
///
/// Prompts keep their fetch order. Lookups go through the id index, never
/// through positions, so a reordered payload cannot shift a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    prompts: Vec<Prompt>,
    index: HashMap<String, usize>,
    tags: BTreeSet<String>,
}

impl Catalog {
    pub fn new(prompts: Vec<Prompt>) -> Self {
        let index = prompts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let tags = prompts
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        Self {
            prompts,
            index,
            tags,
        }
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn get(&self, id: &str) -> Option<&Prompt> {
        self.index.get(id).and_then(|&i| self.prompts.get(i))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Distinct tags across every loaded prompt.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// True when some prompt's name equals `name`, ignoring case and
    /// surrounding whitespace.
    pub fn has_name(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.prompts
            .iter()
            .any(|p| p.name.trim().to_lowercase() == wanted)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
