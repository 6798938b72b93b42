use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::ValidationError;

/// Institutions a requester can submit on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Institution {
    #[serde(rename = "University of Chicago")]
    UniversityOfChicago,
    #[serde(rename = "Cornell University")]
    CornellUniversity,
    #[serde(rename = "University of Hawaii")]
    UniversityOfHawaii,
    #[serde(rename = "Virginia Tech")]
    VirginiaTech,
    #[serde(rename = "University of Notre Dame")]
    UniversityOfNotreDame,
    #[serde(rename = "Cornell Weill")]
    CornellWeill,
    #[serde(rename = "University of Pennsylvania")]
    UniversityOfPennsylvania,
}

impl Institution {
    pub const ALL: &[Institution] = &[
        Institution::UniversityOfChicago,
        Institution::CornellUniversity,
        Institution::UniversityOfHawaii,
        Institution::VirginiaTech,
        Institution::UniversityOfNotreDame,
        Institution::CornellWeill,
        Institution::UniversityOfPennsylvania,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Institution::UniversityOfChicago => "University of Chicago",
            Institution::CornellUniversity => "Cornell University",
            Institution::UniversityOfHawaii => "University of Hawaii",
            Institution::VirginiaTech => "Virginia Tech",
            Institution::UniversityOfNotreDame => "University of Notre Dame",
            Institution::CornellWeill => "Cornell Weill",
            Institution::UniversityOfPennsylvania => "University of Pennsylvania",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|i| i == self).unwrap_or(0)
    }

    /// Cycle forward through the list, starting at the first entry.
    pub fn next(current: Option<Institution>) -> Institution {
        match current {
            None => Self::ALL[0],
            Some(i) => Self::ALL[(i.position() + 1) % Self::ALL.len()],
        }
    }

    /// Cycle backward through the list, starting at the last entry.
    pub fn prev(current: Option<Institution>) -> Institution {
        let len = Self::ALL.len();
        match current {
            None => Self::ALL[len - 1],
            Some(i) => Self::ALL[(i.position() + len - 1) % len],
        }
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Body of `POST /prompts/request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub name: String,
    pub institution: Institution,
    pub email: String,
    /// Comma-separated, as typed.
    pub tags: String,
    pub prompt_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_summary: Option<String>,
    pub prompt_text: String,
    pub description: String,
}

/// The request form's contents while the user is still editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDraft {
    pub name: String,
    pub institution: Option<Institution>,
    pub email: String,
    pub tags: String,
    pub prompt_name: String,
    pub prompt_summary: String,
    pub prompt_text: String,
    pub description: String,
}

impl RequestDraft {
    /// Check the draft against local rules and the loaded catalog, producing
    /// the wire request on success.
    pub fn validate(&self, catalog: &Catalog) -> Result<PromptRequest, ValidationError> {
        let name = required(&self.name, "your name")?;
        let institution = self
            .institution
            .ok_or(ValidationError::MissingField("institution"))?;
        let email = required(&self.email, "email address")?;
        if !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }
        let tags = required(&self.tags, "tags")?;
        let prompt_name = required(&self.prompt_name, "prompt title")?;
        let prompt_text = required(&self.prompt_text, "prompt text")?;
        let description = required(&self.description, "usage information")?;

        if catalog.has_name(&prompt_name) {
            return Err(ValidationError::DuplicateTitle(prompt_name));
        }

        let summary = self.prompt_summary.trim();
        Ok(PromptRequest {
            name,
            institution,
            email,
            tags,
            prompt_name,
            prompt_summary: (!summary.is_empty()).then(|| summary.to_string()),
            prompt_text,
            description,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Prompt;

    fn catalog() -> Catalog {
        Catalog::new(vec![Prompt {
            id: "1".into(),
            name: "Summarize".into(),
            text: String::new(),
            description: String::new(),
            summary: String::new(),
            tags: vec!["nlp".into()],
            authors: Vec::new(),
            institution: String::new(),
        }])
    }

    fn draft() -> RequestDraft {
        RequestDraft {
            name: "Jane Doe".into(),
            institution: Some(Institution::CornellUniversity),
            email: "jane@example.edu".into(),
            tags: "writing, feedback".into(),
            prompt_name: "Essay feedback".into(),
            prompt_summary: String::new(),
            prompt_text: "Give feedback on this essay".into(),
            description: "Paste the essay after the prompt".into(),
        }
    }

    #[test]
    fn valid_draft_becomes_request() {
        let req = draft().validate(&catalog()).unwrap();
        assert_eq!(req.prompt_name, "Essay feedback");
        assert_eq!(req.institution, Institution::CornellUniversity);
        assert_eq!(req.prompt_summary, None);
    }

    #[test]
    fn duplicate_title_is_rejected_ignoring_case() {
        let mut d = draft();
        d.prompt_name = "sUMMARIZE".into();
        assert_eq!(
            d.validate(&catalog()),
            Err(ValidationError::DuplicateTitle("sUMMARIZE".into()))
        );
    }

    #[test]
    fn blank_fields_are_missing() {
        let mut d = draft();
        d.prompt_text = "   ".into();
        assert_eq!(
            d.validate(&catalog()),
            Err(ValidationError::MissingField("prompt text"))
        );

        let mut d = draft();
        d.institution = None;
        assert_eq!(
            d.validate(&catalog()),
            Err(ValidationError::MissingField("institution"))
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["jane", "jane@", "@example.edu", "jane@example", "ja ne@x.edu"] {
            let mut d = draft();
            d.email = bad.into();
            assert_eq!(
                d.validate(&catalog()),
                Err(ValidationError::InvalidEmail),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn request_serializes_in_camel_case() {
        let mut d = draft();
        d.prompt_summary = "Feedback on essays".into();
        let req = d.validate(&catalog()).unwrap();
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["promptName"], "Essay feedback");
        assert_eq!(v["promptText"], "Give feedback on this essay");
        assert_eq!(v["promptSummary"], "Feedback on essays");
        assert_eq!(v["institution"], "Cornell University");
        assert_eq!(v["tags"], "writing, feedback");
    }

    #[test]
    fn summary_is_omitted_when_blank() {
        let req = draft().validate(&catalog()).unwrap();
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("promptSummary").is_none());
    }

    #[test]
    fn institution_cycles() {
        assert_eq!(Institution::next(None), Institution::UniversityOfChicago);
        assert_eq!(
            Institution::next(Some(Institution::UniversityOfPennsylvania)),
            Institution::UniversityOfChicago
        );
        assert_eq!(
            Institution::prev(Some(Institution::UniversityOfChicago)),
            Institution::UniversityOfPennsylvania
        );
        assert_eq!(Institution::prev(None), Institution::UniversityOfPennsylvania);
    }
}
