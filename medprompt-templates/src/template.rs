//! Versioned templates bound to a task
//!
//! A template is parametrized text plus its submission metadata: a name, a
//! monotonic iteration among templates sharing a task, and a user rating.
//! The template borrows its task rather than owning it; every operation
//! that needs property data takes `&Task` and verifies the binding.

use std::cmp::Ordering;
use std::fmt;

use medprompt_common::to_canonical;
use medprompt_tasks::Task;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::alignment::{AlignmentIssue, AlignmentKind};
use crate::error::{Result, TemplateError};
use crate::placeholder;

/// Highest allowed user rating.
pub const MAX_SCORE: u8 = 5;

/// A submitted prompt: template text plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// The raw template text as submitted
    pub text: String,
    /// Display name of the prompt
    pub name: String,
    /// Revision counter among prompts for the same task
    pub iteration: u32,
    /// User rating 1-5; 0 when unrated
    pub score: u8,
}

impl Prompt {
    /// A fresh, unrated submission.
    pub fn new(text: impl Into<String>, name: impl Into<String>, iteration: u32) -> Self {
        Self {
            text: text.into(),
            name: name.into(),
            iteration,
            score: 0,
        }
    }
}

/// On-disk record shape for one template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub task: String,
    pub iteration: u32,
    pub name: String,
    pub score: u8,
    pub prompt: String,
    #[serde(default)]
    pub template: Option<String>,
}

/// Parametrized text bound to one task, validated for variable alignment
/// and rendered by substitution.
#[derive(Debug, Clone)]
pub struct Template {
    prompt: Prompt,
    content: String,
    task_name: String,
}

impl Template {
    /// Bind a prompt to a task. With `validate`, alignment is checked
    /// immediately; otherwise the check is deferred to `build`.
    pub fn new(prompt: Prompt, task: &Task, validate: bool) -> Result<Self> {
        let template = Self {
            content: prompt.text.clone(),
            task_name: task.name().to_string(),
            prompt,
        };
        if validate {
            template.validate(task)?;
        }
        Ok(template)
    }

    /// Identity among all templates: task name and iteration.
    pub fn id(&self) -> String {
        format!("{}/{}", self.task_name, self.prompt.iteration)
    }

    /// Display name of the underlying prompt.
    pub fn name(&self) -> &str {
        &self.prompt.name
    }

    /// Revision counter among templates sharing this task.
    pub fn iteration(&self) -> u32 {
        self.prompt.iteration
    }

    /// Current user rating.
    pub fn score(&self) -> u8 {
        self.prompt.score
    }

    /// Name of the task this template is bound to.
    pub fn task(&self) -> &str {
        &self.task_name
    }

    /// Current template text (may diverge from the original prompt after
    /// `change_template`).
    pub fn content(&self) -> &str {
        &self.content
    }

    fn ensure_task(&self, task: &Task) -> Result<()> {
        if task.name() != self.task_name {
            return Err(TemplateError::TaskMismatch {
                expected: self.task_name.clone(),
                found: task.name().to_string(),
            });
        }
        Ok(())
    }

    /// Compute every alignment issue between this template's placeholders
    /// and the task's properties. Warnings are also logged.
    pub fn check_alignment(&self, task: &Task) -> Result<Vec<AlignmentIssue>> {
        self.ensure_task(task)?;

        // Compare in canonical form: a placeholder may be written with the
        // display casing of its property.
        let mut placeholders = Vec::new();
        for name in placeholder::placeholders(&self.content)? {
            let canonical = to_canonical(&name);
            if !placeholders.contains(&canonical) {
                placeholders.push(canonical);
            }
        }
        let required = task.get_required_inputs();

        let mut issues = Vec::new();

        // Task properties the template never consumes.
        let missing: Vec<&str> = task
            .keys()
            .filter(|key| !placeholders.iter().any(|p| p == key))
            .collect();
        let missing_required: Vec<String> = missing
            .iter()
            .filter(|key| required.iter().any(|r| r == *key))
            .map(|key| key.to_string())
            .collect();
        let missing_optional: Vec<String> = missing
            .iter()
            .filter(|key| !required.iter().any(|r| r == *key))
            .map(|key| key.to_string())
            .collect();

        if !missing_required.is_empty() {
            issues.push(AlignmentIssue::missing_required(missing_required));
        }
        if !missing_optional.is_empty() {
            let issue = AlignmentIssue::unused_optional(missing_optional);
            warn!(template = %self.id(), "{issue}");
            issues.push(issue);
        }

        // Placeholders no task property can satisfy.
        let unknown: Vec<String> = placeholders
            .into_iter()
            .filter(|name| !task.contains_key(name))
            .collect();
        if !unknown.is_empty() {
            issues.push(AlignmentIssue::unknown_placeholder(unknown));
        }

        Ok(issues)
    }

    /// Check alignment, failing on any error-level issue and returning the
    /// remaining warnings.
    pub fn validate(&self, task: &Task) -> Result<Vec<AlignmentIssue>> {
        let issues = self.check_alignment(task)?;
        for issue in &issues {
            if issue.level.is_error() {
                return Err(match issue.kind {
                    AlignmentKind::MissingRequired => TemplateError::MissingRequired {
                        variables: issue.variables.clone(),
                    },
                    _ => TemplateError::UnknownPlaceholders {
                        variables: issue.variables.clone(),
                    },
                });
            }
        }
        Ok(issues)
    }

    /// Render the final prompt text: revalidate, then substitute every
    /// placeholder with the task's current value in its natural string
    /// form. The task may have mutated since binding, so substitution
    /// re-checks that every placeholder still resolves.
    pub fn build(&self, task: &Task) -> Result<String> {
        self.validate(task)?;

        placeholder::render(&self.content, |name| {
            task.get(name)
                .ok()
                .flatten()
                .map(|value| value.to_string())
        })
    }

    /// Replace the template text, or revert to the original prompt text
    /// when `new_content` is `None`. With `validate`, alignment is
    /// re-checked against the task.
    pub fn change_template(
        &mut self,
        new_content: Option<String>,
        validate: bool,
        task: &Task,
    ) -> Result<()> {
        self.content = new_content.unwrap_or_else(|| self.prompt.text.clone());
        if validate {
            self.validate(task)?;
        }
        Ok(())
    }

    /// Update the user rating in place.
    pub fn change_score(&mut self, score: u8) -> Result<()> {
        if score > MAX_SCORE {
            return Err(TemplateError::InvalidScore { score });
        }
        self.prompt.score = score;
        Ok(())
    }

    /// Serialize to the `{task, iteration, name, score, prompt, template}`
    /// record.
    pub fn to_record(&self) -> TemplateRecord {
        TemplateRecord {
            task: self.task_name.clone(),
            iteration: self.prompt.iteration,
            name: self.prompt.name.clone(),
            score: self.prompt.score,
            prompt: self.prompt.text.clone(),
            template: Some(self.content.clone()),
        }
    }

    /// Serialize to a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_record())?)
    }

    /// Rebuild from a record for the given task. The record's task name
    /// must match; alignment validation is deferred. A record without a
    /// separate `template` field renders from its original prompt text.
    pub fn from_record(record: TemplateRecord, task: &Task) -> Result<Self> {
        if record.task != task.name() {
            return Err(TemplateError::TaskMismatch {
                expected: record.task,
                found: task.name().to_string(),
            });
        }

        let content = record.template.unwrap_or_else(|| record.prompt.clone());
        let prompt = Prompt {
            text: record.prompt,
            name: record.name,
            iteration: record.iteration,
            score: record.score,
        };
        Ok(Self {
            content,
            task_name: task.name().to_string(),
            prompt,
        })
    }

    /// Rebuild from a JSON value.
    pub fn from_json(value: serde_json::Value, task: &Task) -> Result<Self> {
        let record: TemplateRecord = serde_json::from_value(value)?;
        Self::from_record(record, task)
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Template {}

/// Templates order by iteration, oldest first.
impl PartialOrd for Template {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Template {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iteration().cmp(&other.iteration())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Pick the best template: highest score, ties broken by highest
/// iteration (most recent wins among equally rated).
pub fn select_best<'a, I>(templates: I) -> Option<&'a Template>
where
    I: IntoIterator<Item = &'a Template>,
{
    templates
        .into_iter()
        .max_by_key(|template| (template.score(), template.iteration()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use medprompt_tasks::{PropertyValue, PublicTarget};

    fn patient_task() -> Task {
        let mut task = Task::new("Discharge Summary", PublicTarget::Patient);
        task.to_mutable();
        task.insert("Age", PropertyValue::Integer(52)).unwrap();
        task.to_detailed();
        task.insert("Notes", PropertyValue::Text("stable".into()))
            .unwrap();
        task
    }

    #[test]
    fn build_substitutes_values() {
        let task = patient_task();
        let prompt = Prompt::new(
            "Patient aged {age}. Extra: {notes}.",
            "Summary v1",
            1,
        );
        let template = Template::new(prompt, &task, true).unwrap();
        assert_eq!(
            template.build(&task).unwrap(),
            "Patient aged 52. Extra: stable."
        );
    }

    #[test]
    fn missing_required_placeholder_is_fatal() {
        let task = patient_task();
        let prompt = Prompt::new("No age here, just {notes}.", "Bad", 1);
        let err = Template::new(prompt, &task, true).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingRequired { variables } if variables == vec!["age".to_string()]
        ));
    }

    #[test]
    fn deferred_validation_fails_at_build() {
        let task = patient_task();
        let prompt = Prompt::new("No placeholders at all.", "Bad", 1);
        let template = Template::new(prompt, &task, false).unwrap();
        assert!(template.build(&task).is_err());
    }

    #[test]
    fn unused_optional_is_a_warning_only() {
        let task = patient_task();
        let prompt = Prompt::new("Patient aged {age}.", "Terse", 1);
        let template = Template::new(prompt, &task, true).unwrap();

        let warnings = template.validate(&task).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].level.is_warning());
        assert_eq!(warnings[0].variables, vec!["notes".to_string()]);

        assert_eq!(template.build(&task).unwrap(), "Patient aged 52.");
    }

    #[test]
    fn unknown_placeholder_is_fatal() {
        let task = patient_task();
        let prompt = Prompt::new("{age} {notes} {dosage}", "Over-asking", 1);
        let err = Template::new(prompt, &task, true).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnknownPlaceholders { variables } if variables == vec!["dosage".to_string()]
        ));
    }

    #[test]
    fn display_cased_placeholders_match_their_properties() {
        let task = patient_task();
        let prompt = Prompt::new("Patient aged {Age}. Extra: {Notes}.", "Cased", 1);
        let template = Template::new(prompt, &task, true).unwrap();
        assert_eq!(
            template.build(&task).unwrap(),
            "Patient aged 52. Extra: stable."
        );
    }

    #[test]
    fn unknown_placeholder_is_reported_canonically() {
        let task = patient_task();
        let prompt = Prompt::new("{Age} {notes} {Dosage}", "Cased", 1);
        let err = Template::new(prompt, &task, true).unwrap_err();
        // The cased {Age} satisfies the required input; only the truly
        // unknown placeholder is reported, in canonical form.
        assert!(matches!(
            err,
            TemplateError::UnknownPlaceholders { variables } if variables == vec!["dosage".to_string()]
        ));
    }

    #[test]
    fn build_fails_after_task_mutation() {
        let mut task = patient_task();
        let prompt = Prompt::new("{age} and {notes}", "Live", 1);
        let template = Template::new(prompt, &task, true).unwrap();

        // Binding-time validation passed; mutate the task afterwards.
        task.remove("notes").unwrap();
        assert!(matches!(
            template.build(&task),
            Err(TemplateError::UnknownPlaceholders { .. })
        ));
    }

    #[test]
    fn wrong_task_is_rejected() {
        let task = patient_task();
        let other = Task::new("Referral", PublicTarget::Physician);
        let prompt = Prompt::new("{age} {notes}", "Misbound", 1);
        let template = Template::new(prompt, &task, true).unwrap();
        assert!(matches!(
            template.build(&other),
            Err(TemplateError::TaskMismatch { .. })
        ));
    }

    #[test]
    fn date_values_render_formatted() {
        let mut task = Task::new("Visit Recap", PublicTarget::Patient);
        task.insert(
            "Visit Date",
            PropertyValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
        )
        .unwrap();
        let prompt = Prompt::new("Seen on {visit_date}.", "Recap", 1);
        let template = Template::new(prompt, &task, true).unwrap();
        assert_eq!(template.build(&task).unwrap(), "Seen on 02-05-2024.");
    }

    #[test]
    fn change_template_revalidates() {
        let task = patient_task();
        let prompt = Prompt::new("{age} {notes}", "Mutable", 1);
        let mut template = Template::new(prompt, &task, true).unwrap();

        assert!(template
            .change_template(Some("only {notes}".into()), true, &task)
            .is_err());

        // Reverting to the original prompt text restores validity.
        template.change_template(None, true, &task).unwrap();
        assert_eq!(template.content(), "{age} {notes}");
    }

    #[test]
    fn change_score_bounds() {
        let task = patient_task();
        let prompt = Prompt::new("{age} {notes}", "Rated", 1);
        let mut template = Template::new(prompt, &task, true).unwrap();

        template.change_score(5).unwrap();
        assert_eq!(template.score(), 5);
        assert!(matches!(
            template.change_score(6),
            Err(TemplateError::InvalidScore { score: 6 })
        ));
    }

    #[test]
    fn identity_and_ordering() {
        let task = patient_task();
        let a = Template::new(Prompt::new("{age} {notes}", "A", 1), &task, true).unwrap();
        let b = Template::new(Prompt::new("{age} {notes}", "B", 2), &task, true).unwrap();
        assert_eq!(a.id(), "Discharge Summary/1");
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn best_template_prefers_score_then_iteration() {
        let task = patient_task();
        let mut templates = Vec::new();
        for (score, iteration) in [(3u8, 1u32), (5, 2), (5, 5)] {
            let mut template =
                Template::new(Prompt::new("{age} {notes}", "T", iteration), &task, true).unwrap();
            template.change_score(score).unwrap();
            templates.push(template);
        }
        let best = select_best(&templates).unwrap();
        assert_eq!(best.score(), 5);
        assert_eq!(best.iteration(), 5);
    }

    #[test]
    fn record_round_trip_preserves_diverged_content() {
        let task = patient_task();
        let prompt = Prompt::new("{age} {notes}", "Rounder", 3);
        let mut template = Template::new(prompt, &task, true).unwrap();
        template.change_score(4).unwrap();
        template
            .change_template(Some("{notes} then {age}".into()), true, &task)
            .unwrap();

        let json = template.to_json().unwrap();
        assert_eq!(json["task"], "Discharge Summary");
        assert_eq!(json["iteration"], 3);
        assert_eq!(json["score"], 4);
        assert_eq!(json["prompt"], "{age} {notes}");
        assert_eq!(json["template"], "{notes} then {age}");

        let restored = Template::from_json(json, &task).unwrap();
        assert_eq!(restored.content(), "{notes} then {age}");
        assert_eq!(restored.score(), 4);
        assert_eq!(restored, template);
    }

    #[test]
    fn record_for_wrong_task_is_rejected() {
        let task = patient_task();
        let other = Task::new("Referral", PublicTarget::Physician);
        let prompt = Prompt::new("{age} {notes}", "Strict", 1);
        let template = Template::new(prompt, &task, true).unwrap();
        let json = template.to_json().unwrap();
        assert!(matches!(
            Template::from_json(json, &other),
            Err(TemplateError::TaskMismatch { .. })
        ));
    }
}
