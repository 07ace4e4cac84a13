//! End-to-end persistence: author a task, upload prompts in bulk, rate
//! them, persist everything, then reopen the repository and pick the best
//! template.

use medprompt_storage::{Repository, StorageError};
use medprompt_tasks::{PropertyValue, PublicTarget, Task};
use medprompt_templates::{parse_bulk, select_best, Prompt, Template};

fn discharge_task() -> Task {
    let mut task = Task::new("Discharge Summary", PublicTarget::Patient);
    task.to_mutable();
    task.insert("Age", PropertyValue::Integer(52)).unwrap();
    task.to_detailed();
    task.insert("Notes", PropertyValue::Text("stable".into()))
        .unwrap();
    task
}

#[test]
fn full_lifecycle_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();

    {
        let repository = Repository::new(dir.path()).unwrap();
        let task = discharge_task();
        repository.save_task(&task).unwrap();

        let upload = "Prompt 1: Terse\nAge {age}. {notes}\n===\n\
                      Prompt 2: Friendly\nYou are {age}; note {notes}.\n===\n";
        let mut templates = parse_bulk(upload, &task).unwrap();
        templates[0].change_score(3).unwrap();
        templates[1].change_score(5).unwrap();
        for template in &templates {
            repository.save_template(template, &task).unwrap();
        }
    }

    let repository = Repository::new(dir.path()).unwrap();
    let task = repository
        .get_task(PublicTarget::Patient, "Discharge Summary")
        .unwrap();
    assert_eq!(task.get_required_inputs(), vec!["age".to_string()]);
    assert_eq!(task.get("age").unwrap(), Some(PropertyValue::Integer(52)));

    let templates = repository.load_templates(&task).unwrap();
    assert_eq!(templates.len(), 2);
    assert_eq!(templates[0].iteration(), 1);

    let best = select_best(&templates).expect("templates loaded");
    assert_eq!(best.name(), "Friendly");
    assert_eq!(best.score(), 5);
    assert_eq!(best.build(&task).unwrap(), "You are 52; note stable.");
}

#[test]
fn allocation_fills_the_first_gap() {
    let dir = tempfile::tempdir().unwrap();
    let mut repository = Repository::new(dir.path()).unwrap();

    for name in ["First", "Second", "Third"] {
        repository
            .save_task(&Task::new(name, PublicTarget::Patient))
            .unwrap();
    }
    // Deleting the middle record leaves task-PATIENT-1.json free; scanning
    // stops at the gap, so only the first record is still listed.
    repository
        .delete_task(PublicTarget::Patient, "Second")
        .unwrap();
    let names: Vec<String> = repository
        .load_tasks(PublicTarget::Patient)
        .iter()
        .map(|task| task.name().to_string())
        .collect();
    assert_eq!(names, vec!["First"]);

    // The next allocation reuses the gap.
    let path = repository
        .save_task(&Task::new("Fourth", PublicTarget::Patient))
        .unwrap();
    assert_eq!(path.file_name().unwrap(), "task-PATIENT-1.json");
}

#[test]
fn save_template_rewrites_matching_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Repository::new(dir.path()).unwrap();
    let task = discharge_task();

    let mut template = Template::new(
        Prompt::new("Age {age}. {notes}", "Draft", 1),
        &task,
        true,
    )
    .unwrap();
    let first = repository.save_template(&template, &task).unwrap();

    template.change_score(4).unwrap();
    let second = repository.save_template(&template, &task).unwrap();
    assert_eq!(first, second);

    let stored = repository.get_template(&task, 1).unwrap();
    assert_eq!(stored.score(), 4);
}

#[test]
fn templates_are_scoped_to_their_task() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Repository::new(dir.path()).unwrap();

    let summary = discharge_task();
    let mut recap = Task::new("Visit Recap", PublicTarget::Patient);
    recap
        .insert("Notes", PropertyValue::Text("fine".into()))
        .unwrap();
    repository.save_task(&summary).unwrap();
    repository.save_task(&recap).unwrap();

    let for_summary = Template::new(
        Prompt::new("Age {age}. {notes}", "S", 1),
        &summary,
        true,
    )
    .unwrap();
    let for_recap = Template::new(Prompt::new("{notes}", "R", 1), &recap, true).unwrap();
    repository.save_template(&for_summary, &summary).unwrap();
    repository.save_template(&for_recap, &recap).unwrap();

    let summary_templates = repository.load_templates(&summary).unwrap();
    assert_eq!(summary_templates.len(), 1);
    assert_eq!(summary_templates[0].name(), "S");

    assert!(repository.find_template(&recap, 2).unwrap().is_none());
}

#[test]
fn delete_missing_template_reports_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut repository = Repository::new(dir.path()).unwrap();
    let task = discharge_task();
    assert!(matches!(
        repository.delete_template(&task, 9),
        Err(StorageError::MissingSourceFile { .. })
    ));
}
