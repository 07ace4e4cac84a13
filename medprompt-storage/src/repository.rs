//! File-backed repository for task and template records
//!
//! Records live as JSON files in two flat directories under one root:
//! `tasks/task-<SEGMENT>.json` and `templates/prompt-<SEGMENT>.json`, with
//! `-1`, `-2`, … suffixes once a segment holds more than one record. The
//! file listing doubles as the index: lookups probe filenames from index
//! zero upward and stop at the first gap.
//!
//! The repository is an explicit value. Callers construct it from a root
//! directory and pass it where needed; there is no global instance.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use medprompt_tasks::{MedicalEndUser, PublicTarget, Task, TaskRecord};
use medprompt_templates::{Template, TemplateError, TemplateRecord};
use tracing::warn;

use crate::error::{Result, StorageError};

const TASK_PREFIX: &str = "task";
const TEMPLATE_PREFIX: &str = "prompt";

/// File-backed store of task and template records, with a per-segment
/// participant cache for live editing.
pub struct Repository {
    root: PathBuf,
    participants: HashMap<PublicTarget, MedicalEndUser>,
}

impl Repository {
    /// Open a repository at the given root, creating the record
    /// directories when absent.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("tasks"))?;
        fs::create_dir_all(root.join("templates"))?;
        Ok(Self {
            root,
            participants: HashMap::new(),
        })
    }

    /// Directory holding task records.
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    /// Directory holding template records.
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    fn record_name(prefix: &str, target: PublicTarget, index: usize) -> String {
        if index == 0 {
            format!("{prefix}-{}.json", target.as_str())
        } else {
            format!("{prefix}-{}-{index}.json", target.as_str())
        }
    }

    /// Existing record files for a segment, probing from index zero and
    /// stopping at the first gap.
    fn scan(dir: &Path, prefix: &str, target: PublicTarget) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for index in 0.. {
            let path = dir.join(Self::record_name(prefix, target, index));
            if !path.exists() {
                break;
            }
            files.push(path);
        }
        files
    }

    /// First unused record filename for a segment.
    fn allocate(dir: &Path, prefix: &str, target: PublicTarget) -> PathBuf {
        let mut index = 0;
        loop {
            let path = dir.join(Self::record_name(prefix, target, index));
            if !path.exists() {
                return path;
            }
            index += 1;
        }
    }

    fn read_task_record(path: &Path) -> Result<TaskRecord> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn read_template_record(path: &Path) -> Result<TemplateRecord> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Path of the stored task with the given name, if any.
    fn task_path(&self, target: PublicTarget, name: &str) -> Option<PathBuf> {
        Self::scan(&self.tasks_dir(), TASK_PREFIX, target)
            .into_iter()
            .find(|path| {
                matches!(Self::read_task_record(path), Ok(record) if record.name == name)
            })
    }

    /// Path of the stored template for the given task and iteration, if any.
    fn template_path(&self, task: &Task, iteration: u32) -> Option<PathBuf> {
        Self::scan(&self.templates_dir(), TEMPLATE_PREFIX, task.target())
            .into_iter()
            .find(|path| {
                matches!(
                    Self::read_template_record(path),
                    Ok(record) if record.task == task.name() && record.iteration == iteration
                )
            })
    }

    /// Persist a task: rewrite its existing file when one holds a record
    /// with the same name, else write to a freshly allocated filename.
    pub fn save_task(&self, task: &Task) -> Result<PathBuf> {
        let path = self
            .task_path(task.target(), task.name())
            .unwrap_or_else(|| Self::allocate(&self.tasks_dir(), TASK_PREFIX, task.target()));
        task.save(&path)?;
        Ok(path)
    }

    /// Every readable task stored for a segment. Unreadable candidates are
    /// logged and skipped rather than failing the whole listing.
    pub fn load_tasks(&self, target: PublicTarget) -> Vec<Task> {
        let mut tasks = Vec::new();
        for path in Self::scan(&self.tasks_dir(), TASK_PREFIX, target) {
            match Task::load(&path, target) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!(path = %path.display(), "skipping unreadable task record: {e}"),
            }
        }
        tasks
    }

    /// The stored task with the given name, if any.
    pub fn find_task(&self, target: PublicTarget, name: &str) -> Result<Option<Task>> {
        match self.task_path(target, name) {
            Some(path) => Ok(Some(Task::load(&path, target)?)),
            None => Ok(None),
        }
    }

    /// The stored task with the given name; a lookup miss is an error.
    pub fn get_task(&self, target: PublicTarget, name: &str) -> Result<Task> {
        self.find_task(target, name)?
            .ok_or_else(|| StorageError::RecordNotFound {
                record: format!("{}/{name}", target.as_str()),
            })
    }

    /// Delete a stored task.
    pub fn delete_task(&mut self, target: PublicTarget, name: &str) -> Result<()> {
        let path = self
            .task_path(target, name)
            .ok_or_else(|| StorageError::MissingSourceFile {
                record: format!("{}/{name}", target.as_str()),
            })?;
        fs::remove_file(path)?;
        if let Some(participant) = self.participants.get_mut(&target) {
            participant.remove_task(name);
        }
        Ok(())
    }

    /// Persist a template: rewrite the existing file whose record matches
    /// on task name and iteration, else allocate a fresh filename. The
    /// task must be the one the template is bound to; it supplies the
    /// segment the record files for.
    pub fn save_template(&self, template: &Template, task: &Task) -> Result<PathBuf> {
        if template.task() != task.name() {
            return Err(StorageError::Template(TemplateError::TaskMismatch {
                expected: template.task().to_string(),
                found: task.name().to_string(),
            }));
        }
        let path = self
            .template_path(task, template.iteration())
            .unwrap_or_else(|| {
                Self::allocate(&self.templates_dir(), TEMPLATE_PREFIX, task.target())
            });
        let json = serde_json::to_string_pretty(&template.to_record())?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Every readable template stored for a task, sorted by iteration.
    pub fn load_templates(&self, task: &Task) -> Result<Vec<Template>> {
        let mut templates = Vec::new();
        for path in Self::scan(&self.templates_dir(), TEMPLATE_PREFIX, task.target()) {
            let record = match Self::read_template_record(&path) {
                Ok(record) => record,
                Err(e) => {
                    warn!(path = %path.display(), "skipping unreadable template record: {e}");
                    continue;
                }
            };
            if record.task != task.name() {
                continue;
            }
            templates.push(Template::from_record(record, task)?);
        }
        templates.sort();
        Ok(templates)
    }

    /// The stored template for a task and iteration, if any.
    pub fn find_template(&self, task: &Task, iteration: u32) -> Result<Option<Template>> {
        match self.template_path(task, iteration) {
            Some(path) => {
                let record = Self::read_template_record(&path)?;
                Ok(Some(Template::from_record(record, task)?))
            }
            None => Ok(None),
        }
    }

    /// The stored template for a task and iteration; a lookup miss is an
    /// error.
    pub fn get_template(&self, task: &Task, iteration: u32) -> Result<Template> {
        self.find_template(task, iteration)?
            .ok_or_else(|| StorageError::RecordNotFound {
                record: format!("{}/{iteration}", task.name()),
            })
    }

    /// Delete a stored template.
    pub fn delete_template(&mut self, task: &Task, iteration: u32) -> Result<()> {
        let path =
            self.template_path(task, iteration)
                .ok_or_else(|| StorageError::MissingSourceFile {
                    record: format!("{}/{iteration}", task.name()),
                })?;
        fs::remove_file(path)?;
        Ok(())
    }

    /// The participant owning a segment's tasks, loaded from disk on first
    /// access and cached for the lifetime of the repository. Mutations
    /// through the returned reference are visible to every later access;
    /// call [`flush`](Self::flush) to persist them.
    pub fn participant(&mut self, target: PublicTarget) -> &mut MedicalEndUser {
        if !self.participants.contains_key(&target) {
            let mut participant = MedicalEndUser::new(target);
            for task in self.load_tasks(target) {
                participant.assign(task);
            }
            self.participants.insert(target, participant);
        }
        self.participants
            .get_mut(&target)
            .expect("participant cached above")
    }

    /// Drop a segment's cached participant; the next access reloads from
    /// disk.
    pub fn invalidate(&mut self, target: PublicTarget) {
        self.participants.remove(&target);
    }

    /// Persist every task held by a segment's cached participant. A
    /// segment with no cache entry has nothing to flush.
    pub fn flush(&mut self, target: PublicTarget) -> Result<()> {
        let tasks: Vec<Task> = match self.participants.get(&target) {
            Some(participant) => participant.tasks().cloned().collect(),
            None => return Ok(()),
        };
        for task in &tasks {
            self.save_task(task)?;
        }
        Ok(())
    }
}
