//! Task collection and its on-disk store.
//!
//! `TaskList` is the in-memory, insertion-ordered collection for one command.
//! `TaskStore` translates between that collection and the JSON task file: it
//! always reads and writes the whole file, and holds no tasks itself.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::error::StoreError;
use crate::fields::Status;
use crate::task::{format_timestamp, Task};

/// In-memory collection of tasks, stored as a bare JSON array.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// Generate the next task ID: one past the largest existing id.
    /// `None` once the largest id is `u64::MAX`.
    pub fn next_id(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0).checked_add(1)
    }

    /// Append a new `todo` task and return its id, or `None` if no id is left.
    pub fn add(&mut self, description: String, now: NaiveDateTime) -> Option<u64> {
        let id = self.next_id()?;
        self.tasks.push(Task::new(id, description, now));
        Some(id)
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Remove a task by ID, keeping the order of the survivors.
    pub fn remove(&mut self, id: u64) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    /// Tasks in storage order, optionally restricted to one status.
    pub fn filter(&self, status: Option<Status>) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| status.map_or(true, |s| t.status == s))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn first_duplicate_id(&self) -> Option<u64> {
        let mut seen = HashSet::new();
        self.tasks.iter().map(|t| t.id).find(|id| !seen.insert(*id))
    }
}

/// Handle on the JSON task file.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file holding an empty collection if it is absent.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        debug!(path = %self.path.display(), "creating empty task file");
        self.save(&TaskList::default())
    }

    /// Load the whole collection. An empty file is an empty collection.
    pub fn load(&self) -> Result<TaskList, StoreError> {
        let buf = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;

        if buf.is_empty() {
            debug!(path = %self.path.display(), "task file is empty");
            return Ok(TaskList::default());
        }

        let list: TaskList = serde_json::from_slice(&buf).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        if let Some(id) = list.first_duplicate_id() {
            return Err(StoreError::DuplicateId { path: self.path.clone(), id });
        }
        debug!(path = %self.path.display(), count = list.len(), "loaded tasks");
        Ok(list)
    }

    /// Overwrite the file with the whole collection (temp file + rename).
    pub fn save(&self, list: &TaskList) -> Result<(), StoreError> {
        let data = to_pretty_json(list)?;
        let tmp = self.tmp_path();
        File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(&data)?;
                f.write_all(b"\n")?;
                f.flush()
            })
            .map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), count = list.len(), "saved tasks");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn to_pretty_json(list: &TaskList) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    list.serialize(&mut ser).map_err(StoreError::Serialize)?;
    Ok(out)
}

/// Format one task as a `list` output line.
pub fn format_task_line(t: &Task) -> String {
    format!(
        "[{}] {} (Status: {}, Created: {}, updated: {})",
        t.id,
        t.description,
        t.status,
        format_timestamp(&t.created),
        format_timestamp(&t.updated)
    )
}

/// Print tasks one per line, or `No task found` when there are none.
pub fn print_tasks<'a, W: Write>(
    out: &mut W,
    tasks: impl IntoIterator<Item = &'a Task>,
) -> io::Result<usize> {
    let mut count = 0;
    for t in tasks {
        writeln!(out, "{}", format_task_line(t))?;
        count += 1;
    }
    if count == 0 {
        writeln!(out, "No task found")?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(9, 30, 0, 250_000)
            .unwrap()
    }

    fn store_in(dir: &TempDir) -> TaskStore {
        TaskStore::new(dir.path().join("tasks.json"))
    }

    #[test]
    fn test_ids_are_sequential_from_one() {
        let mut list = TaskList::default();
        assert_eq!(list.next_id(), Some(1));
        let ids: Vec<u64> = (0..5).map(|i| list.add(format!("t{i}"), ts()).unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut list = TaskList::default();
        list.add("a".into(), ts());
        list.add("b".into(), ts());
        list.add("c".into(), ts());
        list.remove(2);
        assert_eq!(list.add("d".into(), ts()), Some(4));
        list.remove(4);
        // Only the current maximum is consulted.
        assert_eq!(list.next_id(), Some(4));
    }

    #[test]
    fn test_no_id_after_max() {
        let mut list = TaskList::default();
        list.tasks.push(Task::new(u64::MAX, "last".into(), ts()));
        assert_eq!(list.next_id(), None);
        assert_eq!(list.add("overflow".into(), ts()), None);
        assert_eq!(list.len(), 1);

        list.tasks[0].id = u64::MAX - 1;
        assert_eq!(list.add("fits".into(), ts()), Some(u64::MAX));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut list = TaskList::default();
        for d in ["a", "b", "c", "d"] {
            list.add(d.into(), ts());
        }
        assert!(list.remove(2).is_some());
        assert!(list.remove(2).is_none());
        let ids: Vec<u64> = list.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_filter_by_status() {
        let mut list = TaskList::default();
        list.add("a".into(), ts());
        list.add("b".into(), ts());
        list.get_mut(2).unwrap().set_status(Status::Done, ts());

        let done: Vec<u64> = list.filter(Some(Status::Done)).map(|t| t.id).collect();
        assert_eq!(done, vec![2]);
        let todo: Vec<u64> = list.filter(Some(Status::Todo)).map(|t| t.id).collect();
        assert_eq!(todo, vec![1]);
        assert_eq!(list.filter(Some(Status::InProgress)).count(), 0);
        assert_eq!(list.filter(None).count(), 2);
    }

    #[test]
    fn test_ensure_exists_creates_empty_array() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_exists().unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.trim(), "[]");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_ensure_exists_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut list = TaskList::default();
        list.add("keep me".into(), ts());
        store.save(&list).unwrap();

        store.ensure_exists().unwrap();
        assert_eq!(store.load().unwrap(), list);
    }

    #[test]
    fn test_empty_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));

        fs::write(store.path(), r#"[{"id": 1, "description": "x", "status": "later", "created": "2024-05-01T09:30:00", "updated": "2024-05-01T09:30:00"}]"#).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), [0xff, 0xfe, b'[', b']']).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));

        fs::write(store.path(), b"[{\"id\": 1, \"description\": \"\xff\"}]").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let task = r#"{"id": 1, "description": "x", "status": "todo", "created": "2024-05-01T09:30:00", "updated": "2024-05-01T09:30:00"}"#;
        fs::write(store.path(), format!("[{task}, {task}]")).unwrap();
        assert!(matches!(store.load(), Err(StoreError::DuplicateId { id: 1, .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.load(), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut list = TaskList::default();
        list.add("first".into(), ts());
        list.add("second".into(), ts());
        list.get_mut(2).unwrap().set_status(Status::InProgress, ts());
        store.save(&list).unwrap();

        let before = fs::read_to_string(store.path()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, list);

        store.save(&loaded).unwrap();
        let after = fs::read_to_string(store.path()).unwrap();
        assert_eq!(before, after);
        assert!(after.contains("\"status\": \"in-progress\""));
        assert!(after.contains("\"created\": \"2024-05-01T09:30:00.250000\""));
        assert!(!dir.path().join("tasks.json.tmp").exists());
    }

    #[test]
    fn test_format_task_line() {
        let task = Task::new(1, "write spec".into(), ts());
        assert_eq!(
            format_task_line(&task),
            "[1] write spec (Status: todo, Created: 2024-05-01T09:30:00.250000, updated: 2024-05-01T09:30:00.250000)"
        );
    }

    #[test]
    fn test_print_tasks_empty() {
        let mut out = Vec::new();
        let n = print_tasks(&mut out, std::iter::empty()).unwrap();
        assert_eq!(n, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "No task found\n");
    }
}
