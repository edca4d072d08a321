use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::{BUDGET_DOCUMENT_ID, Budget, Expense, Snapshot, Task};

pub type Document = Map<String, Value>;

pub type SnapshotCallback = Box<dyn FnMut(&[Document])>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    Expenses,
    Budgets,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Tasks, Collection::Expenses, Collection::Budgets];

    pub fn as_key(&self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Expenses => "expenses",
            Collection::Budgets => "budgets",
        }
    }

    fn file_name(&self) -> String {
        format!("{}.data", self.as_key())
    }
}

/// Handle returned by [`DocumentStore::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    kind: Collection,
}

impl Subscription {
    pub fn kind(&self) -> Collection {
        self.kind
    }
}

/// The persistence collaborator. Ids are assigned here, never by callers.
pub trait DocumentStore {
    fn create(&mut self, kind: Collection, fields: Document) -> anyhow::Result<String>;

    /// Merges `fields` into an existing document. Null values remove keys.
    fn update(&mut self, kind: Collection, id: &str, fields: Document) -> anyhow::Result<()>;

    /// Like `update`, but creates the document under `id` when missing.
    fn upsert(&mut self, kind: Collection, id: &str, fields: Document) -> anyhow::Result<()>;

    fn delete(&mut self, kind: Collection, id: &str) -> anyhow::Result<()>;

    fn documents(&self, kind: Collection) -> anyhow::Result<Vec<Document>>;

    /// Calls `callback` with the current documents right away and again after
    /// every write to `kind`.
    fn subscribe(&mut self, kind: Collection, callback: SnapshotCallback) -> anyhow::Result<Subscription>;

    fn unsubscribe(&mut self, subscription: Subscription) -> bool;
}

struct Subscriber {
    id: u64,
    kind: Collection,
    callback: SnapshotCallback,
}

/// One JSON-lines file per collection under `data_dir`.
pub struct JsonlStore {
    pub data_dir: PathBuf,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl std::fmt::Debug for JsonlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStore")
            .field("data_dir", &self.data_dir)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl JsonlStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        for kind in Collection::ALL {
            let path = data_dir.join(kind.file_name());
            if !path.exists() {
                fs::write(&path, "").with_context(|| format!("failed to create {}", path.display()))?;
            }
        }

        info!(data_dir = %data_dir.display(), "opened document store");

        Ok(Self {
            data_dir,
            subscribers: Vec::new(),
            next_subscription: 1,
        })
    }

    pub fn path_for(&self, kind: Collection) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    fn load(&self, kind: Collection) -> anyhow::Result<Vec<Document>> {
        let path = self.path_for(kind);
        load_jsonl(&path).with_context(|| format!("failed to load {}", kind.file_name()))
    }

    fn save(&mut self, kind: Collection, docs: &[Document]) -> anyhow::Result<()> {
        let path = self.path_for(kind);
        save_jsonl_atomic(&path, docs).with_context(|| format!("failed to save {}", kind.file_name()))?;
        self.notify(kind, docs);
        Ok(())
    }

    fn notify(&mut self, kind: Collection, docs: &[Document]) {
        for subscriber in self.subscribers.iter_mut().filter(|s| s.kind == kind) {
            debug!(subscription = subscriber.id, collection = kind.as_key(), "notifying subscriber");
            (subscriber.callback)(docs);
        }
    }
}

impl DocumentStore for JsonlStore {
    #[tracing::instrument(skip(self, fields), fields(collection = kind.as_key()))]
    fn create(&mut self, kind: Collection, mut fields: Document) -> anyhow::Result<String> {
        let mut docs = self.load(kind)?;
        let id = Uuid::new_v4().to_string();
        fields.insert("id".to_string(), Value::String(id.clone()));
        docs.push(fields);
        self.save(kind, &docs)?;
        info!(id = %id, "created document");
        Ok(id)
    }

    #[tracing::instrument(skip(self, fields), fields(collection = kind.as_key()))]
    fn update(&mut self, kind: Collection, id: &str, fields: Document) -> anyhow::Result<()> {
        let mut docs = self.load(kind)?;
        let doc = docs
            .iter_mut()
            .find(|doc| document_id(doc) == Some(id))
            .ok_or_else(|| anyhow!("{} document not found: {id}", kind.as_key()))?;
        merge_fields(doc, fields);
        self.save(kind, &docs)
    }

    #[tracing::instrument(skip(self, fields), fields(collection = kind.as_key()))]
    fn upsert(&mut self, kind: Collection, id: &str, fields: Document) -> anyhow::Result<()> {
        let mut docs = self.load(kind)?;
        match docs.iter_mut().find(|doc| document_id(doc) == Some(id)) {
            Some(doc) => merge_fields(doc, fields),
            None => {
                let mut doc = Document::new();
                doc.insert("id".to_string(), Value::String(id.to_string()));
                merge_fields(&mut doc, fields);
                docs.push(doc);
            }
        }
        self.save(kind, &docs)
    }

    #[tracing::instrument(skip(self), fields(collection = kind.as_key()))]
    fn delete(&mut self, kind: Collection, id: &str) -> anyhow::Result<()> {
        let mut docs = self.load(kind)?;
        let before = docs.len();
        docs.retain(|doc| document_id(doc) != Some(id));
        if docs.len() == before {
            return Err(anyhow!("{} document not found: {id}", kind.as_key()));
        }
        self.save(kind, &docs)
    }

    fn documents(&self, kind: Collection) -> anyhow::Result<Vec<Document>> {
        self.load(kind)
    }

    #[tracing::instrument(skip(self, callback), fields(collection = kind.as_key()))]
    fn subscribe(&mut self, kind: Collection, mut callback: SnapshotCallback) -> anyhow::Result<Subscription> {
        let docs = self.load(kind)?;
        callback(&docs);

        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push(Subscriber { id, kind, callback });
        debug!(subscription = id, "subscribed");
        Ok(Subscription { id, kind })
    }

    fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != subscription.id);
        self.subscribers.len() != before
    }
}

pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

fn merge_fields(doc: &mut Document, fields: Document) {
    for (key, value) in fields {
        if key == "id" {
            continue;
        }
        if value.is_null() {
            doc.remove(&key);
        } else {
            doc.insert(key, value);
        }
    }
}

pub fn decode_tasks(docs: &[Document]) -> Vec<Task> {
    decode_each(docs, "task")
}

pub fn decode_expenses(docs: &[Document]) -> Vec<Expense> {
    decode_each(docs, "expense")
}

/// The singleton budget, or the default limits while none has been saved.
pub fn decode_budget(docs: &[Document]) -> Budget {
    let Some(doc) = docs.iter().find(|doc| document_id(doc) == Some(BUDGET_DOCUMENT_ID)) else {
        return Budget::default();
    };
    serde_json::from_value(Value::Object(doc.clone())).unwrap_or_else(|err| {
        warn!(error = %err, "unreadable budget document; using defaults");
        Budget::default()
    })
}

/// Decodes what it can; a bad record is logged and skipped rather than
/// failing the whole collection.
fn decode_each<T: serde::de::DeserializeOwned>(docs: &[Document], what: &str) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match serde_json::from_value::<T>(Value::Object(doc.clone())) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    kind = what,
                    id = document_id(doc).unwrap_or("-"),
                    error = %err,
                    "skipping unreadable record"
                );
                None
            }
        })
        .collect()
}

impl Snapshot {
    pub fn from_documents(tasks: &[Document], expenses: &[Document], budgets: &[Document]) -> Self {
        Self {
            tasks: decode_tasks(tasks),
            expenses: decode_expenses(expenses),
            budget: decode_budget(budgets),
        }
    }

    #[tracing::instrument(skip(store))]
    pub fn load<S: DocumentStore + ?Sized>(store: &S) -> anyhow::Result<Self> {
        let snapshot = Self::from_documents(
            &store.documents(Collection::Tasks)?,
            &store.documents(Collection::Expenses)?,
            &store.documents(Collection::Budgets)?,
        );
        debug!(
            tasks = snapshot.tasks.len(),
            expenses = snapshot.expenses.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }
}

pub fn save_budget<S: DocumentStore + ?Sized>(store: &mut S, budget: &Budget) -> anyhow::Result<()> {
    store.upsert(Collection::Budgets, BUDGET_DOCUMENT_ID, budget.to_fields())
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Document>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(doc)) => out.push(doc),
            Ok(_) => warn!(file = %path.display(), line = idx + 1, "skipping non-object line"),
            Err(err) => {
                warn!(file = %path.display(), line = idx + 1, error = %err, "skipping malformed line")
            }
        }
    }

    debug!(count = out.len(), "loaded documents from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, docs))]
fn save_jsonl_atomic(path: &Path, docs: &[Document]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = docs.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for doc in docs {
        let serialized = serde_json::to_string(doc)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn merge_removes_nulls_and_keeps_id() {
        let mut target = doc(json!({ "id": "a", "date": "2024-01-01", "time": "09:00" }));
        merge_fields(&mut target, doc(json!({ "id": "b", "date": "2024-02-01", "time": null })));
        assert_eq!(target, doc(json!({ "id": "a", "date": "2024-02-01" })));
    }

    #[test]
    fn missing_budget_falls_back_to_defaults() {
        assert_eq!(decode_budget(&[]), Budget::default());
        let other = doc(json!({ "id": "someone-else", "daily": 1 }));
        assert_eq!(decode_budget(&[other]), Budget::default());
        let saved = doc(json!({ "id": "default", "daily": 20, "weekly": 100, "monthly": 400 }));
        assert_eq!(
            decode_budget(&[saved]),
            Budget {
                daily: 20.0,
                weekly: 100.0,
                monthly: 400.0
            }
        );
    }

    #[test]
    fn bad_records_are_skipped_not_fatal() {
        let docs = vec![
            doc(json!({ "id": "1", "title": "ok", "amount": 3, "category": "Food", "date": "2024-04-01" })),
            doc(json!({ "id": "2", "title": "bad", "amount": 3, "category": "Food", "date": "tomorrow" })),
        ];
        let expenses = decode_expenses(&docs);
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].id, "1");

        let tasks = decode_tasks(&[
            doc(json!({ "id": "t", "title": "fine", "priority": "low" })),
            doc(json!({ "id": "u", "title": "odd", "priority": "urgent" })),
            doc(json!({ "id": "v", "title": "", "priority": "high" })),
        ]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "t");
    }
}
