//! JSON collection store.
//!
//! A collection is an ordered array of records persisted as a single file,
//! `<name>_backup.json`. Every mutation is a read-modify-write of the whole
//! collection. Nothing here raises: backend failures are written to the
//! audit log and come back as an empty list or `false`.
//!
//! Identifiers are `len + 1` at insert time, so an insert after a delete can
//! reuse an id that is still present. Callers must not assume uniqueness.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::audit::AuditLog;
use crate::errors::StoreError;

/// One entity: field name to JSON value, carrying an identifier field.
pub type Record = Map<String, Value>;

/// Identifier field assigned by [`CollectionStore::insert`].
pub const ID_FIELD: &str = "id";
/// Identifier field found in older user files. Honored when matching.
pub const LEGACY_ID_FIELD: &str = "_id";

/// Well-known collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PLAYERS: &str = "jogadoras";
    pub const EVENTS: &str = "eventos";
}

/// Returns the record identifier in string form, if it has one.
pub fn record_id(record: &Record) -> Option<String> {
    record
        .get(ID_FIELD)
        .or_else(|| record.get(LEGACY_ID_FIELD))
        .and_then(id_string)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_id(record: &Record, id: &str) -> bool {
    record_id(record).as_deref() == Some(id)
}

/// Copies a record with its identifier fields in string form.
fn normalize_ids(record: &Record) -> Record {
    let mut copy = record.clone();
    for field in [ID_FIELD, LEGACY_ID_FIELD] {
        if let Some(value) = copy.get_mut(field) {
            if value.is_string() {
                continue;
            }
            if let Some(text) = id_string(value) {
                *value = Value::String(text);
            }
        }
    }
    copy
}

/// Best human label for a record, used in audit lines.
fn record_label(record: &Record) -> String {
    ["nome", "titulo", "email"]
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
        .unwrap_or("N/A")
        .to_string()
}

/// Raw storage behind the collection store.
///
/// `read` returns `Ok(None)` when the collection was never written.
pub trait CollectionBackend: Send + Sync {
    fn read(&self, collection: &str) -> Result<Option<Vec<Record>>, StoreError>;

    fn write(&self, collection: &str, records: &[Record]) -> Result<(), StoreError>;
}

/// Directory of `<name>_backup.json` files.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}_backup.json"))
    }
}

impl CollectionBackend for JsonFileBackend {
    fn read(&self, collection: &str) -> Result<Option<Vec<Record>>, StoreError> {
        let path = self.file_path(collection);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(collection, err)),
        };

        serde_json::from_str::<Vec<Record>>(&text)
            .map(Some)
            .map_err(|err| StoreError::parse(collection, err.to_string()))
    }

    fn write(&self, collection: &str, records: &[Record]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|err| StoreError::io(collection, err))?;
        let body = serde_json::to_string_pretty(records)
            .map_err(|err| StoreError::parse(collection, err.to_string()))?;
        fs::write(self.file_path(collection), body).map_err(|err| StoreError::io(collection, err))
    }
}

/// In-memory backend for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    reject_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `write` fail, to exercise the failure paths.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.collections.read().contains_key(collection)
    }
}

impl CollectionBackend for MemoryBackend {
    fn read(&self, collection: &str) -> Result<Option<Vec<Record>>, StoreError> {
        Ok(self.collections.read().get(collection).cloned())
    }

    fn write(&self, collection: &str, records: &[Record]) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(collection.to_string()));
        }
        self.collections
            .write()
            .insert(collection.to_string(), records.to_vec());
        Ok(())
    }
}

/// Load/save and the derived CRUD helpers over named collections.
#[derive(Clone)]
pub struct CollectionStore {
    backend: Arc<dyn CollectionBackend>,
    audit: AuditLog,
}

impl CollectionStore {
    pub fn new(backend: Arc<dyn CollectionBackend>, audit: AuditLog) -> Self {
        Self { backend, audit }
    }

    /// Store over `<dir>/<name>_backup.json` files.
    pub fn json_files(dir: impl Into<PathBuf>, audit: AuditLog) -> Self {
        Self::new(Arc::new(JsonFileBackend::new(dir)), audit)
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Reads a collection. Missing or unreadable collections are empty.
    pub fn load(&self, name: &str) -> Vec<Record> {
        match self.backend.read(name) {
            Ok(Some(records)) => {
                debug!(collection = name, count = records.len(), "coleção carregada");
                self.audit
                    .log(format!("✓ Backup carregado: {name} ({} registros)", records.len()));
                records
            }
            Ok(None) => {
                self.audit
                    .log(format!("⚠ Arquivo de backup não encontrado: {name}"));
                Vec::new()
            }
            Err(err) => {
                warn!(collection = name, %err, "falha ao carregar coleção");
                self.audit
                    .log(format!("✗ ERRO ao carregar backup {name}: {err}"));
                Vec::new()
            }
        }
    }

    /// Replaces the whole collection. Identifier fields are written as strings.
    pub fn save(&self, name: &str, records: &[Record]) -> bool {
        let normalized: Vec<Record> = records.iter().map(normalize_ids).collect();
        match self.backend.write(name, &normalized) {
            Ok(()) => {
                self.audit
                    .log(format!("✓ Backup salvo: {name} ({} registros)", records.len()));
                true
            }
            Err(err) => {
                warn!(collection = name, %err, "falha ao salvar coleção");
                self.audit
                    .log(format!("✗ ERRO ao salvar backup {name}: {err}"));
                false
            }
        }
    }

    /// Alias for [`CollectionStore::load`].
    pub fn list(&self, name: &str) -> Vec<Record> {
        self.load(name)
    }

    /// First record whose identifier equals `id`.
    pub fn find(&self, name: &str, id: &str) -> Option<Record> {
        self.load(name).into_iter().find(|record| matches_id(record, id))
    }

    /// Appends `record`, assigning `id = len + 1` in place.
    pub fn insert(&self, name: &str, record: &mut Record) -> bool {
        let mut records = self.load(name);
        let id = (records.len() + 1).to_string();
        record.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        records.push(record.clone());

        if !self.save(name, &records) {
            self.audit
                .log(format!("✗ ERRO ao inserir registro em {name}: ID {id}"));
            return false;
        }

        self.audit.log(format!(
            "✓ Registro inserido em {name}: {} (ID {id})",
            record_label(record)
        ));
        true
    }

    /// Shallow-merges `patch` into the first record with identifier `id`.
    pub fn update(&self, name: &str, id: &str, patch: &Record) -> bool {
        let mut records = self.load(name);
        let Some(target) = records.iter_mut().find(|record| matches_id(record, id)) else {
            self.audit
                .log(format!("⚠ Registro não encontrado para atualizar: {name} ID {id}"));
            return false;
        };

        for (field, value) in patch {
            target.insert(field.clone(), value.clone());
        }

        if !self.save(name, &records) {
            self.audit
                .log(format!("✗ ERRO ao atualizar registro em {name}: ID {id}"));
            return false;
        }

        self.audit
            .log(format!("✓ Registro atualizado em {name}: ID {id}"));
        true
    }

    /// Removes every record with identifier `id`.
    pub fn delete(&self, name: &str, id: &str) -> bool {
        let records = self.load(name);
        let before = records.len();
        let remaining: Vec<Record> = records
            .into_iter()
            .filter(|record| !matches_id(record, id))
            .collect();

        if remaining.len() == before {
            self.audit
                .log(format!("⚠ Registro não encontrado para deletar: {name} ID {id}"));
            return false;
        }

        if !self.save(name, &remaining) {
            self.audit
                .log(format!("✗ ERRO ao deletar registro de {name}: ID {id}"));
            return false;
        }

        self.audit
            .log(format!("✓ Registro deletado de {name}: ID {id}"));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn file_store() -> (tempfile::TempDir, CollectionStore, JsonFileBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("database"));
        let store = CollectionStore::new(
            Arc::new(backend.clone()),
            AuditLog::new(dir.path().join("database").join("logs.txt")),
        );
        (dir, store, backend)
    }

    fn memory_store() -> (tempfile::TempDir, Arc<MemoryBackend>, CollectionStore) {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let store = CollectionStore::new(backend.clone(), AuditLog::new(dir.path().join("logs.txt")));
        (dir, backend, store)
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().filter_map(record_id).collect()
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store, backend) = file_store();
        let records = vec![
            record(json!({"id": "1", "nome": "Marta", "idade": 38, "ativa": true})),
            record(json!({"id": 2, "nome": "Formiga", "clube_atual": null})),
        ];

        assert!(store.save("jogadoras", &records));
        let loaded = store.load("jogadoras");

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], records[0]);
        assert_eq!(loaded[1]["id"], json!("2"));
        assert_eq!(loaded[1]["nome"], json!("Formiga"));
        assert_eq!(loaded[1]["clube_atual"], Value::Null);

        let text = fs::read_to_string(backend.file_path("jogadoras")).unwrap();
        assert!(text.contains("\n  {"), "file should be indented: {text}");
    }

    #[test]
    fn legacy_ids_are_coerced_to_strings() {
        let (_dir, store, _backend) = file_store();
        assert!(store.save("users", &[record(json!({"_id": 7, "email": "a@b.com"}))]));
        let loaded = store.load("users");
        assert_eq!(loaded[0]["_id"], json!("7"));
        assert_eq!(record_id(&loaded[0]).as_deref(), Some("7"));
    }

    #[test]
    fn loading_missing_collection_is_idempotent() {
        let (_dir, store, backend) = file_store();
        assert!(store.load("eventos").is_empty());
        assert!(store.load("eventos").is_empty());
        assert!(!backend.file_path("eventos").exists());
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let (_dir, store, backend) = file_store();
        fs::create_dir_all(backend.dir()).unwrap();
        fs::write(backend.file_path("eventos"), "{ not json").unwrap();
        assert!(store.load("eventos").is_empty());

        let log = fs::read_to_string(store.audit().path()).unwrap();
        assert!(log.contains("ERRO ao carregar backup eventos"));
    }

    #[test]
    fn update_touches_only_the_patched_field() {
        let (_dir, store, _backend) = file_store();
        let mut a = record(json!({"nome": "A", "posicao": "Atacante"}));
        let mut b = record(json!({"nome": "B", "posicao": "Goleira"}));
        assert!(store.insert("jogadoras", &mut a));
        assert!(store.insert("jogadoras", &mut b));

        let patch = record(json!({"posicao": "Zagueira"}));
        assert!(store.update("jogadoras", "1", &patch));

        let loaded = store.load("jogadoras");
        assert_eq!(loaded[0]["posicao"], json!("Zagueira"));
        assert_eq!(loaded[0]["nome"], json!("A"));
        assert_eq!(loaded[0]["id"], json!("1"));
        assert_eq!(loaded[1], b);
    }

    #[test]
    fn update_of_unknown_id_fails() {
        let (_dir, _backend, store) = memory_store();
        let mut a = record(json!({"nome": "A"}));
        assert!(store.insert("jogadoras", &mut a));
        assert!(!store.update("jogadoras", "9", &record(json!({"nome": "Z"}))));
        assert_eq!(store.load("jogadoras"), vec![a]);
    }

    #[test]
    fn delete_of_unknown_id_leaves_file_untouched() {
        let (_dir, store, backend) = file_store();
        let mut a = record(json!({"nome": "A"}));
        assert!(store.insert("eventos", &mut a));
        let before = fs::read(backend.file_path("eventos")).unwrap();

        assert!(!store.delete("eventos", "42"));

        let after = fs::read(backend.file_path("eventos")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn delete_removes_every_match() {
        let (_dir, _backend, store) = memory_store();
        let records = vec![
            record(json!({"id": "1", "nome": "A"})),
            record(json!({"id": "2", "nome": "B"})),
            record(json!({"id": "2", "nome": "B2"})),
        ];
        assert!(store.save("jogadoras", &records));
        assert!(store.delete("jogadoras", "2"));
        assert_eq!(ids(&store.list("jogadoras")), vec!["1"]);
    }

    #[test]
    fn insert_after_delete_reuses_an_existing_id() {
        let (_dir, _backend, store) = memory_store();
        for name in ["A", "B", "C"] {
            let mut r = record(json!({ "nome": name }));
            assert!(store.insert("jogadoras", &mut r));
        }
        assert_eq!(ids(&store.list("jogadoras")), vec!["1", "2", "3"]);

        assert!(store.delete("jogadoras", "2"));
        let mut d = record(json!({"nome": "D"}));
        assert!(store.insert("jogadoras", &mut d));

        // count + 1 collides with the surviving "C"
        assert_eq!(d["id"], json!("3"));
        let all = store.list("jogadoras");
        assert_eq!(ids(&all), vec!["1", "3", "3"]);
        assert_eq!(store.find("jogadoras", "3").unwrap()["nome"], json!("C"));
    }

    #[test]
    fn failed_save_is_reported_as_false() {
        let (_dir, backend, store) = memory_store();
        backend.reject_writes(true);

        let mut a = record(json!({"nome": "A"}));
        assert!(!store.insert("jogadoras", &mut a));
        assert!(!store.save("jogadoras", &[a]));
        assert!(!backend.contains("jogadoras"));
        assert!(store.load("jogadoras").is_empty());
    }

    #[test]
    fn memory_store_audits_into_its_own_directory() {
        let (dir, backend, store) = memory_store();
        assert!(store.audit().path().starts_with(dir.path()));

        backend.reject_writes(true);
        let mut a = record(json!({"nome": "A"}));
        assert!(!store.insert("jogadoras", &mut a));

        let log = fs::read_to_string(dir.path().join("logs.txt")).unwrap();
        assert!(log.contains("ERRO ao inserir registro em jogadoras"));
    }

    #[test]
    fn reading_never_creates_memory_collections() {
        let (_dir, backend, store) = memory_store();
        assert!(store.load("users").is_empty());
        assert!(!backend.contains("users"));
    }
}
