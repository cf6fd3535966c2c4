//! Imports starter data into empty collections.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::errors::{PlatformError, Result};
use crate::store::{collections, CollectionStore, Record};

/// Collections fed from `<seed_dir>/<file>`.
const SEED_FILES: [(&str, &str); 2] = [
    (collections::PLAYERS, "jogadoras.json"),
    (collections::EVENTS, "eventos.json"),
];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// `(collection, imported records)` for each collection that was filled.
    pub imported: Vec<(String, usize)>,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.imported.is_empty()
    }
}

/// Copies seed files into collections that are still empty.
///
/// Collections that already hold records and missing seed files are skipped.
pub fn seed_from_dir(store: &CollectionStore, seed_dir: &Path) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for (collection, file_name) in SEED_FILES {
        if !store.load(collection).is_empty() {
            continue;
        }

        let path = seed_dir.join(file_name);
        if !path.exists() {
            continue;
        }

        let text = fs::read_to_string(&path)?;
        let records: Vec<Record> = serde_json::from_str(&text).map_err(|err| {
            PlatformError::Internal(format!("{} inválido: {err}", path.display()))
        })?;

        if !store.save(collection, &records) {
            return Err(PlatformError::Internal(format!(
                "falha ao importar {collection}"
            )));
        }

        store.audit().log(format!(
            "✓ {} registros importados para {collection}",
            records.len()
        ));
        report.imported.push((collection.to_string(), records.len()));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::audit::AuditLog;

    #[test]
    fn fills_only_empty_collections() {
        let dir = tempfile::tempdir().unwrap();
        let seed_dir = dir.path().join("seed");
        fs::create_dir_all(&seed_dir).unwrap();
        fs::write(
            seed_dir.join("jogadoras.json"),
            json!([{"id": 1, "nome": "Marta"}, {"id": 2, "nome": "Cristiane"}]).to_string(),
        )
        .unwrap();
        fs::write(
            seed_dir.join("eventos.json"),
            json!([{"id": "1", "titulo": "Festival"}]).to_string(),
        )
        .unwrap();

        let store = CollectionStore::json_files(
            dir.path().join("database"),
            AuditLog::new(dir.path().join("logs.txt")),
        );
        let existing: Record = json!({"id": "1", "titulo": "Já existe"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(store.save(collections::EVENTS, &[existing]));

        let report = seed_from_dir(&store, &seed_dir).unwrap();
        assert_eq!(report.imported, vec![(collections::PLAYERS.to_string(), 2)]);

        let players = store.load(collections::PLAYERS);
        assert_eq!(players[0]["id"], json!("1"));
        assert_eq!(store.load(collections::EVENTS)[0]["titulo"], json!("Já existe"));

        let again = seed_from_dir(&store, &seed_dir).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn malformed_seed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("eventos.json"), "[{").unwrap();
        let store = CollectionStore::json_files(
            dir.path().join("database"),
            AuditLog::new(dir.path().join("logs.txt")),
        );
        let err = seed_from_dir(&store, dir.path()).unwrap_err();
        assert_eq!(err.code(), "internal_error");
    }
}
