//! CRUD over the player (`jogadoras`) and event (`eventos`) collections.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{PlatformError, Result, ValidationError};
use crate::store::{collections, CollectionStore, Record, ID_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Players,
    Events,
}

impl ResourceKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Players => collections::PLAYERS,
            ResourceKind::Events => collections::EVENTS,
        }
    }

    /// Singular noun used in messages and response bodies.
    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Players => "jogadora",
            ResourceKind::Events => "evento",
        }
    }

    fn build_record(&self, fields: Value) -> std::result::Result<Record, ValidationError> {
        let body = match self {
            ResourceKind::Players => {
                let player: NewPlayer = parse_body(fields)?;
                player.into_fields()?
            }
            ResourceKind::Events => {
                let event: NewEvent = parse_body(fields)?;
                event.into_fields()?
            }
        };

        // keep the identifier as the first field of the stored object
        let mut record = Record::new();
        record.insert(ID_FIELD.into(), Value::Null);
        record.extend(body);
        Ok(record)
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(
    fields: Value,
) -> std::result::Result<T, ValidationError> {
    serde_json::from_value(fields).map_err(|err| ValidationError::field("corpo", err.to_string()))
}

fn to_fields<T: Serialize>(value: &T) -> std::result::Result<Record, ValidationError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::field("corpo", "esperado um objeto")),
        Err(err) => Err(ValidationError::field("corpo", err.to_string())),
    }
}

fn default_nationality() -> Option<String> {
    Some("Brasil".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayer {
    pub nome: String,
    #[serde(default)]
    pub idade: Option<u32>,
    pub posicao: String,
    #[serde(default = "default_nationality")]
    pub nacionalidade: Option<String>,
    #[serde(default)]
    pub clube_atual: Option<String>,
    #[serde(default)]
    pub altura: Option<f64>,
    #[serde(default)]
    pub peso: Option<f64>,
    #[serde(default)]
    pub pe_preferido: Option<String>,
}

impl NewPlayer {
    fn into_fields(self) -> std::result::Result<Record, ValidationError> {
        let mut fields = to_fields(&self)?;
        fields.insert("gols_carreira".into(), Value::from(0));
        fields.insert("assistencias".into(), Value::from(0));
        fields.insert("partidas_jogadas".into(), Value::from(0));
        fields.insert("status".into(), Value::from("Ativo"));
        Ok(fields)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub titulo: String,
    pub descricao: String,
    pub tipo: String,
    pub data: String,
    pub horario: String,
    pub local: String,
    pub endereco: String,
    #[serde(default)]
    pub vagas: Option<i64>,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub organizador: Option<String>,
}

impl NewEvent {
    fn into_fields(self) -> std::result::Result<Record, ValidationError> {
        let title_len = self.titulo.chars().count();
        if !(5..=200).contains(&title_len) {
            return Err(ValidationError::field(
                "titulo",
                "precisa ter entre 5 e 200 caracteres",
            ));
        }

        let available = self.vagas.filter(|vagas| *vagas != 0);
        let mut fields = to_fields(&self)?;
        fields.insert("vagas_disponiveis".into(), Value::from(available));
        fields.insert("inscricoes_abertas".into(), Value::Bool(true));
        Ok(fields)
    }
}

/// List/get/create/update/delete for one resource collection.
#[derive(Clone)]
pub struct ResourceService {
    kind: ResourceKind,
    store: CollectionStore,
}

impl ResourceService {
    pub fn new(kind: ResourceKind, store: CollectionStore) -> Self {
        Self { kind, store }
    }

    pub fn players(store: CollectionStore) -> Self {
        Self::new(ResourceKind::Players, store)
    }

    pub fn events(store: CollectionStore) -> Self {
        Self::new(ResourceKind::Events, store)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn list(&self) -> Vec<Record> {
        let records = self.store.list(self.kind.collection());
        self.store.audit().log(format!(
            "✓ Listagem de {}: {} registros",
            self.kind.collection(),
            records.len()
        ));
        records
    }

    pub fn get(&self, id: &str) -> Result<Record> {
        match self.store.find(self.kind.collection(), id) {
            Some(record) => {
                self.store.audit().log(format!(
                    "✓ Registro encontrado em {}: ID {id}",
                    self.kind.collection()
                ));
                Ok(record)
            }
            None => Err(self.not_found(id)),
        }
    }

    /// Validates `fields`, fills defaults and inserts the new record.
    pub fn create(&self, fields: Value) -> Result<Record> {
        let collection = self.kind.collection();
        let mut record = self.kind.build_record(fields).map_err(|err| {
            self.store.audit().log(format!(
                "✗ ERRO de validação ao criar {}: {err}",
                self.kind.singular()
            ));
            PlatformError::from(err)
        })?;

        if !self.store.insert(collection, &mut record) {
            self.store.audit().log(format!(
                "✗ ERRO ao criar {}: falha ao salvar {collection}",
                self.kind.singular()
            ));
            return Err(PlatformError::Internal(format!(
                "Erro ao criar {}",
                self.kind.singular()
            )));
        }

        debug!(collection, id = ?record.get(ID_FIELD), "registro criado");
        Ok(record)
    }

    /// Shallow-merges `patch` into the record.
    pub fn update(&self, id: &str, patch: &Record) -> Result<()> {
        let collection = self.kind.collection();
        if self.store.find(collection, id).is_none() {
            return Err(self.not_found(id));
        }

        if !self.store.update(collection, id, patch) {
            return Err(PlatformError::Internal(format!(
                "Erro ao atualizar {} {id}",
                self.kind.singular()
            )));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let collection = self.kind.collection();
        if self.store.find(collection, id).is_none() {
            return Err(self.not_found(id));
        }

        if !self.store.delete(collection, id) {
            return Err(PlatformError::Internal(format!(
                "Erro ao deletar {} {id}",
                self.kind.singular()
            )));
        }
        Ok(())
    }

    fn not_found(&self, id: &str) -> PlatformError {
        let message = match self.kind {
            ResourceKind::Players => format!("Jogadora com ID {id} não encontrada"),
            ResourceKind::Events => format!("Evento com ID {id} não encontrado"),
        };
        self.store.audit().log(format!("⚠ {message}"));
        PlatformError::NotFound(message)
    }
}
