//! Bridge to the externally-owned entity store.
//!
//! The layout never edits entity fields itself. Every create, update and
//! delete, whether it comes from direct editing or from undo/redo, goes
//! through [`EntityManager`] so the store's own validation applies.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EntityError;
use crate::model::EntityId;

const CAPTION_PROPERTIES: &[&str] = &["name", "label", "title"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub schema: String,
    #[serde(default)]
    pub properties: IndexMap<String, Vec<String>>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, schema: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema: schema.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.properties
            .entry(name.to_string())
            .or_default()
            .push(value.into());
        self
    }

    /// Replaces every value of `name` with `value`.
    pub fn set_property(&mut self, name: &str, value: impl Into<String>) {
        self.properties.insert(name.to_string(), vec![value.into()]);
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Human readable label: the first caption-like property, else the id.
    pub fn caption(&self) -> &str {
        CAPTION_PROPERTIES
            .iter()
            .find_map(|p| self.property(p))
            .unwrap_or(self.id.as_str())
    }
}

/// Data for an entity the store has not created yet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDraft {
    pub schema: String,
    #[serde(default)]
    pub properties: IndexMap<String, Vec<String>>,
}

impl EntityDraft {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.properties
            .entry(name.to_string())
            .or_default()
            .push(value.into());
        self
    }

    pub fn caption(&self) -> Option<&str> {
        CAPTION_PROPERTIES.iter().find_map(|p| {
            self.properties
                .get(*p)
                .and_then(|v| v.first())
                .map(String::as_str)
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntityUpdate {
    pub before: Entity,
    pub after: Entity,
}

/// One replayable entity-level effect.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityChange {
    Created(Entity),
    Updated(EntityUpdate),
    Deleted(Entity),
}

impl EntityChange {
    pub fn inverse(&self) -> EntityChange {
        match self {
            EntityChange::Created(e) => EntityChange::Deleted(e.clone()),
            EntityChange::Deleted(e) => EntityChange::Created(e.clone()),
            EntityChange::Updated(u) => EntityChange::Updated(EntityUpdate {
                before: u.after.clone(),
                after: u.before.clone(),
            }),
        }
    }
}

/// Entity effects attached to one history entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityDelta {
    pub created: Vec<Entity>,
    pub updated: Vec<EntityUpdate>,
    pub deleted: Vec<Entity>,
}

impl EntityDelta {
    pub fn created(entity: Entity) -> Self {
        Self {
            created: vec![entity],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Changes in the order they were applied.
    pub fn changes(&self) -> Vec<EntityChange> {
        let mut out = Vec::with_capacity(self.created.len() + self.updated.len() + self.deleted.len());
        out.extend(self.created.iter().cloned().map(EntityChange::Created));
        out.extend(self.updated.iter().cloned().map(EntityChange::Updated));
        out.extend(self.deleted.iter().cloned().map(EntityChange::Deleted));
        out
    }
}

/// Direction in which a delta is replayed against the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replay {
    Redo,
    Undo,
}

impl Replay {
    pub fn factor(self) -> i8 {
        match self {
            Replay::Redo => 1,
            Replay::Undo => -1,
        }
    }
}

/// The externally-owned entity store.
///
/// `update_entity` must behave as an upsert: redo of a creation and undo of a
/// deletion both recreate the entity through it.
pub trait EntityStore {
    fn create_entity(&mut self, draft: EntityDraft) -> Result<Entity, EntityError>;
    fn update_entity(&mut self, entity: &Entity) -> Result<(), EntityError>;
    fn delete_entity(&mut self, id: &EntityId);
    fn resolve_entity(&self, id: &EntityId) -> Option<Entity>;

    fn entity_suggestions(&self, _query: &str, _schemas: &[String]) -> Vec<Entity> {
        Vec::new()
    }
}

/// Default store used when no external store is injected.
#[derive(Clone, Debug, Default)]
pub struct MemoryEntityStore {
    entities: IndexMap<EntityId, Entity>,
    schemas: IndexMap<String, IndexSet<String>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `schema` to the given property names. Unregistered schemas
    /// accept any property.
    pub fn register_schema<I, S>(&mut self, schema: &str, properties: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas.insert(
            schema.to_string(),
            properties.into_iter().map(Into::into).collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn validate(
        &self,
        schema: &str,
        properties: &IndexMap<String, Vec<String>>,
    ) -> Result<(), EntityError> {
        if schema.trim().is_empty() {
            return Err(EntityError::UnknownSchema(schema.to_string()));
        }
        let Some(allowed) = self.schemas.get(schema) else {
            return Ok(());
        };
        for (property, values) in properties {
            if !allowed.contains(property) {
                return Err(EntityError::InvalidProperty {
                    schema: schema.to_string(),
                    property: property.clone(),
                    reason: "property is not defined by the schema".to_string(),
                });
            }
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(EntityError::InvalidProperty {
                    schema: schema.to_string(),
                    property: property.clone(),
                    reason: "empty values are not allowed".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl EntityStore for MemoryEntityStore {
    fn create_entity(&mut self, draft: EntityDraft) -> Result<Entity, EntityError> {
        self.validate(&draft.schema, &draft.properties)?;
        let entity = Entity {
            id: EntityId::generate(),
            schema: draft.schema,
            properties: draft.properties,
        };
        self.entities.insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    fn update_entity(&mut self, entity: &Entity) -> Result<(), EntityError> {
        self.validate(&entity.schema, &entity.properties)?;
        self.entities.insert(entity.id.clone(), entity.clone());
        Ok(())
    }

    fn delete_entity(&mut self, id: &EntityId) {
        self.entities.shift_remove(id);
    }

    fn resolve_entity(&self, id: &EntityId) -> Option<Entity> {
        self.entities.get(id).cloned()
    }

    fn entity_suggestions(&self, query: &str, schemas: &[String]) -> Vec<Entity> {
        let matcher = SkimMatcherV2::default();
        let q = query.trim();
        let mut out: Vec<(&Entity, i64)> = self
            .entities
            .values()
            .filter(|e| schemas.is_empty() || schemas.iter().any(|s| s == &e.schema))
            .filter_map(|e| {
                if q.is_empty() {
                    return Some((e, 0));
                }
                matcher.fuzzy_match(e.caption(), q).map(|score| (e, score))
            })
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.caption().cmp(b.0.caption())));
        out.into_iter().map(|(e, _)| e.clone()).collect()
    }
}

/// Either an id or an entity value that may be stale.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityRef {
    Id(EntityId),
    Entity(Entity),
}

impl From<EntityId> for EntityRef {
    fn from(value: EntityId) -> Self {
        EntityRef::Id(value)
    }
}

impl From<&EntityId> for EntityRef {
    fn from(value: &EntityId) -> Self {
        EntityRef::Id(value.clone())
    }
}

impl From<Entity> for EntityRef {
    fn from(value: Entity) -> Self {
        EntityRef::Entity(value)
    }
}

pub struct EntityManager {
    store: Box<dyn EntityStore>,
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityManager {
    pub fn new() -> Self {
        Self::with_store(MemoryEntityStore::new())
    }

    pub fn with_store(store: impl EntityStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn create_entity(&mut self, draft: EntityDraft) -> Result<Entity, EntityError> {
        self.store.create_entity(draft)
    }

    pub fn update_entity(&mut self, entity: &Entity) -> Result<(), EntityError> {
        self.store.update_entity(entity)
    }

    pub fn delete_entity(&mut self, id: &EntityId) {
        self.store.delete_entity(id);
    }

    /// Current store value for the reference. A passed entity unknown to the
    /// store resolves to itself.
    pub fn resolve_entity_reference(&self, reference: impl Into<EntityRef>) -> Option<Entity> {
        match reference.into() {
            EntityRef::Id(id) => self.store.resolve_entity(&id),
            EntityRef::Entity(entity) => self.store.resolve_entity(&entity.id).or(Some(entity)),
        }
    }

    pub fn get_entity_suggestions(&self, query: &str, schemas: &[String]) -> Vec<Entity> {
        self.store.entity_suggestions(query, schemas)
    }

    fn apply_change(&mut self, change: &EntityChange) {
        let result = match change {
            EntityChange::Created(entity) => self.store.update_entity(entity),
            EntityChange::Updated(update) => self.store.update_entity(&update.after),
            EntityChange::Deleted(entity) => {
                self.store.delete_entity(&entity.id);
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(%err, "entity store rejected a replayed change");
        }
    }

    /// Replays `delta` against the store. Undo applies the inverse of each
    /// change, last change first.
    pub fn apply_entity_changes(&mut self, delta: &EntityDelta, replay: Replay) {
        let changes = delta.changes();
        debug!(
            factor = replay.factor(),
            changes = changes.len(),
            "replaying entity changes"
        );
        match replay {
            Replay::Redo => changes.iter().for_each(|c| self.apply_change(c)),
            Replay::Undo => changes
                .iter()
                .rev()
                .for_each(|c| self.apply_change(&c.inverse())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str) -> EntityDraft {
        EntityDraft::new("Person").with_property("name", name)
    }

    #[test]
    fn memory_store_creates_with_fresh_ids() {
        let mut store = MemoryEntityStore::new();
        let a = store.create_entity(person("Ada")).unwrap();
        let b = store.create_entity(person("Ada")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
        assert_eq!(a.caption(), "Ada");
    }

    #[test]
    fn registered_schema_rejects_unknown_property() {
        let mut store = MemoryEntityStore::new();
        store.register_schema("Person", ["name", "nationality"]);
        let err = store
            .create_entity(person("Ada").with_property("wingspan", "2m"))
            .unwrap_err();
        assert_eq!(
            err,
            EntityError::InvalidProperty {
                schema: "Person".into(),
                property: "wingspan".into(),
                reason: "property is not defined by the schema".into(),
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn suggestions_are_ranked_and_filtered_by_schema() {
        let mut store = MemoryEntityStore::new();
        store.create_entity(person("Grace Hopper")).unwrap();
        store.create_entity(person("Alan Turing")).unwrap();
        store
            .create_entity(EntityDraft::new("Company").with_property("name", "Hopper Ltd"))
            .unwrap();

        let all = store.entity_suggestions("hopper", &[]);
        assert_eq!(all.len(), 2);

        let people = store.entity_suggestions("hopper", &["Person".to_string()]);
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].caption(), "Grace Hopper");
    }

    #[test]
    fn undo_replay_inverts_each_change() {
        let mut manager = EntityManager::new();
        let created = manager.create_entity(person("Ada")).unwrap();
        let before = manager.create_entity(person("Bob")).unwrap();
        let mut after = before.clone();
        after.set_property("name", "Robert");
        assert_eq!(after.caption(), "Robert");
        assert_eq!(after.properties["name"], ["Robert"]);
        manager.update_entity(&after).unwrap();
        let doomed = manager.create_entity(person("Eve")).unwrap();
        manager.delete_entity(&doomed.id);

        let delta = EntityDelta {
            created: vec![created.clone()],
            updated: vec![EntityUpdate {
                before: before.clone(),
                after: after.clone(),
            }],
            deleted: vec![doomed.clone()],
        };

        manager.apply_entity_changes(&delta, Replay::Undo);
        assert_eq!(manager.resolve_entity_reference(&created.id), None);
        assert_eq!(manager.resolve_entity_reference(&before.id), Some(before.clone()));
        assert_eq!(manager.resolve_entity_reference(&doomed.id), Some(doomed.clone()));

        manager.apply_entity_changes(&delta, Replay::Redo);
        assert_eq!(manager.resolve_entity_reference(&created.id), Some(created));
        assert_eq!(manager.resolve_entity_reference(&before.id), Some(after));
        assert_eq!(manager.resolve_entity_reference(&doomed.id), None);
    }

    #[test]
    fn stale_reference_resolves_to_itself() {
        let manager = EntityManager::new();
        let ghost = Entity::new("ghost", "Person");
        assert_eq!(
            manager.resolve_entity_reference(ghost.clone()),
            Some(ghost)
        );
        assert_eq!(manager.resolve_entity_reference(EntityId::from("ghost")), None);
    }
}
