//! Data getters: how a field's target entity turns into the tree the popup browses.

use crate::{AipError, DataValue, statics};
use std::{fmt, str::FromStr, sync::Arc};

/// Which view of the target entity a field autocompletes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataMode {
    /// The entity's raw document data.
    #[default]
    Document,
    /// Data as used by rolls and formulas; references in this mode take an `@` prefix.
    Roll,
    /// Raw document data of the actor owning the entity.
    OwningActor,
    /// Roll data of the actor owning the entity.
    OwningActorRoll,
    /// A caller-supplied getter.
    Custom,
}

impl DataMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Document => statics::MODE_DOCUMENT,
            DataMode::Roll => statics::MODE_ROLL,
            DataMode::OwningActor => statics::MODE_OWNING_ACTOR,
            DataMode::OwningActorRoll => statics::MODE_OWNING_ACTOR_ROLL,
            DataMode::Custom => statics::MODE_CUSTOM,
        }
    }

    /// Prefix put in front of inserted references unless a field overrides it.
    pub fn default_key_prefix(&self) -> &'static str {
        match self {
            DataMode::Roll | DataMode::OwningActorRoll => statics::ROLL_KEY_PREFIX,
            _ => statics::EN_EMPTY,
        }
    }

    /// Whether `name` is an old spelling that still parses but should be migrated.
    pub fn is_deprecated_alias(name: &str) -> bool {
        name == statics::MODE_ENTITY
    }
}

impl FromStr for DataMode {
    type Err = AipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            statics::MODE_DOCUMENT | statics::MODE_ENTITY => Ok(DataMode::Document),
            statics::MODE_ROLL => Ok(DataMode::Roll),
            statics::MODE_OWNING_ACTOR => Ok(DataMode::OwningActor),
            statics::MODE_OWNING_ACTOR_ROLL => Ok(DataMode::OwningActorRoll),
            statics::MODE_CUSTOM => Ok(DataMode::Custom),
            other => Err(AipError::InvalidDataMode(other.to_string())),
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The host-side entity a field belongs to.
pub trait DataTarget {
    fn document_data(&self) -> Option<DataValue>;

    fn roll_data(&self) -> Option<DataValue> {
        None
    }

    fn owning_actor(&self) -> Option<&dyn DataTarget> {
        None
    }
}

pub type CustomGetter = Arc<dyn Fn(&dyn DataTarget) -> Option<DataValue> + Send + Sync>;

/// A resolved getter: either one of the built-in modes or a custom function.
#[derive(Clone)]
pub enum DataGetter {
    Mode(DataMode),
    Custom(CustomGetter),
}

impl DataGetter {
    /// `Custom` mode without a function stays a mode getter, which never yields data.
    pub fn new(mode: DataMode, custom: Option<CustomGetter>) -> Self {
        match (mode, custom) {
            (DataMode::Custom, Some(getter)) => DataGetter::Custom(getter),
            (mode, _) => DataGetter::Mode(mode),
        }
    }

    pub fn mode(&self) -> DataMode {
        match self {
            DataGetter::Mode(mode) => *mode,
            DataGetter::Custom(_) => DataMode::Custom,
        }
    }

    pub fn get(&self, target: &dyn DataTarget) -> Option<DataValue> {
        match self {
            DataGetter::Mode(DataMode::Document) => target.document_data(),
            DataGetter::Mode(DataMode::Roll) => target.roll_data(),
            DataGetter::Mode(DataMode::OwningActor) => target.owning_actor()?.document_data(),
            DataGetter::Mode(DataMode::OwningActorRoll) => target.owning_actor()?.roll_data(),
            DataGetter::Mode(DataMode::Custom) => None,
            DataGetter::Custom(getter) => getter(target),
        }
    }
}

impl fmt::Debug for DataGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataGetter::Mode(mode) => f.debug_tuple("Mode").field(mode).finish(),
            DataGetter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A plain in-memory entity, as loaded from a data snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub document: Option<DataValue>,
    pub roll: Option<DataValue>,
    pub actor: Option<Box<Entity>>,
}

impl Entity {
    /// Reads a snapshot shaped `{ document, rollData, actor: { document, rollData } }`.
    /// Anything else is taken as the document data itself.
    pub fn from_snapshot(root: DataValue) -> Self {
        let is_shaped = root
            .as_object()
            .is_some_and(|map| map.contains_key(statics::SNAPSHOT_DOCUMENT));
        if !is_shaped {
            return Entity {
                document: Some(root),
                ..Default::default()
            };
        }

        let DataValue::Object(mut map) = root else {
            return Entity::default();
        };
        let actor = map
            .shift_remove(statics::SNAPSHOT_ACTOR)
            .filter(DataValue::has_children)
            .map(|actor| Box::new(Entity::from_snapshot(actor)));
        Entity {
            document: map.shift_remove(statics::SNAPSHOT_DOCUMENT),
            roll: map.shift_remove(statics::SNAPSHOT_ROLL_DATA),
            actor,
        }
    }
}

impl DataTarget for Entity {
    fn document_data(&self) -> Option<DataValue> {
        self.document.clone()
    }

    fn roll_data(&self) -> Option<DataValue> {
        self.roll.clone()
    }

    fn owning_actor(&self) -> Option<&dyn DataTarget> {
        self.actor.as_deref().map(|actor| actor as &dyn DataTarget)
    }
}

#[cfg(test)]
mod tests {
    use super::{CustomGetter, DataGetter, DataMode, DataTarget, Entity};
    use crate::{AipError, DataValue};
    use std::sync::Arc;

    fn entity() -> Entity {
        Entity::from_snapshot(
            DataValue::parse_json5(
                "{ document: { name: 'Sword' }, rollData: { dmg: 4 },
                   actor: { document: { name: 'Hero' }, rollData: { str: 3 } } }",
            )
            .unwrap(),
        )
    }

    #[test]
    fn parses_modes_and_rejects_unknown() {
        assert_eq!("roll".parse::<DataMode>(), Ok(DataMode::Roll));
        assert_eq!("entity".parse::<DataMode>(), Ok(DataMode::Document));
        assert!(DataMode::is_deprecated_alias("entity"));
        assert_eq!(
            "bogus".parse::<DataMode>(),
            Err(AipError::InvalidDataMode("bogus".to_string()))
        );
    }

    #[test]
    fn roll_modes_default_to_at_prefix() {
        assert_eq!(DataMode::Roll.default_key_prefix(), "@");
        assert_eq!(DataMode::OwningActorRoll.default_key_prefix(), "@");
        assert_eq!(DataMode::Document.default_key_prefix(), "");
    }

    #[test]
    fn mode_getters_pick_the_matching_view() {
        let e = entity();
        let name = |v: Option<DataValue>| {
            v.and_then(|v| v.get("name").and_then(|n| n.as_str().map(str::to_string)))
        };
        assert_eq!(name(DataGetter::Mode(DataMode::Document).get(&e)), Some("Sword".into()));
        assert_eq!(name(DataGetter::Mode(DataMode::OwningActor).get(&e)), Some("Hero".into()));
        assert!(DataGetter::Mode(DataMode::Roll).get(&e).unwrap().get("dmg").is_some());
        assert!(DataGetter::Mode(DataMode::OwningActorRoll).get(&e).unwrap().get("str").is_some());
        assert_eq!(DataGetter::Mode(DataMode::Custom).get(&e), None);
    }

    #[test]
    fn custom_getter_is_called_with_the_target() {
        let custom: CustomGetter =
            Arc::new(|target: &dyn DataTarget| target.owning_actor()?.roll_data());
        let getter = DataGetter::new(DataMode::Custom, Some(custom));
        assert_eq!(getter.mode(), DataMode::Custom);
        assert!(getter.get(&entity()).unwrap().get("str").is_some());
    }

    #[test]
    fn plain_snapshot_is_document_data() {
        let e = Entity::from_snapshot(DataValue::parse_json5("{ hp: 3 }").unwrap());
        assert!(e.document.is_some());
        assert!(e.roll.is_none());
        assert!(e.actor.is_none());
    }
}
