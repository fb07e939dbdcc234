#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static definition tables loaded from a TOML catalog.
//!
//! The catalog supplies everything the formation engine treats as read-only
//! configuration: unit and skill profiles, the ordered synergy table, and
//! per-stage tile layouts with their deploy caps.

mod layout;

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use formation_core::{
    CategoryType, EffectId, EffectSlot, EffectSlots, PatternCategory, SkillId, SkillProfile,
    StageConfig, StageLayouts, StageType, SynergyDefinition, SynergyId, SynergyTable,
    TargetScope, UnitCatalog, UnitId, UnitProfile, EFFECT_SLOTS, REQUIREMENT_SLOTS,
};
use serde::Deserialize;
use thiserror::Error;

const SUPPORTED_CATALOG_VERSION: u32 = 1;

/// Catalog embedded into the binary.
pub const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// Errors produced while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog from {path:?}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The catalog is not valid TOML for the expected schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    /// The catalog declares a version this loader does not understand.
    #[error("unsupported catalog version {found}; expected {}", SUPPORTED_CATALOG_VERSION)]
    UnsupportedVersion {
        /// Declared version.
        found: u32,
    },
    /// Two entries share an identifier.
    #[error("duplicate {kind} id {id}")]
    Duplicate {
        /// Table containing the duplicate.
        kind: &'static str,
        /// Repeated identifier.
        id: u32,
    },
    /// An entry lists more than three effects.
    #[error("{kind} {id} lists {count} effects; at most {} are supported", EFFECT_SLOTS)]
    TooManyEffects {
        /// Table containing the entry.
        kind: &'static str,
        /// Identifier of the entry.
        id: u32,
        /// Number of effects listed.
        count: usize,
    },
    /// A synergy lists more than three required tags.
    #[error("synergy {id} requires {count} tags; at most {} are supported", REQUIREMENT_SLOTS)]
    TooManyRequirements {
        /// Identifier of the synergy.
        id: u32,
        /// Number of tags listed.
        count: usize,
    },
    /// A category name is not recognised.
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    /// A pattern name is not recognised.
    #[error("unknown pattern `{0}`")]
    UnknownPattern(String),
    /// A target scope name is not recognised.
    #[error("unknown target scope `{0}`")]
    UnknownScope(String),
    /// A stage layout is malformed.
    #[error("stage {stage_type} layout is invalid: {reason}")]
    InvalidLayout {
        /// Stage type owning the layout.
        stage_type: u32,
        /// Description of the defect.
        reason: String,
    },
}

/// Stage entry carried by the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageEntry {
    /// Display name of the stage.
    pub name: String,
    /// Stage parameters consumed by the world.
    pub config: StageConfig,
}

/// Fully validated static definitions.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    units: UnitCatalog,
    unit_names: BTreeMap<UnitId, String>,
    synergies: SynergyTable,
    layouts: StageLayouts,
    stages: BTreeMap<StageType, StageEntry>,
}

impl Catalog {
    /// Parses the embedded catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Reads and parses the catalog stored at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            units = catalog.unit_names.len(),
            synergies = catalog.synergies.len(),
            stages = catalog.stages.len(),
            "catalog.loaded=file"
        );
        Ok(catalog)
    }

    /// Parses a catalog from TOML source.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(contents)?;
        if raw.version != SUPPORTED_CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion { found: raw.version });
        }

        let mut catalog = Self::default();

        for skill in raw.skills {
            let effects = effect_slots("skill", skill.id, &skill.effects)?;
            let profile = SkillProfile {
                skill: SkillId::new(skill.id),
                effects,
            };
            if catalog.units.insert_skill(profile).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "skill",
                    id: skill.id,
                });
            }
        }

        for unit in raw.units {
            let profile = UnitProfile {
                unit: UnitId::new(unit.id),
                category: parse_category(&unit.category)?,
                pattern: parse_pattern(&unit.pattern)?,
                skill: unit.skill.map(SkillId::new),
            };
            if catalog.units.insert_unit(profile).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "unit",
                    id: unit.id,
                });
            }
            let _ = catalog.unit_names.insert(profile.unit, unit.name);
        }

        let mut synergies: Vec<SynergyDefinition> = Vec::with_capacity(raw.synergies.len());
        for synergy in raw.synergies {
            if synergies
                .iter()
                .any(|existing| existing.id.get() == synergy.id)
            {
                return Err(CatalogError::Duplicate {
                    kind: "synergy",
                    id: synergy.id,
                });
            }
            if synergy.requires.len() > REQUIREMENT_SLOTS {
                return Err(CatalogError::TooManyRequirements {
                    id: synergy.id,
                    count: synergy.requires.len(),
                });
            }
            let requirements = synergy
                .requires
                .iter()
                .map(|name| parse_category(name))
                .collect::<Result<Vec<_>, _>>()?;
            synergies.push(SynergyDefinition {
                id: SynergyId::new(synergy.id),
                name: synergy.name,
                requirements,
                scope: parse_scope(&synergy.scope)?,
                payload: effect_slots("synergy", synergy.id, &synergy.effects)?,
            });
        }
        catalog.synergies = SynergyTable::new(synergies);

        for stage in raw.stages {
            let stage_type = StageType::new(stage.stage_type);
            let mask = layout::parse_mask(&stage.layout).map_err(|reason| {
                CatalogError::InvalidLayout {
                    stage_type: stage.stage_type,
                    reason,
                }
            })?;
            let mut config = StageConfig::new(stage_type, stage.member_count);
            if let Some(max_deploy) = stage.max_deploy {
                config = config.with_max_deploy(max_deploy);
            }
            let entry = StageEntry {
                name: stage.name,
                config,
            };
            if catalog.stages.insert(stage_type, entry).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "stage",
                    id: stage.stage_type,
                });
            }
            let _ = catalog.layouts.insert(stage_type, mask);
        }

        Ok(catalog)
    }

    /// Unit and skill profiles.
    #[must_use]
    pub fn units(&self) -> &UnitCatalog {
        &self.units
    }

    /// Display name of a unit, if the catalog names it.
    #[must_use]
    pub fn unit_name(&self, unit: UnitId) -> Option<&str> {
        self.unit_names.get(&unit).map(String::as_str)
    }

    /// Ordered synergy definitions.
    #[must_use]
    pub fn synergies(&self) -> &SynergyTable {
        &self.synergies
    }

    /// Per-stage tile layouts.
    #[must_use]
    pub fn layouts(&self) -> &StageLayouts {
        &self.layouts
    }

    /// Stage entry registered for `stage_type`.
    #[must_use]
    pub fn stage(&self, stage_type: StageType) -> Option<&StageEntry> {
        self.stages.get(&stage_type)
    }

    /// Iterates stage entries in stage type order.
    pub fn stages(&self) -> impl Iterator<Item = &StageEntry> {
        self.stages.values()
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    version: u32,
    #[serde(default)]
    skills: Vec<RawSkill>,
    #[serde(default)]
    units: Vec<RawUnit>,
    #[serde(default)]
    synergies: Vec<RawSynergy>,
    #[serde(default)]
    stages: Vec<RawStage>,
}

#[derive(Debug, Deserialize)]
struct RawEffect {
    effect: u32,
    magnitude: i32,
}

#[derive(Debug, Deserialize)]
struct RawSkill {
    id: u32,
    #[serde(default)]
    effects: Vec<RawEffect>,
}

#[derive(Debug, Deserialize)]
struct RawUnit {
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default = "none_name")]
    category: String,
    #[serde(default = "none_name")]
    pattern: String,
    skill: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSynergy {
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default = "none_name")]
    scope: String,
    #[serde(default)]
    effects: Vec<RawEffect>,
}

#[derive(Debug, Deserialize)]
struct RawStage {
    stage_type: u32,
    #[serde(default)]
    name: String,
    member_count: u32,
    max_deploy: Option<u32>,
    layout: Vec<String>,
}

fn none_name() -> String {
    "None".to_owned()
}

fn effect_slots(kind: &'static str, id: u32, effects: &[RawEffect]) -> Result<EffectSlots, CatalogError> {
    let slots: Vec<EffectSlot> = effects
        .iter()
        .map(|raw| EffectSlot::new(EffectId::new(raw.effect), raw.magnitude))
        .collect();
    EffectSlots::from_effects(&slots).ok_or(CatalogError::TooManyEffects {
        kind,
        id,
        count: effects.len(),
    })
}

fn parse_category(name: &str) -> Result<CategoryType, CatalogError> {
    match name {
        "None" => Ok(CategoryType::None),
        "Vocal" => Ok(CategoryType::Vocal),
        "Rap" => Ok(CategoryType::Rap),
        "Dance" => Ok(CategoryType::Dance),
        "Visual" => Ok(CategoryType::Visual),
        "Leader" => Ok(CategoryType::Leader),
        _ => Err(CatalogError::UnknownCategory(name.to_owned())),
    }
}

fn parse_pattern(name: &str) -> Result<PatternCategory, CatalogError> {
    match name {
        "None" => Ok(PatternCategory::None),
        "Type1" => Ok(PatternCategory::Type1),
        "Type2" => Ok(PatternCategory::Type2),
        "Type3" => Ok(PatternCategory::Type3),
        "Type4" => Ok(PatternCategory::Type4),
        "Type5" => Ok(PatternCategory::Type5),
        "Type6" => Ok(PatternCategory::Type6),
        "Type7" => Ok(PatternCategory::Type7),
        "Type8" => Ok(PatternCategory::Type8),
        _ => Err(CatalogError::UnknownPattern(name.to_owned())),
    }
}

fn parse_scope(name: &str) -> Result<TargetScope, CatalogError> {
    match name {
        "None" => Ok(TargetScope::None),
        "AlliesAll" => Ok(TargetScope::AlliesAll),
        "GlobalOrOther" => Ok(TargetScope::GlobalOrOther),
        _ => Err(CatalogError::UnknownScope(name.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        assert_eq!(catalog.unit_name(UnitId::new(1001)), Some("Aria"));
        assert_eq!(catalog.synergies().len(), 4);
        assert_eq!(catalog.layouts().len(), 3);
    }

    #[test]
    fn rejects_unknown_version() {
        let error = Catalog::from_toml_str("version = 2").expect_err("version rejected");
        assert!(matches!(error, CatalogError::UnsupportedVersion { found: 2 }));
    }

    #[test]
    fn rejects_unknown_category_names() {
        let source = r#"
            version = 1

            [[units]]
            id = 1
            category = "Drummer"
        "#;
        let error = Catalog::from_toml_str(source).expect_err("category rejected");
        assert!(matches!(error, CatalogError::UnknownCategory(name) if name == "Drummer"));
    }

    #[test]
    fn rejects_four_effects() {
        let source = r#"
            version = 1

            [[skills]]
            id = 9
            effects = [
                { effect = 1, magnitude = 1 },
                { effect = 2, magnitude = 1 },
                { effect = 3, magnitude = 1 },
                { effect = 4, magnitude = 1 },
            ]
        "#;
        let error = Catalog::from_toml_str(source).expect_err("effects rejected");
        assert!(matches!(
            error,
            CatalogError::TooManyEffects {
                kind: "skill",
                id: 9,
                count: 4
            }
        ));
    }
}
