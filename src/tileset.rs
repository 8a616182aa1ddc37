//! Sprite and animation tables
//!
//! Data-driven lookup from tile kind to sprites. The raw JSON form
//! ([`TileSetConfig`]) is checked once by [`TileSet::from_config`]; after that
//! every solid kind has a sprite group, every directional tile a decoration,
//! and every animatable kind both animations, so per-frame lookups never fail.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::animation::{Animation, AnimationName, AnimationSource, FrameSequence};
use crate::sim::tile::{SpriteId, TileKind};

/// Bundled tileset used by the demo and tests
const BUILTIN_TILESET: &str = include_str!("../assets/tileset.json");

/// Body/edge/corner sprites for one solid kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidSprites {
    pub body: SpriteId,
    /// Drawn facing north at 0°
    pub edge: SpriteId,
    /// Convex corner, drawn facing north-east at 0°
    pub corner: SpriteId,
    /// Concave corner, drawn facing north-east at 0°
    pub inverse_corner: SpriteId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidEntry {
    pub kind: TileKind,
    #[serde(flatten)]
    pub sprites: SolidSprites,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecorationEntry {
    pub kind: TileKind,
    pub sprite: SpriteId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationEntry {
    pub kind: TileKind,
    pub default: FrameSequence,
    pub struck: FrameSequence,
}

/// Raw tileset as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileSetConfig {
    #[serde(default)]
    pub solids: Vec<SolidEntry>,
    #[serde(default)]
    pub decorations: Vec<DecorationEntry>,
    #[serde(default)]
    pub animations: Vec<AnimationEntry>,
}

/// Validated sprite tables
#[derive(Debug, Clone)]
pub struct TileSet {
    solids: HashMap<TileKind, SolidSprites>,
    decorations: HashMap<TileKind, SpriteId>,
    animations: HashMap<TileKind, (FrameSequence, FrameSequence)>,
}

impl TileSet {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_TILESET)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TileSetConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_config(config: TileSetConfig) -> Result<Self, ConfigError> {
        let mut solids = HashMap::new();
        for entry in config.solids {
            if !entry.kind.is_solid() {
                return Err(ConfigError::UnexpectedEntry {
                    kind: entry.kind,
                    table: "solids",
                });
            }
            if solids.insert(entry.kind, entry.sprites).is_some() {
                return Err(ConfigError::DuplicateEntry {
                    kind: entry.kind,
                    table: "solids",
                });
            }
        }

        let mut decorations = HashMap::new();
        for entry in config.decorations {
            if entry.kind.decoration_rotation().is_none() {
                return Err(ConfigError::UnexpectedEntry {
                    kind: entry.kind,
                    table: "decorations",
                });
            }
            if decorations.insert(entry.kind, entry.sprite).is_some() {
                return Err(ConfigError::DuplicateEntry {
                    kind: entry.kind,
                    table: "decorations",
                });
            }
        }

        let mut animations = HashMap::new();
        for entry in config.animations {
            if !entry.kind.is_animatable() {
                return Err(ConfigError::UnexpectedEntry {
                    kind: entry.kind,
                    table: "animations",
                });
            }
            for (name, seq) in [
                (AnimationName::Default, &entry.default),
                (AnimationName::Struck, &entry.struck),
            ] {
                if seq.frames.is_empty() || seq.ticks_per_frame == 0 {
                    return Err(ConfigError::EmptyAnimation {
                        kind: entry.kind,
                        animation: name.as_str(),
                    });
                }
            }
            if animations
                .insert(entry.kind, (entry.default, entry.struck))
                .is_some()
            {
                return Err(ConfigError::DuplicateEntry {
                    kind: entry.kind,
                    table: "animations",
                });
            }
        }

        for kind in TileKind::ALL {
            if kind.is_solid() && !solids.contains_key(&kind) {
                return Err(ConfigError::MissingSpriteGroup(kind));
            }
            if kind.decoration_rotation().is_some() && !decorations.contains_key(&kind) {
                return Err(ConfigError::MissingDecoration(kind));
            }
            if kind.is_animatable() && !animations.contains_key(&kind) {
                return Err(ConfigError::MissingAnimation {
                    kind,
                    animation: AnimationName::Default.as_str(),
                });
            }
        }

        log::info!(
            "Tileset ready: {} sprite groups, {} decorations, {} animated kinds",
            solids.len(),
            decorations.len(),
            animations.len()
        );
        Ok(Self {
            solids,
            decorations,
            animations,
        })
    }

    pub fn solid(&self, kind: TileKind) -> Option<&SolidSprites> {
        self.solids.get(&kind)
    }

    pub fn decoration(&self, kind: TileKind) -> Option<SpriteId> {
        self.decorations.get(&kind).copied()
    }

    /// Frame sequence template for a kind
    pub fn animation(&self, kind: TileKind, name: AnimationName) -> Option<&FrameSequence> {
        let (default, struck) = self.animations.get(&kind)?;
        Some(match name {
            AnimationName::Default => default,
            AnimationName::Struck => struck,
        })
    }
}

impl AnimationSource for TileSet {
    fn build(&self, kind: TileKind, name: AnimationName) -> Option<Box<dyn Animation>> {
        let mut seq = self.animation(kind, name)?.clone();
        seq.reset();
        Some(Box::new(seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SpikeDir;

    #[test]
    fn test_builtin_tileset_is_complete() {
        let tileset = TileSet::builtin().unwrap();
        for kind in TileKind::ALL {
            assert_eq!(tileset.solid(kind).is_some(), kind.is_solid(), "{kind:?}");
            assert_eq!(
                tileset.decoration(kind).is_some(),
                kind.decoration_rotation().is_some(),
                "{kind:?}"
            );
            assert_eq!(
                tileset.build(kind, AnimationName::Struck).is_some(),
                kind.is_animatable(),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn test_missing_sprite_group_fails_at_load() {
        let mut config: TileSetConfig = serde_json::from_str(BUILTIN_TILESET).unwrap();
        config.solids.retain(|entry| entry.kind != TileKind::Rock);
        assert!(matches!(
            TileSet::from_config(config),
            Err(ConfigError::MissingSpriteGroup(TileKind::Rock))
        ));
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let json = r#"{"solids":[{"kind":"Lava","body":1,"edge":2,"corner":3,"inverse_corner":4}]}"#;
        assert!(matches!(TileSet::from_json(json), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_entries_in_wrong_table_are_rejected() {
        let mut config: TileSetConfig = serde_json::from_str(BUILTIN_TILESET).unwrap();
        config.decorations.push(DecorationEntry {
            kind: TileKind::Brick,
            sprite: SpriteId(1),
        });
        assert!(matches!(
            TileSet::from_config(config),
            Err(ConfigError::UnexpectedEntry {
                kind: TileKind::Brick,
                table: "decorations"
            })
        ));
    }

    #[test]
    fn test_duplicate_and_empty_entries_are_rejected() {
        let mut config: TileSetConfig = serde_json::from_str(BUILTIN_TILESET).unwrap();
        let first = config.decorations[0].clone();
        config.decorations.push(first);
        assert!(matches!(
            TileSet::from_config(config),
            Err(ConfigError::DuplicateEntry { .. })
        ));

        let mut config: TileSetConfig = serde_json::from_str(BUILTIN_TILESET).unwrap();
        config.animations[0].struck.frames.clear();
        assert!(matches!(
            TileSet::from_config(config),
            Err(ConfigError::EmptyAnimation {
                animation: "struck",
                ..
            })
        ));
    }

    #[test]
    fn test_spike_decorations_parse_from_tagged_kind() {
        let tileset = TileSet::builtin().unwrap();
        assert!(tileset.decoration(TileKind::Spikes(SpikeDir::Left)).is_some());
    }
}
