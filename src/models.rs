//! Data models for catalog records, recipes and planning requests

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// What sort of thing a material reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Item,
    Cargo,
    Building,
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Item => "item",
            MaterialKind::Cargo => "cargo",
            MaterialKind::Building => "building",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "item" => Ok(MaterialKind::Item),
            "cargo" => Ok(MaterialKind::Cargo),
            "building" => Ok(MaterialKind::Building),
            other => Err(PlannerError::InvalidReference(format!("unknown kind '{}'", other))),
        }
    }
}

/// Key used for every material lookup in the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialRef {
    pub kind: MaterialKind,
    pub id: u32,
}

impl MaterialRef {
    pub const fn new(kind: MaterialKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub const fn item(id: u32) -> Self {
        Self::new(MaterialKind::Item, id)
    }

    pub const fn cargo(id: u32) -> Self {
        Self::new(MaterialKind::Cargo, id)
    }

    pub const fn building(id: u32) -> Self {
        Self::new(MaterialKind::Building, id)
    }
}

impl fmt::Display for MaterialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for MaterialRef {
    type Err = PlannerError;

    /// Parses `kind:id`, e.g. `item:1001`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| PlannerError::InvalidReference(format!("expected kind:id, got '{}'", s)))?;
        let id = id
            .parse::<u32>()
            .map_err(|_| PlannerError::InvalidReference(format!("bad id in '{}'", s)))?;
        Ok(Self::new(kind.parse()?, id))
    }
}

impl Serialize for MaterialRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MaterialRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An item, cargo or building as described by the game catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub reference: MaterialRef,
    pub name: String,
    pub tier: Option<u32>, // None = no tier
    pub tag: Option<String>,
    pub default_recipe: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingredient {
    pub material: MaterialRef,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: u32,
    pub output: MaterialRef,
    pub output_quantity: u32,
    pub ingredients: Vec<Ingredient>,
    pub profession: Option<String>,
    pub station_tier: Option<u32>,
    /// Gathering "recipes" are listed in the catalog but never expanded
    pub expandable: bool,
}

/// One line of a crafting list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    pub id: u32,
    pub material: MaterialRef,
    pub quantity: u64,
    pub recipe: Option<u32>,
    pub label: Option<String>,
}

impl RootEntry {
    pub fn new(id: u32, material: MaterialRef, quantity: u64) -> Self {
        Self {
            id,
            material,
            quantity,
            recipe: None,
            label: None,
        }
    }

    pub fn with_recipe(mut self, recipe: u32) -> Self {
        self.recipe = Some(recipe);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Why a branch stopped expanding before reaching a real raw material
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeafFlag {
    /// Reference is not in the catalog
    Unresolved,
    /// Material appeared again in its own ancestor chain
    Cycle,
    /// Recursion hit the maximum depth
    DepthLimit,
    /// Recipe produces nothing
    InvalidRecipe,
    /// Ingredient quantities no longer fit in a u64
    Overflow,
}

impl fmt::Display for LeafFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeafFlag::Unresolved => "unresolved",
            LeafFlag::Cycle => "cycle",
            LeafFlag::DepthLimit => "depth-limit",
            LeafFlag::InvalidRecipe => "invalid-recipe",
            LeafFlag::Overflow => "overflow",
        };
        f.write_str(s)
    }
}

/// Attribution of a merged requirement back to a list entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootContribution {
    pub root_id: u32,
    pub name: String,
    pub requested_quantity: u64,
    pub contribution: u64,
}

/// Amount of a requirement explained away by an owned parent product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentContribution {
    pub parent: MaterialRef,
    pub parent_name: String,
    pub parent_quantity_used: u64,
    pub coverage: u64,
}

/// Final, inventory-reconciled requirement for one material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRequirement {
    pub material: MaterialRef,
    pub name: String,
    pub tier: Option<u32>,
    pub step: u32,
    pub profession: Option<String>,
    pub base_required: u64,
    pub have: u64,
    pub remaining: u64,
    pub is_complete: bool,
    pub parent_contributions: Vec<ParentContribution>,
    pub root_contributions: Vec<RootContribution>,
    pub flags: Vec<LeafFlag>,
}

impl MaterialRequirement {
    /// Owned quantity that actually counts towards the requirement
    pub fn available(&self) -> u64 {
        self.have.min(self.base_required)
    }

    pub fn coverage(&self) -> u64 {
        self.parent_contributions.iter().map(|p| p.coverage).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_ref_round_trips_through_text() {
        let r: MaterialRef = "cargo:42".parse().unwrap();
        assert_eq!(r, MaterialRef::cargo(42));
        assert_eq!(r.to_string(), "cargo:42");
    }

    #[test]
    fn test_material_ref_rejects_garbage() {
        assert!("42".parse::<MaterialRef>().is_err());
        assert!("tool:1".parse::<MaterialRef>().is_err());
        assert!("item:abc".parse::<MaterialRef>().is_err());
    }

    #[test]
    fn test_refs_order_by_kind_then_id() {
        let mut refs = vec![MaterialRef::building(1), MaterialRef::item(9), MaterialRef::item(2)];
        refs.sort();
        assert_eq!(refs, vec![MaterialRef::item(2), MaterialRef::item(9), MaterialRef::building(1)]);
    }
}
