//! Display groupings over a reconciled requirement map

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{MaterialRef, MaterialRequirement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementGroup<'a, K> {
    pub key: K,
    pub materials: Vec<&'a MaterialRequirement>,
    pub total_required: u64,
    /// Owned quantity, each material clamped to its requirement
    pub total_available: u64,
    pub is_complete: bool,
}

impl<'a, K> RequirementGroup<'a, K> {
    fn new(key: K, mut materials: Vec<&'a MaterialRequirement>) -> Self {
        materials.sort_by(|a, b| display_order(a, b));
        let total_required = materials.iter().fold(0u64, |t, m| t.saturating_add(m.base_required));
        let total_available = materials.iter().fold(0u64, |t, m| t.saturating_add(m.available()));
        let is_complete = materials.iter().all(|m| m.is_complete);
        Self {
            key,
            materials,
            total_required,
            total_available,
            is_complete,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.materials.iter().fold(0u64, |t, m| t.saturating_add(m.remaining))
    }
}

/// Tier ascending with untiered last, then name, then reference
fn display_order(a: &MaterialRequirement, b: &MaterialRequirement) -> Ordering {
    option_last(&a.tier, &b.tier)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.material.cmp(&b.material))
}

fn option_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn group_by<'a, K, F>(
    requirements: &'a BTreeMap<MaterialRef, MaterialRequirement>,
    key_of: F,
) -> Vec<RequirementGroup<'a, K>>
where
    K: Ord,
    F: Fn(&MaterialRequirement) -> K,
{
    let mut buckets: BTreeMap<K, Vec<&MaterialRequirement>> = BTreeMap::new();
    for requirement in requirements.values() {
        buckets.entry(key_of(requirement)).or_default().push(requirement);
    }
    buckets
        .into_iter()
        .map(|(key, materials)| RequirementGroup::new(key, materials))
        .collect()
}

pub fn by_tier(
    requirements: &BTreeMap<MaterialRef, MaterialRequirement>,
) -> Vec<RequirementGroup<'_, Option<u32>>> {
    let mut groups = group_by(requirements, |r| r.tier);
    groups.sort_by(|a, b| option_last(&a.key, &b.key));
    groups
}

pub fn by_step(
    requirements: &BTreeMap<MaterialRef, MaterialRequirement>,
) -> Vec<RequirementGroup<'_, u32>> {
    group_by(requirements, |r| r.step)
}

pub fn by_profession(
    requirements: &BTreeMap<MaterialRef, MaterialRequirement>,
) -> Vec<RequirementGroup<'_, Option<String>>> {
    let mut groups = group_by(requirements, |r| r.profession.clone());
    groups.sort_by(|a, b| option_last(&a.key, &b.key));
    groups
}

pub fn by_step_then_profession(
    requirements: &BTreeMap<MaterialRef, MaterialRequirement>,
) -> Vec<RequirementGroup<'_, (u32, Option<String>)>> {
    let mut groups = group_by(requirements, |r| (r.step, r.profession.clone()));
    groups.sort_by(|a, b| a.key.0.cmp(&b.key.0).then_with(|| option_last(&a.key.1, &b.key.1)));
    groups
}
