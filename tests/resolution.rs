//! End-to-end properties of a resolution pass

use craft_planner::models::{CatalogRecord, Ingredient, LeafFlag, Recipe};
use craft_planner::{
    CatalogIndex, InventorySnapshot, MaterialRef, PlannerOptions, Resolution, RootEntry, resolve,
};

const WOOD: MaterialRef = MaterialRef::item(1);
const PLANK: MaterialRef = MaterialRef::item(2);
const NAILS: MaterialRef = MaterialRef::item(3);
const ORE: MaterialRef = MaterialRef::item(4);
const INGOT: MaterialRef = MaterialRef::item(5);
const FRAME: MaterialRef = MaterialRef::cargo(1);
const HALL: MaterialRef = MaterialRef::building(1);

fn record(reference: MaterialRef, name: &str, tier: Option<u32>) -> CatalogRecord {
    CatalogRecord {
        reference,
        name: name.to_string(),
        tier,
        tag: None,
        default_recipe: None,
    }
}

fn recipe(id: u32, output: MaterialRef, output_quantity: u32, ingredients: &[(MaterialRef, u32)]) -> Recipe {
    Recipe {
        id,
        output,
        output_quantity,
        ingredients: ingredients
            .iter()
            .map(|&(material, quantity)| Ingredient { material, quantity })
            .collect(),
        profession: None,
        station_tier: None,
        expandable: true,
    }
}

fn catalog() -> CatalogIndex {
    let mut catalog = CatalogIndex::new();
    catalog.insert_record(record(WOOD, "Wood", Some(1)));
    catalog.insert_record(record(PLANK, "Plank", Some(1)));
    catalog.insert_record(record(NAILS, "Nails", Some(2)));
    catalog.insert_record(record(ORE, "Ore", Some(1)));
    catalog.insert_record(record(INGOT, "Ingot", Some(2)));
    catalog.insert_record(record(FRAME, "Frame", Some(2)));
    catalog.insert_record(record(HALL, "Hall", None));

    catalog.insert_recipe(recipe(1, PLANK, 2, &[(WOOD, 1)]));
    catalog.insert_recipe(recipe(2, INGOT, 3, &[(ORE, 2)]));
    catalog.insert_recipe(recipe(3, NAILS, 5, &[(INGOT, 1)]));
    catalog.insert_recipe(recipe(4, FRAME, 1, &[(PLANK, 4), (NAILS, 6)]));
    catalog.insert_recipe(recipe(5, HALL, 1, &[(FRAME, 3), (PLANK, 10), (NAILS, 12)]));
    catalog
}

fn run(entries: &[RootEntry], inventory: &InventorySnapshot) -> Resolution {
    resolve(&catalog(), entries, inventory, PlannerOptions::default())
}

fn big_list() -> Vec<RootEntry> {
    vec![
        RootEntry::new(1, HALL, 2),
        RootEntry::new(2, FRAME, 5),
        RootEntry::new(3, NAILS, 13),
        RootEntry::new(4, PLANK, 7),
    ]
}

#[test]
fn contributions_sum_to_base_required() {
    let resolution = run(&big_list(), &InventorySnapshot::new().with_quantity(PLANK, 9));
    for r in resolution.requirements.values() {
        let total: u64 = r.root_contributions.iter().map(|c| c.contribution).sum();
        assert_eq!(total, r.base_required, "{}", r.name);
    }
}

#[test]
fn resolution_is_idempotent() {
    let inventory = InventorySnapshot::new()
        .with_quantity(FRAME, 2)
        .with_quantity(ORE, 11)
        .with_checked_off(WOOD);
    let first = run(&big_list(), &inventory);
    let second = run(&big_list(), &inventory);
    assert_eq!(first, second);
}

#[test]
fn raising_a_quantity_never_lowers_requirements() {
    let before = run(&big_list(), &InventorySnapshot::new());

    let mut entries = big_list();
    entries[1].quantity += 4;
    let after = run(&entries, &InventorySnapshot::new());

    for (material, r) in &before.requirements {
        assert!(after.requirements[material].base_required >= r.base_required, "{}", r.name);
    }
}

#[test]
fn remaining_is_bounded_and_matches_completion() {
    let inventory = InventorySnapshot::new()
        .with_quantity(HALL, 1)
        .with_quantity(FRAME, 4)
        .with_quantity(PLANK, 30)
        .with_quantity(NAILS, 7)
        .with_quantity(INGOT, 2)
        .with_quantity(WOOD, 12)
        .with_override(ORE, 3);
    let resolution = run(&big_list(), &inventory);

    for r in resolution.requirements.values() {
        assert!(r.remaining <= r.base_required, "{}", r.name);
        assert_eq!(r.remaining == 0, r.is_complete, "{}", r.name);
    }
}

#[test]
fn partial_crafts_round_up() {
    // 7 ingots at 3 per craft: 3 crafts, 2 ore each
    let resolution = run(&[RootEntry::new(1, INGOT, 7)], &InventorySnapshot::new());
    assert_eq!(resolution.get(ORE).unwrap().base_required, 6);
}

#[test]
fn circular_recipes_terminate() {
    let mut catalog = catalog();
    catalog.insert_recipe(recipe(6, WOOD, 1, &[(PLANK, 1)]));

    let resolution = resolve(
        &catalog,
        &[RootEntry::new(1, PLANK, 4)],
        &InventorySnapshot::new(),
        PlannerOptions::default(),
    );
    assert_eq!(resolution.truncated_branches, 1);
    let plank = resolution.get(PLANK).unwrap();
    assert!(plank.flags.contains(&LeafFlag::Cycle));
    // 4 at the root plus the truncated occurrence under wood
    assert_eq!(plank.base_required, 6);
}

#[test]
fn checked_off_material_is_complete() {
    let inventory = InventorySnapshot::new().with_checked_off(ORE);
    let resolution = run(&[RootEntry::new(1, NAILS, 50)], &inventory);
    let ore = resolution.get(ORE).unwrap();
    assert_eq!(ore.have, 0);
    assert!(ore.base_required > 0);
    assert_eq!(ore.remaining, 0);
    assert!(ore.is_complete);
}

#[test]
fn plank_scenario() {
    let resolution = run(&[RootEntry::new(1, PLANK, 10)], &InventorySnapshot::new());
    let wood = resolution.get(WOOD).unwrap();
    assert_eq!(wood.base_required, 5);
    assert_eq!(wood.step, 1);
    assert_eq!(resolution.get(PLANK).unwrap().step, 2);

    // plank requested directly with no recipe of its own is a step-1 leaf
    let mut bare = CatalogIndex::new();
    bare.insert_record(record(PLANK, "Plank", Some(1)));
    let resolution = resolve(
        &bare,
        &[RootEntry::new(1, PLANK, 10)],
        &InventorySnapshot::new(),
        PlannerOptions::default(),
    );
    assert_eq!(resolution.get(PLANK).unwrap().step, 1);
}

#[test]
fn nails_from_two_entries() {
    let entries = [RootEntry::new(1, NAILS, 5), RootEntry::new(2, NAILS, 8)];
    let resolution = run(&entries, &InventorySnapshot::new());
    let nails = resolution.get(NAILS).unwrap();

    assert_eq!(nails.base_required, 13);
    let contributions: Vec<_> = nails
        .root_contributions
        .iter()
        .map(|c| (c.root_id, c.contribution))
        .collect();
    assert_eq!(contributions, vec![(1, 5), (2, 8)]);
}

#[test]
fn owned_planks_cover_wood() {
    let inventory = InventorySnapshot::new().with_quantity(PLANK, 4);
    let resolution = run(&[RootEntry::new(1, PLANK, 20)], &inventory);
    let wood = resolution.get(WOOD).unwrap();

    assert_eq!(wood.base_required, 10);
    assert_eq!(wood.remaining, 8);
    assert_eq!(wood.coverage(), 2);
    assert_eq!(wood.parent_contributions[0].parent, PLANK);
}

#[test]
fn bad_reference_does_not_block_the_list() {
    let entries = [
        RootEntry::new(1, MaterialRef::item(9999), 3),
        RootEntry::new(2, FRAME, 1),
    ];
    let resolution = run(&entries, &InventorySnapshot::new());
    assert_eq!(resolution.trees_expanded, 2);
    assert!(resolution.get(MaterialRef::item(9999)).unwrap().flags.contains(&LeafFlag::Unresolved));
    assert_eq!(resolution.get(WOOD).unwrap().base_required, 2);
}

#[test]
fn owned_planks_cover_wood_across_odd_entries() {
    let entries = [RootEntry::new(1, PLANK, 3), RootEntry::new(2, PLANK, 3)];
    let inventory = InventorySnapshot::new().with_quantity(PLANK, 6);
    let resolution = run(&entries, &inventory);

    let plank = resolution.get(PLANK).unwrap();
    assert_eq!(plank.base_required, 6);
    assert_eq!(plank.remaining, 0);

    let wood = resolution.get(WOOD).unwrap();
    assert_eq!(wood.base_required, 4);
    assert_eq!(wood.coverage(), 4);
    assert_eq!(wood.remaining, 0);
    assert!(resolution.is_complete());
}

#[test]
fn huge_quantities_degrade_instead_of_panicking() {
    let mut catalog = CatalogIndex::new();
    for id in 0..5 {
        catalog.insert_record(record(MaterialRef::item(id), &format!("Stage {}", id), Some(1)));
        if id < 4 {
            catalog.insert_recipe(recipe(id, MaterialRef::item(id), 1, &[(MaterialRef::item(id + 1), u32::MAX)]));
        }
    }

    let entries = [
        RootEntry::new(1, MaterialRef::item(0), 1),
        RootEntry::new(2, MaterialRef::item(0), 1),
    ];
    let inventory = InventorySnapshot::new().with_quantity(MaterialRef::item(2), u64::MAX);
    let resolution = resolve(&catalog, &entries, &inventory, PlannerOptions::default());

    assert_eq!(resolution.truncated_branches, 2);
    let stage2 = resolution.get(MaterialRef::item(2)).unwrap();
    assert!(stage2.flags.contains(&LeafFlag::Overflow));
    assert_eq!(stage2.base_required, u64::MAX);
    assert_eq!(stage2.remaining, 0);
    assert!(resolution.get(MaterialRef::item(3)).is_none());

    for r in resolution.requirements.values() {
        assert!(r.remaining <= r.base_required, "{}", r.name);
    }
}
