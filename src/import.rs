//! Game-data import
//!
//! Walks a directory of JSON descriptor dumps and writes the items, cargo,
//! buildings and recipes they describe into the catalog database. Each file may
//! hold any subset of the four descriptor arrays.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::error::Result;
use crate::models::{CatalogRecord, Ingredient, MaterialKind, MaterialRef, Recipe};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DescriptorFile {
    items: Vec<MaterialDesc>,
    cargo: Vec<MaterialDesc>,
    buildings: Vec<MaterialDesc>,
    recipes: Vec<RecipeDesc>,
}

#[derive(Debug, Deserialize)]
struct MaterialDesc {
    id: u32,
    name: String,
    /// The game uses -1 for "no tier"
    #[serde(default)]
    tier: Option<i64>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    default_recipe: Option<u32>,
}

impl MaterialDesc {
    fn into_record(self, kind: MaterialKind) -> CatalogRecord {
        CatalogRecord {
            reference: MaterialRef::new(kind, self.id),
            name: self.name,
            tier: self.tier.filter(|t| *t > 0).and_then(|t| u32::try_from(t).ok()),
            tag: self.tag,
            default_recipe: self.default_recipe,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IngredientDesc {
    material: MaterialRef,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct RecipeDesc {
    id: u32,
    output: MaterialRef,
    #[serde(default = "default_output_quantity")]
    output_quantity: u32,
    #[serde(default)]
    ingredients: Vec<IngredientDesc>,
    #[serde(default)]
    profession: Option<String>,
    #[serde(default)]
    station_tier: Option<u32>,
    #[serde(default = "default_true")]
    expandable: bool,
}

fn default_output_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl From<RecipeDesc> for Recipe {
    fn from(desc: RecipeDesc) -> Self {
        Recipe {
            id: desc.id,
            output: desc.output,
            output_quantity: desc.output_quantity,
            ingredients: desc
                .ingredients
                .into_iter()
                .map(|i| Ingredient {
                    material: i.material,
                    quantity: i.quantity,
                })
                .collect(),
            profession: desc.profession,
            station_tier: desc.station_tier,
            expandable: desc.expandable,
        }
    }
}

/// Statistics from an import run
#[derive(Debug, Default)]
pub struct ImportStats {
    pub files_found: usize,
    pub files_skipped: usize,
    pub items: usize,
    pub cargo: usize,
    pub buildings: usize,
    pub recipes: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Import Statistics ===")?;
        writeln!(f, "Descriptor files found: {}", self.files_found)?;
        writeln!(f, "Files skipped:          {}", self.files_skipped)?;
        writeln!(f, "Items:                  {}", self.items)?;
        writeln!(f, "Cargo:                  {}", self.cargo)?;
        writeln!(f, "Buildings:              {}", self.buildings)?;
        writeln!(f, "Recipes:                {}", self.recipes)?;
        Ok(())
    }
}

/// Find all JSON descriptor files under a directory
pub fn find_descriptor_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn parse_descriptor_file(path: &Path) -> Result<DescriptorFile> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Import every descriptor file under `dir` into the catalog database
pub fn import_directory(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let files = find_descriptor_files(dir);
    info!("Found {} descriptor files in {}", files.len(), dir.display());

    let mut stats = ImportStats {
        files_found: files.len(),
        ..ImportStats::default()
    };

    let tx = conn.unchecked_transaction()?;
    for path in &files {
        let descriptors = match parse_descriptor_file(path) {
            Ok(d) => d,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                stats.files_skipped += 1;
                continue;
            }
        };
        debug!("Importing {}", path.display());

        for desc in descriptors.items {
            db::upsert_record(&tx, &desc.into_record(MaterialKind::Item))?;
            stats.items += 1;
        }
        for desc in descriptors.cargo {
            db::upsert_record(&tx, &desc.into_record(MaterialKind::Cargo))?;
            stats.cargo += 1;
        }
        for desc in descriptors.buildings {
            db::upsert_record(&tx, &desc.into_record(MaterialKind::Building))?;
            stats.buildings += 1;
        }
        for desc in descriptors.recipes {
            db::insert_recipe(&tx, &Recipe::from(desc))?;
            stats.recipes += 1;
        }
    }
    tx.commit()?;

    Ok(stats)
}
