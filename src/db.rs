//! Catalog database schema and operations

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row};

use crate::catalog::CatalogIndex;
use crate::error::Result;
use crate::models::{CatalogRecord, Ingredient, MaterialKind, MaterialRef, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Items, cargo and buildings share one table keyed by (kind, id)
        CREATE TABLE IF NOT EXISTS materials (
            kind TEXT NOT NULL,
            id INTEGER NOT NULL,
            name TEXT NOT NULL,
            tier INTEGER,
            tag TEXT,
            default_recipe INTEGER,
            PRIMARY KEY (kind, id)
        );

        -- Crafting and construction recipes
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY,
            output_kind TEXT NOT NULL,
            output_id INTEGER NOT NULL,
            output_quantity INTEGER NOT NULL,
            profession TEXT,
            station_tier INTEGER,
            expandable INTEGER NOT NULL DEFAULT 1
        );

        -- Ordered ingredient lists
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            recipe_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            kind TEXT NOT NULL,
            material_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipes_output ON recipes(output_kind, output_id);
        "#,
    )?;
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_ingredients;
        DELETE FROM recipes;
        DELETE FROM materials;
        "#,
    )?;
    Ok(())
}

/// Insert or replace a catalog record
pub fn upsert_record(conn: &Connection, record: &CatalogRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO materials (kind, id, name, tier, tag, default_recipe)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            record.reference.kind.as_str(),
            record.reference.id,
            &record.name,
            record.tier,
            &record.tag,
            record.default_recipe,
        ),
    )?;
    Ok(())
}

/// Insert or replace a recipe together with its ingredients
pub fn insert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (id, output_kind, output_id, output_quantity, profession, station_tier, expandable)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            recipe.id,
            recipe.output.kind.as_str(),
            recipe.output.id,
            recipe.output_quantity,
            &recipe.profession,
            recipe.station_tier,
            recipe.expandable,
        ),
    )?;

    conn.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", [recipe.id])?;
    for (position, ingredient) in recipe.ingredients.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, position, kind, material_id, quantity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                recipe.id,
                position as i64,
                ingredient.material.kind.as_str(),
                ingredient.material.id,
                ingredient.quantity,
            ),
        )?;
    }
    Ok(())
}

fn parse_kind(idx: usize, value: String) -> rusqlite::Result<MaterialKind> {
    value.parse::<MaterialKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogRecord> {
    Ok(CatalogRecord {
        reference: MaterialRef::new(parse_kind(0, row.get(0)?)?, row.get(1)?),
        name: row.get(2)?,
        tier: row.get(3)?,
        tag: row.get(4)?,
        default_recipe: row.get(5)?,
    })
}

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        output: MaterialRef::new(parse_kind(1, row.get(1)?)?, row.get(2)?),
        output_quantity: row.get(3)?,
        ingredients: Vec::new(),
        profession: row.get(4)?,
        station_tier: row.get(5)?,
        expandable: row.get(6)?,
    })
}

fn get_ingredients(conn: &Connection, recipe_id: u32) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(
        "SELECT kind, material_id, quantity
         FROM recipe_ingredients
         WHERE recipe_id = ?1
         ORDER BY position",
    )?;

    let rows = stmt.query_map([recipe_id], |row| {
        Ok(Ingredient {
            material: MaterialRef::new(parse_kind(0, row.get(0)?)?, row.get(1)?),
            quantity: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Get one catalog record
pub fn get_record(conn: &Connection, reference: MaterialRef) -> Result<Option<CatalogRecord>> {
    let record = conn
        .query_row(
            "SELECT kind, id, name, tier, tag, default_recipe FROM materials WHERE kind = ?1 AND id = ?2",
            (reference.kind.as_str(), reference.id),
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

/// List catalog records, optionally restricted to one kind
pub fn list_records(conn: &Connection, kind: Option<MaterialKind>) -> Result<Vec<CatalogRecord>> {
    let mut stmt = conn.prepare(
        "SELECT kind, id, name, tier, tag, default_recipe
         FROM materials
         WHERE ?1 IS NULL OR kind = ?1
         ORDER BY kind, tier, name",
    )?;

    let rows = stmt.query_map([kind.map(|k| k.as_str())], record_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Get every recipe that produces a material
pub fn get_recipes_for(conn: &Connection, reference: MaterialRef) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT id, output_kind, output_id, output_quantity, profession, station_tier, expandable
         FROM recipes
         WHERE output_kind = ?1 AND output_id = ?2
         ORDER BY id",
    )?;

    let rows = stmt.query_map((reference.kind.as_str(), reference.id), recipe_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        let mut recipe = row?;
        recipe.ingredients = get_ingredients(conn, recipe.id)?;
        results.push(recipe);
    }
    Ok(results)
}

/// Load the whole catalog into memory for planning
pub fn load_catalog(conn: &Connection) -> Result<CatalogIndex> {
    let mut catalog = CatalogIndex::new();

    for record in list_records(conn, None)? {
        catalog.insert_record(record);
    }

    let mut stmt = conn.prepare(
        "SELECT id, output_kind, output_id, output_quantity, profession, station_tier, expandable
         FROM recipes",
    )?;
    let mut recipes = Vec::new();
    for row in stmt.query_map([], recipe_from_row)? {
        recipes.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT recipe_id, kind, material_id, quantity
         FROM recipe_ingredients
         ORDER BY recipe_id, position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            Ingredient {
                material: MaterialRef::new(parse_kind(1, row.get(1)?)?, row.get(2)?),
                quantity: row.get(3)?,
            },
        ))
    })?;
    let mut ingredients: HashMap<u32, Vec<Ingredient>> = HashMap::new();
    for row in rows {
        let (recipe_id, ingredient) = row?;
        ingredients.entry(recipe_id).or_default().push(ingredient);
    }

    for mut recipe in recipes {
        recipe.ingredients = ingredients.remove(&recipe.id).unwrap_or_default();
        catalog.insert_recipe(recipe);
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn store(conn: &Connection, catalog: &CatalogIndex) {
        for record in catalog.records() {
            upsert_record(conn, record).unwrap();
        }
        for recipe in catalog.recipes() {
            insert_recipe(conn, recipe).unwrap();
        }
    }

    #[test]
    fn test_catalog_survives_the_database() {
        let original = workshop();
        let conn = open();
        store(&conn, &original);

        let loaded = load_catalog(&conn).unwrap();
        assert_eq!(loaded.len(), original.len());
        assert_eq!(loaded.lookup(SHED).unwrap(), original.lookup(SHED).unwrap());
        assert_eq!(loaded.recipe(102), original.recipe(102));
        assert_eq!(loaded.default_recipe(PLANK).map(|r| r.id), Some(100));
    }

    #[test]
    fn test_list_records_by_kind() {
        let conn = open();
        store(&conn, &workshop());

        let items = list_records(&conn, Some(MaterialKind::Item)).unwrap();
        assert_eq!(items.len(), 4);
        let all = list_records(&conn, None).unwrap();
        assert_eq!(all.len(), 6);
        let cargo = list_records(&conn, Some(MaterialKind::Cargo)).unwrap();
        assert_eq!(cargo[0].name, "Crate");
    }

    #[test]
    fn test_get_recipes_for_keeps_ingredient_order() {
        let conn = open();
        store(&conn, &workshop());

        let recipes = get_recipes_for(&conn, CRATE).unwrap();
        assert_eq!(recipes.len(), 1);
        let materials: Vec<_> = recipes[0].ingredients.iter().map(|i| i.material).collect();
        assert_eq!(materials, vec![PLANK, NAILS]);
        assert!(get_recipes_for(&conn, WOOD).unwrap().is_empty());
    }

    #[test]
    fn test_get_record_and_clear() {
        let conn = open();
        store(&conn, &workshop());
        assert_eq!(get_record(&conn, WOOD).unwrap().map(|r| r.name), Some("Wood".to_string()));

        clear_catalog(&conn).unwrap();
        assert!(get_record(&conn, WOOD).unwrap().is_none());
        assert!(load_catalog(&conn).unwrap().is_empty());
    }
}
