//! Crafting Material Planner
//!
//! Command-line front end for the material requirements engine.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use tracing::info;

use craft_planner::config::PlannerConfig;
use craft_planner::models::{CatalogRecord, Ingredient, MaterialKind, MaterialRef, Recipe};
use craft_planner::plan_file::PlanFile;
use craft_planner::report::{self, RequirementTable};
use craft_planner::{Expander, db, grouping, import, resolve};

#[derive(Parser)]
#[command(name = "craft-planner")]
#[command(about = "Work out which materials a crafting list needs and what is still missing")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the SQLite catalog (overrides the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Tier,
    Step,
    Profession,
    StepProfession,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import game-data JSON descriptors from a directory
    Import {
        /// Directory holding descriptor files
        source_dir: PathBuf,

        /// Clear existing catalog before import
        #[arg(long)]
        clear: bool,
    },

    /// List catalog entries
    List {
        /// Restrict to one kind (item, cargo, building)
        kind: Option<String>,
    },

    /// Show a catalog entry and the recipes producing it
    Show {
        /// Material reference, e.g. item:1001
        material: String,
    },

    /// Print the production tree for one material
    Tree {
        /// Material reference, e.g. item:1001
        material: String,

        /// Quantity to produce
        #[arg(short, long, default_value = "1")]
        quantity: u64,

        /// Recipe to use instead of the default
        #[arg(short, long)]
        recipe: Option<u32>,
    },

    /// Resolve a plan file into material requirements
    Plan {
        /// TOML plan file
        plan: PathBuf,

        /// Group the output instead of listing it flat
        #[arg(short, long, value_enum)]
        group: Option<GroupBy>,

        /// Show parent coverage and list-entry breakdowns
        #[arg(long)]
        detailed: bool,
    },

    /// Check the catalog for broken recipes and cycles
    Validate,

    /// Load sample data for testing (without game-data dumps)
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if let Some(database) = cli.database {
        config.database = database;
    }

    let filter = match cli.verbose {
        0 => config.log_filter.as_str(),
        1 => "craft_planner=debug",
        _ => "craft_planner=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let conn = Connection::open(&config.database)
        .with_context(|| format!("Failed to open {}", config.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", config.database.display());
        }

        Commands::Import { source_dir, clear } => {
            if clear {
                info!("Clearing existing catalog");
                db::clear_catalog(&conn)?;
            }

            let stats = import::import_directory(&conn, &source_dir)
                .with_context(|| format!("Failed to import {}", source_dir.display()))?;
            println!("\n{}", stats);
        }

        Commands::List { kind } => {
            let kind = kind.map(|k| k.parse::<MaterialKind>()).transpose()?;
            let records = db::list_records(&conn, kind)?;
            if records.is_empty() {
                println!("No catalog entries. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<14} {:<30} {:>5}", "Reference", "Name", "Tier");
                println!("{}", "-".repeat(51));
                for r in records {
                    println!(
                        "{:<14} {:<30} {:>5}",
                        r.reference.to_string(),
                        r.name,
                        report::tier_label(r.tier)
                    );
                }
            }
        }

        Commands::Show { material } => {
            let reference: MaterialRef = material.parse()?;
            let Some(record) = db::get_record(&conn, reference)? else {
                bail!("{} not found", reference);
            };
            println!("{}: {}", record.reference, record.name);
            println!("  Tier: {}", report::tier_label(record.tier));
            if let Some(tag) = &record.tag {
                println!("  Tag: {}", tag);
            }

            let recipes = db::get_recipes_for(&conn, reference)?;
            if recipes.is_empty() {
                println!("  No recipes (raw material)");
            }
            for recipe in recipes {
                let default = if record.default_recipe == Some(recipe.id) { " (default)" } else { "" };
                println!(
                    "  Recipe {}{}: makes {} [{}]",
                    recipe.id,
                    default,
                    recipe.output_quantity,
                    report::profession_label(recipe.profession.as_deref())
                );
                for i in &recipe.ingredients {
                    println!("    {} x{}", i.material, i.quantity);
                }
            }
        }

        Commands::Tree {
            material,
            quantity,
            recipe,
        } => {
            let reference: MaterialRef = material.parse()?;
            let catalog = db::load_catalog(&conn)?;
            let tree = Expander::new(&catalog)
                .with_max_depth(config.max_depth)
                .expand(reference, quantity, recipe);
            print!("{}", report::format_tree(&tree, 0));
        }

        Commands::Plan {
            plan,
            group,
            detailed,
        } => {
            let request = PlanFile::from_file(&plan)
                .and_then(PlanFile::into_request)
                .with_context(|| format!("Failed to load plan {}", plan.display()))?;
            let catalog = db::load_catalog(&conn)?;
            info!(
                "Planning {} entries against {} inventory sources",
                request.entries.len(),
                request.sources.iter().filter(|s| s.enabled).count()
            );

            let resolution = resolve(
                &catalog,
                &request.entries,
                &request.inventory,
                config.planner_options(),
            );
            let requirements = &resolution.requirements;

            match group {
                None => print!(
                    "{}",
                    RequirementTable {
                        requirements,
                        detailed,
                    }
                ),
                Some(GroupBy::Tier) => print!(
                    "{}",
                    report::format_groups(&grouping::by_tier(requirements), |t| report::tier_label(*t))
                ),
                Some(GroupBy::Step) => print!(
                    "{}",
                    report::format_groups(&grouping::by_step(requirements), |s| format!("Step {}", s))
                ),
                Some(GroupBy::Profession) => print!(
                    "{}",
                    report::format_groups(&grouping::by_profession(requirements), |p| {
                        report::profession_label(p.as_deref()).to_string()
                    })
                ),
                Some(GroupBy::StepProfession) => print!(
                    "{}",
                    report::format_groups(&grouping::by_step_then_profession(requirements), |(s, p)| {
                        format!("Step {} / {}", s, report::profession_label(p.as_deref()))
                    })
                ),
            }
        }

        Commands::Validate => {
            let catalog = db::load_catalog(&conn)?;
            println!("{}", catalog.validate());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

fn record(reference: MaterialRef, name: &str, tier: Option<u32>) -> CatalogRecord {
    CatalogRecord {
        reference,
        name: name.to_string(),
        tier,
        tag: None,
        default_recipe: None,
    }
}

fn recipe(
    id: u32,
    output: MaterialRef,
    output_quantity: u32,
    ingredients: &[(MaterialRef, u32)],
    profession: &str,
) -> Recipe {
    Recipe {
        id,
        output,
        output_quantity,
        ingredients: ingredients
            .iter()
            .map(|&(material, quantity)| Ingredient { material, quantity })
            .collect(),
        profession: Some(profession.to_string()),
        station_tier: Some(1),
        expandable: true,
    }
}

/// Load a small sample catalog for testing without game-data dumps
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;

    let log = MaterialRef::item(1);
    let plank = MaterialRef::item(2);
    let fiber = MaterialRef::item(3);
    let rope = MaterialRef::item(4);
    let ore = MaterialRef::item(5);
    let ingot = MaterialRef::item(6);
    let nails = MaterialRef::item(7);
    let stone = MaterialRef::item(8);
    let brick = MaterialRef::item(9);
    let timber = MaterialRef::cargo(1);
    let workshop = MaterialRef::building(1);

    let records = [
        record(log, "Rough Log", Some(1)),
        record(plank, "Rough Plank", Some(1)),
        record(fiber, "Plant Fiber", Some(1)),
        record(rope, "Rough Rope", Some(1)),
        record(ore, "Ferralith Ore", Some(1)),
        record(ingot, "Ferralith Ingot", Some(2)),
        record(nails, "Ferralith Nails", Some(2)),
        record(stone, "Rough Stone", Some(1)),
        record(brick, "Rough Brick", Some(2)),
        record(timber, "Timber Bundle", Some(2)),
        record(workshop, "Carpentry Workshop", None),
    ];
    for r in &records {
        db::upsert_record(conn, r)?;
    }

    let recipes = [
        recipe(100, plank, 2, &[(log, 1)], "Carpentry"),
        recipe(101, rope, 1, &[(fiber, 3)], "Farming"),
        recipe(102, ingot, 1, &[(ore, 2)], "Smithing"),
        recipe(103, nails, 5, &[(ingot, 1)], "Smithing"),
        recipe(104, brick, 4, &[(stone, 3)], "Masonry"),
        recipe(105, timber, 1, &[(plank, 6), (rope, 2)], "Carpentry"),
        recipe(106, workshop, 1, &[(timber, 4), (nails, 20), (brick, 12)], "Construction"),
    ];
    for r in &recipes {
        db::insert_recipe(conn, r)?;
    }

    println!("Loaded {} sample materials and {} recipes", records.len(), recipes.len());
    Ok(())
}
