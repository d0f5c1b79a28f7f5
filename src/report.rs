//! Plain-text rendering of trees, requirement lists and groups

use std::collections::BTreeMap;
use std::fmt;

use crate::expand::MaterialNode;
use crate::grouping::RequirementGroup;
use crate::models::{MaterialRef, MaterialRequirement};

pub fn tier_label(tier: Option<u32>) -> String {
    match tier {
        Some(t) => format!("T{}", t),
        None => "T-".to_string(),
    }
}

pub fn profession_label(profession: Option<&str>) -> &str {
    profession.unwrap_or("Gathering")
}

/// Format an expanded tree as an indented list
pub fn format_tree(node: &MaterialNode, indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    output.push_str(&format!(
        "{}{}x {} [{}, step {}]",
        prefix,
        node.quantity,
        node.name,
        tier_label(node.tier),
        node.step
    ));
    match (node.recipe, node.flag) {
        (Some(recipe), _) => output.push_str(&format!(" via recipe {}", recipe)),
        (None, Some(flag)) => output.push_str(&format!(" ({})", flag)),
        (None, None) => output.push_str(" (raw)"),
    }
    output.push('\n');

    for child in &node.children {
        output.push_str(&format_tree(child, indent + 1));
    }

    output
}

/// Requirement list with per-material breakdowns
pub struct RequirementTable<'a> {
    pub requirements: &'a BTreeMap<MaterialRef, MaterialRequirement>,
    pub detailed: bool,
}

impl fmt::Display for RequirementTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Material Requirements ===")?;
        writeln!(
            f,
            "{:<28} {:>4} {:>5} {:>10} {:>10} {:>10}",
            "Material", "Tier", "Step", "Required", "Have", "Remaining"
        )?;
        writeln!(f, "{}", "-".repeat(72))?;

        let mut rows: Vec<_> = self.requirements.values().collect();
        rows.sort_by(|a, b| b.step.cmp(&a.step).then_with(|| a.name.cmp(&b.name)));

        for r in rows {
            let mark = if r.is_complete { "✓" } else { " " };
            writeln!(
                f,
                "{:<28} {:>4} {:>5} {:>10} {:>10} {:>10} {}",
                r.name,
                tier_label(r.tier),
                r.step,
                r.base_required,
                r.have,
                r.remaining,
                mark
            )?;

            if !self.detailed {
                continue;
            }
            for p in &r.parent_contributions {
                writeln!(
                    f,
                    "    covered {} by {} owned {}",
                    p.coverage, p.parent_quantity_used, p.parent_name
                )?;
            }
            for c in &r.root_contributions {
                writeln!(
                    f,
                    "    {} for #{} {} (x{})",
                    c.contribution, c.root_id, c.name, c.requested_quantity
                )?;
            }
            if !r.flags.is_empty() {
                let flags: Vec<_> = r.flags.iter().map(|f| f.to_string()).collect();
                writeln!(f, "    flags: {}", flags.join(", "))?;
            }
        }

        let outstanding = self.requirements.values().filter(|r| !r.is_complete).count();
        writeln!(f)?;
        writeln!(f, "{} materials, {} outstanding", self.requirements.len(), outstanding)?;
        Ok(())
    }
}

/// Render groups with their totals; `label` names each group key
pub fn format_groups<K, F>(groups: &[RequirementGroup<'_, K>], label: F) -> String
where
    F: Fn(&K) -> String,
{
    let mut output = String::new();

    for group in groups {
        let mark = if group.is_complete { " ✓" } else { "" };
        output.push_str(&format!(
            "== {} ({}/{}){}\n",
            label(&group.key),
            group.total_available,
            group.total_required,
            mark
        ));
        for r in &group.materials {
            output.push_str(&format!(
                "  {:<28} {:>4} {:>8} / {:<8} remaining {}\n",
                r.name,
                tier_label(r.tier),
                r.available(),
                r.base_required,
                r.remaining
            ));
        }
    }

    output
}
