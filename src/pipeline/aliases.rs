//! Import alias aggregation

use crate::models::AliasUsage;
use crate::parsers::ImportRecord;
use std::collections::BTreeMap;
use std::path::Path;

/// Number of aliases kept in the report
pub const ALIAS_LIMIT: usize = 20;

/// An alias counts as a codebase convention once this many files use it
pub const PATTERN_MIN_FILES: usize = 2;

/// Aggregated alias usage
#[derive(Debug, Default)]
pub struct AliasSummary {
    /// Most used aliases, capped at the requested limit
    pub top: Vec<AliasUsage>,
    /// alias -> target for every alias used in at least two files
    pub patterns: BTreeMap<String, String>,
}

/// Count alias declarations across files, most used first.
///
/// An alias is keyed by its name and target, so `np -> numpy` and
/// `np -> numpy.random` are counted separately. Patterns are taken from the
/// full list before truncation; when one alias name has several recurring
/// targets, the most used one is kept.
pub fn aggregate_aliases<'a>(
    records: impl IntoIterator<Item = (&'a Path, &'a ImportRecord)>,
    limit: usize,
) -> AliasSummary {
    let mut usage: BTreeMap<(&str, &str), Vec<String>> = BTreeMap::new();

    for (file, record) in records {
        for (alias, target) in &record.aliases {
            usage
                .entry((alias.as_str(), target.as_str()))
                .or_default()
                .push(file.display().to_string());
        }
    }

    let mut aliases: Vec<AliasUsage> = usage
        .into_iter()
        .map(|((alias, module), mut files)| {
            files.sort();
            files.dedup();
            AliasUsage {
                alias: alias.to_string(),
                module: module.to_string(),
                usage_count: files.len(),
                files,
            }
        })
        .collect();

    // Stable sort keeps (alias, module) order among equal counts
    aliases.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));

    let mut patterns = BTreeMap::new();
    for usage in aliases.iter().filter(|a| a.usage_count >= PATTERN_MIN_FILES) {
        patterns
            .entry(usage.alias.clone())
            .or_insert_with(|| usage.module.clone());
    }

    aliases.truncate(limit);
    AliasSummary {
        top: aliases,
        patterns,
    }
}
