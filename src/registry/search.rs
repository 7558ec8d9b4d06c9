//! Scored free-text search and category filtering over registry entries.

use super::ToolEntry;

/// A scored match ready for rendering, cloning the entry for each name it
/// was matched under (its canonical name, or one of its aliases).
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub name: String,
    pub entry: ToolEntry,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter<'a> {
    FreeText(&'a str),
    Category(&'a str),
}

fn parse_query(query: &str) -> Filter<'_> {
    for prefix in ["category:", "integration:"] {
        if let Some(rest) = strip_ci_prefix(query, prefix) {
            return Filter::Category(rest);
        }
    }
    Filter::FreeText(query)
}

fn strip_ci_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn names_of(entry: &ToolEntry, canonical: &str, aliases: &[String]) -> Vec<String> {
    let mut names = vec![canonical.to_string()];
    names.extend(aliases.iter().cloned());
    let _ = entry;
    names
}

/// Scores `entry` (known under `canonical` plus `aliases`) against `query`.
/// Returns 0 when there is no match at all.
fn score_entry(entry: &ToolEntry, canonical: &str, aliases: &[String], query: &str) -> u32 {
    if query.is_empty() {
        return 1;
    }
    let q = query.to_ascii_lowercase();

    match parse_query(query) {
        Filter::Category(cat) => {
            let cat = cat.to_ascii_lowercase();
            let category_hit = entry.category.to_ascii_lowercase().contains(&cat);
            let tag_hit = entry
                .tags
                .iter()
                .any(|t| t.to_ascii_lowercase().contains(&cat));
            if category_hit || tag_hit {
                40
            } else {
                0
            }
        }
        Filter::FreeText(_) => {
            let names = names_of(entry, canonical, aliases);
            let names_lower: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();

            if names_lower.iter().any(|n| *n == q) {
                return 100;
            }
            if names_lower.iter().any(|n| n.starts_with(&q)) {
                return 80;
            }
            if names_lower.iter().any(|n| n.contains(&q)) {
                return 60;
            }
            let category_or_tag_hit = entry.category.to_ascii_lowercase().contains(&q)
                || entry
                    .tags
                    .iter()
                    .any(|t| t.to_ascii_lowercase().contains(&q));
            if category_or_tag_hit {
                return 40;
            }
            if entry.tool.description.to_ascii_lowercase().contains(&q) {
                return 20;
            }
            0
        }
    }
}

/// Scores `entry` and returns one [`ScoredEntry`] per matched name
/// (canonical plus each alias), or an empty vec when the score is 0.
pub fn score_and_expand(
    entry: &ToolEntry,
    canonical: &str,
    aliases: &[String],
    query: &str,
) -> Vec<ScoredEntry> {
    let score = score_entry(entry, canonical, aliases, query);
    if score == 0 {
        return Vec::new();
    }

    let mut out = vec![ScoredEntry {
        name: canonical.to_string(),
        entry: entry.clone(),
        score,
    }];
    for alias in aliases {
        out.push(ScoredEntry {
            name: alias.clone(),
            entry: entry.clone(),
            score,
        });
    }
    out
}

/// Sorts by `(-score, name)`, the registry's deterministic tie-break.
pub fn sort_results(results: &mut [ScoredEntry]) {
    results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
}
