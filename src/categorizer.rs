use regex::RegexBuilder;

use crate::error::Result;
use crate::models::CategoryRule;
use crate::workbook::{Workbook, AUTO_CATEGORY};

/// Compile a rule pattern the way rules are matched: case-insensitive,
/// anywhere in the description.
pub fn compile_pattern(pattern: &str) -> Result<regex::Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Read the AutoCategory sheet in order. Rows with an empty pattern are
/// skipped; a pattern that does not compile fails the whole load.
pub fn load_rules(workbook: &dyn Workbook) -> Result<Vec<CategoryRule>> {
    let mut rules = Vec::new();
    for row in workbook.rows(AUTO_CATEGORY)? {
        let pattern = row.first().map(|p| p.trim()).unwrap_or("");
        if pattern.is_empty() {
            continue;
        }
        rules.push(CategoryRule {
            pattern: compile_pattern(pattern)?,
            category: row.get(1).cloned().unwrap_or_default(),
            sub_category: row.get(2).cloned().unwrap_or_default(),
        });
    }
    Ok(rules)
}

/// First matching rule wins; no match yields empty category fields.
pub fn categorize<'a>(description: &str, rules: &'a [CategoryRule]) -> (&'a str, &'a str) {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(description))
        .map(|rule| (rule.category.as_str(), rule.sub_category.as_str()))
        .unwrap_or(("", ""))
}
