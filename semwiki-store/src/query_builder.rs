//! Translation of [`RequestOptions`] into select options and predicates.
//!
//! Every collector funnels its caller's options through these two
//! functions, so pagination and string filters behave the same on every
//! listing.

use crate::database::{Condition, SelectOptions};
use semwiki_types::{RequestOptions, SortOrder, StringCondition, StringConditionKind};

/// `LIMIT`/`OFFSET`/`ORDER BY` for a listing sorted on `sort_column`
///
/// A zero limit means no limit. The offset only applies together with a
/// limit.
pub fn sql_options(options: Option<&RequestOptions>, sort_column: &str) -> SelectOptions {
    let mut select = SelectOptions::new();
    let Some(options) = options else {
        return select;
    };

    if options.has_limit() {
        select = select.limit(options.limit).offset(options.offset);
    }

    select = match options.sort {
        SortOrder::Unsorted => select,
        SortOrder::Ascending => select.order_by(sort_column),
        SortOrder::Descending => select.order_by_desc(sort_column),
    };

    select
}

/// `LIKE` predicates on `column` for every string condition
pub fn sql_conditions(options: Option<&RequestOptions>, column: &str) -> Vec<Condition> {
    options
        .map(|options| {
            options
                .string_conditions
                .iter()
                .map(|condition| Condition::like(column, like_pattern(condition)))
                .collect()
        })
        .unwrap_or_default()
}

fn like_pattern(condition: &StringCondition) -> String {
    let value = escape_like(&condition.value.replace(' ', "_"));
    match condition.kind {
        StringConditionKind::Prefix => format!("{}%", value),
        StringConditionKind::Suffix => format!("%{}", value),
        StringConditionKind::Contains => format!("%{}%", value),
    }
}

/// Escape `LIKE` metacharacters with `\`
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
