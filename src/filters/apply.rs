use chrono::{NaiveDate, NaiveTime};

use super::ast::{FieldFilter, FilterExpr, FilterField, FilterOperator};
use crate::models::ChatThread;

/// Keep the threads matching `filter`, preserving their order
///
/// `viewer` is needed for `unread:`, which reads the viewer's own counter.
pub fn apply_filters(
    threads: Vec<ChatThread>,
    filter: &FilterExpr,
    viewer: &str,
) -> Vec<ChatThread> {
    if filter.is_empty() {
        return threads;
    }
    threads.into_iter().filter(|thread| evaluate_filter(thread, filter, viewer)).collect()
}

/// Left-to-right evaluation, no precedence between AND and OR
fn evaluate_filter(thread: &ChatThread, filter: &FilterExpr, viewer: &str) -> bool {
    let Some((first, rest)) = filter.filters.split_first() else {
        return true;
    };

    let mut result = evaluate_field_filter(thread, first, viewer);
    for (operator, next) in filter.operators.iter().zip(rest) {
        let next = evaluate_field_filter(thread, next, viewer);
        result = match operator {
            FilterOperator::And => result && next,
            FilterOperator::Or => result || next,
        };
    }
    result
}

fn evaluate_field_filter(thread: &ChatThread, filter: &FieldFilter, viewer: &str) -> bool {
    match filter.field {
        FilterField::With => match_with(thread, &filter.value, viewer),
        FilterField::Type => thread.kind_label().eq_ignore_ascii_case(&filter.value),
        FilterField::Since => match_since(thread, &filter.value),
        FilterField::Unread => match_unread(thread, &filter.value, viewer),
    }
}

/// Case-insensitive substring of the group name or of someone the viewer is talking to
///
/// The viewer's own ID and name never match; they are part of every thread.
fn match_with(thread: &ChatThread, value: &str, viewer: &str) -> bool {
    let needle = value.to_lowercase();
    let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

    matches!(thread, ChatThread::Group(group) if contains(&group.name))
        || thread
            .counterparts(viewer)
            .into_iter()
            .any(|(id, name)| contains(id) || name.is_some_and(contains))
}

/// Activity on or after midnight UTC of the given day; inactive threads never match
fn match_since(thread: &ChatThread, value: &str) -> bool {
    let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
        return false;
    };
    let start = date.and_time(NaiveTime::MIN).and_utc();
    thread.last_message_time().is_some_and(|time| time >= start)
}

fn match_unread(thread: &ChatThread, value: &str, viewer: &str) -> bool {
    let has_unread = thread.unread_for(viewer) > 0;
    match value.to_lowercase().as_str() {
        "true" => has_unread,
        "false" => !has_unread,
        _ => false,
    }
}
