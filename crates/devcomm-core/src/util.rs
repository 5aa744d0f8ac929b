//! Small helpers shared by the loader, table builder and resolver.

use crate::model::DevCommFilterInfo;

/// ASCII case fold used for every table key.
///
/// Only key construction goes through here; stored record fields keep the
/// case they were written with.
pub fn to_lowercase(value: &str) -> String {
    value.to_ascii_lowercase()
}

/// `true` when `value` is non-empty and made of ASCII digits only.
pub fn is_only_number(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Check query constraints against the resolver's active filter list.
///
/// A constraint whose name appears in `active` (case-insensitive) must carry
/// the same value. Names the list does not know do not constrain.
pub fn matches_filter_list(active: &[DevCommFilterInfo], constraints: &[DevCommFilterInfo]) -> bool {
    constraints.iter().all(|c| {
        active
            .iter()
            .filter(|a| a.filter_name.eq_ignore_ascii_case(&c.filter_name))
            .all(|a| a.filter_value == c.filter_value)
    })
}
