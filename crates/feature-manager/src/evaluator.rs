//! Pure lookups over an already loaded [`FeatureDocument`].
//!
//! Resolution rule for a record: the feature is enabled unless `disabled` is
//! `true` or `enabled` is `false`. `disabled: true` wins even when `enabled`
//! is also `true`.

use crate::document::{FeatureDocument, FlagState};
use serde_json::Value;

pub fn is_enabled(document: &FeatureDocument, feature_id: &str) -> bool {
    document.get(feature_id).is_some_and(resolve)
}

pub fn resolve(state: &FlagState) -> bool {
    match state {
        FlagState::Toggle(enabled) => *enabled,
        FlagState::Options(options) => {
            options.enabled.unwrap_or(true) && !options.disabled.unwrap_or(false)
        }
    }
}

pub fn options<'a>(document: &'a FeatureDocument, feature_id: &str) -> Option<&'a FlagState> {
    document.get(feature_id)
}

/// A single extra field of a feature's record. Toggles carry no options.
pub fn option_value<'a>(
    document: &'a FeatureDocument,
    feature_id: &str,
    key: &str,
) -> Option<&'a Value> {
    match document.get(feature_id)? {
        FlagState::Options(options) => options.extra.get(key),
        FlagState::Toggle(_) => None,
    }
}
