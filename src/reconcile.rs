//! Combines a freshly fetched tweak document with the user's saved one.
//!
//! Structure always comes from the remote side. What the user chose (each
//! item's `enabled` flag and the theme) comes from the local side whenever
//! both sides know about it. Items are matched by [`IdentityKey`], so renaming
//! a feature or category upstream resets the state of the items inside it.

use crate::tweaks::{Configuration, IdentityKey};

pub fn reconcile(
    remote: Option<Configuration>,
    local: Option<Configuration>,
) -> Option<Configuration> {
    match (remote, local) {
        (None, local) => local,
        (Some(remote), None) => Some(remote),
        (Some(remote), Some(local)) => Some(merge(remote, &local)),
    }
}

fn merge(mut remote: Configuration, local: &Configuration) -> Configuration {
    // Duplicate keys in `local` collapse here; the last one read wins.
    let enabled = local.enabled_map();
    let mut carried = 0usize;

    for feature in &mut remote.tweaks {
        for category in &mut feature.categories {
            for item in &mut category.items {
                let key = IdentityKey::new(&feature.feature, &category.category, &item.name);
                if let Some(&state) = enabled.get(&key) {
                    item.enabled = state;
                    carried += 1;
                }
            }
        }
    }

    if let Some(theme) = local.theme.as_ref().filter(|t| !t.is_empty()) {
        remote.theme = Some(theme.clone());
    }

    tracing::debug!(
        carried,
        local_items = enabled.len(),
        "reconciled remote document with local state"
    );
    remote
}
