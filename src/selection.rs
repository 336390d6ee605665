use crate::error::SelectionError;
use crate::types::Dataset;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Bucket {
    members: BTreeSet<String>,
    chosen: BTreeSet<String>,
}

/// Chosen site names per category. A name is only ever filed under its own
/// category.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    buckets: BTreeMap<String, Bucket>,
    seed: Option<Vec<String>>,
}

impl SelectionState {
    pub fn new(dataset: &Dataset) -> Self {
        let buckets = dataset
            .categories()
            .into_iter()
            .map(|group| {
                let members = group.sites.into_iter().map(str::to_string).collect();
                (group.name.to_string(), Bucket { members, chosen: BTreeSet::new() })
            })
            .collect();
        Self { buckets, seed: None }
    }

    pub fn seeded(dataset: &Dataset, preselected: &[String]) -> Self {
        let mut state = Self::new(dataset);
        for name in preselected {
            match state.buckets.values_mut().find(|b| b.members.contains(name)) {
                Some(bucket) => {
                    bucket.chosen.insert(name.clone());
                }
                None => debug!("Preselected {:?} is not in the dataset", name),
            }
        }
        if !preselected.is_empty() {
            state.seed = Some(preselected.to_vec());
        }
        state
    }

    /// Replaces the chosen set of one category. Names outside the category
    /// are ignored. Returns how many names were kept.
    pub fn set_selection<I, S>(&mut self, category: &str, names: I) -> Result<usize, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bucket = self
            .buckets
            .get_mut(category)
            .ok_or_else(|| SelectionError::UnknownCategory(category.to_string()))?;

        bucket.chosen = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .filter(|n| bucket.members.contains(n))
            .collect();
        Ok(bucket.chosen.len())
    }

    pub fn clear_all(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.chosen.clear();
        }
        self.seed = None;
    }

    pub fn selected_names(&self) -> BTreeSet<&str> {
        self.buckets
            .values()
            .flat_map(|b| b.chosen.iter().map(String::as_str))
            .collect()
    }

    pub fn selected_in(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.buckets.get(category).map(|b| &b.chosen)
    }

    pub fn seed(&self) -> Option<&[String]> {
        self.seed.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|b| b.chosen.is_empty())
    }
}
