use crate::selection::SelectionState;
use crate::types::{Dataset, Site};

/// Sites whose name is selected in any category, in dataset order.
pub fn visible_sites<'a>(dataset: &'a Dataset, selection: &SelectionState) -> Vec<&'a Site> {
    if selection.is_empty() {
        return Vec::new();
    }
    let selected = selection.selected_names();
    dataset
        .sites()
        .iter()
        .filter(|site| selected.contains(site.name.as_str()))
        .collect()
}
