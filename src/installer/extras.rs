use indicatif::HumanBytes;

use super::interpreter::{Extra, ExtrasBySource};

/// Address of a row in the selection tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraPath {
    Source(usize),
    Extra(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraRow {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraGroup {
    pub source: String,
    pub selected: bool,
    /// Some, but not all, of the group's extras are selected.
    pub inconsistent: bool,
    pub extras: Vec<ExtraRow>,
}

/// Two-level checklist: sources, then their extras. Nothing is selected
/// initially.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtrasSelection {
    pub groups: Vec<ExtraGroup>,
}

/// `Manual (2.0 KiB, pdf)`
pub fn extra_label(extra: &Extra) -> String {
    let mut infos = Vec::new();
    if let Some(size) = extra.total_size.filter(|s| *s > 0) {
        infos.push(HumanBytes(size).to_string());
    }
    if let Some(kind) = extra.kind.as_deref().filter(|k| !k.is_empty()) {
        infos.push(kind.to_string());
    }
    if infos.is_empty() {
        extra.name.clone()
    } else {
        format!("{} ({})", extra.name, infos.join(", "))
    }
}

impl ExtrasSelection {
    pub fn new(all: &ExtrasBySource) -> Self {
        let groups = all
            .iter()
            .map(|(source, extras)| ExtraGroup {
                source: source.clone(),
                selected: false,
                inconsistent: false,
                extras: extras
                    .iter()
                    .map(|e| ExtraRow {
                        id: e.id.clone(),
                        label: extra_label(e),
                        selected: false,
                    })
                    .collect(),
            })
            .collect();
        ExtrasSelection { groups }
    }

    /// Flips a row. A source carries all its extras along; an extra
    /// updates the state of the sources.
    pub fn toggle(&mut self, path: ExtraPath) -> bool {
        match path {
            ExtraPath::Source(g) => {
                let Some(group) = self.groups.get_mut(g) else {
                    return false;
                };
                group.selected = !group.selected;
                group.inconsistent = false;
                for row in &mut group.extras {
                    row.selected = group.selected;
                }
            }
            ExtraPath::Extra(g, e) => {
                let Some(row) = self.groups.get_mut(g).and_then(|grp| grp.extras.get_mut(e)) else {
                    return false;
                };
                row.selected = !row.selected;
                for group in &mut self.groups {
                    let all = group.extras.iter().all(|r| r.selected);
                    let any = group.extras.iter().any(|r| r.selected);
                    group.selected = any && all;
                    group.inconsistent = any && !all;
                }
            }
        }
        true
    }

    /// Ids of the selected extras, in display order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.extras.iter())
            .filter(|r| r.selected && !r.id.is_empty())
            .map(|r| r.id.clone())
            .collect()
    }
}
