use console::style;
use dialoguer::MultiSelect;

use gamesetup::{
    error::SetupError,
    installer::{extras::ExtraPath, InterpreterFactory, ShortcutCreator, WizardEvent},
    ui,
};

use super::{dispatch, Wizard};

/// Checklist of the extras offered by each source.
pub fn run<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    ui::print_info(wizard.status());

    let mut paths = Vec::new();
    let mut labels = Vec::new();
    if let Some(selection) = wizard.extras() {
        for (g, group) in selection.groups.iter().enumerate() {
            for (e, row) in group.extras.iter().enumerate() {
                paths.push(ExtraPath::Extra(g, e));
                labels.push(format!("{}  {}", style(&group.source).dim(), row.label));
            }
        }
    }

    let picked = MultiSelect::new()
        .with_prompt("Extras to download (space to toggle)")
        .items(&labels)
        .interact()?;
    for i in picked {
        dispatch(wizard, WizardEvent::ExtraToggled(paths[i]))?;
    }

    if let Some(selection) = wizard.extras() {
        for group in &selection.groups {
            let mark = if group.selected {
                "all"
            } else if group.inconsistent {
                "some"
            } else {
                "none"
            };
            ui::print_info(&format!("{}: {} selected", group.source, mark));
        }
    }

    dispatch(wizard, WizardEvent::ExtrasConfirmed)
}
