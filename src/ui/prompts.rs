use anyhow::Result;
use dialoguer::Select;

/// Interactive confirmation prompt using arrow-key navigable selection
///
/// # Arguments
/// * `prompt` - The question to ask the user
/// * `default_yes` - Whether "Yes" should be the default selection (index 0)
///
/// # Returns
/// * `Ok(true)` if user selects "Yes"
/// * `Ok(false)` if user selects "No"
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_clear_confirmation(count: usize) -> Result<bool> {
    prompt_confirmation(&format!("Remove all {} preference(s)?", count), false)
}

pub fn prompt_import_confirmation(path: &std::path::Path) -> Result<bool> {
    prompt_confirmation(
        &format!(
            "Replace all preferences and cars with the contents of {}?",
            path.display()
        ),
        false,
    )
}
