use std::collections::HashMap;

use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use crate::error::{MigrateError, Result};
use crate::utils::full_string_right_match;

/// Picks one account when a reference matches several in the book.
pub trait AccountChooser {
    fn choose(&mut self, candidate: &str, matches: &[String]) -> Result<String>;
}

impl<F> AccountChooser for F
where
    F: FnMut(&str, &[String]) -> Result<String>,
{
    fn choose(&mut self, candidate: &str, matches: &[String]) -> Result<String> {
        self(candidate, matches)
    }
}

/// Asks on the terminal. Blocks until the user answers.
pub struct PromptChooser;

impl AccountChooser for PromptChooser {
    fn choose(&mut self, candidate: &str, matches: &[String]) -> Result<String> {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("The account for '{candidate}' is unclear. Choose one"))
            .items(matches)
            .default(0)
            .interact()
            .map_err(|e| MigrateError::Prompt(e.to_string()))?;
        Ok(matches[selection].clone())
    }
}

/// Resolves short or partial account references against the book's chart.
pub struct AccountResolver<'a> {
    existing: Vec<String>,
    chooser: &'a mut dyn AccountChooser,
    choices: HashMap<String, String>,
}

impl<'a> AccountResolver<'a> {
    pub fn new(existing: Vec<String>, chooser: &'a mut dyn AccountChooser) -> Self {
        Self {
            existing,
            chooser,
            choices: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, candidate: &str) -> Result<String> {
        if let Some(choice) = self.choices.get(candidate) {
            return Ok(choice.clone());
        }
        let matches = full_string_right_match(&self.existing, candidate);
        let chosen = match matches.len() {
            0 => return Err(MigrateError::MissingAccount(candidate.to_string())),
            1 => matches[0].clone(),
            _ => {
                let choice = self.chooser.choose(candidate, &matches)?;
                if !matches.contains(&choice) {
                    return Err(MigrateError::InvalidChoice {
                        candidate: candidate.to_string(),
                        choice,
                    });
                }
                choice
            }
        };
        log::debug!("Resolved '{candidate}' to '{chosen}'");
        self.choices.insert(candidate.to_string(), chosen.clone());
        Ok(chosen)
    }
}
