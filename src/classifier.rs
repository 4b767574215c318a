use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::console::Console;
use crate::error::{Result, TallyError};
use crate::models::{is_reserved_category, RESERVED_CATEGORIES};

/// One learned description→classification rule. Rules are an explicit
/// ordered list so substring matching stays deterministic: first match in
/// list order wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub pattern: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
}

#[derive(Serialize, Deserialize, Default)]
struct CategoriesFile {
    categories: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize, Deserialize, Default)]
struct MappingsFile {
    mappings: Vec<MappingRule>,
}

/// Category/subcategory store plus the learned mapping rules. All mutating
/// operations persist immediately and roll the in-memory change back if the
/// write fails, so a failed save never corrupts state.
pub struct Classifier {
    categories_path: PathBuf,
    mappings_path: PathBuf,
    subcategories: BTreeMap<String, Vec<String>>,
    mappings: Vec<MappingRule>,
}

impl Classifier {
    pub fn load(categories_path: PathBuf, mappings_path: PathBuf) -> Result<Self> {
        let mut classifier = Self {
            categories_path,
            mappings_path,
            subcategories: BTreeMap::new(),
            mappings: Vec::new(),
        };

        if classifier.categories_path.exists() {
            let content = fs::read_to_string(&classifier.categories_path)?;
            let file: CategoriesFile = serde_json::from_str(&content).map_err(|e| {
                TallyError::Config(format!(
                    "could not parse {}: {e}",
                    classifier.categories_path.display()
                ))
            })?;
            classifier.subcategories = file.categories;
        }
        // Reserved categories always exist and are never user-managed.
        for reserved in RESERVED_CATEGORIES {
            classifier
                .subcategories
                .entry(reserved.to_string())
                .or_default();
        }
        if !classifier.categories_path.exists() {
            classifier.persist_categories()?;
        }

        if classifier.mappings_path.exists() {
            let content = fs::read_to_string(&classifier.mappings_path)?;
            let file: MappingsFile = serde_json::from_str(&content).map_err(|e| {
                TallyError::Config(format!(
                    "could not parse {}: {e}",
                    classifier.mappings_path.display()
                ))
            })?;
            classifier.mappings = file.mappings;
        } else {
            classifier.persist_mappings()?;
        }

        Ok(classifier)
    }

    /// Non-reserved category names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.subcategories
            .keys()
            .map(String::as_str)
            .filter(|name| !is_reserved_category(name))
            .collect()
    }

    pub fn subcategories_of(&self, category: &str) -> &[String] {
        self.subcategories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn mappings(&self) -> &[MappingRule] {
        &self.mappings
    }

    /// Case-insensitive substring lookup over the rules, in order.
    pub fn find_category(&self, description: &str) -> Option<(&str, &str)> {
        let haystack = description.to_lowercase();
        self.mappings
            .iter()
            .find(|rule| haystack.contains(&rule.pattern.to_lowercase()))
            .map(|rule| (rule.category.as_str(), rule.subcategory.as_str()))
    }

    /// Add or overwrite a rule (by exact pattern) and persist the table.
    pub fn save_mapping(
        &mut self,
        description: &str,
        category: &str,
        subcategory: &str,
    ) -> Result<()> {
        let previous = self.mappings.clone();
        if let Some(rule) = self
            .mappings
            .iter_mut()
            .find(|rule| rule.pattern == description)
        {
            rule.category = category.to_string();
            rule.subcategory = subcategory.to_string();
        } else {
            self.mappings.push(MappingRule {
                pattern: description.to_string(),
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            });
        }
        if let Err(e) = self.persist_mappings() {
            self.mappings = previous;
            return Err(e);
        }
        info!("saved mapping '{description}' -> {category}/{subcategory}");
        Ok(())
    }

    pub fn delete_mapping(&mut self, pattern: &str) -> Result<()> {
        let Some(position) = self.mappings.iter().position(|rule| rule.pattern == pattern) else {
            return Err(TallyError::Validation(format!(
                "no mapping with pattern '{pattern}'"
            )));
        };
        let removed = self.mappings.remove(position);
        if let Err(e) = self.persist_mappings() {
            self.mappings.insert(position, removed);
            return Err(e);
        }
        Ok(())
    }

    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }
        if is_reserved_category(name) {
            return Err(TallyError::Validation(format!(
                "'{name}' is a reserved category name"
            )));
        }
        if self.subcategories.contains_key(name) {
            return Err(TallyError::Validation(format!(
                "category '{name}' already exists"
            )));
        }
        self.subcategories.insert(name.to_string(), Vec::new());
        if let Err(e) = self.persist_categories() {
            self.subcategories.remove(name);
            return Err(e);
        }
        Ok(())
    }

    pub fn add_subcategory(&mut self, category: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::Validation(
                "subcategory name cannot be empty".to_string(),
            ));
        }
        let Some(existing) = self.subcategories.get_mut(category) else {
            return Err(TallyError::UnknownCategory(category.to_string()));
        };
        if existing.iter().any(|s| s == name) {
            return Err(TallyError::Validation(format!(
                "subcategory '{name}' already exists"
            )));
        }
        existing.push(name.to_string());
        if let Err(e) = self.persist_categories() {
            if let Some(subs) = self.subcategories.get_mut(category) {
                subs.pop();
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn delete_category(&mut self, name: &str) -> Result<()> {
        if is_reserved_category(name) {
            return Err(TallyError::Validation(format!(
                "'{name}' is reserved and cannot be deleted"
            )));
        }
        let Some(removed) = self.subcategories.remove(name) else {
            return Err(TallyError::UnknownCategory(name.to_string()));
        };
        if let Err(e) = self.persist_categories() {
            self.subcategories.insert(name.to_string(), removed);
            return Err(e);
        }
        Ok(())
    }

    /// Interactive classification: list categories (plus "add new"), then a
    /// subcategory for the chosen one. Loops until a valid selection; any
    /// persistence failure is reported and the menu re-shown, never fatal.
    pub fn prompt_for_category(
        &mut self,
        description: &str,
        console: &mut dyn Console,
    ) -> (String, String) {
        console.message(&format!("\nTransaction: {description}"));
        loop {
            console.message("\nSelect a category:");
            let choices: Vec<String> = self.categories().iter().map(|s| s.to_string()).collect();
            for (i, category) in choices.iter().enumerate() {
                console.menu_item(i + 1, category);
            }
            console.menu_item(choices.len() + 1, "Add new category");

            let input = console.prompt("\nEnter category number: ");
            let Ok(choice) = input.parse::<usize>() else {
                if !input.is_empty() {
                    console.warn("Please enter a valid number.");
                }
                continue;
            };

            if (1..=choices.len()).contains(&choice) {
                let selected = choices[choice - 1].clone();
                return self.prompt_for_subcategory(&selected, description, console);
            }
            if choice == choices.len() + 1 {
                let name = console.prompt("Enter new category name: ");
                match self.add_category(&name) {
                    Ok(()) => {
                        console.message(&format!("Added new category: {}", name.trim()));
                        return self.prompt_for_subcategory(name.trim(), description, console);
                    }
                    Err(TallyError::Validation(reason)) => console.warn(&reason),
                    Err(e) => console.error(&format!("Could not save new category: {e}")),
                }
                continue;
            }
            console.warn("Invalid choice.");
        }
    }

    fn prompt_for_subcategory(
        &mut self,
        category: &str,
        description: &str,
        console: &mut dyn Console,
    ) -> (String, String) {
        loop {
            let mut subcategories: Vec<String> = self.subcategories_of(category).to_vec();
            subcategories.sort();

            console.message(&format!(
                "\nSelect a subcategory for {category} (transaction: {description}):"
            ));
            console.menu_item(0, "[No subcategory]");
            for (i, subcategory) in subcategories.iter().enumerate() {
                console.menu_item(i + 1, subcategory);
            }
            console.menu_item(subcategories.len() + 1, "Add new subcategory");

            let input = console.prompt("\nEnter subcategory number: ");
            let Ok(choice) = input.parse::<usize>() else {
                if !input.is_empty() {
                    console.warn("Please enter a valid number.");
                }
                continue;
            };

            if choice == 0 {
                return (category.to_string(), String::new());
            }
            if (1..=subcategories.len()).contains(&choice) {
                return (category.to_string(), subcategories[choice - 1].clone());
            }
            if choice == subcategories.len() + 1 {
                let name = console.prompt("Enter new subcategory name: ");
                match self.add_subcategory(category, &name) {
                    Ok(()) => {
                        console.message(&format!("Added new subcategory: {}", name.trim()));
                        return (category.to_string(), name.trim().to_string());
                    }
                    Err(TallyError::Validation(reason)) => console.warn(&reason),
                    Err(e) => console.error(&format!("Could not save new subcategory: {e}")),
                }
                continue;
            }
            console.warn("Invalid choice.");
        }
    }

    fn persist_categories(&self) -> Result<()> {
        if let Some(parent) = self.categories_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CategoriesFile {
            categories: self.subcategories.clone(),
        };
        let json =
            serde_json::to_string_pretty(&file).map_err(|e| TallyError::Config(e.to_string()))?;
        fs::write(&self.categories_path, format!("{json}\n"))?;
        Ok(())
    }

    fn persist_mappings(&self) -> Result<()> {
        if let Some(parent) = self.mappings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = MappingsFile {
            mappings: self.mappings.clone(),
        };
        let json =
            serde_json::to_string_pretty(&file).map_err(|e| TallyError::Config(e.to_string()))?;
        fs::write(&self.mappings_path, format!("{json}\n"))?;
        Ok(())
    }
}
