use comfy_table::Table;

use crate::classifier::Classifier;
use crate::error::Result;
use crate::settings::load_config;

pub fn list() -> Result<()> {
    let config = load_config()?;
    let classifier = Classifier::load(config.categories_path(), config.mappings_path())?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Pattern", "Category", "Subcategory"]);
    // Shown in match order: earlier rows win when several patterns match.
    for (i, rule) in classifier.mappings().iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            rule.pattern.clone(),
            rule.category.clone(),
            rule.subcategory.clone(),
        ]);
    }
    println!("Mappings\n{table}");
    Ok(())
}

pub fn delete(pattern: &str) -> Result<()> {
    let config = load_config()?;
    let mut classifier = Classifier::load(config.categories_path(), config.mappings_path())?;
    classifier.delete_mapping(pattern)?;
    println!("Deleted mapping: {pattern}");
    Ok(())
}
