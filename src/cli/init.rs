use std::fs;

use crate::classifier::Classifier;
use crate::console::Console;
use crate::error::Result;
use crate::ledger::LedgerStore;
use crate::settings::{config_file_exists, config_path, load_config, save_config, Config};

/// Bootstrap the config file and data directory. Idempotent; rerunning on an
/// existing setup only fills in whatever is missing. The import schema is
/// left null on purpose so the user can describe their bank's columns before
/// the first import.
pub fn run(console: &mut dyn Console) -> Result<()> {
    let config = if config_file_exists() {
        console.message(&format!(
            "Found existing configuration at {}.",
            config_path().display()
        ));
        load_config()?
    } else {
        let config = Config::default();
        save_config(&config)?;
        console.message(&format!("Wrote {}.", config_path().display()));
        config
    };

    fs::create_dir_all(config.data_dir())?;
    Classifier::load(config.categories_path(), config.mappings_path())?;
    LedgerStore::new(config.ledger_path()).ensure_exists()?;
    console.message(&format!(
        "Data directory ready at {}.",
        config.data_dir().display()
    ));

    if config.import_schema.is_none() {
        console.message(&format!(
            "\nBefore importing, edit {} and fill in \"import_schema\" with your \
             bank's CSV column names (date_column, description_column, amount_column).",
            config_path().display()
        ));
    }
    console.message(&format!(
        "Drop bank exports into {} and run `tally import`.",
        config.inbox_path().display()
    ));
    Ok(())
}
