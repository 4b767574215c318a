use std::path::PathBuf;

use crate::classifier::Classifier;
use crate::console::Console;
use crate::error::Result;
use crate::ledger::LedgerStore;
use crate::processor::process_new_transactions;
use crate::settings::load_config;

pub fn run(file: Option<&str>, console: &mut dyn Console) -> Result<()> {
    let config = load_config()?;
    let schema = config.import_schema()?.clone();
    schema.validate()?;

    let inbox: PathBuf = match file {
        Some(path) => PathBuf::from(path),
        None => config.inbox_path(),
    };

    let ledger = LedgerStore::new(config.ledger_path());
    ledger.ensure_exists()?;
    let mut classifier = Classifier::load(config.categories_path(), config.mappings_path())?;

    process_new_transactions(&inbox, &ledger, &mut classifier, &schema, console)?;
    Ok(())
}
