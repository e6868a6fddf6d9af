// SPDX-License-Identifier: GPL-3.0

const APP_ID: &str = "dev.databank.Databank";

mod alert;
mod vocabulary;

pub use alert::Alert;
pub use vocabulary::DeckInputError;
pub use vocabulary::LINE_FORMAT;
pub use vocabulary::default_vocabulary;
pub use vocabulary::parse_deck_input;
pub use vocabulary::parse_vocabulary;
pub use vocabulary::vocabulary_text;

/// Directory where the application keeps its data
pub fn data_dir() -> Result<std::path::PathBuf, anywho::Error> {
    Ok(dirs::data_dir()
        .ok_or_else(|| anywho::anywho!("Failed to get data directory"))?
        .join(APP_ID))
}

/// Directory where the application keeps its configuration
pub fn config_dir() -> Result<std::path::PathBuf, anywho::Error> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anywho::anywho!("Failed to get config directory"))?
        .join(APP_ID))
}
