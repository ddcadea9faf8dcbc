// Central place for UI strings and other non-localized constants.
// Keep these out of gui.rs and the core so wording tweaks stay in one file.

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "AIP: Autocomplete Inline Properties";

pub const EN_BTN_OPEN: &str = "Open data...";
pub const EN_BTN_RELOAD_FIELDS: &str = "Reload fields";
pub const EN_BTN_BACK: &str = "Back";
pub const EN_BTN_INSERT: &str = "Insert";
pub const EN_BTN_SUMMON: &str = "@";

pub const EN_HOME_INSTRUCTIONS: &str =
    "Open a data file (.json/.json5/.gz), then press @ in a field or use the @ button.";

pub const EN_HEADING_FIELDS: &str = "Fields";
pub const EN_HEADING_SETTINGS: &str = "Settings";

pub const EN_SETTING_SHOW_BUTTON: &str = "Show autocomplete button";
pub const EN_SETTING_SHOW_BUTTON_HINT: &str =
    "Show a button on supported fields that opens the autocomplete popup.";
pub const EN_SETTING_DEBUG: &str = "Debug logging";
pub const EN_SETTING_DEBUG_HINT: &str = "Log navigation details to the console.";

pub const EN_COL_KEY: &str = "Key";
pub const EN_COL_VALUE: &str = "Value";

pub const EN_NO_CANDIDATES: &str = "No keys at this path.";
pub const EN_NO_DATA_FOR_FIELD: &str = "No data available for this field.";

pub const EN_EMPTY: &str = "";

// Literal renderings of candidate values.
pub const LITERAL_UNDEFINED: &str = "undefined";
pub const LITERAL_NULL: &str = "null";
pub const LITERAL_OBJECT: &str = "{}";

// Inserted references in roll-data modes start with this sigil.
pub const ROLL_KEY_PREFIX: &str = "@";

// Typing this character in a field opens the popup.
pub const HOTKEY_CHAR: &str = "@";

// Data mode names as written in field configuration.
pub const MODE_DOCUMENT: &str = "document";
pub const MODE_ENTITY: &str = "entity";
pub const MODE_ROLL: &str = "roll";
pub const MODE_OWNING_ACTOR: &str = "owning-actor";
pub const MODE_OWNING_ACTOR_ROLL: &str = "owning-actor-roll";
pub const MODE_CUSTOM: &str = "custom";

// Keys of a shaped entity snapshot.
pub const SNAPSHOT_DOCUMENT: &str = "document";
pub const SNAPSHOT_ROLL_DATA: &str = "rollData";
pub const SNAPSHOT_ACTOR: &str = "actor";

// Tracing filter directives.
pub const LOG_DIRECTIVE_DEFAULT: &str = "aip=info";
pub const LOG_DIRECTIVE_DEBUG: &str = "aip=debug";
