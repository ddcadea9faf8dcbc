//! Core library for AIP (Autocomplete Inline Properties).
//! Suggests dotted property paths from a live data tree while the user types into a form
//! field, and inserts the completed reference on confirmation.

pub mod config;
mod error;
pub mod getter;
mod gui;
pub mod logging;
pub mod navigator;
pub mod resolver;
pub mod session;
mod source;
pub mod statics;
mod value;

pub use config::{FieldConfig, PackageConfig, ResolvedField, SessionConfig, Settings};
pub use error::AipError;
pub use getter::{DataGetter, DataMode, DataTarget, Entity};
pub use gui::run_gui;
pub use navigator::{Cycle, PathNavigator, PopupView, ViewEntry};
pub use resolver::Candidate;
pub use session::{ActiveSlot, AnchorField, Session, TextAnchor};
pub use source::{DataFormat, LoadedData};
pub use value::{DataValue, Number, format_value};
