//! Persistence and discovery services.
//!
//! Each store owns one JSON document under the config directory. The scanner
//! discovers model files on disk.

pub mod layout;
pub mod profiles;
pub mod scanner;
pub mod settings;
pub mod store;
pub mod theme;

pub use layout::LayoutStore;
pub use profiles::ProfileStore;
pub use scanner::{ModelScanner, ScanResult};
pub use settings::{Settings, SettingsStore};
pub use theme::{ThemeDocument, ThemeSection, ThemeStore};
