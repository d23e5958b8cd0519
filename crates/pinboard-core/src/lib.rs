pub mod backend;
pub mod config_file;
pub mod extract;
pub mod settings;
pub mod tree;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend, PdfDocument};
pub use extract::{ExtractError, ExtractRequest, ExtractionWorker, WorkerMessage, extract_text};
pub use settings::{JsonFileStore, SettingsError, SettingsStore, UiSettings, update_pinned};
pub use tree::{
    OutlineEntry, OutlineRow, PinnedItem, PinnedTree, add_category, add_model_to_tree,
    get_pinned_model_ids, is_pinned, move_model_to_category, move_top_level, outline,
    remove_model_from_tree, rename_category, retain_known, toggle_pin,
};
