pub mod selection;
pub mod state;

pub use selection::{HierarchySelection, Level};
pub use state::{Action, Browsing, CreateForm, LevelOptions, Navigator, Notice, ViewState};
