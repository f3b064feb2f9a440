pub mod aggregate;
pub mod exchange;
pub mod hierarchy;
pub mod tree;

pub use aggregate::{
    CategoryDto, CategoryLevels, CategoryRecord, DeletionCheck, HierarchyUpdate, MoveCategoryDto,
    MovePlan, PlannedUpdate, MAX_LEVELS,
};
pub use exchange::{ImportResult, RowError, CSV_HEADERS};
pub use hierarchy::HierarchyError;
pub use tree::{CategoryTreeNode, HierarchyStats, LevelCount};
