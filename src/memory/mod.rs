pub mod context;
pub mod dedup;
pub mod embeddings;
pub mod factory;
pub mod in_memory;
pub mod keywords;
pub mod manager;
pub mod personal;
pub mod significance;
pub mod sqlite;
pub mod traits;
pub mod types;
pub mod vector;

pub use context::{ContextBundle, ContextLimits, FileContext};
pub use factory::create_store;
pub use in_memory::InMemoryStore;
pub use manager::{FactInsert, MemoryManager};
pub use sqlite::SqliteStore;
pub use traits::DocumentStore;
pub use types::{
    Document, DurableFact, FactSource, Interaction, InteractionKind, Metadata, MetadataFilter,
    Partition, Priority, Record, ReferenceItem, ReferenceSource, SystemSetting, Todo, TodoStatus,
};
