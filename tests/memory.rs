#[path = "memory/context.rs"]
mod context;
#[path = "memory/dedup.rs"]
mod dedup;
#[path = "memory/significance.rs"]
mod significance;
#[path = "memory/sqlite_persistence.rs"]
mod sqlite_persistence;
