/// The shared runtime state: task group, output sink and import registry.
pub mod core;
/// Monitors: a mutual exclusion lock with a condition queue.
pub mod monitor;
/// Counting semaphores.
pub mod semaphore;
/// Tracked and detached background tasks.
pub mod task;
