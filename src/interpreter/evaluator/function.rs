/// General purpose builtins: printing, conversion and inspection.
pub mod builtin;
/// Task spawning and the semaphore and monitor builtins.
pub mod concurrency;
/// Builtin tables, registration and call dispatch.
pub mod core;
/// The math builtins, available globally and as the `math` module.
pub mod math;
/// Native methods on arrays, strings and maps.
pub mod methods;
