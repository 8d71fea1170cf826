/// The `Value` enum and its conversions, truthiness and equality rules.
pub mod core;
/// Callable values: closures over a scope and native builtins.
pub mod function;
/// Classes and their instances.
///
/// A class resolves its inherited fields and methods once, when it is
/// declared. Instances own a scope holding their fields, their bound methods
/// and the `self`/`this`/`super` names.
pub mod object;
