/// Numeric conversion helpers.
///
/// Every number in the language is an `f64`. This module holds the checked
/// conversions needed where the runtime has to treat one as an index or an
/// integer: array positions, negative indices and the bitwise operators.
pub mod num;
