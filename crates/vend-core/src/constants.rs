/// Smallest allowed demand window, in periods.
pub const WINDOW_MIN: u32 = 1;

/// Largest allowed demand window, in periods.
pub const WINDOW_MAX: u32 = 256;

/// Largest supported decimal precision for either asset.
///
/// 10^18 per whole unit is the common ceiling for fungible assets; capping
/// here keeps every scale factor and cross-scale product inside u128.
pub const MAX_DECIMALS: u32 = 18;
