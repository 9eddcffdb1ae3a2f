use std::fmt;

/// Rejected sale parameters. Detected before any state exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroPeriod,
    ZeroTarget,
    WindowOutOfRange(u32),
    MaxBelowTarget { max: u128, target: u128 },
    DecimalsOutOfRange(u32),
    /// An amount does not fit the internal fixed-point scale.
    AmountOutOfRange(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroPeriod => write!(f, "period length must be non-zero"),
            ConfigError::ZeroTarget => write!(f, "target per period must be non-zero"),
            ConfigError::WindowOutOfRange(w) => {
                write!(f, "window size {w} outside 1..=256")
            }
            ConfigError::MaxBelowTarget { max, target } => {
                write!(f, "max per period {max} below target {target}")
            }
            ConfigError::DecimalsOutOfRange(d) => {
                write!(f, "decimal precision {d} exceeds 18")
            }
            ConfigError::AmountOutOfRange(field) => {
                write!(f, "{field} does not fit the internal scale")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settlement failure. The purchase aborts with no state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Native currency attached to the call does not cover the cost.
    InsufficientFunds { required: u128, provided: u128 },
    /// The transfer collaborator reported failure.
    TransferFailed(String),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentError::InsufficientFunds { required, provided } => {
                write!(f, "insufficient funds: required {required}, provided {provided}")
            }
            PaymentError::TransferFailed(reason) => write!(f, "transfer failed: {reason}"),
        }
    }
}

impl std::error::Error for PaymentError {}

/// Defensive arithmetic failures that validated configurations cannot
/// reach. Never clamped over: if one fires, the call aborts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    Overflow(&'static str),
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantError::Overflow(what) => write!(f, "arithmetic overflow in {what}"),
        }
    }
}

impl std::error::Error for InvariantError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleError {
    Config(ConfigError),
    Payment(PaymentError),
    Invariant(InvariantError),
}

impl fmt::Display for SaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleError::Config(e) => write!(f, "configuration error: {e}"),
            SaleError::Payment(e) => write!(f, "payment error: {e}"),
            SaleError::Invariant(e) => write!(f, "invariant error: {e}"),
        }
    }
}

impl std::error::Error for SaleError {}

impl From<ConfigError> for SaleError {
    fn from(e: ConfigError) -> Self {
        SaleError::Config(e)
    }
}

impl From<PaymentError> for SaleError {
    fn from(e: PaymentError) -> Self {
        SaleError::Payment(e)
    }
}

impl From<InvariantError> for SaleError {
    fn from(e: InvariantError) -> Self {
        SaleError::Invariant(e)
    }
}

pub type Result<T> = std::result::Result<T, SaleError>;
