/// Quantity threshold for significant positions
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;
