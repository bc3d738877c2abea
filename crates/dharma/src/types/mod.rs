//! The numeric tower and the closed literal-value representation (SPEC_FULL
//! §4.1 and §3).

pub mod big_decimal;
pub mod integer;
pub mod literal;
pub mod promotion;

pub use big_decimal::BigDecimal;
pub use integer::Integer;
pub use literal::{DeclaredType, LiteralValue, clean_decimal};
pub use promotion::promote;
