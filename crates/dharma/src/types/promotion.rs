//! The conversion table from SPEC_FULL §4.1, used both by the parser's
//! annotation folding and the interpreter's binary-op promotion.

use super::big_decimal::BigDecimal;
use super::integer::Integer;
use super::literal::LiteralValue;

/// Attempts to promote `value` to the dynamic type named by `target`.
/// Returns `None` when the pair is not in the conversion table. On success,
/// the second element is `true` exactly when this was a genuine (non-
/// identity) conversion — callers emit an `ImplicitConversionWarning` for
/// those.
pub fn promote(value: &LiteralValue, target: &str) -> Option<(LiteralValue, bool)> {
    if value.type_tag() == target {
        return Some((value.clone(), false));
    }
    let promoted = match (value, target) {
        (LiteralValue::Nil, "integer") => LiteralValue::Integer(Integer::zero()),
        (LiteralValue::Nil, "decimal") => LiteralValue::Decimal(0.0),
        (LiteralValue::Nil, "BigDecimal") => LiteralValue::BigDecimal(BigDecimal::zero()),
        (LiteralValue::Nil, "boolean") => LiteralValue::Boolean(false),
        (LiteralValue::Boolean(b), "integer") => LiteralValue::Integer(Integer::from_bool(*b)),
        (LiteralValue::Boolean(b), "decimal") => {
            LiteralValue::Decimal(if *b { 1.0 } else { 0.0 })
        }
        (LiteralValue::Boolean(b), "BigDecimal") => {
            LiteralValue::BigDecimal(BigDecimal::from_integer(&Integer::from_bool(*b)))
        }
        (LiteralValue::Integer(i), "decimal") => LiteralValue::Decimal(i.to_f64()),
        (LiteralValue::Integer(i), "BigDecimal") => {
            LiteralValue::BigDecimal(BigDecimal::from_integer(i))
        }
        (LiteralValue::Integer(i), "boolean") => LiteralValue::Boolean(!i.is_zero()),
        (LiteralValue::Decimal(d), "integer") => LiteralValue::Integer(decimal_to_integer(*d)),
        (LiteralValue::Decimal(d), "BigDecimal") => {
            LiteralValue::BigDecimal(BigDecimal::from_f64(*d))
        }
        (LiteralValue::BigDecimal(bd), "integer") => LiteralValue::Integer(bd.to_integer()),
        (LiteralValue::BigDecimal(bd), "decimal") => LiteralValue::Decimal(bd.to_f64()),
        _ => return None,
    };
    Some((promoted, true))
}

fn decimal_to_integer(d: f64) -> Integer {
    BigDecimal::from_f64(d).truncate(0).to_integer()
}
