//! Comparison helpers over runtime values
//!
//! Built-in orderings exist for same-typed numbers, strings and
//! booleans, and `None` equals `None`. Instances participate through
//! their `__eq__` and `__lt__` methods; every other combination
//! refuses to compare. The remaining comparators derive from `equal`
//! and `less`.

use crate::error::RuntimeError;
use crate::runtime::{Context, Handle};

/// `lhs == rhs`
pub fn equal(lhs: &Handle, rhs: &Handle, ctx: &mut Context) -> Result<bool, RuntimeError> {
    if lhs.is_none() && rhs.is_none() {
        return Ok(true);
    }
    if let (Some(left), Some(right)) = (lhs.as_string(), rhs.as_string()) {
        return Ok(left == right);
    }
    if let (Some(left), Some(right)) = (lhs.as_number(), rhs.as_number()) {
        return Ok(left == right);
    }
    if let (Some(left), Some(right)) = (lhs.as_bool(), rhs.as_bool()) {
        return Ok(left == right);
    }
    if lhs.has_method("__eq__", 1) {
        return Ok(lhs.call_method("__eq__", &[rhs.clone()], ctx)?.is_truthy());
    }
    Err(RuntimeError::CannotCompare("equality"))
}

/// `lhs < rhs`
pub fn less(lhs: &Handle, rhs: &Handle, ctx: &mut Context) -> Result<bool, RuntimeError> {
    if let (Some(left), Some(right)) = (lhs.as_string(), rhs.as_string()) {
        return Ok(left < right);
    }
    if let (Some(left), Some(right)) = (lhs.as_number(), rhs.as_number()) {
        return Ok(left < right);
    }
    if let (Some(left), Some(right)) = (lhs.as_bool(), rhs.as_bool()) {
        return Ok(!left && right);
    }
    if lhs.has_method("__lt__", 1) {
        return Ok(lhs.call_method("__lt__", &[rhs.clone()], ctx)?.is_truthy());
    }
    Err(RuntimeError::CannotCompare("less"))
}

/// `lhs != rhs`
pub fn not_equal(lhs: &Handle, rhs: &Handle, ctx: &mut Context) -> Result<bool, RuntimeError> {
    Ok(!equal(lhs, rhs, ctx)?)
}

/// `lhs > rhs`
pub fn greater(lhs: &Handle, rhs: &Handle, ctx: &mut Context) -> Result<bool, RuntimeError> {
    Ok(!(less(lhs, rhs, ctx)? || equal(lhs, rhs, ctx)?))
}

/// `lhs <= rhs`
pub fn less_or_equal(lhs: &Handle, rhs: &Handle, ctx: &mut Context) -> Result<bool, RuntimeError> {
    Ok(!greater(lhs, rhs, ctx)?)
}

/// `lhs >= rhs`
pub fn greater_or_equal(
    lhs: &Handle,
    rhs: &Handle,
    ctx: &mut Context,
) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, ctx)?)
}
