//! Math constants and functions.
//!
//! Results are `Float64` unless every argument is `Float32`. `abs` keeps
//! integer kinds. The `is*` tests answer with `true`/`false`. Special
//! functions with no `f64` method (`erf`, `lgamma` and friends) come from
//! `libm`.

use quill_value::errors::{self, ScriptResult};
use quill_value::Variant;

use super::{arity, as_f64};
use crate::context::{CallContext, Context, NativeFlags, NativeFn};

pub(super) fn install(ctx: &mut Context) {
    ctx.register_constant("Pi", Variant::Float64(std::f64::consts::PI));
    ctx.register_constant("E", Variant::Float64(std::f64::consts::E));
    ctx.register_constant("NaN", Variant::Float64(f64::NAN));
    ctx.register_constant("Inf", Variant::Float64(f64::INFINITY));

    for &(name, func) in UNARY.iter().chain(BINARY).chain(OTHER) {
        ctx.register_native(name, func, NativeFlags::PURE);
    }
}

fn unary(args: &[Variant], name: &str, f: fn(f64) -> f64) -> ScriptResult<Variant> {
    let [x] = arity::<1>(args, &format!("{name}(x)"))?;
    match x {
        Variant::Float32(v) => Ok(Variant::Float32(f(f64::from(v)) as f32)),
        other => as_f64(other)
            .map(|v| Variant::Float64(f(v)))
            .ok_or_else(|| errors::usage(format!("Usage: {name}(x)."))),
    }
}

fn binary(args: &[Variant], name: &str, f: fn(f64, f64) -> f64) -> ScriptResult<Variant> {
    let usage = || errors::usage(format!("Usage: {name}(x, y)."));
    let [x, y] = arity::<2>(args, &format!("{name}(x, y)"))?;
    if let (Variant::Float32(a), Variant::Float32(b)) = (x, y) {
        return Ok(Variant::Float32(f(f64::from(a), f64::from(b)) as f32));
    }
    let (a, b) = (as_f64(x).ok_or_else(usage)?, as_f64(y).ok_or_else(usage)?);
    Ok(Variant::Float64(f(a, b)))
}

macro_rules! unary_natives {
    ($($name:ident => $f:expr;)*) => {
        $(
            fn $name(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
                unary(args, stringify!($name), $f)
            }
        )*
        const UNARY: &[(&str, NativeFn)] = &[$((stringify!($name), $name),)*];
    };
}

macro_rules! binary_natives {
    ($($name:ident => $f:expr;)*) => {
        $(
            fn $name(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
                binary(args, stringify!($name), $f)
            }
        )*
        const BINARY: &[(&str, NativeFn)] = &[$((stringify!($name), $name),)*];
    };
}

unary_natives! {
    acos => f64::acos;
    asin => f64::asin;
    atan => f64::atan;
    ceil => f64::ceil;
    cos => f64::cos;
    cosh => f64::cosh;
    exp => f64::exp;
    floor => f64::floor;
    log => f64::ln;
    log10 => f64::log10;
    log2 => f64::log2;
    sin => f64::sin;
    sinh => f64::sinh;
    sqrt => f64::sqrt;
    tan => f64::tan;
    tanh => f64::tanh;
    cbrt => f64::cbrt;
    round => f64::round;
    trunc => f64::trunc;
    fabs => f64::abs;
    acosh => f64::acosh;
    asinh => f64::asinh;
    atanh => f64::atanh;
    expm1 => f64::exp_m1;
    exp2 => f64::exp2;
    log1p => f64::ln_1p;
    logb => exponent_of;
    rint => libm::rint;
    nearbyint => libm::rint;
    erf => libm::erf;
    erfc => libm::erfc;
    lgamma => libm::lgamma;
    tgamma => libm::tgamma;
}

binary_natives! {
    atan2 => f64::atan2;
    pow => f64::powf;
    fmod => |a, b| a % b;
    fmin => f64::min;
    fmax => f64::max;
    hypot => f64::hypot;
    fdim => libm::fdim;
    remainder => libm::remainder;
    copysign => f64::copysign;
}

/// Unbiased binary exponent of `x`, as a float.
fn exponent_of(x: f64) -> f64 {
    if x == 0.0 {
        f64::NEG_INFINITY
    } else if x.is_finite() {
        f64::from(libm::ilogb(x))
    } else {
        x.abs()
    }
}

const OTHER: &[(&str, NativeFn)] = &[
    ("abs", abs),
    ("isnan", isnan),
    ("isinf", isinf),
    ("isfinite", isfinite),
    ("isnormal", isnormal),
    ("isgreater", isgreater),
    ("isgreaterequal", isgreaterequal),
    ("isless", isless),
    ("islessequal", islessequal),
    ("islessgreater", islessgreater),
    ("isunordered", isunordered),
];

fn abs(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    match arity::<1>(args, "abs(x)")? {
        [Variant::Int32(v)] => Ok(Variant::Int32(v.wrapping_abs())),
        [Variant::Int64(v)] => Ok(Variant::Int64(v.wrapping_abs())),
        _ => unary(args, "abs", f64::abs),
    }
}

fn classify(args: &[Variant], name: &str, test: fn(f64) -> bool) -> ScriptResult<Variant> {
    let [x] = arity::<1>(args, &format!("{name}(x)"))?;
    as_f64(x)
        .map(|v| Variant::from_bool(test(v)))
        .ok_or_else(|| errors::usage(format!("Usage: {name}(x).")))
}

fn isnan(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    classify(args, "isnan", f64::is_nan)
}

fn isinf(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    classify(args, "isinf", f64::is_infinite)
}

fn isfinite(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    classify(args, "isfinite", f64::is_finite)
}

/// Integers are always normal, zero included.
fn isnormal(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    match arity::<1>(args, "isnormal(x)")? {
        [Variant::Int32(_) | Variant::Int64(_)] => Ok(Variant::from_bool(true)),
        [Variant::Float32(v)] => Ok(Variant::from_bool(v.is_normal())),
        _ => classify(args, "isnormal", f64::is_normal),
    }
}

/// Quiet comparisons: a NaN operand makes every test but `isunordered`
/// false instead of raising.
fn compare(args: &[Variant], name: &str, test: fn(f64, f64) -> bool) -> ScriptResult<Variant> {
    let usage = || errors::usage(format!("Usage: {name}(x, y)."));
    let [x, y] = arity::<2>(args, &format!("{name}(x, y)"))?;
    let (a, b) = (as_f64(x).ok_or_else(usage)?, as_f64(y).ok_or_else(usage)?);
    Ok(Variant::from_bool(test(a, b)))
}

fn isgreater(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    compare(args, "isgreater", |a, b| a > b)
}

fn isgreaterequal(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    compare(args, "isgreaterequal", |a, b| a >= b)
}

fn isless(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    compare(args, "isless", |a, b| a < b)
}

fn islessequal(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    compare(args, "islessequal", |a, b| a <= b)
}

fn islessgreater(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    compare(args, "islessgreater", |a, b| a < b || a > b)
}

fn isunordered(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    compare(args, "isunordered", |a, b| a.is_nan() || b.is_nan())
}
