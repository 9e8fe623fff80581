use pretty_assertions::assert_eq;

use quill_value::ScriptError;

use crate::context::{CallContext, Context};
use crate::print_handler::buffer_handler;
use quill_value::Variant;

fn call(ctx: &mut Context, name: &str, args: &[Variant]) -> Result<Variant, ScriptError> {
    let id = ctx.native_id(name).unwrap();
    let func = ctx.native(id).unwrap().func;
    func(&mut CallContext::new(ctx, &[]), args)
}

fn text(ctx: &Context, value: Variant) -> String {
    ctx.display(&value)
}

fn context() -> Context {
    Context::new().with_print_handler(buffer_handler())
}

#[test]
fn usage_errors_name_the_shape() {
    let mut ctx = context();
    let err = call(&mut ctx, "sqrt", &[]).unwrap_err();
    assert_eq!(err.to_string(), "Usage: sqrt(x).");
    assert_eq!(err.kind_name(), "UsageError");
    let err = call(&mut ctx, "pow", &[Variant::Int32(1)]).unwrap_err();
    assert_eq!(err.to_string(), "Usage: pow(x, y).");
    let err = call(&mut ctx, "object", &[Variant::Null]).unwrap_err();
    assert_eq!(err.to_string(), "Usage: object().");
}

#[test]
fn unary_math_keeps_float32() {
    let mut ctx = context();
    assert_eq!(
        call(&mut ctx, "sqrt", &[Variant::Float32(4.0)]),
        Ok(Variant::Float32(2.0))
    );
    assert_eq!(
        call(&mut ctx, "sqrt", &[Variant::Int64(9)]),
        Ok(Variant::Float64(3.0))
    );
    assert_eq!(
        call(&mut ctx, "floor", &[Variant::Float64(-1.5)]),
        Ok(Variant::Float64(-2.0))
    );
    assert!(call(&mut ctx, "sqrt", &[Variant::Null]).is_err());
}

#[test]
fn abs_keeps_integers() {
    let mut ctx = context();
    assert_eq!(call(&mut ctx, "abs", &[Variant::Int32(-3)]), Ok(Variant::Int32(3)));
    assert_eq!(call(&mut ctx, "abs", &[Variant::Int64(-3)]), Ok(Variant::Int64(3)));
    assert_eq!(
        call(&mut ctx, "abs", &[Variant::Float64(-0.5)]),
        Ok(Variant::Float64(0.5))
    );
}

#[test]
fn binary_math() {
    let mut ctx = context();
    assert_eq!(
        call(&mut ctx, "pow", &[Variant::Int32(2), Variant::Int32(10)]),
        Ok(Variant::Float64(1024.0))
    );
    assert_eq!(
        call(&mut ctx, "fmod", &[Variant::Float64(7.5), Variant::Int32(2)]),
        Ok(Variant::Float64(1.5))
    );
    assert_eq!(
        call(&mut ctx, "fmax", &[Variant::Float32(1.0), Variant::Float32(2.0)]),
        Ok(Variant::Float32(2.0))
    );
}

#[test]
fn extended_math() {
    let mut ctx = context();
    let close = |value: Variant, expected: f64| match value {
        Variant::Float64(v) => assert!((v - expected).abs() < 1e-9, "{v} != {expected}"),
        other => panic!("expected float64, got {other:?}"),
    };
    close(call(&mut ctx, "fabs", &[Variant::Int32(-2)]).unwrap(), 2.0);
    close(call(&mut ctx, "exp2", &[Variant::Int32(10)]).unwrap(), 1024.0);
    close(call(&mut ctx, "expm1", &[Variant::Int32(0)]).unwrap(), 0.0);
    close(call(&mut ctx, "log1p", &[Variant::Int32(0)]).unwrap(), 0.0);
    close(call(&mut ctx, "asinh", &[Variant::Int32(0)]).unwrap(), 0.0);
    close(call(&mut ctx, "logb", &[Variant::Int32(10)]).unwrap(), 3.0);
    close(call(&mut ctx, "rint", &[Variant::Float64(2.5)]).unwrap(), 2.0);
    close(call(&mut ctx, "nearbyint", &[Variant::Float64(3.5)]).unwrap(), 4.0);
    close(call(&mut ctx, "erf", &[Variant::Int32(0)]).unwrap(), 0.0);
    close(call(&mut ctx, "erfc", &[Variant::Int32(0)]).unwrap(), 1.0);
    close(call(&mut ctx, "tgamma", &[Variant::Int32(5)]).unwrap(), 24.0);
    close(call(&mut ctx, "lgamma", &[Variant::Int32(1)]).unwrap(), 0.0);
    close(call(&mut ctx, "fdim", &[Variant::Int32(2), Variant::Int32(5)]).unwrap(), 0.0);
    close(call(&mut ctx, "fdim", &[Variant::Int32(5), Variant::Int32(2)]).unwrap(), 3.0);
    close(call(&mut ctx, "remainder", &[Variant::Int32(7), Variant::Int32(4)]).unwrap(), -1.0);
    close(call(&mut ctx, "copysign", &[Variant::Int32(3), Variant::Int32(-1)]).unwrap(), -3.0);
    assert_eq!(
        call(&mut ctx, "logb", &[Variant::Int32(0)]),
        Ok(Variant::Float64(f64::NEG_INFINITY))
    );
    let err = call(&mut ctx, "erf", &[]).unwrap_err();
    assert_eq!(err.to_string(), "Usage: erf(x).");
}

#[test]
fn quiet_comparisons() {
    let mut ctx = context();
    let nan = ctx.lookup("NaN");
    let (one, two) = (Variant::Int32(1), Variant::Float64(2.0));
    let truth = |v: bool| -> Result<Variant, ScriptError> { Ok(Variant::from_bool(v)) };
    assert_eq!(call(&mut ctx, "isgreater", &[two, one]), truth(true));
    assert_eq!(call(&mut ctx, "isgreaterequal", &[one, one]), truth(true));
    assert_eq!(call(&mut ctx, "isless", &[two, one]), truth(false));
    assert_eq!(call(&mut ctx, "islessequal", &[one, two]), truth(true));
    assert_eq!(call(&mut ctx, "islessgreater", &[one, one]), truth(false));
    assert_eq!(call(&mut ctx, "islessgreater", &[one, two]), truth(true));
    assert_eq!(call(&mut ctx, "isunordered", &[one, two]), truth(false));
    for name in ["isgreater", "isless", "islessgreater"] {
        assert_eq!(call(&mut ctx, name, &[nan, one]), truth(false), "{name}");
    }
    assert_eq!(call(&mut ctx, "isunordered", &[nan, one]), truth(true));
    let err = call(&mut ctx, "isless", &[one]).unwrap_err();
    assert_eq!(err.to_string(), "Usage: isless(x, y).");
}

#[test]
fn classification() {
    let mut ctx = context();
    let nan = ctx.lookup("NaN");
    let inf = ctx.lookup("Inf");
    assert_eq!(call(&mut ctx, "isnan", &[nan]), Ok(Variant::Int32(1)));
    assert_eq!(call(&mut ctx, "isinf", &[inf]), Ok(Variant::Int32(1)));
    assert_eq!(call(&mut ctx, "isfinite", &[inf]), Ok(Variant::Int32(0)));
    assert_eq!(call(&mut ctx, "isnormal", &[Variant::Int32(0)]), Ok(Variant::Int32(1)));
    assert_eq!(call(&mut ctx, "isnormal", &[Variant::Float64(0.0)]), Ok(Variant::Int32(0)));
    assert_eq!(call(&mut ctx, "isnormal", &[Variant::Float32(1.0)]), Ok(Variant::Int32(1)));
    assert_eq!(call(&mut ctx, "isnormal", &[nan]), Ok(Variant::Int32(0)));
}

#[test]
fn conversions() {
    let mut ctx = context();
    let s = ctx.heap().alloc_string(" 42 ");
    assert_eq!(call(&mut ctx, "int", &[s]), Ok(Variant::Int32(42)));
    assert_eq!(call(&mut ctx, "long", &[Variant::Float64(2.9)]), Ok(Variant::Int64(2)));
    assert_eq!(call(&mut ctx, "double", &[Variant::Int32(2)]), Ok(Variant::Float64(2.0)));
    assert_eq!(call(&mut ctx, "float", &[Variant::Int32(2)]), Ok(Variant::Float32(2.0)));
    let bad = ctx.heap().alloc_string("abc");
    assert_eq!(call(&mut ctx, "int", &[bad]).unwrap_err().kind_name(), "ConversionError");
}

#[test]
fn text_natives() {
    let mut ctx = context();
    let value = call(&mut ctx, "tostring", &[Variant::Int32(5)]).unwrap();
    assert_eq!(text(&ctx, value), "5");
    let value = call(&mut ctx, "typeof", &[Variant::Float32(1.0)]).unwrap();
    assert_eq!(text(&ctx, value), "float32");
    let value = call(&mut ctx, "hex", &[Variant::Int32(255)]).unwrap();
    assert_eq!(text(&ctx, value), "0xff");
    let value = call(&mut ctx, "hex", &[Variant::Int32(-1)]).unwrap();
    assert_eq!(text(&ctx, value), "0xffffffff");
}

#[test]
fn containers() {
    let mut ctx = context();
    let array = call(&mut ctx, "array", &[Variant::Int32(1), Variant::Null]).unwrap();
    assert_eq!(call(&mut ctx, "len", &[array]), Ok(Variant::Int64(2)));

    let range = call(&mut ctx, "range", &[Variant::Int32(3), Variant::Int32(6)]).unwrap();
    let Variant::Array(handle) = range else {
        panic!("range returns an array");
    };
    let elements: Vec<Variant> = ctx.heap().array(handle).unwrap().iter().collect();
    assert_eq!(
        elements,
        [Variant::Int32(3), Variant::Int32(4), Variant::Int32(5)]
    );
    let empty = call(&mut ctx, "range", &[Variant::Int32(6), Variant::Int32(3)]).unwrap();
    assert_eq!(call(&mut ctx, "len", &[empty]), Ok(Variant::Int64(0)));

    let word = ctx.heap().alloc_string("héllo");
    assert_eq!(call(&mut ctx, "len", &[word]), Ok(Variant::Int64(5)));
    assert!(call(&mut ctx, "len", &[Variant::Int32(1)]).is_err());
}

fn strings_of(ctx: &Context, array: Variant) -> Vec<String> {
    let Variant::Array(handle) = array else {
        panic!("expected an array, got {array:?}");
    };
    let heap = ctx.heap();
    heap.array(handle)
        .unwrap()
        .iter()
        .map(|v| heap.display(&v))
        .collect()
}

#[test]
fn dir_lists_every_global_name() {
    let mut ctx = context();
    ctx.set_global("zeta", Variant::Int32(1)).unwrap();
    ctx.set_global("alpha", Variant::Int32(2)).unwrap();
    let names = call(&mut ctx, "dir", &[]).unwrap();
    assert_eq!(text(&ctx, names), "{Array}");

    let listed = strings_of(&ctx, names);
    for expected in ["alpha", "zeta", "Pi", "NaN", "print", "sqrt", "dir"] {
        assert!(listed.iter().any(|n| n == expected), "{expected} missing from {listed:?}");
    }
    let mut sorted = listed.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(listed, sorted);
}

#[test]
fn dir_of_a_value_lists_its_fields() {
    let mut ctx = context();
    let object = call(&mut ctx, "object", &[]).unwrap();
    let Variant::Object(handle) = object else {
        panic!("object() returns an object");
    };
    {
        let mut heap = ctx.heap();
        let fields = heap.object_mut(handle).unwrap();
        fields.set("b", Variant::Int32(2));
        fields.set("a", Variant::Null);
    }
    let fields = call(&mut ctx, "dir", &[object]).unwrap();
    assert_eq!(strings_of(&ctx, fields), ["a", "b"]);

    let none = call(&mut ctx, "dir", &[Variant::Int32(3)]).unwrap();
    assert!(strings_of(&ctx, none).is_empty());
    let err = call(&mut ctx, "dir", &[Variant::Null, Variant::Null]).unwrap_err();
    assert_eq!(err.to_string(), "Usage: dir() or dir(x).");
}

#[test]
fn nameof_describes_the_value() {
    let mut ctx = context();
    let print = ctx.lookup("print");
    let word = ctx.heap().alloc_string("w");
    let object = call(&mut ctx, "object", &[]).unwrap();
    let cases = [
        (Variant::Float64(1.5), "{Literal}"),
        (word, "{Literal}"),
        (object, "{Object}"),
        (print, "{Native:print}"),
        (Variant::CodeAddress(8), "{Function}"),
        (Variant::Null, "{Unknown}"),
    ];
    for (value, expected) in cases {
        let name = call(&mut ctx, "nameof", &[value]).unwrap();
        assert_eq!(text(&ctx, name), expected);
    }
    assert!(call(&mut ctx, "nameof", &[]).is_err());
}

#[test]
fn intern_exposes_the_payload_word() {
    let mut ctx = context();
    assert_eq!(call(&mut ctx, "intern", &[Variant::Int32(-2)]), Ok(Variant::Int64(-2)));
    assert_eq!(
        call(&mut ctx, "intern", &[Variant::Float64(1.0)]),
        Ok(Variant::Int64(0x3FF0_0000_0000_0000))
    );
    assert_eq!(call(&mut ctx, "intern", &[Variant::Null]), Ok(Variant::Int64(0)));

    let first = call(&mut ctx, "object", &[]).unwrap();
    let second = call(&mut ctx, "object", &[]).unwrap();
    let a = call(&mut ctx, "intern", &[first]).unwrap();
    assert_eq!(call(&mut ctx, "intern", &[first]), Ok(a));
    assert_ne!(call(&mut ctx, "intern", &[second]), Ok(a));
}

#[test]
fn heap_control() {
    let mut ctx = context();
    call(&mut ctx, "object", &[]).unwrap();
    assert_eq!(call(&mut ctx, "objcount", &[]), Ok(Variant::Int64(1)));
    assert_eq!(call(&mut ctx, "collect", &[]), Ok(Variant::Int64(1)));
    assert_eq!(call(&mut ctx, "objcount", &[]), Ok(Variant::Int64(0)));
}

#[test]
fn print_joins_arguments() {
    let mut ctx = context();
    let s = ctx.heap().alloc_string("x=");
    call(&mut ctx, "print", &[s, Variant::Int32(1)]).unwrap();
    call(&mut ctx, "print", &[]).unwrap();
    assert_eq!(ctx.print_handler().output(), "x=1\n\n");
}
