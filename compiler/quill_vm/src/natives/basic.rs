//! Output, conversions, containers and heap control.

use quill_value::errors::{self, ScriptResult};
use quill_value::{to_f32, to_f64, to_i32, to_i64, Variant, MAX_ARRAY_LEN};

use super::arity;
use crate::context::{CallContext, Context, NativeFlags, NativeFn};

pub(super) fn install(ctx: &mut Context) {
    let table: &[(&str, NativeFn, NativeFlags)] = &[
        ("print", print, NativeFlags::empty()),
        ("tostring", tostring, NativeFlags::empty()),
        ("int", int, NativeFlags::PURE),
        ("long", long, NativeFlags::PURE),
        ("float", float, NativeFlags::PURE),
        ("double", double, NativeFlags::PURE),
        ("typeof", type_of, NativeFlags::empty()),
        ("nameof", nameof, NativeFlags::empty()),
        ("intern", intern, NativeFlags::empty()),
        ("hex", hex, NativeFlags::empty()),
        ("len", len, NativeFlags::PURE),
        ("object", object, NativeFlags::empty()),
        ("array", array, NativeFlags::empty()),
        ("range", range, NativeFlags::empty()),
        ("dir", dir, NativeFlags::empty()),
        ("collect", collect, NativeFlags::empty()),
        ("objcount", objcount, NativeFlags::empty()),
    ];
    for &(name, func, flags) in table {
        ctx.register_native(name, func, flags);
    }
}

fn print(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let line: String = args.iter().map(|arg| cx.display(arg)).collect();
    cx.println(&line);
    Ok(Variant::Null)
}

fn tostring(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "tostring(x)")?;
    if value.is_string() {
        return Ok(value);
    }
    let text = cx.display(&value);
    Ok(cx.heap().alloc_string(text))
}

fn int(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "int(x)")?;
    to_i32(&cx.heap(), value).map(Variant::Int32)
}

fn long(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "long(x)")?;
    to_i64(&cx.heap(), value).map(Variant::Int64)
}

fn float(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "float(x)")?;
    to_f32(&cx.heap(), value).map(Variant::Float32)
}

fn double(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "double(x)")?;
    to_f64(&cx.heap(), value).map(Variant::Float64)
}

fn type_of(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "typeof(x)")?;
    Ok(cx.heap().alloc_string(value.type_name()))
}

/// What kind of thing a value names: `{Literal}` for numbers and
/// strings, `{Native:name}` for natives.
fn nameof(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "nameof(x)")?;
    let name = match value {
        Variant::Int32(_)
        | Variant::Int64(_)
        | Variant::Float32(_)
        | Variant::Float64(_)
        | Variant::String(_) => "{Literal}".to_owned(),
        Variant::Object(_) => "{Object}".to_owned(),
        Variant::Array(_) => "{Array}".to_owned(),
        Variant::NativeFunction(id) => match cx.context().native(id) {
            Some(entry) => format!("{{Native:{}}}", entry.name),
            None => "{Native:Unknown}".to_owned(),
        },
        Variant::CodeAddress(_) => "{Function}".to_owned(),
        Variant::Null | Variant::ReturnLink(_) => "{Unknown}".to_owned(),
    };
    Ok(cx.heap().alloc_string(name))
}

/// The raw payload word of a value as `int64`: the bit pattern of a
/// number, the slot and generation of a heap handle, the id of a native
/// or the entry offset of a function.
fn intern(_: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "intern(x)")?;
    let word = match value {
        Variant::Null => 0,
        Variant::Int32(v) => i64::from(v),
        Variant::Int64(v) => v,
        Variant::Float32(v) => i64::from(v.to_bits()),
        Variant::Float64(v) => v.to_bits() as i64,
        Variant::String(h) | Variant::Object(h) | Variant::Array(h) => {
            (i64::from(h.generation()) << 32) | i64::from(h.index())
        }
        Variant::NativeFunction(id) => i64::from(id.0),
        Variant::CodeAddress(addr) => i64::from(addr),
        Variant::ReturnLink(link) => link as i64,
    };
    Ok(Variant::Int64(word))
}

fn hex(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "hex(x)")?;
    let text = match value {
        Variant::Int32(v) => format!("{:#x}", v as u32),
        Variant::Int64(v) => format!("{:#x}", v as u64),
        _ => return Err(errors::usage("Usage: hex(integer).")),
    };
    Ok(cx.heap().alloc_string(text))
}

fn len(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [value] = arity::<1>(args, "len(x)")?;
    let heap = cx.heap();
    let len = match value {
        Variant::String(handle) => heap.string(handle)?.chars().count(),
        Variant::Array(handle) => heap.array(handle)?.len(),
        Variant::Object(handle) => heap.object(handle)?.len(),
        other => return Err(errors::expected_kind("string, array or object", other.type_name())),
    };
    Ok(Variant::Int64(len as i64))
}

fn object(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [] = arity::<0>(args, "object()")?;
    Ok(cx.heap().alloc_object())
}

fn array(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    Ok(cx.heap().alloc_array(args.to_vec()))
}

/// `range(a, b)`: the integers `a, a + 1, .., b - 1`.
fn range(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    const USAGE: &str = "Usage: range(from, to).";
    let [from, to] = arity::<2>(args, "range(from, to)")?;
    let wide = matches!(from, Variant::Int64(_)) || matches!(to, Variant::Int64(_));
    let (start, end) = match (from, to) {
        (
            Variant::Int32(_) | Variant::Int64(_),
            Variant::Int32(_) | Variant::Int64(_),
        ) => {
            let heap = cx.heap();
            (to_i64(&heap, from)?, to_i64(&heap, to)?)
        }
        _ => return Err(errors::usage(USAGE)),
    };
    let count = end.saturating_sub(start).max(0);
    if count as u64 > MAX_ARRAY_LEN as u64 {
        return Err(errors::usage(format!(
            "range(from, to) would create {count} elements"
        )));
    }
    let elements = (start..end)
        .map(|i| if wide { Variant::Int64(i) } else { Variant::Int32(i as i32) })
        .collect();
    Ok(cx.heap().alloc_array(elements))
}

/// `dir()` lists every global name: variables, constants and natives.
/// `dir(obj)` lists an object's fields; any other value has none.
fn dir(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let mut names: Vec<String> = match args {
        [] => {
            let ctx = cx.context();
            ctx.global_names()
                .into_iter()
                .chain(ctx.constant_names())
                .chain(ctx.native_names())
                .map(str::to_owned)
                .collect()
        }
        [Variant::Object(handle)] => cx.heap().object(*handle)?.keys().map(str::to_owned).collect(),
        [_] => Vec::new(),
        _ => return Err(errors::usage("Usage: dir() or dir(x).")),
    };
    names.sort_unstable();
    names.dedup();
    let mut heap = cx.heap();
    let elements = names.into_iter().map(|name| heap.alloc_string(name)).collect();
    Ok(heap.alloc_array(elements))
}

fn collect(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [] = arity::<0>(args, "collect()")?;
    Ok(Variant::Int64(cx.collect() as i64))
}

fn objcount(cx: &mut CallContext<'_>, args: &[Variant]) -> ScriptResult<Variant> {
    let [] = arity::<0>(args, "objcount()")?;
    Ok(Variant::Int64(cx.heap().len() as i64))
}
