use super::{Registry, TypeTag, num};
use crate::error::RuntimeError;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;

const N: &[TypeTag] = &[TypeTag::Number];
const NN: &[TypeTag] = &[TypeTag::Number, TypeTag::Number];
const NNN: &[TypeTag] = &[TypeTag::Number, TypeTag::Number, TypeTag::Number];

macro_rules! unary {
    ($method:ident) => {{
        fn call(
            _: &mut Interpreter<'_>,
            args: &[Value],
            line: usize,
        ) -> Result<Value, RuntimeError> {
            Ok(Value::Number(num(line, args, 0)?.$method()))
        }
        call
    }};
}

pub(super) fn register(reg: &mut Registry) {
    reg.add("sin",   N, unary!(sin));
    reg.add("cos",   N, unary!(cos));
    reg.add("tan",   N, unary!(tan));
    reg.add("asin",  N, unary!(asin));
    reg.add("acos",  N, unary!(acos));
    reg.add("atan",  N, unary!(atan));
    reg.add("sqrt",  N, unary!(sqrt));
    reg.add("abs",   N, unary!(abs));
    reg.add("floor", N, unary!(floor));
    reg.add("ceil",  N, unary!(ceil));
    reg.add("round", N, unary!(round));
    reg.add("fract", N, unary!(fract));

    reg.add("sign", N, |_, args, line| {
        let v = num(line, args, 0)?;
        Ok(Value::Number(if v == 0.0 { 0.0 } else { v.signum() }))
    });

    reg.add("atan2", NN, |_, args, line| {
        Ok(Value::Number(num(line, args, 0)?.atan2(num(line, args, 1)?)))
    });
    reg.add("pow", NN, |_, args, line| {
        Ok(Value::Number(num(line, args, 0)?.powf(num(line, args, 1)?)))
    });
    reg.add("hypot", NN, |_, args, line| {
        Ok(Value::Number(num(line, args, 0)?.hypot(num(line, args, 1)?)))
    });
    reg.add("min", NN, |_, args, line| {
        Ok(Value::Number(num(line, args, 0)?.min(num(line, args, 1)?)))
    });
    reg.add("max", NN, |_, args, line| {
        Ok(Value::Number(num(line, args, 0)?.max(num(line, args, 1)?)))
    });

    reg.add("clamp", NNN, |_, args, line| {
        let v = num(line, args, 0)?;
        let lo = num(line, args, 1)?;
        let hi = num(line, args, 2)?;
        Ok(Value::Number(v.clamp(lo, hi.max(lo))))
    });
}
