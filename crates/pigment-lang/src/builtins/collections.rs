use std::cmp::Ordering;

use super::{Registry, TypeTag, function, kernel, list};
use crate::error::RuntimeError;
use crate::runtime::ops;
use crate::runtime::value::Value;

pub(super) fn register(reg: &mut Registry) {
    // every sort clones first; the original collection is untouched
    reg.add("sort", &[TypeTag::Kernel], |_, args, line| {
        let k = kernel(line, args, 0)?;
        let mut sorted = k.borrow().clone();
        sorted.values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Ok(Value::kernel(sorted))
    });

    reg.add("sort", &[TypeTag::List], |_, args, line| {
        let items = list(line, args, 0)?;
        let mut sorted = items.borrow().clone();
        fallible_sort(&mut sorted, |a, b| {
            ops::compare(a, b).map(sign_to_ordering).ok_or_else(|| {
                RuntimeError::new(line, format!(
                    "cannot order {} and {}", a.type_name(), b.type_name()))
            })
        })?;
        Ok(Value::list(sorted))
    });

    // sort(list, fn): the comparator returns a signed number
    reg.add("sort", &[TypeTag::List, TypeTag::Function], |interp, args, line| {
        let items = list(line, args, 0)?;
        let cmp = function(line, args, 1)?;
        let mut sorted = items.borrow().clone();
        fallible_sort(&mut sorted, |a, b| {
            match interp.call_function(line, &cmp, &[a.clone(), b.clone()])? {
                Value::Number(n) => Ok(sign_to_ordering(n)),
                other => Err(RuntimeError::new(line, format!(
                    "comparator must return a number, got {}", other.type_name()))),
            }
        })?;
        Ok(Value::list(sorted))
    });

    reg.add("min", &[TypeTag::Kernel], |_, args, line| {
        kernel_extreme(args, line, f64::min)
    });
    reg.add("max", &[TypeTag::Kernel], |_, args, line| {
        kernel_extreme(args, line, f64::max)
    });

    reg.add("min", &[TypeTag::List], |_, args, line| list_extreme(args, line, -1.0));
    reg.add("max", &[TypeTag::List], |_, args, line| list_extreme(args, line, 1.0));

    reg.add("len", &[TypeTag::Any], |_, args, line| {
        let n = match &args[0] {
            Value::Str(s)        => s.chars().count(),
            Value::List(items)   => items.borrow().len(),
            Value::Map(entries)  => entries.borrow().len(),
            Value::Kernel(k)     => k.borrow().len(),
            Value::Polygon(pts)  => pts.len(),
            other => {
                return Err(RuntimeError::new(line, format!(
                    "`len` is not defined for {}", other.type_name())));
            }
        };
        Ok(Value::Number(n as f64))
    });

    reg.add("str", &[TypeTag::Any], |_, args, _| {
        Ok(Value::Str(args[0].to_string()))
    });
}

fn sign_to_ordering(sign: f64) -> Ordering {
    if sign < 0.0 {
        Ordering::Less
    } else if sign > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// `sort_by` with a comparator that can fail: the first error aborts
/// the sort and surfaces.
fn fallible_sort<F>(items: &mut [Value], mut cmp: F) -> Result<(), RuntimeError>
where
    F: FnMut(&Value, &Value) -> Result<Ordering, RuntimeError>,
{
    let mut failed = None;
    items.sort_by(|a, b| {
        if failed.is_some() {
            return Ordering::Equal;
        }
        match cmp(a, b) {
            Ok(ord) => ord,
            Err(e) => {
                failed = Some(e);
                Ordering::Equal
            }
        }
    });
    match failed {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn kernel_extreme(
    args: &[Value],
    line: usize,
    pick: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    let k = kernel(line, args, 0)?;
    let k = k.borrow();
    let mut best = match k.values.first() {
        Some(v) => *v,
        None => return Err(RuntimeError::new(line, "kernel is empty")),
    };
    for &v in &k.values[1..] {
        best = pick(best, v);
    }
    Ok(Value::Number(best))
}

/// `want` is the comparison sign that makes a candidate the new best:
/// +1 selects the maximum, -1 the minimum.
fn list_extreme(args: &[Value], line: usize, want: f64) -> Result<Value, RuntimeError> {
    let items = list(line, args, 0)?;
    let items = items.borrow();
    let mut iter = items.iter();
    let mut best = match iter.next() {
        Some(v) => v.clone(),
        None => return Err(RuntimeError::new(line, "list is empty")),
    };
    for item in iter {
        let Some(ord) = ops::compare(item, &best) else {
            return Err(RuntimeError::new(line, format!(
                "cannot order {} and {}", item.type_name(), best.type_name())));
        };
        if ord.signum() == want {
            best = item.clone();
        }
    }
    Ok(best)
}
