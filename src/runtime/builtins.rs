//! Native procedures bound in the global environment.
//!
//! Each receives a proper list of evaluated arguments. Builtins may allocate
//! but never evaluate, so no collection can happen while one runs.

use super::{
    context::Runtime,
    error::{Error, Result},
    value::{Builtin, BuiltinFn, Object, Value},
};

const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("cons", cons),
    ("first", first),
    ("rest", rest),
    ("list", list),
    ("null?", null_p),
    ("+", add),
    ("-", sub),
    ("*", mul),
    ("/", div),
    ("=", num_eq),
    ("<", less_than),
    (">", greater_than),
    ("eq?", eq_p),
    ("is?", is_p),
];

/// Binds every builtin, plus `true` and `false`, in `env`.
pub fn install(rt: &mut Runtime, env: Value) -> Result<()> {
    for &(name, func) in BUILTINS {
        let symbol = rt.intern(name)?;
        let builtin = rt.heap.allocate(Object::Builtin(Builtin { name, func }))?;
        rt.bind(env, symbol, builtin)?;
    }
    for (name, value) in [("true", rt.true_value()), ("false", rt.false_value())] {
        let symbol = rt.intern(name)?;
        rt.bind(env, symbol, value)?;
    }
    log::debug!(target: "eval", "installed {} builtins", BUILTINS.len());
    Ok(())
}

/// Destructures exactly `N` arguments, using the cached list length for the
/// arity check.
fn arguments<const N: usize>(rt: &Runtime, name: &'static str, args: Value) -> Result<[Value; N]> {
    let got = rt.list_length(args)?.unwrap_or(0);
    if got != N {
        return Err(Error::ArityMismatch {
            name: name.to_owned(),
            expected: N,
            got,
        });
    }
    let mut out = [args; N];
    let mut cursor = args;
    for slot in &mut out {
        *slot = rt.car(cursor)?;
        cursor = rt.cdr(cursor)?;
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn to_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(x) => x,
        }
    }
}

fn number(rt: &Runtime, value: Value) -> Result<Number> {
    match rt.object(value)? {
        Object::Integer(n) => Ok(Number::Integer(*n)),
        Object::Float(x) => Ok(Number::Float(*x)),
        other => Err(Error::Type {
            expected: "number",
            found: other.kind_name(),
        }),
    }
}

fn operands(rt: &Runtime, name: &'static str, args: Value) -> Result<(Number, Number)> {
    let [lhs, rhs] = arguments(rt, name, args)?;
    Ok((number(rt, lhs)?, number(rt, rhs)?))
}

fn make_number(rt: &mut Runtime, n: Number) -> Result<Value> {
    match n {
        Number::Integer(n) => rt.integer(n),
        Number::Float(x) => rt.float(x),
    }
}

/// Integer arithmetic when both operands are integers, float otherwise.
fn arith(
    rt: &mut Runtime,
    name: &'static str,
    args: Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    let result = match operands(rt, name, args)? {
        (Number::Integer(a), Number::Integer(b)) => {
            Number::Integer(int(a, b).ok_or(Error::Overflow(name))?)
        }
        (a, b) => Number::Float(float(a.to_f64(), b.to_f64())),
    };
    make_number(rt, result)
}

fn compare(
    rt: &mut Runtime,
    name: &'static str,
    args: Value,
    int: fn(&i64, &i64) -> bool,
    float: fn(&f64, &f64) -> bool,
) -> Result<Value> {
    let holds = match operands(rt, name, args)? {
        (Number::Integer(a), Number::Integer(b)) => int(&a, &b),
        (a, b) => float(&a.to_f64(), &b.to_f64()),
    };
    Ok(rt.boolean(holds))
}

fn cons(rt: &mut Runtime, args: Value) -> Result<Value> {
    let [head, tail] = arguments(rt, "cons", args)?;
    rt.cons(head, tail)
}

fn first(rt: &mut Runtime, args: Value) -> Result<Value> {
    let [list] = arguments(rt, "first", args)?;
    rt.car(list)
}

fn rest(rt: &mut Runtime, args: Value) -> Result<Value> {
    let [list] = arguments(rt, "rest", args)?;
    rt.cdr(list)
}

fn list(_rt: &mut Runtime, args: Value) -> Result<Value> {
    Ok(args)
}

fn null_p(rt: &mut Runtime, args: Value) -> Result<Value> {
    let [value] = arguments(rt, "null?", args)?;
    Ok(rt.boolean(value == rt.empty_list()))
}

fn add(rt: &mut Runtime, args: Value) -> Result<Value> {
    arith(rt, "+", args, i64::checked_add, |a, b| a + b)
}

fn sub(rt: &mut Runtime, args: Value) -> Result<Value> {
    arith(rt, "-", args, i64::checked_sub, |a, b| a - b)
}

fn mul(rt: &mut Runtime, args: Value) -> Result<Value> {
    arith(rt, "*", args, i64::checked_mul, |a, b| a * b)
}

fn div(rt: &mut Runtime, args: Value) -> Result<Value> {
    if let (_, Number::Integer(0)) = operands(rt, "/", args)? {
        return Err(Error::DivisionByZero("/"));
    }
    arith(rt, "/", args, i64::checked_div, |a, b| a / b)
}

fn num_eq(rt: &mut Runtime, args: Value) -> Result<Value> {
    compare(rt, "=", args, i64::eq, f64::eq)
}

fn less_than(rt: &mut Runtime, args: Value) -> Result<Value> {
    compare(rt, "<", args, i64::lt, f64::lt)
}

fn greater_than(rt: &mut Runtime, args: Value) -> Result<Value> {
    compare(rt, ">", args, i64::gt, f64::gt)
}

/// Atoms of the same kind compare by content, everything else by identity.
fn eq_p(rt: &mut Runtime, args: Value) -> Result<Value> {
    let [lhs, rhs] = arguments(rt, "eq?", args)?;
    let same = lhs == rhs
        || match (rt.object(lhs)?, rt.object(rhs)?) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            _ => false,
        };
    Ok(rt.boolean(same))
}

fn is_p(rt: &mut Runtime, args: Value) -> Result<Value> {
    let [lhs, rhs] = arguments(rt, "is?", args)?;
    Ok(rt.boolean(lhs == rhs))
}

#[cfg(test)]
mod tests {
    use crate::{interpreter::Interpreter, runtime::error::Error};

    fn eval(src: &str) -> Result<String, Error> {
        let mut interp = Interpreter::new()?;
        let value = interp.eval_str(src)?;
        Ok(interp.display(value))
    }

    #[test]
    fn list_primitives() {
        assert_eq!(eval("(cons 1 (cons 2 ()))").unwrap(), "(1 2)");
        assert_eq!(eval("(cons 1 2)").unwrap(), "(1 . 2)");
        assert_eq!(eval("(first '(1 2))").unwrap(), "1");
        assert_eq!(eval("(rest '(1 2))").unwrap(), "(2)");
        assert_eq!(eval("(list 1 (+ 1 1) 3)").unwrap(), "(1 2 3)");
        assert_eq!(eval("(list)").unwrap(), "()");
        assert_eq!(eval("(null? ())").unwrap(), "#t");
        assert_eq!(eval("(null? '(1))").unwrap(), "#f");
        assert!(matches!(eval("(first 1)"), Err(Error::Type { expected: "pair", .. })));
    }

    #[test]
    fn cached_length_of_constructed_list() {
        let mut interp = Interpreter::new().unwrap();
        let list = interp.eval_str("(cons 1 (cons 2 ()))").unwrap();
        assert_eq!(interp.runtime().list_length(list).unwrap(), Some(2));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("(+ 1 2)").unwrap(), "3");
        assert_eq!(eval("(- 1 2)").unwrap(), "-1");
        assert_eq!(eval("(* 6 7)").unwrap(), "42");
        assert_eq!(eval("(/ 7 2)").unwrap(), "3");
        assert_eq!(eval("(/ 7.0 2)").unwrap(), "3.5");
        assert_eq!(eval("(+ 1 0.5)").unwrap(), "1.5");
        assert_eq!(eval("(/ 1 0)"), Err(Error::DivisionByZero("/")));
        assert_eq!(eval("(+ 9223372036854775807 1)"), Err(Error::Overflow("+")));
        assert!(matches!(eval("(+ 1 'a)"), Err(Error::Type { expected: "number", .. })));
        assert!(matches!(eval("(+ 1 2 3)"), Err(Error::ArityMismatch { expected: 2, got: 3, .. })));
    }

    #[test]
    fn comparisons_have_their_usual_meaning() {
        assert_eq!(eval("(< 1 2)").unwrap(), "#t");
        assert_eq!(eval("(< 2 1)").unwrap(), "#f");
        assert_eq!(eval("(< 1 1)").unwrap(), "#f");
        assert_eq!(eval("(> 2 1)").unwrap(), "#t");
        assert_eq!(eval("(> 1 2.5)").unwrap(), "#f");
        assert_eq!(eval("(= 2 2)").unwrap(), "#t");
        assert_eq!(eval("(= 2 2.0)").unwrap(), "#t");
        assert_eq!(eval("(= 2 3)").unwrap(), "#f");
    }

    #[test]
    fn equality_predicates() {
        assert_eq!(eval("(eq? 1 1)").unwrap(), "#t");
        assert_eq!(eval("(eq? 1 1.0)").unwrap(), "#f");
        assert_eq!(eval("(eq? 'a 'a)").unwrap(), "#t");
        assert_eq!(eval("(eq? () ())").unwrap(), "#t");
        assert_eq!(eval("(eq? '(1) '(1))").unwrap(), "#f");
        assert_eq!(eval("(is? 1 1)").unwrap(), "#f");
        assert_eq!(eval("(is? 'a 'a)").unwrap(), "#t");
        assert_eq!(eval("(is? first first)").unwrap(), "#t");
    }
}
