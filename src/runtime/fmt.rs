//! Formatting for runtime values.

use pretty::{BoxAllocator, DocAllocator, DocBuilder};
use termcolor::{Color, ColorSpec, NoColor, WriteColor};

use super::{
    context::Runtime,
    value::{Object, Value},
};

pub fn pretty(rt: &Runtime, value: Value, out: &mut dyn WriteColor) -> Result<(), std::io::Error> {
    let allocator = BoxAllocator;
    {
        pretty_inner(rt, value, &allocator, 0).1.render_colored(70, out)?;
    }
    Ok(())
}

/// Renders `value` without colors.
pub fn to_string(rt: &Runtime, value: Value) -> String {
    let mut out = NoColor::new(Vec::new());
    if pretty(rt, value, &mut out).is_err() {
        return String::from("#<unprintable>");
    }
    String::from_utf8_lossy(&out.into_inner()).into_owned()
}

fn color(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color));
    spec
}

/// Lists nested deeper than this print as `...`.
const MAX_DEPTH: usize = 512;

/// Concatenates `docs` as a balanced tree so a long list does not produce a
/// document nested once per element.
fn concat_balanced<'b, D>(
    allocator: &'b D,
    mut docs: Vec<DocBuilder<'b, D, ColorSpec>>,
) -> DocBuilder<'b, D, ColorSpec>
where
    D: DocAllocator<'b, ColorSpec>,
{
    while docs.len() > 1 {
        let mut joined = Vec::with_capacity(docs.len() / 2 + 1);
        let mut iter = docs.into_iter();
        while let Some(left) = iter.next() {
            joined.push(match iter.next() {
                Some(right) => left.append(right),
                None => left,
            });
        }
        docs = joined;
    }
    docs.pop().unwrap_or_else(|| allocator.nil())
}

fn pretty_inner<'b, D>(
    rt: &Runtime,
    val: Value,
    allocator: &'b D,
    depth: usize,
) -> DocBuilder<'b, D, ColorSpec>
where
    D: DocAllocator<'b, ColorSpec>,
    D::Doc: Clone,
{
    let Ok(object) = rt.object(val) else {
        return allocator.text("#<stale>");
    };
    match object {
        Object::Integer(n) => allocator.text(n.to_string()).annotate(color(Color::Cyan)),
        Object::Float(x) => allocator.text(format!("{x:?}")).annotate(color(Color::Cyan)),
        Object::EmptyList => allocator.text("()"),
        Object::Symbol(name) => allocator.text(name.to_string()),
        Object::True => allocator.text("#t").annotate(color(Color::Yellow)),
        Object::False => allocator.text("#f").annotate(color(Color::Yellow)),
        Object::Closure(closure) => {
            let text = match closure.name.and_then(|name| rt.symbol_name(name).ok()) {
                Some(name) => format!("#<closure {name}>"),
                None => String::from("#<closure>"),
            };
            allocator.text(text).annotate(color(Color::Green))
        }
        Object::Builtin(builtin) => allocator
            .text(format!("#<builtin {}>", builtin.name))
            .annotate(color(Color::Green)),
        Object::Environment(_) => allocator.text("#<environment>"),
        Object::Free => allocator.text("#<free>"),
        Object::Pair(_) if depth >= MAX_DEPTH => allocator.text("(...)"),
        Object::Pair(_) => {
            let mut docs = Vec::new();
            let mut val = val;
            while let Ok(Object::Pair(pair)) = rt.object(val) {
                let (car, cdr) = (pair.head(), pair.tail());
                docs.push(pretty_inner(rt, car, allocator, depth + 1));
                if matches!(rt.object(cdr), Ok(Object::Pair(_))) {
                    docs.push(allocator.space());
                }
                val = cdr;
            }
            if val != rt.empty_list() {
                docs.push(allocator.text(" . "));
                docs.push(pretty_inner(rt, val, allocator, depth + 1));
            }
            let doc = concat_balanced(allocator, docs);
            allocator.text("(").append(doc).append(allocator.text(")"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_every_kind() {
        let mut rt = Runtime::new().unwrap();
        let env = rt.make_environment(None).unwrap();
        crate::runtime::builtins::install(&mut rt, env).unwrap();
        let cases = [
            ("-7", "-7"),
            ("2.0", "2.0"),
            ("()", "()"),
            ("sym", "sym"),
            ("#t", "#t"),
            ("#f", "#f"),
            ("(1 (2) . 3)", "(1 (2) . 3)"),
        ];
        for (src, printed) in cases {
            let value = rt.read_str(src).unwrap();
            assert_eq!(to_string(&rt, value), printed);
        }

        let plus = rt.intern("+").unwrap();
        let builtin = rt.lookup(env, plus).unwrap();
        assert_eq!(to_string(&rt, builtin), "#<builtin +>");
        assert_eq!(to_string(&rt, env), "#<environment>");
    }

    #[test]
    fn colored_output_wraps_atoms() {
        let mut rt = Runtime::new().unwrap();
        let value = rt.read_str("(1 #t)").unwrap();
        let mut out = termcolor::Ansi::new(Vec::new());
        pretty(&rt, value, &mut out).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains('\u{1b}'));
        assert!(text.contains('1') && text.contains("#t"));
    }

    #[test]
    fn long_lists_stay_on_one_line() {
        let mut rt = Runtime::new().unwrap();
        let items = (0..1_000).map(|n| rt.integer(n).unwrap()).collect::<Vec<_>>();
        let list = rt.list(&items).unwrap();
        let text = to_string(&rt, list);
        assert!(text.starts_with("(0 1 2"));
        assert!(text.ends_with("998 999)"));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn million_element_list_prints() {
        let mut rt = Runtime::new().unwrap();
        let mut list = rt.empty_list();
        for n in (0..1_000_000).rev() {
            let head = rt.integer(n).unwrap();
            list = rt.cons(head, list).unwrap();
        }
        let text = to_string(&rt, list);
        assert!(text.starts_with("(0 1 2 3"));
        assert!(text.ends_with(" 999998 999999)"));
        assert_eq!(text.matches(' ').count(), 999_999);
    }

    #[test]
    fn deep_nesting_is_elided() {
        let mut rt = Runtime::new().unwrap();
        let mut nested = rt.integer(0).unwrap();
        for _ in 0..10_000 {
            let empty = rt.empty_list();
            nested = rt.cons(nested, empty).unwrap();
        }
        let text = to_string(&rt, nested);
        assert!(text.starts_with(&"(".repeat(MAX_DEPTH)));
        assert!(text.contains("(...)"));
        assert!(!text.contains('0'));
        assert!(text.ends_with(&")".repeat(MAX_DEPTH + 1)));
    }
}
