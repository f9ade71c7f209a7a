//! Text to value trees.
//!
//! The reader yields one datum per call. Nothing it allocates is rooted, so
//! callers evaluate (or root) each datum before reading the next one.

use once_cell::sync::Lazy;

use super::{
    context::Runtime,
    error::{Error, Result},
    value::Value,
};

/// ASCII characters that end an atom.
static DELIMITERS: Lazy<[bool; 128]> = Lazy::new(|| {
    let mut map = [false; 128];
    for (i, entry) in map.iter_mut().enumerate() {
        let c = i as u8 as char;
        *entry = c.is_ascii_whitespace() || "()';\"".contains(c);
    }
    map
});

fn delimited(c: char) -> bool {
    c.is_whitespace() || (c.is_ascii() && DELIMITERS[c as usize])
}

/// Nesting limit for lists and quotes.
const MAX_DEPTH: usize = 512;

pub struct Reader<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, depth: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Reads the next datum, or `None` once only whitespace and comments
    /// remain.
    pub fn read(&mut self, rt: &mut Runtime) -> Result<Option<Value>> {
        self.skip_atmosphere();
        if self.peek().is_none() {
            return Ok(None);
        }
        self.datum(rt).map(Some)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_atmosphere(&mut self) {
        while let Some(c) = self.peek() {
            if c == ';' {
                while !matches!(self.bump(), Some('\n') | None) {}
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn datum(&mut self, rt: &mut Runtime) -> Result<Value> {
        self.skip_atmosphere();
        let start = self.pos;
        match self.bump() {
            None => Err(Error::read("unexpected end of input", start)),
            Some('(') => self.nested(start, |reader| reader.list(rt, start)),
            Some(')') => Err(Error::read("unexpected ')'", start)),
            Some('\'') => {
                let quoted = self.nested(start, |reader| reader.datum(rt))?;
                let quote = rt.intern("quote")?;
                rt.list(&[quote, quoted])
            }
            Some('"') => Err(Error::read("strings are not supported", start)),
            Some(_) => {
                while self.peek().is_some_and(|c| !delimited(c)) {
                    self.bump();
                }
                self.atom(rt, start)
            }
        }
    }

    fn nested<T>(&mut self, start: usize, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::read("nesting too deep", start));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn list(&mut self, rt: &mut Runtime, start: usize) -> Result<Value> {
        let mut items = Vec::new();
        let mut tail = rt.empty_list();
        loop {
            self.skip_atmosphere();
            match self.peek() {
                None => return Err(Error::read("unterminated list", start)),
                Some(')') => {
                    self.bump();
                    break;
                }
                Some('.') if self.dot_follows() => {
                    let dot = self.pos;
                    self.bump();
                    if items.is_empty() {
                        return Err(Error::read("'.' without a preceding element", dot));
                    }
                    tail = self.datum(rt)?;
                    self.skip_atmosphere();
                    if self.bump() != Some(')') {
                        return Err(Error::read("expected ')' after dotted tail", dot));
                    }
                    break;
                }
                Some(_) => items.push(self.datum(rt)?),
            }
        }
        items
            .into_iter()
            .rev()
            .try_fold(tail, |tail, head| rt.cons(head, tail))
    }

    /// Whether the `.` at the cursor stands alone rather than starting an atom.
    fn dot_follows(&self) -> bool {
        self.src[self.pos + 1..]
            .chars()
            .next()
            .map_or(true, delimited)
    }

    fn atom(&mut self, rt: &mut Runtime, start: usize) -> Result<Value> {
        let token = &self.src[start..self.pos];
        match token {
            "#t" | "#true" => return Ok(rt.true_value()),
            "#f" | "#false" => return Ok(rt.false_value()),
            "." => return Err(Error::read("unexpected '.'", start)),
            _ => {}
        }
        if looks_numeric(token) {
            if let Ok(n) = token.parse::<i64>() {
                return rt.integer(n);
            }
            if let Ok(x) = token.parse::<f64>() {
                return rt.float(x);
            }
            return Err(Error::read(format!("malformed number '{token}'"), start));
        }
        if token.starts_with('#') {
            return Err(Error::read(format!("unknown syntax '{token}'"), start));
        }
        rt.intern(token)
    }
}

/// Numbers start with a digit, optionally after a sign or a decimal point.
fn looks_numeric(token: &str) -> bool {
    let rest = token.strip_prefix(['+', '-']).unwrap_or(token);
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    rest.starts_with(|c: char| c.is_ascii_digit())
}

impl Runtime {
    /// Reads the first datum of `src`.
    pub fn read_str(&mut self, src: &str) -> Result<Value> {
        Reader::new(src)
            .read(self)?
            .ok_or_else(|| Error::read("no datum", 0))
    }
}
