//! Front end: a runtime plus a rooted global environment.

use termcolor::WriteColor;

use crate::{
    gc::{HeapConfig, Root},
    runtime::{builtins, fmt, reader::Reader, Result, Runtime, Value},
};

pub struct Interpreter {
    global: Root,
    runtime: Runtime,
}

impl Interpreter {
    pub fn new() -> Result<Self> {
        Self::with_config(HeapConfig::default())
    }

    pub fn with_config(config: HeapConfig) -> Result<Self> {
        let mut runtime = Runtime::with_config(config)?;
        let env = runtime.make_environment(None)?;
        let global = runtime.root(env);
        builtins::install(&mut runtime, env)?;
        Ok(Self { global, runtime })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn global(&self) -> Value {
        self.global.get()
    }

    pub fn eval(&mut self, expr: Value) -> Result<Value> {
        let env = self.global.get();
        self.runtime.eval(env, expr)
    }

    /// Reads and evaluates every datum in `src`, returning the last result
    /// (the empty list when `src` holds no datum).
    ///
    /// The returned value is not rooted.
    pub fn eval_str(&mut self, src: &str) -> Result<Value> {
        let mut reader = Reader::new(src);
        let mut last = self.runtime.empty_list();
        while let Some(datum) = reader.read(&mut self.runtime)? {
            last = self.eval(datum)?;
        }
        Ok(last)
    }

    pub fn display(&self, value: Value) -> String {
        fmt::to_string(&self.runtime, value)
    }

    pub fn print(&self, value: Value, out: &mut dyn WriteColor) -> std::io::Result<()> {
        fmt::pretty(&self.runtime, value, out)?;
        writeln!(out)
    }
}
