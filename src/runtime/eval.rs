//! The evaluator.
//!
//! [`Runtime::eval`] drives a loop over [`Runtime::step`]. A step either
//! finishes with a value or asks the loop to continue with a new
//! `(environment, expression)` pair. Closure bodies, `if` branches and the last
//! expression of a body are all continued this way, so a chain of tail calls
//! runs in constant native stack.
//!
//! Rooting discipline: the loop keeps its current environment and expression
//! rooted, and the collector only runs at the top of the loop. A value
//! returned by a nested `eval` is unrooted, so it is either consumed before the
//! next nested `eval` or rooted first (see `apply_form`).

use super::{
    context::Runtime,
    error::{Error, Result},
    value::{Closure, Object, Value},
};
use crate::gc::Root;

/// Outcome of one evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Done(Value),
    TailCall { env: Value, expr: Value },
}

impl Runtime {
    /// Evaluates `expr` in `env`.
    pub fn eval(&mut self, env: Value, expr: Value) -> Result<Value> {
        let env = self.root(env);
        let expr = self.root(expr);
        loop {
            self.maybe_collect();
            match self.step(env.get(), expr.get())? {
                Step::Done(value) => return Ok(value),
                Step::TailCall {
                    env: next_env,
                    expr: next_expr,
                } => {
                    env.set(next_env);
                    expr.set(next_expr);
                }
            }
        }
    }

    /// Calls `operator` with a proper list of already evaluated arguments.
    pub fn apply(&mut self, operator: Value, args: Value) -> Result<Value> {
        let _operator = self.root(operator);
        match self.apply_step(operator, args)? {
            Step::Done(value) => Ok(value),
            Step::TailCall { env, expr } => self.eval(env, expr),
        }
    }

    /// Performs a single evaluation step. Both arguments must be reachable
    /// from the root set for as long as the step runs.
    pub fn step(&mut self, env: Value, expr: Value) -> Result<Step> {
        let head = match self.heap.get(expr)? {
            Object::Symbol(_) => return self.lookup(env, expr).map(Step::Done),
            Object::Pair(pair) => pair.head(),
            Object::Integer(_)
            | Object::Float(_)
            | Object::EmptyList
            | Object::True
            | Object::False
            | Object::Closure(_)
            | Object::Builtin(_)
            | Object::Environment(_) => return Ok(Step::Done(expr)),
            Object::Free => {
                return Err(Error::StaleHandle {
                    arena: expr.arena(),
                    index: expr.index(),
                })
            }
        };

        let forms = self.forms;
        if head == forms.quote {
            self.eval_quote(expr)
        } else if head == forms.if_ {
            self.eval_if(env, expr)
        } else if head == forms.define {
            self.eval_define(env, expr)
        } else if head == forms.lambda {
            self.eval_lambda(env, expr).map(Step::Done)
        } else {
            self.apply_form(env, expr)
        }
    }

    /// Elements of a special form after its keyword.
    fn form_operands(&self, form: &'static str, expr: Value) -> Result<Vec<Value>> {
        let mut items = self
            .list_to_vec(expr)?
            .ok_or_else(|| Error::malformed(form, "not a proper list"))?;
        items.remove(0);
        Ok(items)
    }

    fn eval_quote(&mut self, expr: Value) -> Result<Step> {
        let operands = self.form_operands("quote", expr)?;
        match operands[..] {
            [datum] => Ok(Step::Done(datum)),
            _ => Err(Error::malformed(
                "quote",
                format!("expected 1 operand, got {}", operands.len()),
            )),
        }
    }

    fn eval_if(&mut self, env: Value, expr: Value) -> Result<Step> {
        let operands = self.form_operands("if", expr)?;
        let [test, consequent, alternative] = operands[..] else {
            return Err(Error::malformed(
                "if",
                "expected (if test consequent alternative)",
            ));
        };
        let test = self.eval(env, test)?;
        let branch = if self.is_truthy(test) {
            consequent
        } else {
            alternative
        };
        Ok(Step::TailCall { env, expr: branch })
    }

    fn eval_define(&mut self, env: Value, expr: Value) -> Result<Step> {
        let operands = self.form_operands("define", expr)?;
        let Some(&target) = operands.first() else {
            return Err(Error::malformed("define", "missing name"));
        };

        match self.heap.get(target)? {
            Object::Symbol(_) => {
                let [_, init] = operands[..] else {
                    return Err(Error::malformed(
                        "define",
                        "expected (define name expression)",
                    ));
                };
                let value = self.eval(env, init)?;
                self.bind(env, target, value)?;
                Ok(Step::Done(target))
            }
            Object::Pair(signature) => {
                let (name, params) = (signature.head(), signature.tail());
                if self.symbol_name(name).is_err() {
                    return Err(Error::malformed("define", "procedure name must be a symbol"));
                }
                let body = self.cdr(self.cdr(expr)?)?;
                let closure = self.make_closure(env, params, body, Some(name))?;
                self.bind(env, name, closure)?;
                Ok(Step::Done(name))
            }
            other => Err(Error::malformed(
                "define",
                format!("cannot define a {}", other.kind_name()),
            )),
        }
    }

    fn eval_lambda(&mut self, env: Value, expr: Value) -> Result<Value> {
        let operands = self.form_operands("lambda", expr)?;
        let Some(&params) = operands.first() else {
            return Err(Error::malformed("lambda", "missing parameter list"));
        };
        let body = self.cdr(self.cdr(expr)?)?;
        self.make_closure(env, params, body, None)
    }

    fn make_closure(
        &mut self,
        env: Value,
        params: Value,
        body: Value,
        name: Option<Value>,
    ) -> Result<Value> {
        let form = if name.is_some() { "define" } else { "lambda" };
        let names = self
            .list_to_vec(params)?
            .ok_or_else(|| Error::malformed(form, "parameters must be a proper list"))?;
        if names.iter().any(|&param| self.symbol_name(param).is_err()) {
            return Err(Error::malformed(form, "parameters must be symbols"));
        }
        if !matches!(self.list_length(body)?, Some(n) if n > 0) {
            return Err(Error::malformed(form, "body must be a non-empty list"));
        }
        self.heap.allocate(Object::Closure(Closure {
            params,
            body,
            env,
            name,
        }))
    }

    /// Evaluates operator and operands left to right, then applies.
    fn apply_form(&mut self, env: Value, expr: Value) -> Result<Step> {
        let items = self
            .list_to_vec(expr)?
            .ok_or_else(|| Error::malformed("application", "not a proper list"))?;

        let mut evaluated: Vec<Root> = Vec::with_capacity(items.len());
        for item in items {
            let value = self.eval(env, item)?;
            evaluated.push(self.root(value));
        }

        let operator = evaluated[0].get();
        let args = evaluated[1..].iter().map(Root::get).collect::<Vec<_>>();
        let args = self.list(&args)?;
        self.apply_step(operator, args)
    }

    fn apply_step(&mut self, operator: Value, args: Value) -> Result<Step> {
        match self.heap.get(operator)? {
            Object::Builtin(builtin) => {
                let builtin = *builtin;
                (builtin.func)(self, args).map(Step::Done)
            }
            Object::Closure(closure) => {
                let closure = *closure;
                self.enter_closure(closure, args)
            }
            other => Err(Error::Type {
                expected: "procedure",
                found: other.kind_name(),
            }),
        }
    }

    /// Binds the arguments in a fresh frame and continues with the body.
    fn enter_closure(&mut self, closure: Closure, args: Value) -> Result<Step> {
        let params = self.list_to_vec(closure.params)?.unwrap_or_default();
        let args = self
            .list_to_vec(args)?
            .ok_or_else(|| Error::malformed("application", "arguments must be a proper list"))?;
        if params.len() != args.len() {
            let name = match closure.name {
                Some(name) => self.symbol_name(name)?.to_owned(),
                None => "lambda".to_owned(),
            };
            return Err(Error::ArityMismatch {
                name,
                expected: params.len(),
                got: args.len(),
            });
        }

        let frame = self.make_environment(Some(closure.env))?;
        for (param, arg) in params.into_iter().zip(args) {
            self.bind(frame, param, arg)?;
        }

        let body = self.list_to_vec(closure.body)?.unwrap_or_default();
        let Some((&last, init)) = body.split_last() else {
            return Err(Error::malformed("lambda", "empty body"));
        };
        if !init.is_empty() {
            let frame = self.root(frame);
            let _body = self.root(closure.body);
            for &expr in init {
                self.eval(frame.get(), expr)?;
            }
        }
        log::trace!(target: "eval", "tail call into {:?}", frame);
        Ok(Step::TailCall { env: frame, expr: last })
    }
}
