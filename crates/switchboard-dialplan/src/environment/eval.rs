//! Tree-walking evaluator for context bodies.

use std::collections::HashMap;

use super::ExecutionEnvironment;
use crate::cancel::CancellationToken;
use crate::context::DialplanContext;
use crate::error::ExecutionError;
use crate::syntax::ast::{Block, CompareOp, Expr, Literal, Statement};
use crate::value::Value;

/// How control leaves a statement or block.
pub(super) enum Flow {
    Next,
    Return,
    Transfer(DialplanContext),
    Interrupted,
}

/// Runs a body with a fresh set of locals.
pub(super) fn run_body(
    env: &ExecutionEnvironment,
    body: &Block,
    cancel: &CancellationToken,
) -> Result<Flow, ExecutionError> {
    Frame {
        env,
        cancel,
        locals: HashMap::new(),
    }
    .run_block(body)
}

struct Frame<'run> {
    env: &'run ExecutionEnvironment,
    cancel: &'run CancellationToken,
    locals: HashMap<String, Value>,
}

impl Frame<'_> {
    fn run_block(&mut self, block: &Block) -> Result<Flow, ExecutionError> {
        for statement in &block.statements {
            if self.cancel.is_cancelled() {
                return Ok(Flow::Interrupted);
            }
            match self.run_statement(statement)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn run_statement(&mut self, statement: &Statement) -> Result<Flow, ExecutionError> {
        match statement {
            Statement::Transfer(target) => match self.eval(target)? {
                Value::Context(context) => Ok(Flow::Transfer(context)),
                other => Err(ExecutionError::NotAContext {
                    found: other.describe(),
                }),
            },
            Statement::Let { name, value } => {
                let bound = self.eval(value)?;
                self.locals.insert(name.clone(), bound);
                Ok(Flow::Next)
            }
            Statement::SetVariable { name, value } => {
                let text = match self.eval(value)? {
                    Value::Nil => String::new(),
                    other => other.to_string(),
                };
                self.env.call.variables().set(name.as_str(), text);
                Ok(Flow::Next)
            }
            Statement::If {
                branches,
                otherwise,
            } => {
                for (condition, block) in branches {
                    if self.eval(condition)?.is_truthy() {
                        return self.run_block(block);
                    }
                }
                otherwise
                    .as_ref()
                    .map_or(Ok(Flow::Next), |block| self.run_block(block))
            }
            Statement::Return => Ok(Flow::Return),
            Statement::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Next)
            }
        }
    }

    fn eval(&self, expr: &Expr) -> Result<Value, ExecutionError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Nil => Value::Nil,
                Literal::Bool(flag) => Value::Bool(*flag),
                Literal::Int(number) => Value::Int(*number),
                Literal::Str(text) => Value::Str(text.clone()),
            }),
            Expr::Variable(name) => Ok(self.env.variable(name)),
            Expr::Name(name) => self.resolve(name),
            Expr::Call { name, args } => {
                let values = self.eval_args(args)?;
                self.env.invoke(name, &values)
            }
            Expr::Method {
                receiver,
                method,
                args,
            } => {
                let target = self.eval(receiver)?;
                let values = self.eval_args(args)?;
                self.call_method(&target, method, &values)
            }
            Expr::Compare { op, lhs, rhs } => {
                let left = self.eval(lhs)?;
                let right = self.eval(rhs)?;
                Ok(Value::Bool(match op {
                    CompareOp::Eq => left == right,
                    CompareOp::NotEq => left != right,
                }))
            }
        }
    }

    fn eval_args(&self, args: &[Expr]) -> Result<Vec<Value>, ExecutionError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    /// Bare names resolve to a local, then a context, then a component class,
    /// then a zero-argument capability.
    fn resolve(&self, name: &str) -> Result<Value, ExecutionError> {
        if let Some(value) = self.locals.get(name) {
            return Ok(value.clone());
        }
        if let Some(context) = self.env.context(name) {
            return Ok(Value::Context(context.clone()));
        }
        if self.env.components.contains(name) {
            return Ok(Value::ComponentClass(name.to_owned()));
        }
        if self.env.capabilities.contains(name) {
            return self.env.invoke(name, &[]);
        }
        Err(ExecutionError::unknown_context(name))
    }

    fn call_method(
        &self,
        target: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ExecutionError> {
        match target {
            Value::ComponentClass(class) if method == "new" => self.env.instantiate(class, args),
            Value::Component(handle) => handle.invoke(method, args).map_err(|source| {
                ExecutionError::command(format!("{}.{method}", handle.class()), source)
            }),
            other => Err(ExecutionError::unknown_method(other.describe(), method)),
        }
    }
}
