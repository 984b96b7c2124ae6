//! Bounded-cost, sandboxed predicate evaluator for wait-task `condition`
//! expressions.
//!
//! A condition is compiled once (lex -> parse -> [`ast::Expr`]) and then
//! evaluated once per signal delivery against an [`EvalContext`] exposing
//! only the signal and optional processor output — there is no access to
//! anything else in the process. Evaluation spends from a [`cost::CostBudget`]
//! per AST node and is additionally capped by a wall-clock [`cost::Deadline`],
//! so a pathological expression cannot stall the orchestrator's replay loop.

mod ast;
mod cost;
mod lexer;
mod parser;
mod regex_bound;

use std::collections::HashMap;
use std::time::Duration;

use waittask_types::{ErrorKind, ProcessorOutput, SignalEnvelope, WaitTaskError};

use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use cost::{CostBudget, Deadline};
pub use regex_bound::estimate_states;

/// Runtime value produced while walking a compiled condition.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Value::String(value.to_string())
            }
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The exact data a condition may read: the delivered signal and, if a
/// processor ran, its output. Nothing else in the orchestrator's state is
/// reachable from a condition — this is the sandbox boundary.
pub struct EvalContext<'a> {
    pub signal: &'a SignalEnvelope,
    pub processor: Option<&'a ProcessorOutput>,
}

/// A condition source string, parsed once at [`Evaluator::compile`] time and
/// reused across every signal delivery for a given wait-task instance.
///
/// `regexes` holds every `matches()` pattern in `expr`, each compiled
/// exactly once here rather than on every [`Evaluator::evaluate`] call —
/// a malformed pattern is therefore rejected at compile time, alongside
/// the lex/parse/cost-bound errors, instead of surfacing as a per-signal
/// runtime failure.
#[derive(Clone, Debug)]
pub struct CompiledPredicate {
    source: String,
    expr: Expr,
    regexes: HashMap<String, regex::Regex>,
}

impl CompiledPredicate {
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compiles and evaluates wait-task `condition` expressions under a cost and
/// regex-complexity budget.
#[derive(Clone, Debug)]
pub struct Evaluator {
    cost_limit: u32,
    regex_state_limit: u32,
    eval_timeout: Duration,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            cost_limit: 1000,
            regex_state_limit: 100,
            eval_timeout: Duration::from_millis(50),
        }
    }
}

impl Evaluator {
    pub fn new(cost_limit: u32, regex_state_limit: u32, eval_timeout: Duration) -> Self {
        Self {
            cost_limit,
            regex_state_limit,
            eval_timeout,
        }
    }

    /// Lex, parse, and regex-bound-check `source`, producing a reusable
    /// [`CompiledPredicate`]. This is the only place regex patterns named in
    /// a `matches()` call are checked against `regex_state_limit` — once
    /// compiled, evaluation trusts the pattern.
    pub fn compile(&self, source: &str) -> Result<CompiledPredicate, WaitTaskError> {
        let tokens = lexer::lex(source)?;
        let expr = parser::parse(&tokens)?;
        let mut regexes = HashMap::new();
        self.compile_regex_patterns(&expr, &mut regexes)?;
        Ok(CompiledPredicate {
            source: source.to_string(),
            expr,
            regexes,
        })
    }

    /// Checks every `matches()` pattern against `regex_state_limit` and
    /// compiles it into `regexes`, keyed by pattern text, so a malformed or
    /// overly-complex pattern fails here rather than on first evaluation.
    fn compile_regex_patterns(
        &self,
        expr: &Expr,
        regexes: &mut HashMap<String, regex::Regex>,
    ) -> Result<(), WaitTaskError> {
        match expr {
            Expr::Matches { field, pattern } => {
                regex_bound::check_bound(pattern, self.regex_state_limit)?;
                if !regexes.contains_key(pattern) {
                    let re = regex::Regex::new(pattern).map_err(|e| {
                        WaitTaskError::new(
                            ErrorKind::InvalidConfig,
                            format!("invalid regex pattern '{pattern}': {e}"),
                        )
                    })?;
                    regexes.insert(pattern.clone(), re);
                }
                self.compile_regex_patterns(field, regexes)
            }
            Expr::Unary { expr, .. } => self.compile_regex_patterns(expr, regexes),
            Expr::Binary { lhs, rhs, .. } => {
                self.compile_regex_patterns(lhs, regexes)?;
                self.compile_regex_patterns(rhs, regexes)
            }
            Expr::Literal(_) | Expr::Field(_) => Ok(()),
        }
    }

    /// Evaluate `compiled` against `ctx`. The top-level result must be a
    /// `Bool` — anything else is `ErrorKind::TypeMismatch`, since a
    /// condition that silently coerced e.g. a string to "truthy" would make
    /// misconfigured wait-tasks hang instead of failing loudly at first
    /// signal.
    pub fn evaluate(
        &self,
        compiled: &CompiledPredicate,
        ctx: &EvalContext<'_>,
    ) -> Result<bool, WaitTaskError> {
        let mut budget = CostBudget::new(self.cost_limit);
        let deadline = Deadline::from_now(self.eval_timeout);
        let result = self.eval_node(&compiled.expr, ctx, &mut budget, &deadline, &compiled.regexes)?;
        match result {
            Value::Bool(b) => Ok(b),
            other => Err(WaitTaskError::new(
                ErrorKind::TypeMismatch,
                format!(
                    "condition '{}' evaluated to {}, expected bool",
                    compiled.source,
                    other.type_name()
                ),
            )),
        }
    }

    fn eval_node(
        &self,
        expr: &Expr,
        ctx: &EvalContext<'_>,
        budget: &mut CostBudget,
        deadline: &Deadline,
        regexes: &HashMap<String, regex::Regex>,
    ) -> Result<Value, WaitTaskError> {
        deadline.check()?;
        budget.spend(1)?;
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Field(path) => self.resolve_field(path, ctx),
            Expr::Unary { op, expr } => {
                let v = self.eval_node(expr, ctx, budget, deadline, regexes)?;
                match op {
                    UnaryOp::Not => {
                        let b = v.as_bool().ok_or_else(|| {
                            type_mismatch("!", v.type_name())
                        })?;
                        Ok(Value::Bool(!b))
                    }
                    UnaryOp::Neg => {
                        let n = v.as_number().ok_or_else(|| {
                            type_mismatch("unary -", v.type_name())
                        })?;
                        Ok(Value::Number(-n))
                    }
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                self.eval_binary(*op, lhs, rhs, ctx, budget, deadline, regexes)
            }
            Expr::Matches { field, pattern } => {
                budget.spend(5)?;
                let v = self.eval_node(field, ctx, budget, deadline, regexes)?;
                let s = v
                    .as_str()
                    .ok_or_else(|| type_mismatch("matches()", v.type_name()))?;
                let re = regexes.get(pattern).ok_or_else(|| {
                    WaitTaskError::new(
                        ErrorKind::InvalidConfig,
                        format!("pattern '{pattern}' was not compiled"),
                    )
                })?;
                Ok(Value::Bool(re.is_match(s)))
            }
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        ctx: &EvalContext<'_>,
        budget: &mut CostBudget,
        deadline: &Deadline,
        regexes: &HashMap<String, regex::Regex>,
    ) -> Result<Value, WaitTaskError> {
        // Short-circuit && and || before evaluating the right-hand side.
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let l = self.eval_node(lhs, ctx, budget, deadline, regexes)?;
            let lb = l.as_bool().ok_or_else(|| type_mismatch("&&/||", l.type_name()))?;
            if op == BinaryOp::And && !lb {
                return Ok(Value::Bool(false));
            }
            if op == BinaryOp::Or && lb {
                return Ok(Value::Bool(true));
            }
            let r = self.eval_node(rhs, ctx, budget, deadline, regexes)?;
            let rb = r.as_bool().ok_or_else(|| type_mismatch("&&/||", r.type_name()))?;
            return Ok(Value::Bool(rb));
        }

        let l = self.eval_node(lhs, ctx, budget, deadline, regexes)?;
        let r = self.eval_node(rhs, ctx, budget, deadline, regexes)?;

        match op {
            BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
            BinaryOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ln = l.as_number().ok_or_else(|| type_mismatch("comparison", l.type_name()))?;
                let rn = r.as_number().ok_or_else(|| type_mismatch("comparison", r.type_name()))?;
                let result = match op {
                    BinaryOp::Lt => ln < rn,
                    BinaryOp::Le => ln <= rn,
                    BinaryOp::Gt => ln > rn,
                    BinaryOp::Ge => ln >= rn,
                    _ => unreachable!(),
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let ln = l.as_number().ok_or_else(|| type_mismatch("arithmetic", l.type_name()))?;
                let rn = r.as_number().ok_or_else(|| type_mismatch("arithmetic", r.type_name()))?;
                let result = match op {
                    BinaryOp::Add => ln + rn,
                    BinaryOp::Sub => ln - rn,
                    BinaryOp::Mul => ln * rn,
                    BinaryOp::Div => ln / rn,
                    _ => unreachable!(),
                };
                Ok(Value::Number(result))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn resolve_field(&self, path: &[String], ctx: &EvalContext<'_>) -> Result<Value, WaitTaskError> {
        let (root, rest) = path
            .split_first()
            .ok_or_else(|| WaitTaskError::new(ErrorKind::InvalidConfig, "empty field path"))?;

        match root.as_str() {
            "signal" => self.resolve_signal_field(rest, ctx.signal),
            "processor" => Ok(match ctx.processor {
                Some(output) => self.resolve_processor_field(rest, output),
                None => Value::Null,
            }),
            other => Err(WaitTaskError::new(
                ErrorKind::InvalidConfig,
                format!("unknown field root '{other}', expected 'signal' or 'processor'"),
            )),
        }
    }

    fn resolve_signal_field(
        &self,
        rest: &[String],
        signal: &SignalEnvelope,
    ) -> Result<Value, WaitTaskError> {
        match rest.split_first() {
            Some((head, tail)) if head == "payload" => {
                Ok(resolve_json_path(&signal.payload, tail))
            }
            Some((head, _)) if head == "signal_id" => Ok(Value::String(signal.signal_id().to_string())),
            Some((head, _)) if head == "workflow_id" => {
                Ok(Value::String(signal.metadata.workflow_id.clone()))
            }
            Some((head, _)) if head == "source" => Ok(signal
                .metadata
                .source
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null)),
            _ => Err(WaitTaskError::new(
                ErrorKind::InvalidConfig,
                format!("unknown signal field path 'signal.{}'", rest.join(".")),
            )),
        }
    }

    fn resolve_processor_field(&self, rest: &[String], output: &ProcessorOutput) -> Value {
        match rest.split_first() {
            Some((head, tail)) if head == "output" => output
                .output
                .as_ref()
                .map(|v| resolve_json_path(v, tail))
                .unwrap_or(Value::Null),
            Some((head, _)) if head == "error" => {
                output.error.clone().map(Value::String).unwrap_or(Value::Null)
            }
            _ => Value::Null,
        }
    }
}

fn resolve_json_path(value: &serde_json::Value, path: &[String]) -> Value {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    Value::from_json(current)
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

fn type_mismatch(op: &str, got: &str) -> WaitTaskError {
    WaitTaskError::new(
        ErrorKind::TypeMismatch,
        format!("operator {op} cannot be applied to a {got} value"),
    )
}
