//! Stack-based bytecode virtual machine.
//!
//! Executes the bytecode emitted by the compiler with a flat instruction dispatch loop.
//! One `Vm` runs one invocation of one [`Executable`]; calls into script functions spin up
//! a fresh `Vm` through the dispatch layer.

use std::cmp::Ordering;

use crate::runner::context::EvalContext;
use crate::runner::ds::array_object::parse_array_index;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{new_function_object, FunctionBody};
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{delete_property, get, get_index, has_property, literal_put, put};
use crate::runner::ds::operations::dispatch::{call_with, with_constructor};
use crate::runner::ds::operations::lex_env::{
    assign_binding, declare_var_binding, initialize_binding, new_declarative_environment,
    resolve_binding,
};
use crate::runner::ds::operations::test_and_comparison::{
    compare_values, instance_of, loose_equals, strict_equals,
};
use crate::runner::ds::operations::type_conversion::{
    to_boolean, to_f64, to_number, to_property_key, to_string, type_of, type_of_binding,
};
use crate::runner::ds::value::{JsNumberType, JsValue};

use super::bytecode::{OpCode, UPDATE_DECREMENT, UPDATE_POSTFIX};
use super::Executable;

const STRING_LENGTH_PROP: &str = "length";

/// The bytecode virtual machine.
pub struct Vm<'a> {
    executable: &'a Executable,
    /// Instruction pointer.
    ip: usize,
    /// Operand stack.
    stack: Vec<JsValue>,
    /// Innermost scope of the running code.
    scope: JsLexEnvironmentType,
    this_value: JsValue,
    /// Value of the last expression statement, reported when a script halts.
    completion: JsValue,
}

impl<'a> Vm<'a> {
    pub fn new(executable: &'a Executable, scope: JsLexEnvironmentType, this_value: JsValue) -> Self {
        Vm {
            executable,
            ip: 0,
            stack: Vec::with_capacity(32),
            scope,
            this_value,
            completion: JsValue::Undefined,
        }
    }

    /// Run the bytecode to completion.
    pub fn run(&mut self, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        let executable: &'a Executable = self.executable;
        let chunk = &executable.chunk;
        loop {
            let instr = match chunk.code.get(self.ip) {
                Some(i) => *i,
                None => return Ok(self.completion.clone()),
            };
            let operand = instr.operand;
            self.ip += 1;

            match instr.op {
                // ── Constants & Literals ──────────────────────
                OpCode::Constant => {
                    let val = chunk.constants[operand as usize].clone();
                    self.stack.push(val);
                }
                OpCode::Undefined => self.stack.push(JsValue::Undefined),
                OpCode::Null => self.stack.push(JsValue::Null),
                OpCode::True => self.stack.push(JsValue::Boolean(true)),
                OpCode::False => self.stack.push(JsValue::Boolean(false)),

                // ── Arithmetic ───────────────────────────────
                OpCode::Add => {
                    let (a, b) = self.pop2();
                    self.stack.push(js_add(&a, &b));
                }
                OpCode::Sub => self.numeric_binop(|a, b| a - b),
                OpCode::Mul => self.numeric_binop(|a, b| a * b),
                OpCode::Div => self.numeric_binop(|a, b| a / b),
                OpCode::Mod => self.numeric_binop(|a, b| a % b),
                OpCode::Negate => {
                    let a = self.pop();
                    self.stack.push(JsValue::from_f64(-to_f64(&a)));
                }
                OpCode::UnaryPlus => {
                    let a = self.pop();
                    self.stack.push(JsValue::Number(to_number(&a)));
                }

                // ── Comparison ───────────────────────────────
                OpCode::StrictEqual => {
                    let (a, b) = self.pop2();
                    self.stack.push(JsValue::Boolean(strict_equals(&a, &b)));
                }
                OpCode::StrictNotEqual => {
                    let (a, b) = self.pop2();
                    self.stack.push(JsValue::Boolean(!strict_equals(&a, &b)));
                }
                OpCode::Equal => {
                    let (a, b) = self.pop2();
                    self.stack.push(JsValue::Boolean(loose_equals(&a, &b)));
                }
                OpCode::NotEqual => {
                    let (a, b) = self.pop2();
                    self.stack.push(JsValue::Boolean(!loose_equals(&a, &b)));
                }
                OpCode::LessThan => self.compare(|o| o == Ordering::Less),
                OpCode::LessEqual => self.compare(|o| o != Ordering::Greater),
                OpCode::GreaterThan => self.compare(|o| o == Ordering::Greater),
                OpCode::GreaterEqual => self.compare(|o| o != Ordering::Less),
                OpCode::InstanceOf => {
                    let (value, constructor) = self.pop2();
                    let result = self.instance_of(ctx, &value, &constructor)?;
                    self.stack.push(JsValue::Boolean(result));
                }
                OpCode::In => {
                    let (key, object) = self.pop2();
                    let result = self.has_in(ctx, &key, &object)?;
                    self.stack.push(JsValue::Boolean(result));
                }

                // ── Unary ────────────────────────────────────
                OpCode::Not => {
                    let a = self.pop();
                    self.stack.push(JsValue::Boolean(!to_boolean(&a)));
                }
                OpCode::TypeOf => {
                    let a = self.pop();
                    self.stack.push(JsValue::str(type_of(&a)));
                }
                OpCode::TypeOfVar => {
                    let name = chunk.get_name(operand);
                    let t = type_of_binding(
                        &self.scope,
                        &self.executable.global,
                        name,
                        ctx.chain_limit(),
                    )?;
                    self.stack.push(JsValue::str(t));
                }
                OpCode::Void => {
                    self.pop();
                    self.stack.push(JsValue::Undefined);
                }

                // ── Variables ────────────────────────────────
                OpCode::GetVar => {
                    let val = self.get_var(ctx, chunk.get_name(operand))?;
                    self.stack.push(val);
                }
                OpCode::SetVar => {
                    let val = self.peek();
                    self.set_var(ctx, chunk.get_name(operand), val)?;
                }
                OpCode::DeclareVar => declare_var_binding(&self.scope, chunk.get_name(operand)),
                OpCode::BindFunction => {
                    let f = self.pop();
                    initialize_binding(&self.scope, chunk.get_name(operand), f);
                }

                // ── Control Flow ─────────────────────────────
                OpCode::Jump => self.ip = operand as usize,
                OpCode::JumpIfFalse => {
                    let a = self.pop();
                    if !to_boolean(&a) {
                        self.ip = operand as usize;
                    }
                }
                OpCode::JumpIfTrue => {
                    let a = self.pop();
                    if to_boolean(&a) {
                        self.ip = operand as usize;
                    }
                }

                // ── Stack ────────────────────────────────────
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::Dup => {
                    let a = self.peek();
                    self.stack.push(a);
                }
                OpCode::Dup2 => {
                    let (a, b) = self.pop2();
                    self.stack.push(a.clone());
                    self.stack.push(b.clone());
                    self.stack.push(a);
                    self.stack.push(b);
                }

                // ── Properties ───────────────────────────────
                OpCode::GetProp => {
                    let base = self.pop();
                    let val = get_property(ctx, &base, chunk.get_name(operand))?;
                    self.stack.push(val);
                }
                OpCode::SetProp => {
                    let (base, val) = self.pop2();
                    set_property(ctx, &base, chunk.get_name(operand), val.clone())?;
                    self.stack.push(val);
                }
                OpCode::GetElem => {
                    let (base, key) = self.pop2();
                    let val = get_element(ctx, &base, &key)?;
                    self.stack.push(val);
                }
                OpCode::SetElem => {
                    let val = self.pop();
                    let (base, key) = self.pop2();
                    set_property(ctx, &base, &to_property_key(&key), val.clone())?;
                    self.stack.push(val);
                }
                OpCode::DeleteProp => {
                    let base = self.pop();
                    let deleted = delete_on(&base, chunk.get_name(operand))?;
                    self.stack.push(JsValue::Boolean(deleted));
                }
                OpCode::DeleteElem => {
                    let (base, key) = self.pop2();
                    let deleted = delete_on(&base, &to_property_key(&key))?;
                    self.stack.push(JsValue::Boolean(deleted));
                }

                // ── Literals ─────────────────────────────────
                OpCode::NewObject => {
                    let o = ctx.new_object();
                    self.stack.push(JsValue::Object(o));
                }
                OpCode::InitProp => {
                    let (target, val) = self.pop2();
                    if let JsValue::Object(o) = target {
                        let o = literal_put(o, chunk.get_name(operand), val);
                        self.stack.push(JsValue::Object(o));
                    }
                }
                OpCode::NewArray => {
                    let elements = self.pop_n(operand as usize);
                    let a = ctx.new_array(elements);
                    self.stack.push(JsValue::Object(a));
                }

                // ── Functions ────────────────────────────────
                OpCode::MakeClosure => {
                    let f = self.make_closure(ctx, operand as usize);
                    self.stack.push(f);
                }
                OpCode::Call => {
                    let args = self.pop_n(operand as usize);
                    let callee = self.pop();
                    self.expose_caller(ctx);
                    let receiver = JsValue::Object(ctx.global_this.clone());
                    let result = call_with(ctx, &callee, receiver, args)?;
                    self.stack.push(result);
                }
                OpCode::CallMethod => {
                    let args = self.pop_n(operand as usize);
                    let (receiver, callee) = self.pop2();
                    self.expose_caller(ctx);
                    let result = call_with(ctx, &callee, receiver, args)?;
                    self.stack.push(result);
                }
                OpCode::New => {
                    let args = self.pop_n(operand as usize);
                    let callee = self.pop();
                    self.expose_caller(ctx);
                    let result = with_constructor(ctx, &callee, args)?;
                    self.stack.push(result);
                }
                OpCode::This => self.stack.push(self.this_value.clone()),

                // ── Updates ──────────────────────────────────
                OpCode::PreIncVar | OpCode::PreDecVar | OpCode::PostIncVar | OpCode::PostDecVar => {
                    let name = chunk.get_name(operand);
                    let old = to_number(&self.get_var(ctx, name)?);
                    let delta = match instr.op {
                        OpCode::PreDecVar | OpCode::PostDecVar => -1.0,
                        _ => 1.0,
                    };
                    let new = JsValue::from_f64(old.as_f64() + delta);
                    self.set_var(ctx, name, new.clone())?;
                    let result = match instr.op {
                        OpCode::PostIncVar | OpCode::PostDecVar => JsValue::Number(old),
                        _ => new,
                    };
                    self.stack.push(result);
                }
                OpCode::UpdateProp => {
                    let base = self.pop();
                    let key = chunk.get_name(operand).to_string();
                    let result = update_property(ctx, &base, &key, instr.operand2)?;
                    self.stack.push(result);
                }
                OpCode::UpdateElem => {
                    let (base, key) = self.pop2();
                    let key = to_property_key(&key);
                    let result = update_property(ctx, &base, &key, instr.operand2)?;
                    self.stack.push(result);
                }

                // ── Completion ───────────────────────────────
                OpCode::SetCompletion => self.completion = self.pop(),
                OpCode::Return => return Ok(self.pop()),
                OpCode::Halt => return Ok(self.completion.clone()),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    // Stack helpers
    // ════════════════════════════════════════════════════════════

    fn pop(&mut self) -> JsValue {
        self.stack.pop().unwrap_or(JsValue::Undefined)
    }

    /// Pops two values, returning them in push order.
    fn pop2(&mut self) -> (JsValue, JsValue) {
        let b = self.pop();
        let a = self.pop();
        (a, b)
    }

    fn pop_n(&mut self, n: usize) -> Vec<JsValue> {
        let at = self.stack.len().saturating_sub(n);
        self.stack.split_off(at)
    }

    fn peek(&self) -> JsValue {
        self.stack.last().cloned().unwrap_or(JsValue::Undefined)
    }

    fn numeric_binop(&mut self, op: fn(f64, f64) -> f64) {
        let (a, b) = self.pop2();
        self.stack.push(JsValue::from_f64(op(to_f64(&a), to_f64(&b))));
    }

    /// Relational operators: an undefined ordering (NaN involved) is always false.
    fn compare(&mut self, accept: fn(Ordering) -> bool) {
        let (a, b) = self.pop2();
        let result = compare_values(&a, &b).map(accept).unwrap_or(false);
        self.stack.push(JsValue::Boolean(result));
    }

    // ════════════════════════════════════════════════════════════
    // Scope access
    // ════════════════════════════════════════════════════════════

    /// Scope chain first, then the global object. Names bound nowhere read as `undefined`.
    fn get_var(&self, ctx: &EvalContext, name: &str) -> Result<JsValue, JErrorType> {
        match resolve_binding(&self.scope, name) {
            Some(v) => Ok(v),
            None => get(&self.executable.global, name, ctx.chain_limit()),
        }
    }

    /// Assigns the nearest binding; an unbound name becomes a property of the global object.
    fn set_var(&self, _ctx: &EvalContext, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if assign_binding(&self.scope, name, value.clone()) {
            Ok(())
        } else {
            put(&self.executable.global, name, value, true)
        }
    }

    /// Lets natives such as `eval` see the scope and receiver of the code calling them.
    fn expose_caller(&self, ctx: &mut EvalContext) {
        ctx.scope = self.scope.clone();
        ctx.this_value = self.this_value.clone();
    }

    fn make_closure(&self, ctx: &EvalContext, index: usize) -> JsValue {
        let executable = self.executable.chunk.functions[index].clone();
        let scope = if executable.binds_own_name {
            new_declarative_environment(Some(self.scope.clone()))
        } else {
            self.scope.clone()
        };
        let name = executable.name.clone();
        let binds_own_name = executable.binds_own_name;
        let f = new_function_object(
            &name,
            FunctionBody::Compiled {
                executable,
                scope: scope.clone(),
            },
            &ctx.prototypes,
        );
        if binds_own_name {
            initialize_binding(&scope, &name, JsValue::Object(f.clone()));
        }
        JsValue::Object(f)
    }

    fn instance_of(
        &self,
        ctx: &EvalContext,
        value: &JsValue,
        constructor: &JsValue,
    ) -> Result<bool, JErrorType> {
        match constructor {
            JsValue::Object(c) if c.borrow().is_callable() => {
                instance_of(value, c, ctx.chain_limit())
            }
            _ => Err(JErrorType::TypeError(
                "Right-hand side of 'instanceof' is not callable".to_string(),
            )),
        }
    }

    fn has_in(&self, ctx: &EvalContext, key: &JsValue, object: &JsValue) -> Result<bool, JErrorType> {
        match object {
            JsValue::Object(o) => has_property(o, &to_property_key(key), ctx.chain_limit()),
            _ => Err(JErrorType::TypeError(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                key, object
            ))),
        }
    }
}

/// `+`: string concatenation when either side is a string, numeric addition otherwise.
/// Arrays join their elements first, like their string form.
fn js_add(a: &JsValue, b: &JsValue) -> JsValue {
    match (a, b) {
        (JsValue::Number(JsNumberType::Integer(x)), JsValue::Number(JsNumberType::Integer(y))) => {
            JsValue::from_f64(*x as f64 + *y as f64)
        }
        (JsValue::String(x), _) => JsValue::String(format!("{}{}", x, to_string(b))),
        (_, JsValue::String(y)) => JsValue::String(format!("{}{}", to_string(a), y)),
        _ if is_array(a) || is_array(b) => {
            JsValue::String(format!("{}{}", to_string(a), to_string(b)))
        }
        _ => JsValue::from_f64(to_f64(a) + to_f64(b)),
    }
}

fn is_array(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().as_array().is_some(),
        _ => false,
    }
}

/// Property read on any value. Strings expose `length` and their characters by index; other
/// primitives have no properties.
pub fn get_property(ctx: &EvalContext, base: &JsValue, key: &str) -> Result<JsValue, JErrorType> {
    match base {
        JsValue::Object(o) => get(o, key, ctx.chain_limit()),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read property '{}' of {}",
            key, base
        ))),
        JsValue::String(s) => {
            if key == STRING_LENGTH_PROP {
                return Ok(JsValue::int(s.chars().count() as i64));
            }
            Ok(parse_array_index(key)
                .and_then(|i| s.chars().nth(i))
                .map(|c| JsValue::String(c.to_string()))
                .unwrap_or(JsValue::Undefined))
        }
        JsValue::Boolean(_) | JsValue::Number(_) => Ok(JsValue::Undefined),
    }
}

fn get_element(ctx: &EvalContext, base: &JsValue, key: &JsValue) -> Result<JsValue, JErrorType> {
    match base {
        JsValue::Object(o) => get_index(o, key, ctx.chain_limit()),
        _ => get_property(ctx, base, &to_property_key(key)),
    }
}

/// Property write. Writes to `undefined`/`null` fail, writes to other primitives are dropped.
fn set_property(
    _ctx: &EvalContext,
    base: &JsValue,
    key: &str,
    value: JsValue,
) -> Result<(), JErrorType> {
    match base {
        JsValue::Object(o) => put(o, key, value, true),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set property '{}' of {}",
            key, base
        ))),
        _ => Ok(()),
    }
}

fn delete_on(base: &JsValue, key: &str) -> Result<bool, JErrorType> {
    match base {
        JsValue::Object(o) => Ok(delete_property(o, key)),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot convert {} to object",
            base
        ))),
        _ => Ok(true),
    }
}

fn update_property(
    ctx: &EvalContext,
    base: &JsValue,
    key: &str,
    flags: u32,
) -> Result<JsValue, JErrorType> {
    let old = to_number(&get_property(ctx, base, key)?);
    let delta = if flags & UPDATE_DECREMENT != 0 { -1.0 } else { 1.0 };
    let new = JsValue::from_f64(old.as_f64() + delta);
    set_property(ctx, base, key, new.clone())?;
    Ok(if flags & UPDATE_POSTFIX != 0 {
        JsValue::Number(old)
    } else {
        new
    })
}
