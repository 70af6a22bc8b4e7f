//! Bytecode instruction set and chunk structure.
//!
//! Defines a flat, stack-based bytecode IR that the compiler emits
//! and the VM executes.

use std::rc::Rc;

use crate::runner::ds::value::JsValue;
use crate::runner::jit::Executable;

/// Bytecode opcodes for the stack-based VM.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum OpCode {
    // ── Constants & Literals ──────────────────────────────────
    /// Push a constant from the constant pool onto the stack.
    Constant,
    /// Push `undefined` onto the stack.
    Undefined,
    /// Push `null` onto the stack.
    Null,
    /// Push `true` onto the stack.
    True,
    /// Push `false` onto the stack.
    False,

    // ── Arithmetic ───────────────────────────────────────────
    /// Pop two values, push their sum (or concatenation).
    Add,
    /// Pop two values, push their difference.
    Sub,
    /// Pop two values, push their product.
    Mul,
    /// Pop two values, push their quotient.
    Div,
    /// Pop two values, push their remainder.
    Mod,
    /// Pop one value, push its numeric negation.
    Negate,
    /// Unary `+`: converts to number.
    UnaryPlus,

    // ── Comparison ───────────────────────────────────────────
    /// Strict equality (`===`).
    StrictEqual,
    /// Strict inequality (`!==`).
    StrictNotEqual,
    /// Abstract equality (`==`).
    Equal,
    /// Abstract inequality (`!=`).
    NotEqual,
    /// Less than.
    LessThan,
    /// Less than or equal.
    LessEqual,
    /// Greater than.
    GreaterThan,
    /// Greater than or equal.
    GreaterEqual,
    /// `instanceof`: stack has [value, constructor].
    InstanceOf,
    /// `in`: stack has [key, object].
    In,

    // ── Logical / Unary ──────────────────────────────────────
    /// Logical NOT.
    Not,
    /// `typeof` operator: pops value, pushes type string.
    TypeOf,
    /// `typeof` of a bare identifier, which must not fail when the name is unbound.
    /// Operand: name index.
    TypeOfVar,
    /// `void` operator: pops value, pushes undefined.
    Void,

    // ── Variables ────────────────────────────────────────────
    /// Resolve a name through the scope chain, then the global object.
    /// Operand: name index.
    GetVar,
    /// Assign the value on top of the stack (left in place) to the nearest binding,
    /// or to a global property if nothing binds the name. Operand: name index.
    SetVar,
    /// Declare a `var` binding in the current scope. Operand: name index.
    DeclareVar,
    /// Pop a value and bind it in the current scope, replacing any existing binding.
    /// Used for hoisted function declarations. Operand: name index.
    BindFunction,

    // ── Control Flow ─────────────────────────────────────────
    /// Unconditional jump (operand: absolute offset).
    Jump,
    /// Jump if top of stack is falsy (operand: absolute offset). Pops the value.
    JumpIfFalse,
    /// Jump if top of stack is truthy (operand: absolute offset). Pops the value.
    JumpIfTrue,

    // ── Stack manipulation ───────────────────────────────────
    /// Pop and discard the top of the stack.
    Pop,
    /// Duplicate the top of the stack.
    Dup,
    /// Duplicate the top two stack values (a,b -> a,b,a,b).
    Dup2,

    // ── Objects & Properties ─────────────────────────────────
    /// Get a property: pop object and push object.property.
    /// Operand: name index of property name.
    GetProp,
    /// Set a property: stack has [object, value], pushes value.
    /// Operand: name index of property name.
    SetProp,
    /// Get a computed property: stack has [object, key].
    GetElem,
    /// Set a computed property: stack has [object, key, value], pushes value.
    SetElem,
    /// `delete object.name`: pops object, pushes `true`. Operand: name index.
    DeleteProp,
    /// `delete object[key]`: stack has [object, key], pushes `true`.
    DeleteElem,
    /// Push a new empty object.
    NewObject,
    /// Object literal entry: stack has [object, value], leaves object.
    /// Operand: name index of the key.
    InitProp,
    /// Pop `operand` values and push an array holding them in order.
    NewArray,

    // ── Functions ────────────────────────────────────────────
    /// Push a closure over the current scope. Operand: index into the chunk's functions.
    MakeClosure,
    /// Call a function with the global object as receiver. Operand: argument count.
    /// Stack: [callee, arg_1, ..., arg_n]
    Call,
    /// Call a method. Operand: argument count.
    /// Stack: [object, callee, arg_1, ..., arg_n]
    CallMethod,
    /// Construct with `new`. Operand: argument count.
    /// Stack: [constructor, arg_1, ..., arg_n]
    New,
    /// Push the current receiver.
    This,

    // ── Misc ─────────────────────────────────────────────────
    /// Pop a value and record it as the script's completion value.
    SetCompletion,
    /// Return from the current function/script. Pops return value from stack.
    Return,
    /// Halt execution (end of script), yielding the completion value.
    Halt,

    // ── Pre/Post increment/decrement ─────────────────────────
    /// Pre-increment a variable (++x). Operand: name index.
    PreIncVar,
    /// Pre-decrement a variable (--x). Operand: name index.
    PreDecVar,
    /// Post-increment a variable (x++). Operand: name index.
    PostIncVar,
    /// Post-decrement a variable (x--). Operand: name index.
    PostDecVar,
    /// Update a named property: stack has [object]. Operand: name index,
    /// operand2: update flags.
    UpdateProp,
    /// Update a computed property: stack has [object, key]. Operand2: update flags.
    UpdateElem,
}

/// `operand2` bit of `UpdateProp`/`UpdateElem`: subtract instead of add.
pub const UPDATE_DECREMENT: u32 = 1;
/// `operand2` bit of `UpdateProp`/`UpdateElem`: push the old value instead of the new one.
pub const UPDATE_POSTFIX: u32 = 2;

/// A single bytecode instruction with optional operands.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub op: OpCode,
    /// Primary operand (constant pool index, jump offset, arg count, etc.).
    pub operand: u32,
    /// Secondary operand (update flags).
    pub operand2: u32,
}

impl Instruction {
    pub fn simple(op: OpCode) -> Self {
        Instruction {
            op,
            operand: 0,
            operand2: 0,
        }
    }

    pub fn with_operand(op: OpCode, operand: u32) -> Self {
        Instruction {
            op,
            operand,
            operand2: 0,
        }
    }

    pub fn with_two_operands(op: OpCode, operand: u32, operand2: u32) -> Self {
        Instruction {
            op,
            operand,
            operand2,
        }
    }
}

/// A compiled chunk of bytecode with its constant pool.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The bytecode instructions.
    pub code: Vec<Instruction>,
    /// Constant pool: holds literal values.
    pub constants: Vec<JsValue>,
    /// Deduplicated name table for variable/property names.
    pub names: Vec<String>,
    /// Nested functions, instantiated by `MakeClosure`.
    pub functions: Vec<Rc<Executable>>,
}

impl Chunk {
    pub fn new() -> Self {
        Chunk {
            code: Vec::new(),
            constants: Vec::new(),
            names: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Emit an instruction and return its index.
    pub fn emit(&mut self, instr: Instruction) -> usize {
        let idx = self.code.len();
        self.code.push(instr);
        idx
    }

    /// Emit a simple (no-operand) instruction.
    pub fn emit_op(&mut self, op: OpCode) -> usize {
        self.emit(Instruction::simple(op))
    }

    /// Emit an instruction with one operand.
    pub fn emit_with(&mut self, op: OpCode, operand: u32) -> usize {
        self.emit(Instruction::with_operand(op, operand))
    }

    /// Add a constant to the pool and return its index.
    pub fn add_constant(&mut self, value: JsValue) -> u32 {
        let idx = self.constants.len();
        self.constants.push(value);
        idx as u32
    }

    /// Add a name to the deduplicated name table and return its index.
    pub fn add_name(&mut self, s: &str) -> u32 {
        for (i, existing) in self.names.iter().enumerate() {
            if existing == s {
                return i as u32;
            }
        }
        let idx = self.names.len();
        self.names.push(s.to_string());
        idx as u32
    }

    pub fn add_function(&mut self, f: Executable) -> u32 {
        let idx = self.functions.len();
        self.functions.push(Rc::new(f));
        idx as u32
    }

    /// Get a name by index.
    #[inline]
    pub fn get_name(&self, idx: u32) -> &str {
        match self.names.get(idx as usize) {
            Some(n) => n,
            None => "",
        }
    }

    /// Patch a jump instruction's operand to point to the current code position.
    pub fn patch_jump(&mut self, jump_idx: usize) {
        let target = self.code.len();
        self.patch_jump_to(jump_idx, target);
    }

    pub fn patch_jump_to(&mut self, jump_idx: usize, target: usize) {
        if let Some(instr) = self.code.get_mut(jump_idx) {
            instr.operand = target as u32;
        }
    }

    /// Get the current code position (for jump targets).
    pub fn current_pos(&self) -> usize {
        self.code.len()
    }

    /// Disassemble the chunk for debugging.
    pub fn disassemble(&self, name: &str) -> String {
        let mut out = format!("== {} ==\n", name);
        for (i, instr) in self.code.iter().enumerate() {
            out.push_str(&format!("{:04}  {:?}", i, instr.op));
            match instr.op {
                OpCode::Constant => {
                    if let Some(val) = self.constants.get(instr.operand as usize) {
                        out.push_str(&format!("  {} ({:?})", instr.operand, val));
                    }
                }
                OpCode::GetVar
                | OpCode::SetVar
                | OpCode::DeclareVar
                | OpCode::BindFunction
                | OpCode::TypeOfVar
                | OpCode::GetProp
                | OpCode::SetProp
                | OpCode::DeleteProp
                | OpCode::InitProp
                | OpCode::PreIncVar
                | OpCode::PreDecVar
                | OpCode::PostIncVar
                | OpCode::PostDecVar => {
                    out.push_str(&format!("  \"{}\"", self.get_name(instr.operand)));
                }
                OpCode::UpdateProp => {
                    out.push_str(&format!(
                        "  \"{}\" flags={}",
                        self.get_name(instr.operand),
                        instr.operand2
                    ));
                }
                OpCode::UpdateElem => {
                    out.push_str(&format!("  flags={}", instr.operand2));
                }
                OpCode::Jump | OpCode::JumpIfFalse | OpCode::JumpIfTrue => {
                    out.push_str(&format!("  -> {:04}", instr.operand));
                }
                OpCode::Call | OpCode::CallMethod | OpCode::New => {
                    out.push_str(&format!("  argc={}", instr.operand));
                }
                OpCode::NewArray => {
                    out.push_str(&format!("  len={}", instr.operand));
                }
                OpCode::MakeClosure => {
                    if let Some(f) = self.functions.get(instr.operand as usize) {
                        out.push_str(&format!("  <{}>", f.name));
                    }
                }
                _ => {}
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}
