//! AST-to-bytecode compiler.
//!
//! Walks the AST once and emits a flat bytecode representation
//! that the VM can execute without tree-walking overhead.

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, DeclarationType, ExpressionType, FunctionData,
    LiteralData, LiteralType, LogicalOperator, MemberExpressionType, NumberLiteralType,
    ProgramData, StatementType, UnaryOperator, UpdateOperator, VariableDeclarationData,
    VariableDeclarationOrExpression,
};
use crate::parser::static_semantics::{
    get_hoisted_function_declarations, get_var_scoped_declared_names,
    is_valid_simple_assignment_target,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::jit::{Executable, SCRIPT_NAME, SOURCE_LABEL};

use super::bytecode::{Chunk, Instruction, OpCode, UPDATE_DECREMENT, UPDATE_POSTFIX};

/// Tracks loop context for break/continue resolution.
struct LoopContext {
    /// Indices of continue jumps, patched once the continue target is known.
    continue_jumps: Vec<usize>,
    /// Indices of break jumps that need patching when the loop ends.
    break_jumps: Vec<usize>,
}

/// The bytecode compiler.
pub struct Compiler {
    chunk: Chunk,
    /// Stack of active loop contexts for break/continue.
    loop_stack: Vec<LoopContext>,
    /// Scripts record completion values, function bodies discard them.
    is_script: bool,
    /// Global object the generated code falls back to for free names.
    global: JsObjectType,
}

fn invalid_assignment_target() -> JErrorType {
    JErrorType::ReferenceError("Invalid left-hand side in assignment".to_string())
}

impl Compiler {
    pub fn new(global: &JsObjectType) -> Self {
        Compiler {
            chunk: Chunk::new(),
            loop_stack: Vec::new(),
            is_script: true,
            global: global.clone(),
        }
    }

    fn new_for_function(global: &JsObjectType) -> Self {
        Compiler {
            is_script: false,
            ..Compiler::new(global)
        }
    }

    /// Compile a full program AST into an executable script.
    pub fn compile_program(mut self, program: &ProgramData) -> Result<Executable, JErrorType> {
        self.compile_body(&program.body)?;
        self.chunk.emit_op(OpCode::Halt);
        Ok(Executable {
            name: SCRIPT_NAME.to_string(),
            source_label: SOURCE_LABEL,
            params: vec![],
            chunk: self.chunk,
            global: self.global,
            binds_own_name: false,
        })
    }

    fn compile_function(
        &mut self,
        f: &FunctionData,
        is_expression: bool,
    ) -> Result<u32, JErrorType> {
        let mut inner = Compiler::new_for_function(&self.global);
        inner.compile_body(&f.body.body)?;
        inner.chunk.emit_op(OpCode::Undefined);
        inner.chunk.emit_op(OpCode::Return);
        let executable = Executable {
            name: f.id.as_ref().map(|i| i.name.to_string()).unwrap_or_default(),
            source_label: SOURCE_LABEL,
            params: f.params.iter().map(|p| p.name.to_string()).collect(),
            chunk: inner.chunk,
            global: self.global.clone(),
            binds_own_name: is_expression && f.id.is_some(),
        };
        Ok(self.chunk.add_function(executable))
    }

    /// Hoists `var` names and function declarations, then compiles the statements.
    fn compile_body(&mut self, body: &[StatementType]) -> Result<(), JErrorType> {
        for name in get_var_scoped_declared_names(body) {
            let idx = self.chunk.add_name(&name);
            self.chunk.emit_with(OpCode::DeclareVar, idx);
        }
        for f in get_hoisted_function_declarations(body) {
            let fn_idx = self.compile_function(f, false)?;
            self.chunk.emit_with(OpCode::MakeClosure, fn_idx);
            if let Some(id) = &f.id {
                let idx = self.chunk.add_name(&id.name);
                self.chunk.emit_with(OpCode::BindFunction, idx);
            } else {
                self.chunk.emit_op(OpCode::Pop);
            }
        }
        for stmt in body {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════
    // Statements
    // ════════════════════════════════════════════════════════════

    fn compile_statement(&mut self, stmt: &StatementType) -> Result<(), JErrorType> {
        match stmt {
            StatementType::EmptyStatement { .. } => {}

            StatementType::ExpressionStatement { expression, .. } => {
                self.compile_expression(expression)?;
                if self.is_script {
                    self.chunk.emit_op(OpCode::SetCompletion);
                } else {
                    self.chunk.emit_op(OpCode::Pop);
                }
            }

            StatementType::BlockStatement(block) => {
                for s in &block.body {
                    self.compile_statement(s)?;
                }
            }

            StatementType::DeclarationStatement(decl) => match decl {
                DeclarationType::VariableDeclaration(v) => self.compile_var_declaration(v)?,
                // Already bound by the body prologue.
                DeclarationType::FunctionDeclaration(_) => {}
            },

            StatementType::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.compile_expression(test)?;
                let else_jump = self.chunk.emit_with(OpCode::JumpIfFalse, 0);
                self.compile_statement(consequent)?;
                match alternate {
                    Some(alt) => {
                        let end_jump = self.chunk.emit_with(OpCode::Jump, 0);
                        self.chunk.patch_jump(else_jump);
                        self.compile_statement(alt)?;
                        self.chunk.patch_jump(end_jump);
                    }
                    None => self.chunk.patch_jump(else_jump),
                }
            }

            StatementType::WhileStatement { test, body, .. } => {
                let loop_start = self.chunk.current_pos();
                self.compile_expression(test)?;
                let exit_jump = self.chunk.emit_with(OpCode::JumpIfFalse, 0);
                self.loop_stack.push(LoopContext {
                    continue_jumps: vec![],
                    break_jumps: vec![],
                });
                self.compile_statement(body)?;
                self.chunk
                    .emit(Instruction::with_operand(OpCode::Jump, loop_start as u32));
                self.chunk.patch_jump(exit_jump);
                self.finish_loop(loop_start);
            }

            StatementType::ForStatement {
                init,
                test,
                update,
                body,
                ..
            } => {
                match init {
                    Some(VariableDeclarationOrExpression::VariableDeclaration(v)) => {
                        self.compile_var_declaration(v)?
                    }
                    Some(VariableDeclarationOrExpression::Expression(e)) => {
                        self.compile_expression(e)?;
                        self.chunk.emit_op(OpCode::Pop);
                    }
                    None => {}
                }
                let loop_start = self.chunk.current_pos();
                let exit_jump = match test {
                    Some(t) => {
                        self.compile_expression(t)?;
                        Some(self.chunk.emit_with(OpCode::JumpIfFalse, 0))
                    }
                    None => None,
                };
                self.loop_stack.push(LoopContext {
                    continue_jumps: vec![],
                    break_jumps: vec![],
                });
                self.compile_statement(body)?;
                let update_pos = self.chunk.current_pos();
                if let Some(u) = update {
                    self.compile_expression(u)?;
                    self.chunk.emit_op(OpCode::Pop);
                }
                self.chunk
                    .emit(Instruction::with_operand(OpCode::Jump, loop_start as u32));
                if let Some(j) = exit_jump {
                    self.chunk.patch_jump(j);
                }
                self.finish_loop(update_pos);
            }

            StatementType::BreakStatement { .. } => {
                let jump = self.chunk.emit_with(OpCode::Jump, 0);
                match self.loop_stack.last_mut() {
                    Some(ctx) => ctx.break_jumps.push(jump),
                    None => {
                        return Err(JErrorType::SyntaxError(
                            "Illegal break statement".to_string(),
                        ))
                    }
                }
            }

            StatementType::ContinueStatement { .. } => {
                let jump = self.chunk.emit_with(OpCode::Jump, 0);
                match self.loop_stack.last_mut() {
                    Some(ctx) => ctx.continue_jumps.push(jump),
                    None => {
                        return Err(JErrorType::SyntaxError(
                            "Illegal continue statement".to_string(),
                        ))
                    }
                }
            }

            StatementType::ReturnStatement { argument, .. } => {
                match argument {
                    Some(arg) => self.compile_expression(arg)?,
                    None => {
                        self.chunk.emit_op(OpCode::Undefined);
                    }
                }
                self.chunk.emit_op(OpCode::Return);
            }
        }
        Ok(())
    }

    /// Pops the innermost loop, pointing its `continue`s at `continue_target` and its
    /// `break`s at the current position.
    fn finish_loop(&mut self, continue_target: usize) {
        if let Some(ctx) = self.loop_stack.pop() {
            for j in ctx.continue_jumps {
                self.chunk.patch_jump_to(j, continue_target);
            }
            for j in ctx.break_jumps {
                self.chunk.patch_jump(j);
            }
        }
    }

    fn compile_var_declaration(&mut self, v: &VariableDeclarationData) -> Result<(), JErrorType> {
        for d in &v.declarations {
            if let Some(init) = &d.init {
                self.compile_expression(init)?;
                let idx = self.chunk.add_name(&d.id.name);
                self.chunk.emit_with(OpCode::SetVar, idx);
                self.chunk.emit_op(OpCode::Pop);
            }
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════
    // Expressions
    // ════════════════════════════════════════════════════════════

    fn compile_expression(&mut self, expr: &ExpressionType) -> Result<(), JErrorType> {
        match expr {
            ExpressionType::Literal(lit) => self.compile_literal(lit),

            ExpressionType::Identifier(id) => {
                let idx = self.chunk.add_name(&id.name);
                self.chunk.emit_with(OpCode::GetVar, idx);
            }

            ExpressionType::ThisExpression { .. } => {
                self.chunk.emit_op(OpCode::This);
            }

            ExpressionType::ArrayExpression { elements, .. } => {
                for e in elements {
                    self.compile_expression(e)?;
                }
                self.chunk.emit_with(OpCode::NewArray, elements.len() as u32);
            }

            ExpressionType::ObjectExpression { properties, .. } => {
                self.chunk.emit_op(OpCode::NewObject);
                for p in properties {
                    self.compile_expression(&p.value)?;
                    let idx = self.chunk.add_name(&p.key);
                    self.chunk.emit_with(OpCode::InitProp, idx);
                }
            }

            ExpressionType::FunctionExpression(f) => {
                let fn_idx = self.compile_function(f, true)?;
                self.chunk.emit_with(OpCode::MakeClosure, fn_idx);
            }

            ExpressionType::UnaryExpression {
                operator, argument, ..
            } => self.compile_unary(*operator, argument)?,

            ExpressionType::UpdateExpression {
                operator,
                argument,
                prefix,
                ..
            } => self.compile_update(*operator, argument, *prefix)?,

            ExpressionType::BinaryExpression {
                operator,
                left,
                right,
                ..
            } => {
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                self.chunk.emit_op(binary_opcode(*operator));
            }

            ExpressionType::LogicalExpression {
                operator,
                left,
                right,
                ..
            } => {
                self.compile_expression(left)?;
                self.chunk.emit_op(OpCode::Dup);
                let short_circuit = match operator {
                    LogicalOperator::And => self.chunk.emit_with(OpCode::JumpIfFalse, 0),
                    LogicalOperator::Or => self.chunk.emit_with(OpCode::JumpIfTrue, 0),
                };
                self.chunk.emit_op(OpCode::Pop);
                self.compile_expression(right)?;
                self.chunk.patch_jump(short_circuit);
            }

            ExpressionType::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => self.compile_assignment(*operator, left, right)?,

            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.compile_expression(test)?;
                let else_jump = self.chunk.emit_with(OpCode::JumpIfFalse, 0);
                self.compile_expression(consequent)?;
                let end_jump = self.chunk.emit_with(OpCode::Jump, 0);
                self.chunk.patch_jump(else_jump);
                self.compile_expression(alternate)?;
                self.chunk.patch_jump(end_jump);
            }

            ExpressionType::CallExpression {
                callee, arguments, ..
            } => self.compile_call(callee, arguments)?,

            ExpressionType::NewExpression {
                callee, arguments, ..
            } => {
                self.compile_expression(callee)?;
                for a in arguments {
                    self.compile_expression(a)?;
                }
                self.chunk.emit_with(OpCode::New, arguments.len() as u32);
            }

            ExpressionType::MemberExpression(m) => match m {
                MemberExpressionType::SimpleMemberExpression {
                    object, property, ..
                } => {
                    self.compile_expression(object)?;
                    let idx = self.chunk.add_name(&property.name);
                    self.chunk.emit_with(OpCode::GetProp, idx);
                }
                MemberExpressionType::ComputedMemberExpression {
                    object, property, ..
                } => {
                    self.compile_expression(object)?;
                    self.compile_expression(property)?;
                    self.chunk.emit_op(OpCode::GetElem);
                }
            },

            ExpressionType::SequenceExpression { expressions, .. } => {
                for (i, e) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.chunk.emit_op(OpCode::Pop);
                    }
                    self.compile_expression(e)?;
                }
                if expressions.is_empty() {
                    self.chunk.emit_op(OpCode::Undefined);
                }
            }
        }
        Ok(())
    }

    fn compile_literal(&mut self, lit: &LiteralData) {
        match &lit.value {
            LiteralType::NullLiteral => {
                self.chunk.emit_op(OpCode::Null);
            }
            LiteralType::BooleanLiteral(true) => {
                self.chunk.emit_op(OpCode::True);
            }
            LiteralType::BooleanLiteral(false) => {
                self.chunk.emit_op(OpCode::False);
            }
            LiteralType::StringLiteral(s) => {
                let idx = self.chunk.add_constant(JsValue::String(s.to_string()));
                self.chunk.emit_with(OpCode::Constant, idx);
            }
            LiteralType::NumberLiteral(n) => {
                let value = match n {
                    NumberLiteralType::IntegerLiteral(i) => {
                        JsNumberType::from_f64(*i as f64)
                    }
                    NumberLiteralType::FloatLiteral(f) => JsNumberType::from_f64(*f),
                };
                let idx = self.chunk.add_constant(JsValue::Number(value));
                self.chunk.emit_with(OpCode::Constant, idx);
            }
        }
    }

    fn compile_unary(
        &mut self,
        operator: UnaryOperator,
        argument: &ExpressionType,
    ) -> Result<(), JErrorType> {
        match operator {
            UnaryOperator::TypeOf => {
                if let ExpressionType::Identifier(id) = argument {
                    let idx = self.chunk.add_name(&id.name);
                    self.chunk.emit_with(OpCode::TypeOfVar, idx);
                } else {
                    self.compile_expression(argument)?;
                    self.chunk.emit_op(OpCode::TypeOf);
                }
            }
            UnaryOperator::Delete => match argument {
                ExpressionType::MemberExpression(
                    MemberExpressionType::SimpleMemberExpression {
                        object, property, ..
                    },
                ) => {
                    self.compile_expression(object)?;
                    let idx = self.chunk.add_name(&property.name);
                    self.chunk.emit_with(OpCode::DeleteProp, idx);
                }
                ExpressionType::MemberExpression(
                    MemberExpressionType::ComputedMemberExpression {
                        object, property, ..
                    },
                ) => {
                    self.compile_expression(object)?;
                    self.compile_expression(property)?;
                    self.chunk.emit_op(OpCode::DeleteElem);
                }
                // Variables cannot be deleted.
                ExpressionType::Identifier(_) => {
                    self.chunk.emit_op(OpCode::False);
                }
                _ => {
                    self.compile_expression(argument)?;
                    self.chunk.emit_op(OpCode::Pop);
                    self.chunk.emit_op(OpCode::True);
                }
            },
            _ => {
                self.compile_expression(argument)?;
                self.chunk.emit_op(match operator {
                    UnaryOperator::Minus => OpCode::Negate,
                    UnaryOperator::Plus => OpCode::UnaryPlus,
                    UnaryOperator::LogicalNot => OpCode::Not,
                    _ => OpCode::Void,
                });
            }
        }
        Ok(())
    }

    fn compile_update(
        &mut self,
        operator: UpdateOperator,
        argument: &ExpressionType,
        prefix: bool,
    ) -> Result<(), JErrorType> {
        let mut flags = 0;
        if operator == UpdateOperator::MinusMinus {
            flags |= UPDATE_DECREMENT;
        }
        if !prefix {
            flags |= UPDATE_POSTFIX;
        }
        match argument {
            ExpressionType::Identifier(id) => {
                let idx = self.chunk.add_name(&id.name);
                let op = match (operator, prefix) {
                    (UpdateOperator::PlusPlus, true) => OpCode::PreIncVar,
                    (UpdateOperator::MinusMinus, true) => OpCode::PreDecVar,
                    (UpdateOperator::PlusPlus, false) => OpCode::PostIncVar,
                    (UpdateOperator::MinusMinus, false) => OpCode::PostDecVar,
                };
                self.chunk.emit_with(op, idx);
            }
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                property,
                ..
            }) => {
                self.compile_expression(object)?;
                let idx = self.chunk.add_name(&property.name);
                self.chunk
                    .emit(Instruction::with_two_operands(OpCode::UpdateProp, idx, flags));
            }
            ExpressionType::MemberExpression(
                MemberExpressionType::ComputedMemberExpression {
                    object, property, ..
                },
            ) => {
                self.compile_expression(object)?;
                self.compile_expression(property)?;
                self.chunk
                    .emit(Instruction::with_two_operands(OpCode::UpdateElem, 0, flags));
            }
            _ => {
                return Err(JErrorType::ReferenceError(format!(
                    "Invalid left-hand side expression in {} operation",
                    if prefix { "prefix" } else { "postfix" }
                )))
            }
        }
        Ok(())
    }

    fn compile_assignment(
        &mut self,
        operator: AssignmentOperator,
        left: &ExpressionType,
        right: &ExpressionType,
    ) -> Result<(), JErrorType> {
        if !is_valid_simple_assignment_target(left) {
            return Err(invalid_assignment_target());
        }
        let binary = compound_opcode(operator);
        match left {
            ExpressionType::Identifier(id) => {
                let idx = self.chunk.add_name(&id.name);
                if let Some(op) = binary {
                    self.chunk.emit_with(OpCode::GetVar, idx);
                    self.compile_expression(right)?;
                    self.chunk.emit_op(op);
                } else {
                    self.compile_expression(right)?;
                }
                self.chunk.emit_with(OpCode::SetVar, idx);
            }
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                property,
                ..
            }) => {
                let idx = self.chunk.add_name(&property.name);
                self.compile_expression(object)?;
                if let Some(op) = binary {
                    self.chunk.emit_op(OpCode::Dup);
                    self.chunk.emit_with(OpCode::GetProp, idx);
                    self.compile_expression(right)?;
                    self.chunk.emit_op(op);
                } else {
                    self.compile_expression(right)?;
                }
                self.chunk.emit_with(OpCode::SetProp, idx);
            }
            ExpressionType::MemberExpression(
                MemberExpressionType::ComputedMemberExpression {
                    object, property, ..
                },
            ) => {
                self.compile_expression(object)?;
                self.compile_expression(property)?;
                if let Some(op) = binary {
                    self.chunk.emit_op(OpCode::Dup2);
                    self.chunk.emit_op(OpCode::GetElem);
                    self.compile_expression(right)?;
                    self.chunk.emit_op(op);
                } else {
                    self.compile_expression(right)?;
                }
                self.chunk.emit_op(OpCode::SetElem);
            }
            _ => return Err(invalid_assignment_target()),
        }
        Ok(())
    }

    fn compile_call(
        &mut self,
        callee: &ExpressionType,
        arguments: &[ExpressionType],
    ) -> Result<(), JErrorType> {
        let op = match callee {
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                property,
                ..
            }) => {
                self.compile_expression(object)?;
                self.chunk.emit_op(OpCode::Dup);
                let idx = self.chunk.add_name(&property.name);
                self.chunk.emit_with(OpCode::GetProp, idx);
                OpCode::CallMethod
            }
            ExpressionType::MemberExpression(
                MemberExpressionType::ComputedMemberExpression {
                    object, property, ..
                },
            ) => {
                self.compile_expression(object)?;
                self.chunk.emit_op(OpCode::Dup);
                self.compile_expression(property)?;
                self.chunk.emit_op(OpCode::GetElem);
                OpCode::CallMethod
            }
            _ => {
                self.compile_expression(callee)?;
                OpCode::Call
            }
        };
        for a in arguments {
            self.compile_expression(a)?;
        }
        self.chunk.emit_with(op, arguments.len() as u32);
        Ok(())
    }
}

fn binary_opcode(operator: BinaryOperator) -> OpCode {
    match operator {
        BinaryOperator::LooselyEqual => OpCode::Equal,
        BinaryOperator::LooselyUnequal => OpCode::NotEqual,
        BinaryOperator::StrictlyEqual => OpCode::StrictEqual,
        BinaryOperator::StrictlyUnequal => OpCode::StrictNotEqual,
        BinaryOperator::LessThan => OpCode::LessThan,
        BinaryOperator::LessThanEqual => OpCode::LessEqual,
        BinaryOperator::GreaterThan => OpCode::GreaterThan,
        BinaryOperator::GreaterThanEqual => OpCode::GreaterEqual,
        BinaryOperator::Add => OpCode::Add,
        BinaryOperator::Subtract => OpCode::Sub,
        BinaryOperator::Multiply => OpCode::Mul,
        BinaryOperator::Divide => OpCode::Div,
        BinaryOperator::Modulo => OpCode::Mod,
        BinaryOperator::In => OpCode::In,
        BinaryOperator::InstanceOf => OpCode::InstanceOf,
    }
}

fn compound_opcode(operator: AssignmentOperator) -> Option<OpCode> {
    match operator {
        AssignmentOperator::Equals => None,
        AssignmentOperator::AddEquals => Some(OpCode::Add),
        AssignmentOperator::SubtractEquals => Some(OpCode::Sub),
        AssignmentOperator::MultiplyEquals => Some(OpCode::Mul),
        AssignmentOperator::DivideEquals => Some(OpCode::Div),
        AssignmentOperator::ModuloEquals => Some(OpCode::Mod),
    }
}
