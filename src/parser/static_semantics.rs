use crate::parser::ast::{
    DeclarationType, ExpressionType, FunctionData, MemberExpressionType, StatementType,
    VariableDeclarationOrExpression,
};

/// Names introduced by `var` anywhere in `body`, not descending into nested functions.
///
/// Order follows the source and duplicates are dropped.
pub fn get_var_scoped_declared_names(body: &[StatementType]) -> Vec<String> {
    let mut names = vec![];
    for stmt in body {
        collect_var_names(stmt, &mut names);
    }
    names
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

fn collect_var_names(stmt: &StatementType, names: &mut Vec<String>) {
    match stmt {
        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(v)) => {
            for d in &v.declarations {
                push_unique(names, &d.id.name);
            }
        }
        StatementType::BlockStatement(b) => {
            for s in &b.body {
                collect_var_names(s, names);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names(consequent, names);
            if let Some(a) = alternate {
                collect_var_names(a, names);
            }
        }
        StatementType::WhileStatement { body, .. } => collect_var_names(body, names),
        StatementType::ForStatement { init, body, .. } => {
            if let Some(VariableDeclarationOrExpression::VariableDeclaration(v)) = init {
                for d in &v.declarations {
                    push_unique(names, &d.id.name);
                }
            }
            collect_var_names(body, names);
        }
        _ => {}
    }
}

/// Function declarations that must be bound before the first statement of `body` runs.
///
/// Declarations nested in blocks are hoisted too; nested function bodies are not searched.
pub fn get_hoisted_function_declarations(body: &[StatementType]) -> Vec<&FunctionData> {
    let mut functions = vec![];
    for stmt in body {
        collect_function_declarations(stmt, &mut functions);
    }
    functions
}

fn collect_function_declarations<'a>(stmt: &'a StatementType, out: &mut Vec<&'a FunctionData>) {
    match stmt {
        StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => {
            out.push(f)
        }
        StatementType::BlockStatement(b) => {
            for s in &b.body {
                collect_function_declarations(s, out);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_function_declarations(consequent, out);
            if let Some(a) = alternate {
                collect_function_declarations(a, out);
            }
        }
        StatementType::WhileStatement { body, .. } | StatementType::ForStatement { body, .. } => {
            collect_function_declarations(body, out)
        }
        _ => {}
    }
}

pub fn is_valid_simple_assignment_target(expr: &ExpressionType) -> bool {
    match expr {
        ExpressionType::Identifier(_) => true,
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            ..
        })
        | ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            ..
        }) => true,
        _ => false,
    }
}
