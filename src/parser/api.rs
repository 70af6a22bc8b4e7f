use std::fmt;

use log::debug;
use pest::error::{Error, ErrorVariant, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest::Span;
use pest_derive::Parser;

use super::ast::*;
use super::util::unescape_string_literal;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

/// Reason a source text could not be turned into an AST.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}, column {})",
            self.message, self.line, self.column
        )
    }
}

impl std::error::Error for ParseError {}

impl From<Error<Rule>> for ParseError {
    fn from(e: Error<Rule>) -> Self {
        let (line, column) = match e.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        let message = match &e.variant {
            ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
                format!("Unexpected token, expected one of {:?}", positives)
            }
            ErrorVariant::ParsingError { .. } => "Unexpected token".to_string(),
            ErrorVariant::CustomError { message } => message.clone(),
        };
        ParseError {
            message,
            line,
            column,
        }
    }
}

impl JsParser {
    /// Parses a complete script into a [`ProgramData`].
    pub fn parse_to_ast_from_str(script: &str) -> Result<ProgramData, ParseError> {
        let ast = parse_to_ast(script)?;
        debug!(
            "parsed {} top-level statement(s) from {} byte(s) of source",
            ast.body.len(),
            script.len()
        );
        Ok(ast)
    }
}

pub fn parse_to_ast(script: &str) -> Result<ProgramData, Error<Rule>> {
    let mut pairs = JsParser::parse(Rule::script, script)?;
    let mut body = vec![];
    if let Some(script_pair) = pairs.next() {
        for pair in script_pair.into_inner() {
            match pair.as_rule() {
                Rule::EOI => { /* Do nothing */ }
                _ => body.push(build_ast_from_statement(pair)?),
            }
        }
    }
    Ok(ProgramData {
        meta: Meta {
            start_index: 0,
            end_index: script.len(),
        },
        body,
    })
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn expect_next<'i>(pairs: &mut Pairs<'i, Rule>, span: &Span<'i>) -> Result<Pair<'i, Rule>, Error<Rule>> {
    match pairs.next() {
        Some(p) => Ok(p),
        None => Err(Error::new_from_span(
            ErrorVariant::CustomError {
                message: "Unexpected end of construct".to_string(),
            },
            span.clone(),
        )),
    }
}

fn build_ast_from_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement(BlockStatementData {
            meta,
            body: build_ast_from_statement_list(pair.into_inner())?,
        }),
        Rule::variable_statement => {
            let mut inner = pair.into_inner();
            let list = expect_next(&mut inner, &span)?;
            StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(
                build_ast_from_variable_declaration_list(list)?,
            ))
        }
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::if_statement => {
            let mut inner = pair.into_inner();
            let test = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            let consequent = build_ast_from_statement(expect_next(&mut inner, &span)?)?;
            let alternate = match inner.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::while_statement => {
            let mut inner = pair.into_inner();
            let test = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            let body = build_ast_from_statement(expect_next(&mut inner, &span)?)?;
            StatementType::WhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::for_statement => build_ast_from_for_statement(pair)?,
        Rule::break_statement => StatementType::BreakStatement { meta },
        Rule::continue_statement => StatementType::ContinueStatement { meta },
        Rule::return_statement => {
            let argument = match pair.into_inner().next() {
                Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
                None => None,
            };
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::function_declaration => StatementType::DeclarationStatement(
            DeclarationType::FunctionDeclaration(build_ast_from_function(pair)?),
        ),
        Rule::expression_statement => {
            let mut inner = pair.into_inner();
            let expression = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            StatementType::ExpressionStatement {
                meta,
                expression: Box::new(expression),
            }
        }
        _ => return Err(get_unexpected_error(1, &pair)),
    })
}

fn build_ast_from_statement_list(pairs: Pairs<Rule>) -> Result<Vec<StatementType>, Error<Rule>> {
    let mut s = vec![];
    for pair in pairs {
        s.push(build_ast_from_statement(pair)?);
    }
    Ok(s)
}

fn build_ast_from_for_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for inner_pair in pair.clone().into_inner() {
        match inner_pair.as_rule() {
            Rule::for_init => {
                let span = inner_pair.as_span();
                let p = expect_next(&mut inner_pair.into_inner(), &span)?;
                init = Some(if p.as_rule() == Rule::variable_declaration_list {
                    VariableDeclarationOrExpression::VariableDeclaration(
                        build_ast_from_variable_declaration_list(p)?,
                    )
                } else {
                    VariableDeclarationOrExpression::Expression(Box::new(
                        build_ast_from_expression(p)?,
                    ))
                });
            }
            Rule::for_test => {
                let span = inner_pair.as_span();
                let p = expect_next(&mut inner_pair.into_inner(), &span)?;
                test = Some(Box::new(build_ast_from_expression(p)?));
            }
            Rule::for_update => {
                let span = inner_pair.as_span();
                let p = expect_next(&mut inner_pair.into_inner(), &span)?;
                update = Some(Box::new(build_ast_from_expression(p)?));
            }
            _ => body = Some(Box::new(build_ast_from_statement(inner_pair)?)),
        }
    }
    match body {
        Some(body) => Ok(StatementType::ForStatement {
            meta,
            init,
            test,
            update,
            body,
        }),
        None => Err(get_unexpected_error(2, &pair)),
    }
}

fn build_ast_from_variable_declaration_list(
    pair: Pair<Rule>,
) -> Result<VariableDeclarationData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut declarations = vec![];
    for decl in pair.into_inner() {
        let decl_meta = get_meta(&decl);
        let span = decl.as_span();
        let mut inner = decl.into_inner();
        let id = build_ast_from_identifier(expect_next(&mut inner, &span)?);
        let init = match inner.next() {
            Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
            None => None,
        };
        declarations.push(VariableDeclaratorData {
            meta: decl_meta,
            id,
            init,
        });
    }
    Ok(VariableDeclarationData { meta, declarations })
}

fn build_ast_from_identifier(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        meta: get_meta(&pair),
        name: pair.as_str().to_string(),
    }
}

fn build_ast_from_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for inner_pair in pair.clone().into_inner() {
        match inner_pair.as_rule() {
            Rule::identifier => id = Some(build_ast_from_identifier(inner_pair)),
            Rule::formal_parameters => {
                for p in inner_pair.into_inner() {
                    params.push(build_ast_from_identifier(p));
                }
            }
            Rule::function_body => {
                let body_meta = get_meta(&inner_pair);
                body = Some(FunctionBodyData {
                    meta: body_meta,
                    body: build_ast_from_statement_list(inner_pair.into_inner())?,
                });
            }
            _ => return Err(get_unexpected_error(3, &inner_pair)),
        }
    }
    match body {
        Some(body) => Ok(FunctionData {
            meta,
            id,
            params,
            body,
        }),
        None => Err(get_unexpected_error(4, &pair)),
    }
}

fn build_ast_from_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::expression => {
            let mut expressions = vec![];
            for p in pair.into_inner() {
                expressions.push(build_ast_from_expression(p)?);
            }
            if expressions.len() == 1 {
                expressions.remove(0)
            } else {
                ExpressionType::SequenceExpression { meta, expressions }
            }
        }
        Rule::assignment_expression => {
            let mut inner = pair.into_inner();
            let left = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            match inner.next() {
                None => left,
                Some(op) => {
                    let operator = match op.as_str() {
                        "=" => AssignmentOperator::Equals,
                        "+=" => AssignmentOperator::AddEquals,
                        "-=" => AssignmentOperator::SubtractEquals,
                        "*=" => AssignmentOperator::MultiplyEquals,
                        "/=" => AssignmentOperator::DivideEquals,
                        "%=" => AssignmentOperator::ModuloEquals,
                        _ => return Err(get_unexpected_error(5, &op)),
                    };
                    let right = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
                    ExpressionType::AssignmentExpression {
                        meta,
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
            }
        }
        Rule::conditional_expression => {
            let mut inner = pair.into_inner();
            let test = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            match inner.next() {
                None => test,
                Some(c) => {
                    let consequent = build_ast_from_expression(c)?;
                    let alternate = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
                    ExpressionType::ConditionalExpression {
                        meta,
                        test: Box::new(test),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                    }
                }
            }
        }
        Rule::logical_or_expression => build_ast_from_logical_expression(pair, LogicalOperator::Or)?,
        Rule::logical_and_expression => {
            build_ast_from_logical_expression(pair, LogicalOperator::And)?
        }
        Rule::equality_expression
        | Rule::relational_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => build_ast_from_binary_expression(pair)?,
        Rule::unary_expression => build_ast_from_unary_expression(pair)?,
        Rule::postfix_expression => {
            let mut inner = pair.into_inner();
            let argument = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            match inner.next() {
                None => argument,
                Some(op) => ExpressionType::UpdateExpression {
                    meta,
                    operator: get_update_operator(&op)?,
                    argument: Box::new(argument),
                    prefix: false,
                },
            }
        }
        Rule::lhs_expression | Rule::member_expression => {
            let mut inner = pair.into_inner();
            let mut obj = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            for suffix in inner {
                let suffix_meta = Meta {
                    start_index: meta.start_index,
                    end_index: suffix.as_span().end(),
                };
                obj = build_ast_from_suffix(obj, suffix, suffix_meta)?;
            }
            obj
        }
        Rule::new_member => {
            let mut inner = pair.into_inner();
            let callee = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            let arguments = build_ast_from_arguments(expect_next(&mut inner, &span)?)?;
            ExpressionType::NewExpression {
                meta,
                callee: Box::new(callee),
                arguments,
            }
        }
        Rule::new_no_args => {
            let mut inner = pair.into_inner();
            let callee = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
            ExpressionType::NewExpression {
                meta,
                callee: Box::new(callee),
                arguments: vec![],
            }
        }
        Rule::this_expression => ExpressionType::ThisExpression { meta },
        Rule::function_expression => {
            ExpressionType::FunctionExpression(build_ast_from_function(pair)?)
        }
        Rule::identifier => ExpressionType::Identifier(build_ast_from_identifier(pair)),
        Rule::null_literal
        | Rule::boolean_literal
        | Rule::numeric_literal
        | Rule::string_literal => ExpressionType::Literal(build_ast_from_literal(pair)?),
        Rule::array_literal => {
            let mut elements = vec![];
            for p in pair.into_inner() {
                elements.push(build_ast_from_expression(p)?);
            }
            ExpressionType::ArrayExpression { meta, elements }
        }
        Rule::object_literal => {
            let mut properties = vec![];
            for p in pair.into_inner() {
                let p_meta = get_meta(&p);
                let p_span = p.as_span();
                let mut inner = p.into_inner();
                let key_pair = expect_next(&mut inner, &p_span)?;
                let key = match key_pair.as_rule() {
                    Rule::identifier_name => key_pair.as_str().to_string(),
                    Rule::string_literal | Rule::numeric_literal => {
                        match build_ast_from_literal(key_pair.clone())?.value {
                            LiteralType::StringLiteral(s) => s,
                            LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => {
                                i.to_string()
                            }
                            LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => {
                                f.to_string()
                            }
                            _ => return Err(get_unexpected_error(6, &key_pair)),
                        }
                    }
                    _ => return Err(get_unexpected_error(7, &key_pair)),
                };
                let value = build_ast_from_expression(expect_next(&mut inner, &p_span)?)?;
                properties.push(PropertyData {
                    meta: p_meta,
                    key,
                    value,
                });
            }
            ExpressionType::ObjectExpression { meta, properties }
        }
        _ => return Err(get_unexpected_error(8, &pair)),
    })
}

fn build_ast_from_suffix(
    obj: ExpressionType,
    suffix: Pair<Rule>,
    meta: Meta,
) -> Result<ExpressionType, Error<Rule>> {
    let span = suffix.as_span();
    Ok(match suffix.as_rule() {
        Rule::arguments => ExpressionType::CallExpression {
            meta,
            callee: Box::new(obj),
            arguments: build_ast_from_arguments(suffix)?,
        },
        Rule::dot_member => {
            let name = expect_next(&mut suffix.into_inner(), &span)?;
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                meta,
                object: Box::new(obj),
                property: build_ast_from_identifier(name),
            })
        }
        Rule::computed_member => {
            let property = build_ast_from_expression(expect_next(&mut suffix.into_inner(), &span)?)?;
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                meta,
                object: Box::new(obj),
                property: Box::new(property),
            })
        }
        _ => return Err(get_unexpected_error(9, &suffix)),
    })
}

fn build_ast_from_arguments(pair: Pair<Rule>) -> Result<Vec<ExpressionType>, Error<Rule>> {
    let mut args = vec![];
    for p in pair.into_inner() {
        args.push(build_ast_from_expression(p)?);
    }
    Ok(args)
}

fn build_ast_from_logical_expression(
    pair: Pair<Rule>,
    operator: LogicalOperator,
) -> Result<ExpressionType, Error<Rule>> {
    let start_index = pair.as_span().start();
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let mut left = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
    for p in inner {
        let end_index = p.as_span().end();
        let right = build_ast_from_expression(p)?;
        left = ExpressionType::LogicalExpression {
            meta: Meta {
                start_index,
                end_index,
            },
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn build_ast_from_binary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let start_index = pair.as_span().start();
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let mut left = build_ast_from_expression(expect_next(&mut inner, &span)?)?;
    while let Some(op) = inner.next() {
        let operator = match op.as_str() {
            "==" => BinaryOperator::LooselyEqual,
            "!=" => BinaryOperator::LooselyUnequal,
            "===" => BinaryOperator::StrictlyEqual,
            "!==" => BinaryOperator::StrictlyUnequal,
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessThanEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterThanEqual,
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Modulo,
            "in" => BinaryOperator::In,
            "instanceof" => BinaryOperator::InstanceOf,
            _ => return Err(get_unexpected_error(10, &op)),
        };
        let right_pair = expect_next(&mut inner, &span)?;
        let end_index = right_pair.as_span().end();
        let right = build_ast_from_expression(right_pair)?;
        left = ExpressionType::BinaryExpression {
            meta: Meta {
                start_index,
                end_index,
            },
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn get_update_operator(op: &Pair<Rule>) -> Result<UpdateOperator, Error<Rule>> {
    match op.as_str() {
        "++" => Ok(UpdateOperator::PlusPlus),
        "--" => Ok(UpdateOperator::MinusMinus),
        _ => Err(get_unexpected_error(11, op)),
    }
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let end_index = pair.as_span().end();
    let mut operators = vec![];
    let mut argument = None;
    for p in pair.clone().into_inner() {
        if p.as_rule() == Rule::unary_operator {
            operators.push(p);
        } else {
            argument = Some(build_ast_from_expression(p)?);
        }
    }
    let mut expr = match argument {
        Some(a) => a,
        None => return Err(get_unexpected_error(12, &pair)),
    };
    for op in operators.into_iter().rev() {
        let meta = Meta {
            start_index: op.as_span().start(),
            end_index,
        };
        expr = match op.as_str() {
            "++" | "--" => ExpressionType::UpdateExpression {
                meta,
                operator: get_update_operator(&op)?,
                argument: Box::new(expr),
                prefix: true,
            },
            s => {
                let operator = match s {
                    "!" => UnaryOperator::LogicalNot,
                    "-" => UnaryOperator::Minus,
                    "+" => UnaryOperator::Plus,
                    "typeof" => UnaryOperator::TypeOf,
                    "void" => UnaryOperator::Void,
                    "delete" => UnaryOperator::Delete,
                    _ => return Err(get_unexpected_error(13, &op)),
                };
                ExpressionType::UnaryExpression {
                    meta,
                    operator,
                    argument: Box::new(expr),
                }
            }
        };
    }
    Ok(expr)
}

fn build_ast_from_literal(pair: Pair<Rule>) -> Result<LiteralData, Error<Rule>> {
    let meta = get_meta(&pair);
    let text = pair.as_str();
    let value = match pair.as_rule() {
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::boolean_literal => LiteralType::BooleanLiteral(text == "true"),
        Rule::string_literal => {
            // Strip the surrounding quotes, both are one byte wide.
            LiteralType::StringLiteral(unescape_string_literal(&text[1..text.len() - 1]))
        }
        Rule::numeric_literal => LiteralType::NumberLiteral(parse_numeric_literal(text)),
        _ => return Err(get_unexpected_error(14, &pair)),
    };
    Ok(LiteralData { meta, value })
}

fn parse_numeric_literal(text: &str) -> NumberLiteralType {
    if text.starts_with("0x") || text.starts_with("0X") {
        let digits = &text[2..];
        match i64::from_str_radix(digits, 16) {
            Ok(i) => NumberLiteralType::IntegerLiteral(i),
            Err(_) => NumberLiteralType::FloatLiteral(
                digits
                    .chars()
                    .filter_map(|c| c.to_digit(16))
                    .fold(0f64, |acc, d| acc * 16.0 + d as f64),
            ),
        }
    } else if text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        NumberLiteralType::FloatLiteral(text.parse::<f64>().unwrap_or(f64::NAN))
    } else {
        match text.parse::<i64>() {
            Ok(i) => NumberLiteralType::IntegerLiteral(i),
            Err(_) => NumberLiteralType::FloatLiteral(text.parse::<f64>().unwrap_or(f64::NAN)),
        }
    }
}
