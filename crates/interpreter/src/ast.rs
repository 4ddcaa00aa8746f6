//! AST nodes and the tree-walking evaluator
//!
//! Every node executes against a mutable scope and an execution
//! context and produces a value handle. Early return travels through
//! the scope as the reserved `returned_value` binding: `Return` writes
//! it, `Compound` stops on it, `MethodBody` consumes it.

use std::rc::Rc;

use tracing::debug;

use crate::comparators;
use crate::error::RuntimeError;
use crate::runtime::{Class, ClassRef, Context, Handle, Instance, Scope, Value};

/// Reserved scope key carrying an early return out of a method body
const RETURNED_VALUE: &str = "returned_value";

/// Comparison operator selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Less,
    Greater,
    LessOrEq,
    GreaterOrEq,
}

/// An expression node
#[derive(Debug)]
pub enum Expr {
    /// `None` literal
    None,
    /// Integer literal
    Number(i64),
    /// String literal
    String(String),
    /// `True` / `False`
    Bool(bool),
    /// Variable or dotted field path (`a`, `a.b.c`)
    Variable(Vec<String>),
    /// The `str(...)` builtin
    Stringify(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mult(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Comparison(CmpOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// `ClassName(args)`; the class reference was resolved at parse time
    NewInstance { class: ClassRef, args: Vec<Expr> },
    /// `receiver.method(args)`
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
}

/// A statement node
#[derive(Debug)]
pub enum Statement {
    /// `name = value`
    Assignment { name: String, value: Expr },
    /// `object.field = value`; the field is created on first write
    FieldAssignment {
        object: Expr,
        field: String,
        value: Expr,
    },
    /// `print a, b, c`
    Print(Vec<Expr>),
    /// Expression evaluated for its effect
    Expression(Expr),
    /// `return value`
    Return(Expr),
    /// `if cond: ... else: ...`
    IfElse {
        condition: Expr,
        then_body: Box<Statement>,
        else_body: Option<Box<Statement>>,
    },
    /// Statements in order, stopping at the first early return
    Compound(Vec<Statement>),
    /// Method body wrapper turning the return sentinel into a result
    MethodBody(Box<Statement>),
    /// Binds the class under its own name
    ClassDefinition(Rc<Class>),
}

impl Expr {
    pub fn execute(&self, scope: &mut Scope, ctx: &mut Context) -> Result<Handle, RuntimeError> {
        match self {
            Expr::None => Ok(Handle::none()),
            Expr::Number(n) => Ok(Handle::own(Value::Number(*n))),
            Expr::String(s) => Ok(Handle::own(Value::String(s.clone()))),
            Expr::Bool(b) => Ok(Handle::own(Value::Bool(*b))),
            Expr::Variable(path) => {
                let (first, rest) = match path.split_first() {
                    Some(parts) => parts,
                    None => return Err(RuntimeError::UnknownVariable(String::new())),
                };
                let mut value = match scope.get(first) {
                    Some(handle) => handle.clone(),
                    None => return Err(RuntimeError::UnknownVariable(first.clone())),
                };
                for segment in rest {
                    value = value
                        .with_instance(|instance| {
                            instance
                                .fields()
                                .get(segment)
                                .cloned()
                                .unwrap_or_else(Handle::none)
                        })
                        .ok_or_else(|| RuntimeError::UnknownField(segment.clone()))?;
                }
                Ok(value)
            }
            Expr::Stringify(argument) => {
                let value = argument.execute(scope, ctx)?;
                let mut text = String::new();
                value.write_printed(&mut text, ctx)?;
                Ok(Handle::own(Value::String(text)))
            }
            Expr::Add(lhs, rhs) => {
                let left = lhs.execute(scope, ctx)?;
                let right = rhs.execute(scope, ctx)?;
                if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
                    return Ok(Handle::own(Value::Number(a + b)));
                }
                if let (Some(a), Some(b)) = (left.as_string(), right.as_string()) {
                    return Ok(Handle::own(Value::String(a + &b)));
                }
                if left.has_method("__add__", 1) {
                    return left.call_method("__add__", &[right], ctx);
                }
                Err(RuntimeError::InvalidOperation("add"))
            }
            Expr::Sub(lhs, rhs) => {
                let (a, b) = numeric_operands(lhs, rhs, scope, ctx, "subtract")?;
                Ok(Handle::own(Value::Number(a - b)))
            }
            Expr::Mult(lhs, rhs) => {
                let (a, b) = numeric_operands(lhs, rhs, scope, ctx, "mult")?;
                Ok(Handle::own(Value::Number(a * b)))
            }
            Expr::Div(lhs, rhs) => {
                let (a, b) = numeric_operands(lhs, rhs, scope, ctx, "div")?;
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                // Truncates toward zero, like the host integer division
                Ok(Handle::own(Value::Number(a / b)))
            }
            Expr::Comparison(op, lhs, rhs) => {
                let left = lhs.execute(scope, ctx)?;
                let right = rhs.execute(scope, ctx)?;
                let result = match op {
                    CmpOp::Eq => comparators::equal(&left, &right, ctx)?,
                    CmpOp::NotEq => comparators::not_equal(&left, &right, ctx)?,
                    CmpOp::Less => comparators::less(&left, &right, ctx)?,
                    CmpOp::Greater => comparators::greater(&left, &right, ctx)?,
                    CmpOp::LessOrEq => comparators::less_or_equal(&left, &right, ctx)?,
                    CmpOp::GreaterOrEq => comparators::greater_or_equal(&left, &right, ctx)?,
                };
                Ok(Handle::own(Value::Bool(result)))
            }
            Expr::And(lhs, rhs) => {
                let value =
                    lhs.execute(scope, ctx)?.is_truthy() && rhs.execute(scope, ctx)?.is_truthy();
                Ok(Handle::own(Value::Bool(value)))
            }
            Expr::Or(lhs, rhs) => {
                let value =
                    lhs.execute(scope, ctx)?.is_truthy() || rhs.execute(scope, ctx)?.is_truthy();
                Ok(Handle::own(Value::Bool(value)))
            }
            Expr::Not(argument) => Ok(Handle::own(Value::Bool(
                !argument.execute(scope, ctx)?.is_truthy(),
            ))),
            Expr::NewInstance { class, args } => {
                let class = class
                    .get()
                    .ok_or_else(|| RuntimeError::NotAClass(class.name().to_string()))?;
                let instance = Handle::own(Value::Instance(Instance::new(Rc::clone(&class))));

                if !class.has_method("__init__", args.len()) {
                    // Zero-argument construction needs no constructor;
                    // everything else must match one exactly.
                    if args.is_empty() && class.get_method("__init__").is_none() {
                        return Ok(instance);
                    }
                    return Err(RuntimeError::MethodNotFound("__init__".to_string()));
                }

                let mut actual = Vec::with_capacity(args.len());
                for arg in args {
                    actual.push(arg.execute(scope, ctx)?);
                }
                let after_init = instance.call_method("__init__", &actual, ctx)?;
                if after_init.is_none() {
                    Ok(instance)
                } else {
                    Ok(after_init)
                }
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let object = receiver.execute(scope, ctx)?;
                let mut actual = Vec::with_capacity(args.len());
                for arg in args {
                    actual.push(arg.execute(scope, ctx)?);
                }
                object.call_method(method, &actual, ctx)
            }
        }
    }
}

/// Evaluate both sides of a numeric operator, or fail with `op`
fn numeric_operands(
    lhs: &Expr,
    rhs: &Expr,
    scope: &mut Scope,
    ctx: &mut Context,
    op: &'static str,
) -> Result<(i64, i64), RuntimeError> {
    let left = lhs.execute(scope, ctx)?;
    let right = rhs.execute(scope, ctx)?;
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::InvalidOperation(op)),
    }
}

impl Statement {
    pub fn execute(&self, scope: &mut Scope, ctx: &mut Context) -> Result<Handle, RuntimeError> {
        match self {
            Statement::Assignment { name, value } => {
                let handle = value.execute(scope, ctx)?;
                scope.insert(name.clone(), handle.clone());
                Ok(handle)
            }
            Statement::FieldAssignment {
                object,
                field,
                value,
            } => {
                let target = object.execute(scope, ctx)?;
                let handle = value.execute(scope, ctx)?;
                target
                    .with_instance_mut(|instance| {
                        instance.fields_mut().insert(field.clone(), handle.clone());
                    })
                    .ok_or(RuntimeError::NotAnInstance("field assignment"))?;
                Ok(handle)
            }
            Statement::Print(args) => {
                let mut line = String::new();
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        line.push(' ');
                    }
                    let value = arg.execute(scope, ctx)?;
                    value.write_printed(&mut line, ctx)?;
                }
                line.push('\n');
                ctx.output().write_all(line.as_bytes())?;
                Ok(Handle::none())
            }
            Statement::Expression(expr) => expr.execute(scope, ctx),
            Statement::Return(value) => {
                let handle = value.execute(scope, ctx)?;
                scope.insert(RETURNED_VALUE.to_string(), handle);
                Ok(Handle::none())
            }
            Statement::IfElse {
                condition,
                then_body,
                else_body,
            } => {
                if condition.execute(scope, ctx)?.is_truthy() {
                    then_body.execute(scope, ctx)?;
                } else if let Some(else_body) = else_body {
                    else_body.execute(scope, ctx)?;
                }
                Ok(Handle::none())
            }
            Statement::Compound(statements) => {
                for statement in statements {
                    statement.execute(scope, ctx)?;
                    if scope.contains_key(RETURNED_VALUE) {
                        break;
                    }
                }
                Ok(Handle::none())
            }
            Statement::MethodBody(body) => {
                body.execute(scope, ctx)?;
                match scope.get(RETURNED_VALUE) {
                    Some(handle) => Ok(handle.clone()),
                    None => Ok(Handle::none()),
                }
            }
            Statement::ClassDefinition(class) => {
                debug!("defining class {}", class.name());
                scope.insert(
                    class.name().to_string(),
                    Handle::own(Value::Class(Rc::clone(class))),
                );
                Ok(Handle::none())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Method;

    fn execute(statement: &Statement) -> (Scope, String) {
        let mut scope = Scope::new();
        let output = execute_in(statement, &mut scope).expect("statement should execute");
        (scope, output)
    }

    fn execute_in(statement: &Statement, scope: &mut Scope) -> Result<String, RuntimeError> {
        let mut out = Vec::new();
        let mut ctx = Context::new(&mut out);
        statement.execute(scope, &mut ctx)?;
        Ok(String::from_utf8(out).expect("output should be utf-8"))
    }

    fn eval(expr: &Expr, scope: &mut Scope) -> Result<Handle, RuntimeError> {
        let mut out = Vec::new();
        let mut ctx = Context::new(&mut out);
        expr.execute(scope, &mut ctx)
    }

    fn boxed(expr: Expr) -> Box<Expr> {
        Box::new(expr)
    }

    #[test]
    fn test_assignment_binds_and_returns_the_value() {
        let statement = Statement::Assignment {
            name: "x".into(),
            value: Expr::Number(12),
        };
        let (scope, _) = execute(&statement);
        assert_eq!(scope.get("x").and_then(Handle::as_number), Some(12));
    }

    #[test]
    fn test_unknown_variable() {
        let mut scope = Scope::new();
        let err = eval(&Expr::Variable(vec!["ghost".into()]), &mut scope)
            .expect_err("lookup should fail");
        assert!(matches!(err, RuntimeError::UnknownVariable(name) if name == "ghost"));
    }

    #[test]
    fn test_field_assignment_and_dotted_read() {
        let class = Rc::new(Class::new("Point", vec![], None));
        let mut scope = Scope::new();
        scope.insert(
            "p".into(),
            Handle::own(Value::Instance(Instance::new(class))),
        );

        let statement = Statement::FieldAssignment {
            object: Expr::Variable(vec!["p".into()]),
            field: "x".into(),
            value: Expr::Number(3),
        };
        execute_in(&statement, &mut scope).expect("assignment should execute");

        let read = eval(&Expr::Variable(vec!["p".into(), "x".into()]), &mut scope)
            .expect("field should read");
        assert_eq!(read.as_number(), Some(3));
    }

    #[test]
    fn test_absent_field_reads_as_none() {
        let class = Rc::new(Class::new("Point", vec![], None));
        let mut scope = Scope::new();
        scope.insert(
            "p".into(),
            Handle::own(Value::Instance(Instance::new(class))),
        );
        let read = eval(&Expr::Variable(vec!["p".into(), "y".into()]), &mut scope)
            .expect("read should succeed");
        assert!(read.is_none());
    }

    #[test]
    fn test_field_read_on_non_instance() {
        let mut scope = Scope::new();
        scope.insert("n".into(), Handle::own(Value::Number(1)));
        let err = eval(&Expr::Variable(vec!["n".into(), "x".into()]), &mut scope)
            .expect_err("read should fail");
        assert!(matches!(err, RuntimeError::UnknownField(name) if name == "x"));
    }

    #[test]
    fn test_field_assignment_on_non_instance() {
        let mut scope = Scope::new();
        scope.insert("n".into(), Handle::own(Value::Number(1)));
        let statement = Statement::FieldAssignment {
            object: Expr::Variable(vec!["n".into()]),
            field: "x".into(),
            value: Expr::Number(3),
        };
        let err = execute_in(&statement, &mut scope).expect_err("assignment should fail");
        assert!(matches!(err, RuntimeError::NotAnInstance(_)));
    }

    #[test]
    fn test_print_separates_with_spaces_and_ends_with_newline() {
        let statement = Statement::Print(vec![
            Expr::Number(1),
            Expr::String("two".into()),
            Expr::Bool(true),
            Expr::None,
        ]);
        let (_, output) = execute(&statement);
        assert_eq!(output, "1 two True None\n");
    }

    #[test]
    fn test_print_without_arguments() {
        let (_, output) = execute(&Statement::Print(vec![]));
        assert_eq!(output, "\n");
    }

    #[test]
    fn test_stringify() {
        let mut scope = Scope::new();
        let result = eval(&Expr::Stringify(boxed(Expr::Number(58))), &mut scope)
            .expect("stringify should run");
        assert_eq!(result.as_string(), Some("58".to_string()));
        let result = eval(&Expr::Stringify(boxed(Expr::None)), &mut scope)
            .expect("stringify should run");
        assert_eq!(result.as_string(), Some("None".to_string()));
    }

    #[test]
    fn test_add_numbers_and_strings() {
        let mut scope = Scope::new();
        let sum = eval(
            &Expr::Add(boxed(Expr::Number(2)), boxed(Expr::Number(3))),
            &mut scope,
        )
        .expect("add should run");
        assert_eq!(sum.as_number(), Some(5));

        let joined = eval(
            &Expr::Add(
                boxed(Expr::String("ham".into())),
                boxed(Expr::String("eggs".into())),
            ),
            &mut scope,
        )
        .expect("add should run");
        assert_eq!(joined.as_string(), Some("hameggs".to_string()));
    }

    #[test]
    fn test_add_type_mismatch() {
        let mut scope = Scope::new();
        let err = eval(
            &Expr::Add(boxed(Expr::Number(2)), boxed(Expr::String("x".into()))),
            &mut scope,
        )
        .expect_err("add should fail");
        assert!(err.to_string().contains("invalid add operation"));
    }

    #[test]
    fn test_add_dispatches_dunder() {
        let class = Rc::new(Class::new(
            "Wrapper",
            vec![Method {
                name: "__add__".into(),
                formal_params: vec!["other".into()],
                body: Statement::MethodBody(Box::new(Statement::Return(Expr::Add(
                    boxed(Expr::Number(10)),
                    boxed(Expr::Variable(vec!["other".into()])),
                )))),
            }],
            None,
        ));
        let mut scope = Scope::new();
        scope.insert(
            "w".into(),
            Handle::own(Value::Instance(Instance::new(class))),
        );
        let result = eval(
            &Expr::Add(
                boxed(Expr::Variable(vec!["w".into()])),
                boxed(Expr::Number(5)),
            ),
            &mut scope,
        )
        .expect("dunder add should run");
        assert_eq!(result.as_number(), Some(15));
    }

    #[test]
    fn test_arithmetic_operators() {
        let mut scope = Scope::new();
        let sub = eval(
            &Expr::Sub(boxed(Expr::Number(2)), boxed(Expr::Number(7))),
            &mut scope,
        )
        .expect("sub should run");
        assert_eq!(sub.as_number(), Some(-5));

        let product = eval(
            &Expr::Mult(boxed(Expr::Number(6)), boxed(Expr::Number(7))),
            &mut scope,
        )
        .expect("mult should run");
        assert_eq!(product.as_number(), Some(42));

        // Integer division truncates toward zero
        let quotient = eval(
            &Expr::Div(boxed(Expr::Number(-7)), boxed(Expr::Number(2))),
            &mut scope,
        )
        .expect("div should run");
        assert_eq!(quotient.as_number(), Some(-3));
    }

    #[test]
    fn test_division_by_zero() {
        let mut scope = Scope::new();
        let err = eval(
            &Expr::Div(boxed(Expr::Number(1)), boxed(Expr::Number(0))),
            &mut scope,
        )
        .expect_err("div should fail");
        assert!(matches!(err, RuntimeError::DivisionByZero));
    }

    #[test]
    fn test_sub_rejects_non_numbers() {
        let mut scope = Scope::new();
        let err = eval(
            &Expr::Sub(boxed(Expr::String("a".into())), boxed(Expr::Number(1))),
            &mut scope,
        )
        .expect_err("sub should fail");
        assert!(err.to_string().contains("invalid subtract operation"));
    }

    #[test]
    fn test_comparison_wraps_result_in_bool() {
        let mut scope = Scope::new();
        let result = eval(
            &Expr::Comparison(CmpOp::Less, boxed(Expr::Number(1)), boxed(Expr::Number(2))),
            &mut scope,
        )
        .expect("comparison should run");
        assert_eq!(result.as_bool(), Some(true));
    }

    #[test]
    fn test_and_or_short_circuit() {
        // The right operand would blow up with an unknown variable if
        // it were ever evaluated.
        let mut scope = Scope::new();
        let tripwire = || boxed(Expr::Variable(vec!["tripwire".into()]));

        let or = Expr::Or(boxed(Expr::Bool(true)), tripwire());
        assert_eq!(
            eval(&or, &mut scope).expect("or should short-circuit").as_bool(),
            Some(true)
        );

        let and = Expr::And(boxed(Expr::Number(0)), tripwire());
        assert_eq!(
            eval(&and, &mut scope).expect("and should short-circuit").as_bool(),
            Some(false)
        );

        // And both do evaluate the right side when they must
        assert!(eval(&Expr::Or(boxed(Expr::Bool(false)), tripwire()), &mut scope).is_err());
        assert!(eval(&Expr::And(boxed(Expr::Number(1)), tripwire()), &mut scope).is_err());
    }

    #[test]
    fn test_not() {
        let mut scope = Scope::new();
        let result = eval(&Expr::Not(boxed(Expr::String("".into()))), &mut scope)
            .expect("not should run");
        assert_eq!(result.as_bool(), Some(true));
    }

    #[test]
    fn test_compound_stops_after_return() {
        let statement = Statement::Compound(vec![
            Statement::Assignment {
                name: "x".into(),
                value: Expr::Number(1),
            },
            Statement::Return(Expr::Number(9)),
            Statement::Assignment {
                name: "y".into(),
                value: Expr::Number(2),
            },
        ]);
        let (scope, _) = execute(&statement);
        assert!(scope.contains_key("x"));
        assert!(!scope.contains_key("y"));
        assert_eq!(
            scope.get(RETURNED_VALUE).and_then(Handle::as_number),
            Some(9)
        );
    }

    #[test]
    fn test_method_body_yields_the_returned_value() {
        let body = Statement::MethodBody(Box::new(Statement::Compound(vec![Statement::Return(
            Expr::Number(4),
        )])));
        let mut scope = Scope::new();
        let mut out = Vec::new();
        let mut ctx = Context::new(&mut out);
        let result = body.execute(&mut scope, &mut ctx).expect("body should run");
        assert_eq!(result.as_number(), Some(4));
    }

    #[test]
    fn test_method_body_without_return_yields_none() {
        let body = Statement::MethodBody(Box::new(Statement::Compound(vec![])));
        let mut scope = Scope::new();
        let mut out = Vec::new();
        let mut ctx = Context::new(&mut out);
        let result = body.execute(&mut scope, &mut ctx).expect("body should run");
        assert!(result.is_none());
    }

    #[test]
    fn test_if_else_picks_a_branch() {
        let branchy = |condition: Expr| Statement::IfElse {
            condition,
            then_body: Box::new(Statement::Print(vec![Expr::Number(1)])),
            else_body: Some(Box::new(Statement::Print(vec![Expr::Number(2)]))),
        };
        let (_, output) = execute(&branchy(Expr::Number(5)));
        assert_eq!(output, "1\n");
        let (_, output) = execute(&branchy(Expr::Number(0)));
        assert_eq!(output, "2\n");
    }

    #[test]
    fn test_if_without_else_skips_quietly() {
        let statement = Statement::IfElse {
            condition: Expr::Bool(false),
            then_body: Box::new(Statement::Print(vec![Expr::Number(1)])),
            else_body: None,
        };
        let (_, output) = execute(&statement);
        assert_eq!(output, "");
    }

    #[test]
    fn test_class_definition_binds_the_name() {
        let class = Rc::new(Class::new("Widget", vec![], None));
        let (scope, _) = execute(&Statement::ClassDefinition(class));
        assert!(scope.get("Widget").and_then(Handle::as_class).is_some());
    }

    #[test]
    fn test_new_instance_without_init() {
        let class = Rc::new(Class::new("Bare", vec![], None));
        let mut scope = Scope::new();
        let result = eval(
            &Expr::NewInstance {
                class: ClassRef::resolved(class),
                args: vec![],
            },
            &mut scope,
        )
        .expect("construction should run");
        assert_eq!(
            result.with_instance(|i| i.class().name().to_string()),
            Some("Bare".to_string())
        );
    }

    #[test]
    fn test_new_instance_runs_init() {
        let class = Rc::new(Class::new(
            "Pair",
            vec![Method {
                name: "__init__".into(),
                formal_params: vec!["a".into()],
                body: Statement::MethodBody(Box::new(Statement::FieldAssignment {
                    object: Expr::Variable(vec!["self".into()]),
                    field: "a".into(),
                    value: Expr::Variable(vec!["a".into()]),
                })),
            }],
            None,
        ));
        let mut scope = Scope::new();
        let result = eval(
            &Expr::NewInstance {
                class: ClassRef::resolved(class),
                args: vec![Expr::Number(8)],
            },
            &mut scope,
        )
        .expect("construction should run");
        let field = result
            .with_instance(|i| i.fields().get("a").cloned())
            .flatten()
            .expect("field should exist");
        assert_eq!(field.as_number(), Some(8));
    }

    #[test]
    fn test_new_instance_arity_mismatch_is_an_error() {
        let class = Rc::new(Class::new(
            "Pair",
            vec![Method {
                name: "__init__".into(),
                formal_params: vec!["a".into()],
                body: Statement::MethodBody(Box::new(Statement::Compound(vec![]))),
            }],
            None,
        ));
        let mut scope = Scope::new();
        let err = eval(
            &Expr::NewInstance {
                class: ClassRef::resolved(class),
                args: vec![],
            },
            &mut scope,
        )
        .expect_err("construction should fail");
        assert!(matches!(err, RuntimeError::MethodNotFound(name) if name == "__init__"));
    }

    #[test]
    fn test_new_instance_with_args_but_no_init_is_an_error() {
        let class = Rc::new(Class::new("Bare", vec![], None));
        let mut scope = Scope::new();
        let err = eval(
            &Expr::NewInstance {
                class: ClassRef::resolved(class),
                args: vec![Expr::Number(1)],
            },
            &mut scope,
        )
        .expect_err("construction should fail");
        assert!(matches!(err, RuntimeError::MethodNotFound(_)));
    }

    #[test]
    fn test_new_instance_through_an_unfilled_reference() {
        let mut scope = Scope::new();
        let err = eval(
            &Expr::NewInstance {
                class: ClassRef::unresolved("Ghost"),
                args: vec![],
            },
            &mut scope,
        )
        .expect_err("construction should fail");
        assert!(matches!(err, RuntimeError::NotAClass(name) if name == "Ghost"));
    }

    #[test]
    fn test_method_call_node() {
        let class = Rc::new(Class::new(
            "Echo",
            vec![Method {
                name: "echo".into(),
                formal_params: vec!["v".into()],
                body: Statement::MethodBody(Box::new(Statement::Return(Expr::Variable(vec![
                    "v".into(),
                ])))),
            }],
            None,
        ));
        let mut scope = Scope::new();
        scope.insert(
            "e".into(),
            Handle::own(Value::Instance(Instance::new(class))),
        );
        let result = eval(
            &Expr::MethodCall {
                receiver: boxed(Expr::Variable(vec!["e".into()])),
                method: "echo".into(),
                args: vec![Expr::Number(31)],
            },
            &mut scope,
        )
        .expect("call should run");
        assert_eq!(result.as_number(), Some(31));
    }
}
