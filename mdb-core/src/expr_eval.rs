//! ライブ評価
//!
//! 一時停止中のスコープで、入力された1行を単独のソースとして解析し実行します。
//! 実行できる文の種類は限定されています。

use crate::errors::DebugError;
use mdb_runtime::{ExecResult, Interpreter, Interrupt, Parser, Statement};
use tracing::debug;

/// ライブ評価で使うファイル識別子
pub const LIVE_COMPILE_FILE: &str = "$LIVECOMPILE";

/// ライブ評価器
#[derive(Debug, Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// テキストを解析して最初の文を実行する
    ///
    /// # Errors
    /// - 文が1つも得られなかった場合は [`DebugError::SyntaxError`]
    /// - 許可されていない文の場合は [`DebugError::UnsupportedStatement`]
    /// - 実行時エラーは [`DebugError::RuntimeFault`]
    pub fn evaluate(&self, interpreter: &mut Interpreter, text: &str) -> Result<(), DebugError> {
        let scan = interpreter.lexer().scan(text, LIVE_COMPILE_FILE);
        if !scan.errors.is_empty() {
            debug!("Live compile scan errors: {:?}", scan.errors);
        }
        let parsed = Parser::new().parse(scan.tokens);
        let Some(statement) = parsed.statements.into_iter().next() else {
            return Err(DebugError::SyntaxError);
        };

        // 注入した文からデバッガへ再突入させない
        interpreter.set_debug_mode(false);
        let paused_at = interpreter.location().clone();
        let result = self.execute(interpreter, &statement);
        interpreter.set_location(paused_at);

        match result? {
            Ok(()) => Ok(()),
            Err(Interrupt::Fault(e)) => {
                debug!("Discarded live evaluation fault: {}", e);
                Err(DebugError::RuntimeFault(e))
            }
            Err(Interrupt::Halt) => Ok(()),
        }
    }

    /// 許可された種類の文だけを実行する
    fn execute(
        &self,
        interpreter: &mut Interpreter,
        statement: &Statement,
    ) -> Result<ExecResult<()>, DebugError> {
        let result = match statement {
            Statement::Assignment { name, value, .. } => interpreter.visit_assignment(name, value),
            Statement::DottedSet {
                object, name, value, ..
            } => interpreter.visit_dotted_set(object, name, value),
            Statement::IndexedSet {
                object,
                index,
                value,
                ..
            } => interpreter.visit_indexed_set(object, index, value),
            Statement::Print { items, .. } => interpreter.visit_print(items),
            Statement::Expression { expr, .. } => interpreter.visit_expression(expr).map(|_| ()),
            Statement::Increment { target, op, .. } => interpreter.visit_increment(target, *op),
            Statement::ForEach {
                item, target, body, ..
            } => interpreter.visit_for_each(item, target, body).map(|_| ()),
            Statement::If { .. }
            | Statement::While { .. }
            | Statement::Return { .. }
            | Statement::Stop { .. }
            | Statement::Function(_) => {
                debug!("Rejected live statement: {}", statement.kind_name());
                return Err(DebugError::UnsupportedStatement(statement.kind_name()));
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdb_runtime::{Event, Location, RuntimeError, Value, ENGINE_STACK_SIZE, MAX_ARRAY_LEN};
    use std::sync::mpsc::{self, Receiver};

    fn setup() -> (Interpreter, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        let mut interpreter = Interpreter::new(tx).unwrap();
        interpreter.environment_mut().assign("x", Value::Integer(1));
        interpreter
            .environment_mut()
            .assign("items", Value::array(vec![Value::Integer(1), Value::Integer(2)]));
        (interpreter, rx)
    }

    #[test]
    fn test_assignment_updates_scope() {
        let (mut interpreter, _rx) = setup();
        ExpressionEvaluator::new()
            .evaluate(&mut interpreter, "x = 5")
            .unwrap();
        assert!(matches!(
            interpreter.environment().lookup("x"),
            Some(Value::Integer(5))
        ));
    }

    #[test]
    fn test_print_reaches_event_stream() {
        let (mut interpreter, rx) = setup();
        ExpressionEvaluator::new()
            .evaluate(&mut interpreter, "print x + 1")
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), Event::print("2\r\n"));
    }

    #[test]
    fn test_for_each_and_increment() {
        let (mut interpreter, rx) = setup();
        let evaluator = ExpressionEvaluator::new();
        evaluator.evaluate(&mut interpreter, "x++").unwrap();
        evaluator
            .evaluate(&mut interpreter, "for each i in items : print i : end for")
            .unwrap();
        assert!(matches!(
            interpreter.environment().lookup("x"),
            Some(Value::Integer(2))
        ));
        let printed: Vec<Event> = rx.try_iter().collect();
        assert_eq!(printed, vec![Event::print("1\r\n"), Event::print("2\r\n")]);
    }

    #[test]
    fn test_empty_parse_is_syntax_error() {
        let (mut interpreter, _rx) = setup();
        let result = ExpressionEvaluator::new().evaluate(&mut interpreter, "= = =");
        assert_eq!(result, Err(DebugError::SyntaxError));
    }

    #[test]
    fn test_control_flow_is_rejected_without_mutation() {
        let (mut interpreter, _rx) = setup();
        let result = ExpressionEvaluator::new().evaluate(&mut interpreter, "if true then x = 9");
        assert_eq!(result, Err(DebugError::UnsupportedStatement("if")));
        assert!(matches!(
            interpreter.environment().lookup("x"),
            Some(Value::Integer(1))
        ));
    }

    #[test]
    fn test_fault_is_contained() {
        let (mut interpreter, _rx) = setup();
        let result = ExpressionEvaluator::new().evaluate(&mut interpreter, "print items[10]");
        assert!(matches!(
            result,
            Err(DebugError::RuntimeFault(RuntimeError::IndexOutOfBounds { index: 10, .. }))
        ));
    }

    #[test]
    fn test_disables_step_mode() {
        let (mut interpreter, _rx) = setup();
        interpreter.set_debug_mode(true);
        ExpressionEvaluator::new()
            .evaluate(&mut interpreter, "x = 2")
            .unwrap();
        assert!(!interpreter.debug_mode());
    }

    #[test]
    fn test_huge_index_assignment_is_contained() {
        let (mut interpreter, _rx) = setup();
        let result = ExpressionEvaluator::new().evaluate(&mut interpreter, "items[2147483647] = 1");
        assert!(matches!(
            result,
            Err(DebugError::RuntimeFault(RuntimeError::IndexOutOfBounds { length: 2, .. }))
        ));

        let text = format!("items[{}] = 1", MAX_ARRAY_LEN - 1);
        ExpressionEvaluator::new()
            .evaluate(&mut interpreter, &text)
            .unwrap();
        let count = interpreter
            .environment()
            .lookup("items")
            .and_then(|items| items.element_count());
        assert_eq!(count, Some(MAX_ARRAY_LEN));
    }

    #[test]
    fn test_deeply_nested_expression_is_syntax_error() {
        let (mut interpreter, _rx) = setup();
        let text = format!("print {}1{}", "(".repeat(900), ")".repeat(900));
        let result = ExpressionEvaluator::new().evaluate(&mut interpreter, &text);
        assert_eq!(result, Err(DebugError::SyntaxError));
    }

    const RECURSIVE: &str = "function depth(n as integer) as integer\n  if n = 0 then return 0\n  return depth(n - 1) + 1\nend function";

    #[test]
    fn test_runaway_recursion_is_contained() {
        let result = std::thread::Builder::new()
            .stack_size(ENGINE_STACK_SIZE)
            .spawn(|| {
                let (mut interpreter, rx) = setup();
                interpreter.load("main.brs", RECURSIVE).unwrap();
                let evaluator = ExpressionEvaluator::new();
                evaluator.evaluate(&mut interpreter, "print depth(200)").unwrap();
                let printed: Vec<Event> = rx.try_iter().collect();
                (evaluator.evaluate(&mut interpreter, "print depth(5000)"), printed)
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(result.1, vec![Event::print("200\r\n")]);
        assert_eq!(result.0, Err(DebugError::RuntimeFault(RuntimeError::StackOverflow)));
    }

    #[test]
    fn test_called_function_does_not_move_paused_location() {
        let (mut interpreter, _rx) = setup();
        interpreter.load("main.brs", RECURSIVE).unwrap();
        let paused_at = Location::lines("main.brs", 12, 12);
        interpreter.set_location(paused_at.clone());
        ExpressionEvaluator::new()
            .evaluate(&mut interpreter, "x = depth(3)")
            .unwrap();
        assert_eq!(interpreter.location(), &paused_at);
        assert!(matches!(
            interpreter.environment().lookup("x"),
            Some(Value::Integer(3))
        ));
    }
}
