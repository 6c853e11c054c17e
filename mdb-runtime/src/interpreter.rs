//! ツリーウォーク型インタプリタ
//!
//! 文ごとの実行エントリ（`visit_*`）と、デバッガへの停止フックを提供します。

use crate::ast::{BinaryOp, Block, Expr, FunctionDecl, IncrementOp, PrintItem, Statement, UnaryOp};
use crate::environment::Scope;
use crate::error::RuntimeError;
use crate::event::{Event, EventSink};
use crate::{AssocArray, Environment, Lexer, Location, Parser, Result, Value};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// 関数呼び出しの最大深さ
pub const MAX_CALL_DEPTH: usize = 256;

/// エンジンスレッドのスタックサイズ
///
/// [`MAX_CALL_DEPTH`] 段の呼び出しがデバッグビルドでも収まる大きさです。
pub const ENGINE_STACK_SIZE: usize = 64 * 1024 * 1024;

/// インデックス代入で配列を伸長できる上限
pub const MAX_ARRAY_LEN: usize = 1 << 16;

/// 実行の中断要因
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// 実行時エラー
    Fault(RuntimeError),
    /// デバッガからの終了要求
    Halt,
}

impl From<RuntimeError> for Interrupt {
    fn from(e: RuntimeError) -> Self {
        Interrupt::Fault(e)
    }
}

/// 文実行の結果型
pub type ExecResult<T> = std::result::Result<T, Interrupt>;

/// 文実行後の制御フロー
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// スクリプト実行の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `main` が最後まで実行された（戻り値の表示形式）
    Completed(String),
    /// デバッガの EXIT により停止した
    Halted,
}

/// 一時停止時にエンジンから呼ばれるフック
pub trait StopHandler {
    /// 一時停止を処理する
    ///
    /// # Arguments
    /// * `interpreter` - 停止中のインタプリタ
    /// * `current` - 次に実行する文の位置
    /// * `last` - 最後に実行した文の位置
    ///
    /// # Returns
    /// 実行を再開する場合はtrue、停止する場合はfalse
    fn on_stop(&mut self, interpreter: &mut Interpreter, current: &Location, last: &Location) -> bool;

    /// 実行中にブレーク要求が届いているか（文の境界ごとに呼ばれる）
    fn break_requested(&mut self) -> bool {
        false
    }
}

/// インタプリタ
pub struct Interpreter {
    environment: Environment,
    sink: Box<dyn EventSink>,
    sources: HashMap<String, String>,
    lexer: Lexer,
    /// 最後に実行した文の位置
    location: Location,
    /// trueの場合、文を1つ実行するごとに停止する
    debug_mode: bool,
    executed_since_resume: usize,
    stop_handler: Option<Box<dyn StopHandler>>,
    in_debugger: bool,
}

impl Interpreter {
    /// 新しいインタプリタを作成する
    pub fn new(sink: impl EventSink + 'static) -> Result<Self> {
        Ok(Self {
            environment: Environment::new(),
            sink: Box::new(sink),
            sources: HashMap::new(),
            lexer: Lexer::new()?,
            location: Location::default(),
            debug_mode: false,
            executed_since_resume: 0,
            stop_handler: None,
            in_debugger: false,
        })
    }

    /// 停止フックを設定する
    pub fn set_stop_handler(&mut self, handler: impl StopHandler + 'static) {
        self.stop_handler = Some(Box::new(handler));
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    /// ホストへイベントを送る
    pub fn post(&mut self, event: Event) {
        self.sink.post(event);
    }

    /// ソーステキストを登録する
    pub fn add_source(&mut self, file: &str, text: &str) {
        self.sources.insert(file.to_string(), text.to_string());
    }

    pub fn source(&self, file: &str) -> Option<&str> {
        self.sources.get(file).map(String::as_str)
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    /// 最後に実行した文の位置
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// 最後に実行した文の位置を戻す
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// ソースを解析して関数を登録する
    pub fn load(&mut self, file: &str, text: &str) -> Result<()> {
        self.add_source(file, text);

        let scan = self.lexer.scan(text, file);
        if let Some(e) = scan.errors.into_iter().next() {
            return Err(e.into());
        }
        let parsed = Parser::new().parse(scan.tokens);
        if let Some(e) = parsed.errors.into_iter().next() {
            return Err(e.into());
        }

        for statement in parsed.statements {
            match statement {
                Statement::Function(decl) => self.environment.define_function(decl),
                other => anyhow::bail!(
                    "Only function declarations are allowed at the top level ({})",
                    other.location()
                ),
            }
        }
        Ok(())
    }

    /// `main` を実行する
    pub fn run_main(&mut self) -> Result<RunOutcome> {
        let main = self
            .environment
            .function("main")
            .ok_or_else(|| anyhow::anyhow!("No 'main' function defined"))?;
        self.location = main.location.clone();

        match self.call_function(Rc::clone(&main), Vec::new(), main.location.clone()) {
            Ok(value) => Ok(RunOutcome::Completed(value.to_string())),
            Err(Interrupt::Halt) => Ok(RunOutcome::Halted),
            Err(Interrupt::Fault(e)) => Err(e.into()),
        }
    }

    /// ソースを読み込んで `main` を実行する
    pub fn run_source(&mut self, file: &str, text: &str) -> Result<RunOutcome> {
        self.load(file, text)?;
        self.run_main()
    }

    /// 文を1つ実行する
    pub fn execute(&mut self, statement: &Statement) -> ExecResult<Flow> {
        if !self.in_debugger && !matches!(statement, Statement::Stop { .. }) {
            let step_due = self.debug_mode && self.executed_since_resume > 0;
            let pause = step_due
                || self
                    .stop_handler
                    .as_mut()
                    .is_some_and(|handler| handler.break_requested());
            if pause && !self.enter_debugger(statement.location()) {
                return Err(Interrupt::Halt);
            }
        }

        self.executed_since_resume += 1;
        self.location = statement.location().clone();

        match statement {
            Statement::Assignment { name, value, .. } => {
                self.visit_assignment(name, value)?;
            }
            Statement::DottedSet {
                object, name, value, ..
            } => {
                self.visit_dotted_set(object, name, value)?;
            }
            Statement::IndexedSet {
                object,
                index,
                value,
                ..
            } => {
                self.visit_indexed_set(object, index, value)?;
            }
            Statement::Print { items, .. } => {
                self.visit_print(items)?;
            }
            Statement::Expression { expr, .. } => {
                self.visit_expression(expr)?;
            }
            Statement::Increment { target, op, .. } => {
                self.visit_increment(target, *op)?;
            }
            Statement::ForEach {
                item, target, body, ..
            } => {
                return self.visit_for_each(item, target, body);
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_condition(condition)? {
                    return self.execute_block(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute_block(else_branch);
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                while self.evaluate_condition(condition)? {
                    if let Flow::Return(value) = self.execute_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Invalid,
                };
                return Ok(Flow::Return(value));
            }
            Statement::Stop { location } => {
                if self.in_debugger {
                    debug!("Ignoring stop statement at {} inside the debugger", location);
                } else if !self.enter_debugger(location) {
                    return Err(Interrupt::Halt);
                }
            }
            Statement::Function(decl) => {
                self.environment.define_function(Rc::clone(decl));
            }
        }

        Ok(Flow::Normal)
    }

    fn execute_block(&mut self, block: &Block) -> ExecResult<Flow> {
        for statement in &block.statements {
            if let Flow::Return(value) = self.execute(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// 停止フックを呼び出す
    fn enter_debugger(&mut self, current: &Location) -> bool {
        let Some(mut handler) = self.stop_handler.take() else {
            return true;
        };

        let last = self.location.clone();
        self.in_debugger = true;
        let resume = handler.on_stop(self, current, &last);
        self.in_debugger = false;
        self.stop_handler = Some(handler);
        self.executed_since_resume = 0;
        resume
    }

    // ---- 文ごとの実行エントリ ----

    /// `name = value`
    pub fn visit_assignment(&mut self, name: &str, value: &Expr) -> ExecResult<()> {
        let value = self.evaluate(value)?;
        self.environment.assign(name, value);
        Ok(())
    }

    /// `object.name = value`
    pub fn visit_dotted_set(&mut self, object: &Expr, name: &str, value: &Expr) -> ExecResult<()> {
        let target = self.evaluate(object)?;
        let value = self.evaluate(value)?;
        set_member(&target, name, value)?;
        Ok(())
    }

    /// `object[index] = value`
    pub fn visit_indexed_set(&mut self, object: &Expr, index: &Expr, value: &Expr) -> ExecResult<()> {
        let target = self.evaluate(object)?;
        let index = self.evaluate(index)?;
        let value = self.evaluate(value)?;
        set_index(&target, &index, value)?;
        Ok(())
    }

    /// `print ...`
    pub fn visit_print(&mut self, items: &[PrintItem]) -> ExecResult<()> {
        let mut text = String::new();
        for item in items {
            match item {
                PrintItem::Expr(expr) => {
                    let value = self.evaluate(expr)?;
                    text.push_str(&value.to_string());
                }
                PrintItem::Space => text.push(' '),
                PrintItem::Join => {}
            }
        }
        self.post(Event::Print(format!("{}\r\n", text)));
        Ok(())
    }

    /// 式文
    pub fn visit_expression(&mut self, expr: &Expr) -> ExecResult<Value> {
        self.evaluate(expr)
    }

    /// `target++` / `target--`
    pub fn visit_increment(&mut self, target: &Expr, op: IncrementOp) -> ExecResult<()> {
        let delta = match op {
            IncrementOp::Increment => 1,
            IncrementOp::Decrement => -1,
        };
        let updated = match self.evaluate(target)? {
            Value::Integer(n) => Value::Integer(n.wrapping_add(delta)),
            Value::Float(x) => Value::Float(x + f64::from(delta)),
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "Cannot increment {}",
                    other.kind()
                ))
                .into())
            }
        };

        match target {
            Expr::Variable { name, .. } => self.environment.assign(name, updated),
            Expr::DottedGet { object, name, .. } => {
                let object = self.evaluate(object)?;
                set_member(&object, name, updated)?;
            }
            Expr::IndexedGet { object, index, .. } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                set_index(&object, &index, updated)?;
            }
            _ => {
                return Err(RuntimeError::TypeMismatch("Invalid increment target".into()).into())
            }
        }
        Ok(())
    }

    /// `for each item in target ... end for`
    pub fn visit_for_each(&mut self, item: &str, target: &Expr, body: &Block) -> ExecResult<Flow> {
        let items = match self.evaluate(target)? {
            Value::Array(elements) => elements.borrow().clone(),
            Value::AssocArray(aa) => aa.borrow().keys().map(|k| Value::Str(k.to_string())).collect(),
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "Cannot iterate over {}",
                    other.kind()
                ))
                .into())
            }
        };

        for value in items {
            self.environment.assign(item, value);
            if let Flow::Return(value) = self.execute_block(body)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    // ---- 式の評価 ----

    fn evaluate_condition(&mut self, condition: &Expr) -> ExecResult<bool> {
        let value = self.evaluate(condition)?;
        value.as_bool().ok_or_else(|| {
            RuntimeError::TypeMismatch(format!("Condition must be Boolean, got {}", value.kind())).into()
        })
    }

    /// 式を評価する
    pub fn evaluate(&mut self, expr: &Expr) -> ExecResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, .. } => self
                .environment
                .lookup(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()).into()),
            Expr::ArrayLiteral { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Value::array(values))
            }
            Expr::AssocArrayLiteral { entries, .. } => {
                let mut aa = AssocArray::new();
                for (key, value) in entries {
                    let value = self.evaluate(value)?;
                    aa.set(key, value);
                }
                Ok(Value::assoc_array(aa))
            }
            Expr::Binary {
                left, op, right, ..
            } => self.evaluate_binary(left, *op, right),
            Expr::Unary { op, operand, .. } => {
                let value = self.evaluate(operand)?;
                match (op, value) {
                    (UnaryOp::Negate, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
                    (UnaryOp::Negate, Value::Float(x)) => Ok(Value::Float(-x)),
                    (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
                    (_, other) => Err(RuntimeError::TypeMismatch(format!(
                        "Invalid operand {} for unary operator",
                        other.kind()
                    ))
                    .into()),
                }
            }
            Expr::Call {
                callee,
                args,
                location,
            } => self.evaluate_call(callee, args, location),
            Expr::DottedGet { object, name, .. } => match self.evaluate(object)? {
                Value::AssocArray(aa) => Ok(aa.borrow().get(name).cloned().unwrap_or(Value::Invalid)),
                other => Err(RuntimeError::TypeMismatch(format!(
                    "Cannot read member '{}' of {}",
                    name,
                    other.kind()
                ))
                .into()),
            },
            Expr::IndexedGet { object, index, .. } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                get_index(&object, &index)
            }
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> ExecResult<Value> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let lhs = self.evaluate_condition(left)?;
            let short_circuit = match op {
                BinaryOp::And => !lhs,
                _ => lhs,
            };
            if short_circuit {
                return Ok(Value::Boolean(lhs));
            }
            return Ok(Value::Boolean(self.evaluate_condition(right)?));
        }

        let lhs = self.evaluate(left)?;
        let rhs = self.evaluate(right)?;
        binary_op(op, lhs, rhs).map_err(Interrupt::from)
    }

    fn evaluate_call(&mut self, callee: &Expr, args: &[Expr], location: &Location) -> ExecResult<Value> {
        // メソッド呼び出し
        if let Expr::DottedGet { object, name, .. } = callee {
            let object = self.evaluate(object)?;
            let args = self.evaluate_args(args)?;
            return call_method(&object, name, args);
        }

        if let Expr::Variable { name, .. } = callee {
            if name.eq_ignore_ascii_case("createobject") {
                let args = self.evaluate_args(args)?;
                return create_object(args);
            }
        }

        let function = match self.evaluate(callee)? {
            Value::Callable(name) => self
                .environment
                .function(&name)
                .ok_or(RuntimeError::UndefinedFunction(name))?,
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "{} is not callable",
                    other.kind()
                ))
                .into())
            }
        };
        let args = self.evaluate_args(args)?;
        self.call_function(function, args, location.clone())
    }

    fn evaluate_args(&mut self, args: &[Expr]) -> ExecResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg)?);
        }
        Ok(values)
    }

    fn call_function(
        &mut self,
        function: Rc<FunctionDecl>,
        args: Vec<Value>,
        call_location: Location,
    ) -> ExecResult<Value> {
        if args.len() != function.params.len() {
            return Err(RuntimeError::Arity {
                name: function.name.clone(),
                expected: function.params.len(),
                got: args.len(),
            }
            .into());
        }
        if self.environment.depth() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::StackOverflow.into());
        }

        let mut scope = Scope::new();
        for (param, arg) in function.params.iter().zip(args) {
            if !param.kind.accepts(&arg) {
                return Err(RuntimeError::TypeMismatch(format!(
                    "Argument '{}' of '{}' expects {}, got {}",
                    param.name,
                    function.name,
                    param.kind,
                    arg.kind()
                ))
                .into());
            }
            scope.set(&param.name, arg);
        }

        self.environment
            .push_frame(Rc::clone(&function), call_location, scope);
        let result = self.execute_block(&function.body);
        self.environment.pop_frame();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Invalid),
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(f64::from(*n)),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn binary_op(op: BinaryOp, lhs: Value, rhs: Value) -> std::result::Result<Value, RuntimeError> {
    let mismatch = |lhs: &Value, rhs: &Value| {
        RuntimeError::TypeMismatch(format!(
            "Operator {:?} cannot be applied to {} and {}",
            op,
            lhs.kind(),
            rhs.kind()
        ))
    };

    match op {
        BinaryOp::Equal | BinaryOp::NotEqual => {
            let equal = lhs.loose_eq(&rhs).ok_or_else(|| mismatch(&lhs, &rhs))?;
            Ok(Value::Boolean(if op == BinaryOp::Equal { equal } else { !equal }))
        }
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let ordering = match (&lhs, &rhs) {
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => match (as_number(&lhs), as_number(&rhs)) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                },
            };
            let ordering = ordering.ok_or_else(|| mismatch(&lhs, &rhs))?;
            let result = match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::LessEqual => ordering.is_le(),
                BinaryOp::Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Boolean(result))
        }
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_add(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a + b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Subtract => match (&lhs, &rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_sub(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a - b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Multiply => match (&lhs, &rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_mul(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a * b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Divide => {
            if as_number(&rhs) == Some(0.0) {
                return Err(RuntimeError::DivideByZero);
            }
            float_op(&lhs, &rhs, |a, b| a / b).ok_or_else(|| mismatch(&lhs, &rhs))
        }
        BinaryOp::Modulo => match (&lhs, &rhs) {
            (Value::Integer(_), Value::Integer(0)) => Err(RuntimeError::DivideByZero),
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_rem(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a % b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::And | BinaryOp::Or => match (&lhs, &rhs) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(if op == BinaryOp::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(mismatch(&lhs, &rhs)),
        },
    }
}

fn float_op(lhs: &Value, rhs: &Value, f: impl Fn(f64, f64) -> f64) -> Option<Value> {
    Some(Value::Float(f(as_number(lhs)?, as_number(rhs)?)))
}

fn array_index(index: &Value) -> std::result::Result<i64, RuntimeError> {
    match index {
        Value::Integer(n) => Ok(i64::from(*n)),
        other => Err(RuntimeError::TypeMismatch(format!(
            "Array index must be Integer, got {}",
            other.kind()
        ))),
    }
}

fn get_index(object: &Value, index: &Value) -> ExecResult<Value> {
    match object {
        Value::Array(elements) => {
            let i = array_index(index)?;
            let elements = elements.borrow();
            let value = usize::try_from(i).ok().and_then(|i| elements.get(i).cloned());
            match value {
                Some(value) => Ok(value),
                None => Err(RuntimeError::IndexOutOfBounds {
                    index: i,
                    length: elements.len(),
                }
                .into()),
            }
        }
        Value::AssocArray(aa) => match index {
            Value::Str(key) => Ok(aa.borrow().get(key).cloned().unwrap_or(Value::Invalid)),
            other => Err(RuntimeError::TypeMismatch(format!(
                "Associative array key must be String, got {}",
                other.kind()
            ))
            .into()),
        },
        other => Err(RuntimeError::TypeMismatch(format!("Cannot index {}", other.kind())).into()),
    }
}

fn set_index(object: &Value, index: &Value, value: Value) -> std::result::Result<(), RuntimeError> {
    match object {
        Value::Array(elements) => {
            let i = array_index(index)?;
            let mut elements = elements.borrow_mut();
            let slot = usize::try_from(i).map_err(|_| RuntimeError::IndexOutOfBounds {
                index: i,
                length: elements.len(),
            })?;
            if slot >= MAX_ARRAY_LEN {
                return Err(RuntimeError::IndexOutOfBounds {
                    index: i,
                    length: elements.len(),
                });
            }
            if slot >= elements.len() {
                elements.resize(slot + 1, Value::Invalid);
            }
            elements[slot] = value;
            Ok(())
        }
        Value::AssocArray(aa) => match index {
            Value::Str(key) => {
                aa.borrow_mut().set(key, value);
                Ok(())
            }
            other => Err(RuntimeError::TypeMismatch(format!(
                "Associative array key must be String, got {}",
                other.kind()
            ))),
        },
        other => Err(RuntimeError::TypeMismatch(format!("Cannot index {}", other.kind()))),
    }
}

fn set_member(object: &Value, name: &str, value: Value) -> std::result::Result<(), RuntimeError> {
    match object {
        Value::AssocArray(aa) => {
            aa.borrow_mut().set(name, value);
            Ok(())
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "Cannot set member '{}' on {}",
            name,
            other.kind()
        ))),
    }
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> std::result::Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn count_value(len: usize) -> std::result::Result<Value, RuntimeError> {
    i32::try_from(len)
        .map(Value::Integer)
        .map_err(|_| RuntimeError::CountOverflow(len))
}

fn call_method(object: &Value, name: &str, args: Vec<Value>) -> ExecResult<Value> {
    let method = name.to_ascii_lowercase();
    match (object, method.as_str()) {
        (Value::Array(elements), "count") => {
            expect_args(name, &args, 0)?;
            Ok(count_value(elements.borrow().len())?)
        }
        (Value::Array(elements), "push") => {
            expect_args(name, &args, 1)?;
            elements.borrow_mut().extend(args);
            Ok(Value::Invalid)
        }
        (Value::Array(elements), "pop") => {
            expect_args(name, &args, 0)?;
            Ok(elements.borrow_mut().pop().unwrap_or(Value::Invalid))
        }
        (Value::Array(elements), "clear") => {
            expect_args(name, &args, 0)?;
            elements.borrow_mut().clear();
            Ok(Value::Invalid)
        }
        (Value::AssocArray(aa), "count") => {
            expect_args(name, &args, 0)?;
            Ok(count_value(aa.borrow().len())?)
        }
        (Value::AssocArray(aa), "clear") => {
            expect_args(name, &args, 0)?;
            aa.borrow_mut().clear();
            Ok(Value::Invalid)
        }
        (Value::AssocArray(aa), "keys") => {
            expect_args(name, &args, 0)?;
            let keys = aa.borrow().keys().map(|k| Value::Str(k.to_string())).collect();
            Ok(Value::array(keys))
        }
        (Value::AssocArray(aa), "lookup" | "doesexist") => {
            expect_args(name, &args, 1)?;
            let Value::Str(key) = &args[0] else {
                return Err(RuntimeError::TypeMismatch("Key must be String".into()).into());
            };
            let aa = aa.borrow();
            if method == "lookup" {
                Ok(aa.get(key).cloned().unwrap_or(Value::Invalid))
            } else {
                Ok(Value::Boolean(aa.contains(key)))
            }
        }
        (Value::AssocArray(aa), "addreplace") => {
            expect_args(name, &args, 2)?;
            let mut args = args.into_iter();
            match (args.next(), args.next()) {
                (Some(Value::Str(key)), Some(value)) => {
                    aa.borrow_mut().set(&key, value);
                    Ok(Value::Invalid)
                }
                _ => Err(RuntimeError::TypeMismatch("Key must be String".into()).into()),
            }
        }
        _ => Err(RuntimeError::UnknownMember {
            component: object
                .component_name()
                .map(str::to_string)
                .unwrap_or_else(|| object.kind().to_string()),
            member: name.to_string(),
        }
        .into()),
    }
}

fn create_object(args: Vec<Value>) -> ExecResult<Value> {
    expect_args("CreateObject", &args, 1)?;
    let Value::Str(component) = &args[0] else {
        return Err(RuntimeError::TypeMismatch("Component name must be String".into()).into());
    };
    let value = match component.to_ascii_lowercase().as_str() {
        "roarray" => Value::array(Vec::new()),
        "roassociativearray" => Value::assoc_array(AssocArray::new()),
        _ => Value::object(component),
    };
    Ok(value)
}
