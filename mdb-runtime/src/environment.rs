//! 実行環境
//!
//! コールスタック、関数スコープの束縛、暗黙のルートオブジェクト `m` を保持します。
//! 環境の所有者・変更者はエンジンスレッドのみです。デバッガは
//! [`Environment::back_trace`] などでスナップショットを読み取るだけです。

use crate::ast::FunctionDecl;
use crate::{AssocArray, Location, Value, ValueKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// 暗黙のルートオブジェクトの名前
pub const ROOT_OBJECT_NAME: &str = "m";

/// 変数束縛の集合（挿入順を保持）
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Vec<(String, Value)>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = name.to_ascii_lowercase();
        self.bindings.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        let name = name.to_ascii_lowercase();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some(binding) => binding.1 = value,
            None => self.bindings.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// バックトレースの1フレーム（読み取り専用スナップショット）
#[derive(Debug, Clone, PartialEq)]
pub struct BackTraceFrame {
    pub function_name: String,
    pub params: Vec<(String, ValueKind)>,
    pub return_kind: ValueKind,
    /// 呼び出し元の位置
    pub call_location: Location,
    /// 関数本体の範囲
    pub function_location: Location,
}

/// 実行中の関数呼び出し
#[derive(Debug)]
struct CallFrame {
    function: Rc<FunctionDecl>,
    call_location: Location,
    scope: Scope,
}

/// 実行環境
#[derive(Debug)]
pub struct Environment {
    root: Rc<RefCell<AssocArray>>,
    functions: HashMap<String, Rc<FunctionDecl>>,
    frames: Vec<CallFrame>,
    /// 関数外で評価される文のスコープ
    global: Scope,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            root: Rc::new(RefCell::new(AssocArray::new())),
            functions: HashMap::new(),
            frames: Vec::new(),
            global: Scope::new(),
        }
    }

    /// 関数を登録する
    pub fn define_function(&mut self, decl: Rc<FunctionDecl>) {
        self.functions.insert(decl.name.to_ascii_lowercase(), decl);
    }

    pub fn function(&self, name: &str) -> Option<Rc<FunctionDecl>> {
        self.functions.get(&name.to_ascii_lowercase()).cloned()
    }

    /// 関数呼び出しのフレームを積む
    pub fn push_frame(&mut self, function: Rc<FunctionDecl>, call_location: Location, scope: Scope) {
        self.frames.push(CallFrame {
            function,
            call_location,
            scope,
        });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// コールスタックの深さ
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// 現在のコールスタックのスナップショットを生成する
    ///
    /// 先頭が最も外側、末尾が最も内側のフレームです。
    pub fn back_trace(&self) -> Vec<BackTraceFrame> {
        self.frames
            .iter()
            .map(|frame| BackTraceFrame {
                function_name: frame.function.name.clone(),
                params: frame
                    .function
                    .params
                    .iter()
                    .map(|p| (p.name.clone(), p.kind))
                    .collect(),
                return_kind: frame.function.return_kind,
                call_location: frame.call_location.clone(),
                function_location: frame.function.location.clone(),
            })
            .collect()
    }

    /// 最も内側の関数スコープ
    pub fn function_scope(&self) -> &Scope {
        self.frames.last().map(|f| &f.scope).unwrap_or(&self.global)
    }

    fn function_scope_mut(&mut self) -> &mut Scope {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.scope,
            None => &mut self.global,
        }
    }

    /// 暗黙のルートオブジェクト `m`
    pub fn root_object(&self) -> Value {
        Value::AssocArray(Rc::clone(&self.root))
    }

    /// 名前を解決する（`m`、関数スコープ、関数名の順）
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if name.eq_ignore_ascii_case(ROOT_OBJECT_NAME) {
            return Some(self.root_object());
        }
        if let Some(value) = self.function_scope().get(name) {
            return Some(value.clone());
        }
        self.function(name).map(|f| Value::Callable(f.name.clone()))
    }

    /// 関数スコープに束縛する
    pub fn assign(&mut self, name: &str, value: Value) {
        self.function_scope_mut().set(name, value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
