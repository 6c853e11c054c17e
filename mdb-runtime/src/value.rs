//! ランタイム値
//!
//! スクリプトが扱う値の閉じた集合です。デバッガは `Value` の各バリアントに
//! 対して直接マッチすることで、スカラー・コレクション・その他オブジェクトを
//! 判別します。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// 宣言型・値の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Invalid,
    Boolean,
    String,
    Integer,
    Float,
    Object,
    Function,
    Dynamic,
    Void,
}

impl ValueKind {
    /// 型名（`as` 句の表記）からパースする
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "invalid" => Some(ValueKind::Invalid),
            "boolean" => Some(ValueKind::Boolean),
            "string" => Some(ValueKind::String),
            "integer" => Some(ValueKind::Integer),
            "float" | "double" => Some(ValueKind::Float),
            "object" => Some(ValueKind::Object),
            "function" => Some(ValueKind::Function),
            "dynamic" => Some(ValueKind::Dynamic),
            "void" => Some(ValueKind::Void),
            _ => None,
        }
    }

    /// 宣言型に値が適合するか
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueKind::Dynamic => true,
            ValueKind::Float => matches!(value, Value::Float(_) | Value::Integer(_)),
            ValueKind::Object => matches!(
                value,
                Value::Array(_) | Value::AssocArray(_) | Value::Object(_) | Value::Invalid
            ),
            kind => value.kind() == *kind,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Invalid => "Invalid",
            ValueKind::Boolean => "Boolean",
            ValueKind::String => "String",
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::Object => "Object",
            ValueKind::Function => "Function",
            ValueKind::Dynamic => "Dynamic",
            ValueKind::Void => "Void",
        };
        f.write_str(name)
    }
}

/// 連想配列
///
/// キーは大文字小文字を区別せず、挿入順を保持します。
#[derive(Debug, Clone, Default)]
pub struct AssocArray {
    entries: Vec<(String, Value)>,
}

impl AssocArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = key.to_ascii_lowercase();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        let key = key.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// ランタイム値
#[derive(Debug, Clone)]
pub enum Value {
    Invalid,
    Boolean(bool),
    Integer(i32),
    Float(f64),
    Str(String),
    /// roArray
    Array(Rc<RefCell<Vec<Value>>>),
    /// roAssociativeArray
    AssocArray(Rc<RefCell<AssocArray>>),
    /// 反復不可能なコンポーネント（コンポーネント名のみ保持）
    Object(Rc<str>),
    /// 関数参照
    Callable(String),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn assoc_array(aa: AssocArray) -> Self {
        Value::AssocArray(Rc::new(RefCell::new(aa)))
    }

    pub fn object(component: &str) -> Self {
        Value::Object(Rc::from(component))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Invalid => ValueKind::Invalid,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::String,
            Value::Array(_) | Value::AssocArray(_) | Value::Object(_) => ValueKind::Object,
            Value::Callable(_) => ValueKind::Function,
        }
    }

    /// コンポーネント名（オブジェクトのみ）
    pub fn component_name(&self) -> Option<&str> {
        match self {
            Value::Array(_) => Some("roArray"),
            Value::AssocArray(_) => Some("roAssociativeArray"),
            Value::Object(name) => Some(name),
            _ => None,
        }
    }

    /// 反復可能な値の要素数
    pub fn element_count(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.borrow().len()),
            Value::AssocArray(aa) => Some(aa.borrow().len()),
            _ => None,
        }
    }

    /// 条件式としての真偽値
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// 同値比較（`=` 演算子）
    pub fn loose_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Invalid, Value::Invalid) => Some(true),
            (Value::Invalid, _) | (_, Value::Invalid) => Some(false),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a == b),
            (Value::Integer(a), Value::Integer(b)) => Some(a == b),
            (Value::Integer(a), Value::Float(b)) => Some(f64::from(*a) == *b),
            (Value::Float(a), Value::Integer(b)) => Some(*a == f64::from(*b)),
            (Value::Float(a), Value::Float(b)) => Some(a == b),
            (Value::Str(a), Value::Str(b)) => Some(a == b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Invalid => f.write_str("invalid"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Array(_) | Value::AssocArray(_) | Value::Object(_) => {
                write!(f, "<Component: {}>", self.component_name().unwrap_or("?"))
            }
            Value::Callable(name) => write!(f, "<Function: {}>", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assoc_array_is_case_insensitive() {
        let mut aa = AssocArray::new();
        aa.set("Name", Value::Str("roku".into()));
        aa.set("NAME", Value::Str("brs".into()));
        assert_eq!(aa.len(), 1);
        assert!(aa.contains("name"));
        assert_eq!(aa.get("nAmE").map(|v| v.to_string()), Some("brs".into()));
    }

    #[test]
    fn test_kind_and_component() {
        let arr = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(arr.kind(), ValueKind::Object);
        assert_eq!(arr.component_name(), Some("roArray"));
        assert_eq!(arr.element_count(), Some(2));

        let obj = Value::object("roDateTime");
        assert_eq!(obj.component_name(), Some("roDateTime"));
        assert_eq!(obj.element_count(), None);

        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Invalid.to_string(), "invalid");
    }

    #[test]
    fn test_declared_kind_accepts() {
        assert!(ValueKind::Float.accepts(&Value::Integer(3)));
        assert!(!ValueKind::Integer.accepts(&Value::Str("3".into())));
        assert!(ValueKind::Dynamic.accepts(&Value::Invalid));
        assert_eq!(ValueKind::from_type_name("Double"), Some(ValueKind::Float));
    }
}
