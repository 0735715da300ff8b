use crate::primitives::{self, PrimitiveFunc};
use crate::source::Span;
use crate::token::Keyword;
use crate::types::{Primitive, Value};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvError {
    #[error("undefined variable {0}")]
    UnboundVariable(String, Span), // Symbol name, span where lookup happened
}

/// The interpreter's single, flat binding table.
///
/// User bindings are keyed by identifier; builtins sit in their own table
/// keyed by keyword. The classifier never produces an identifier that spells
/// a keyword, so builtins cannot be shadowed or redefined from a program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    primitives: HashMap<Keyword, Primitive>,
}

impl Environment {
    /// Creates an empty environment, without builtins.
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn new_global_populated() -> Self {
        let mut env = Environment::new();
        env.add_primitive(Keyword::Add, primitives::prim_add);
        env.add_primitive(Keyword::Subtract, primitives::prim_sub);
        env.add_primitive(Keyword::Multiply, primitives::prim_mul);
        env.add_primitive(Keyword::Divide, primitives::prim_div);
        env.add_primitive(Keyword::Equal, primitives::prim_equals);
        env.add_primitive(Keyword::Less, primitives::prim_less_than);
        env.add_primitive(Keyword::LessEqual, primitives::prim_less_than_or_equals);
        env.add_primitive(Keyword::Greater, primitives::prim_greater_than);
        env.add_primitive(Keyword::GreaterEqual, primitives::prim_greater_than_or_equals);

        env.add_primitive(Keyword::Sqrt, primitives::prim_sqrt);
        env.add_primitive(Keyword::Floor, primitives::prim_floor);
        env.add_primitive(Keyword::Ceiling, primitives::prim_ceiling);
        env.add_primitive(Keyword::Round, primitives::prim_round);
        env.add_primitive(Keyword::Max, primitives::prim_max);
        env.add_primitive(Keyword::Min, primitives::prim_min);
        env.add_primitive(Keyword::Abs, primitives::prim_abs);
        env
    }

    /// Creates or overwrites a binding.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// `lookup_span` is where the variable was referenced, used for error reporting.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<&Value, EnvError> {
        self.bindings
            .get(name)
            .ok_or_else(|| EnvError::UnboundVariable(name.to_string(), lookup_span))
    }

    /// Replaces the value of an existing binding. Errors if the name was never defined.
    pub fn set(&mut self, name: &str, value: Value, set_span: Span) -> Result<(), EnvError> {
        match self.bindings.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EnvError::UnboundVariable(name.to_string(), set_span)),
        }
    }

    pub fn get_primitive(&self, keyword: Keyword) -> Option<&Primitive> {
        self.primitives.get(&keyword)
    }

    fn add_primitive(&mut self, keyword: Keyword, func: PrimitiveFunc) {
        self.primitives.insert(keyword, Primitive { keyword, func });
    }

    /// Gets every bound name, builtins included
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.bindings
            .keys()
            .cloned()
            .chain(self.primitives.keys().map(|keyword| keyword.as_str().to_string()))
            .collect()
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn num(n: i64) -> Value {
        Value::Atom(Token::Integer(n))
    }

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("x".to_string(), num(10));
        assert_eq!(env.get("x", Span::default()), Ok(&num(10)));
    }

    #[test]
    fn test_define_overwrites() {
        let mut env = Environment::new();
        env.define("x".to_string(), num(10));
        env.define("x".to_string(), num(20));
        assert_eq!(env.get("x", Span::default()), Ok(&num(20)));
    }

    #[test]
    fn test_get_unbound() {
        let env = Environment::new();
        let span = Span::new(11, 12);
        assert_eq!(
            env.get("z", span),
            Err(EnvError::UnboundVariable("z".to_string(), span))
        );
    }

    #[test]
    fn test_set_requires_existing_binding() {
        let mut env = Environment::new();
        assert!(matches!(
            env.set("f", num(1), Span::default()),
            Err(EnvError::UnboundVariable(name, _)) if name == "f"
        ));
        assert!(env.get("f", Span::default()).is_err());

        env.define("f".to_string(), num(10));
        assert_eq!(env.set("f", num(26), Span::default()), Ok(()));
        assert_eq!(env.get("f", Span::default()), Ok(&num(26)));
    }

    #[test]
    fn test_populated_has_every_builtin() {
        let env = Environment::new_global_populated();
        for keyword in Keyword::all().filter(|k| !k.is_special_form()) {
            let primitive = env.get_primitive(keyword);
            assert!(primitive.is_some(), "missing builtin {}", keyword);
        }
        assert!(env.get_primitive(Keyword::If).is_none());
        assert!(Environment::new().get_primitive(Keyword::Add).is_none());
        assert!(env.get_identifiers().contains("sqrt"));
    }

    #[test]
    fn test_builtins_are_not_variables() {
        let mut env = Environment::new_global_populated();
        assert!(env.get("+", Span::default()).is_err());
        env.define("total".to_string(), num(3));
        let names = env.get_identifiers();
        assert!(names.contains("total"));
        assert!(names.contains("+"));
        assert!(!names.contains("lambda"));
    }
}
