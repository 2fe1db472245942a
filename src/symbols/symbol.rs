//! Symbol entities recorded by the type checker.
use crate::ext::OrderedHashMap;

use super::{activation_record::*, Type};

#[derive(Debug, Clone)]
pub enum Symbol {
    Var(VarSymbol),
    Func(FuncSymbol),
    Class(ClassSymbol),
}
impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Var(var) => &var.name,
            Symbol::Func(func) => &func.name,
            Symbol::Class(class) => &class.name,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Symbol::Var(var) if var.is_const => "const",
            Symbol::Var(_) => "variable",
            Symbol::Func(_) => "function",
            Symbol::Class(_) => "class",
        }
    }

    pub fn as_var(&self) -> Option<&VarSymbol> {
        match self {
            Symbol::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncSymbol> {
        match self {
            Symbol::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassSymbol> {
        match self {
            Symbol::Class(class) => Some(class),
            _ => None,
        }
    }
}

/// A variable, constant, parameter or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSymbol {
    pub name: String,
    pub ty: Type,
    pub is_const: bool,
    pub is_initialized: bool,
    /// Storage in the enclosing activation record. Globals and fields have none.
    pub slot: Option<Slot>,
    /// Position inside an object, when this symbol is a field and its layout is known.
    pub field_offset: Option<usize>,
}
impl VarSymbol {
    pub fn new<S: Into<String>>(name: S, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            is_const: false,
            is_initialized: false,
            slot: None,
            field_offset: None,
        }
    }

    pub fn constant<S: Into<String>>(name: S, ty: Type) -> Self {
        Self {
            is_const: true,
            is_initialized: true,
            ..Self::new(name, ty)
        }
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }
}

/// A set of symbols declared in the same block, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    symbols: OrderedHashMap<String, Symbol>,
}
impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a symbol, shadowing any earlier symbol with the same name.
    pub fn declare(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name().to_string(), symbol);
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().map(|(_, symbol)| symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A function or method, with its parameters, locals and nested functions.
#[derive(Debug, Clone)]
pub struct FuncSymbol {
    pub name: String,
    pub params: Vec<VarSymbol>,
    pub ret: Type,
    pub is_method: bool,
    pub scope: Scope,
    pub activation_record: Option<ActivationRecord>,
}
impl FuncSymbol {
    /// Creates a function and lays out its parameters in a fresh activation record.
    pub fn new<S: Into<String>>(name: S, params: Vec<(&str, Type)>, ret: Type) -> Self {
        Self::build(name.into(), params, ret, false)
    }

    /// Creates a method. Its activation record reserves the `this` slot before the parameters.
    pub fn method<S: Into<String>>(name: S, params: Vec<(&str, Type)>, ret: Type) -> Self {
        Self::build(name.into(), params, ret, true)
    }

    fn build(name: String, params: Vec<(&str, Type)>, ret: Type, is_method: bool) -> Self {
        let mut ar = ActivationRecord::new(name.clone());
        if is_method {
            ar.add_this();
        }

        let mut scope = Scope::new();
        let params: Vec<_> = params
            .into_iter()
            .map(|(param, ty)| {
                let mut symbol = VarSymbol::new(param, ty).with_slot(ar.add_param(param, 1));
                symbol.is_initialized = true;
                scope.declare(Symbol::Var(symbol.clone()));
                symbol
            })
            .collect();

        Self {
            name,
            params,
            ret,
            is_method,
            scope,
            activation_record: Some(ar),
        }
    }

    /// Declares a local variable, assigning it the next local slot.
    pub fn declare_local<S: Into<String>>(&mut self, name: S, ty: Type) -> &mut Self {
        self.declare_local_symbol(VarSymbol::new(name, ty))
    }

    /// Declares a local constant, assigning it the next local slot.
    pub fn declare_const<S: Into<String>>(&mut self, name: S, ty: Type) -> &mut Self {
        self.declare_local_symbol(VarSymbol::constant(name, ty))
    }

    fn declare_local_symbol(&mut self, mut symbol: VarSymbol) -> &mut Self {
        if let Some(ar) = self.activation_record.as_mut() {
            symbol.slot = Some(ar.add_local(symbol.name.clone(), 1));
        }
        self.scope.declare(Symbol::Var(symbol));
        self
    }

    /// Declares a function nested in this one.
    pub fn declare_function(&mut self, function: FuncSymbol) -> &mut Self {
        self.scope.declare(Symbol::Func(function));
        self
    }

    /// Declares `this` as a variable of the given class, stored in the `this` slot.
    pub(super) fn bind_this(&mut self, class: &str) {
        self.is_method = true;
        let slot = match self.activation_record.as_mut() {
            Some(ar) => Some(match ar.addr_of(THIS) {
                Some(slot) => slot.clone(),
                None => ar.add_this(),
            }),
            None => None,
        };
        let mut this = VarSymbol::constant(THIS, Type::class(class));
        this.slot = slot;
        self.scope.declare(Symbol::Var(this));
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scope.resolve(name)
    }

    pub fn params_in_order(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn ty(&self) -> Type {
        Type::Function(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            Box::new(self.ret.clone()),
        )
    }
}

/// A class with its fields in declaration order and an optional base class.
#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub name: String,
    pub fields: OrderedHashMap<String, VarSymbol>,
    pub methods: OrderedHashMap<String, FuncSymbol>,
    pub base: Option<String>,
}
impl ClassSymbol {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            fields: OrderedHashMap::new(),
            methods: OrderedHashMap::new(),
            base: None,
        }
    }

    pub fn with_base<S: Into<String>>(mut self, base: S) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn add_field<S: Into<String>>(&mut self, name: S, ty: Type) -> &mut Self {
        let field = VarSymbol::new(name, ty);
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Adds a method, binding its `this` to an instance of this class.
    pub fn add_method(&mut self, mut method: FuncSymbol) -> &mut Self {
        method.bind_this(&self.name);
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn field(&self, name: &str) -> Option<&VarSymbol> {
        self.fields.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&FuncSymbol> {
        self.methods.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_params_get_param_slots() {
        let f = FuncSymbol::new("f", vec![("a", Type::Integer), ("b", Type::Integer)], Type::Integer);

        let b = f.lookup("b").and_then(Symbol::as_var).unwrap();
        assert_eq!(Some(3), b.slot.as_ref().map(|s| s.offset));
        assert_eq!(vec!["a", "b"], f.params_in_order());
        assert_eq!("(integer, integer) -> integer", f.ty().to_string());
    }

    #[test]
    fn locals_get_negative_slots() {
        let mut f = FuncSymbol::new("f", vec![], Type::Void);
        f.declare_local("x", Type::Integer).declare_const("k", Type::String);

        let k = f.lookup("k").and_then(Symbol::as_var).unwrap();
        assert!(k.is_const);
        assert_eq!(Some(-2), k.slot.as_ref().map(|s| s.offset));
        assert_eq!("const", f.lookup("k").unwrap().category());
    }

    #[test]
    fn methods_bind_this_to_their_class() {
        let mut class = ClassSymbol::new("Point");
        class.add_method(FuncSymbol::method("move", vec![("dx", Type::Integer)], Type::Void));

        let method = class.method("move").unwrap();
        let this = method.lookup(THIS).and_then(Symbol::as_var).unwrap();
        assert_eq!(Type::class("Point"), this.ty);
        assert_eq!(Some(Region::This), this.slot.as_ref().map(|s| s.region));
        assert!(method.is_method);
    }

    #[test]
    fn scope_shadows_by_name() {
        let mut scope = Scope::new();
        scope.declare(Symbol::Var(VarSymbol::new("x", Type::Integer)));
        scope.declare(Symbol::Var(VarSymbol::new("x", Type::String)));

        assert_eq!(1, scope.len());
        assert_eq!(
            Some(&Type::String),
            scope.resolve("x").and_then(Symbol::as_var).map(|v| &v.ty)
        );
    }
}
