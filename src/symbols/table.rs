use crate::il::Addr;

use super::{error::LookupError, symbol::*, Type};

/// The global symbol table, as populated by the type checker. Read-only during generation.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    globals: Scope,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, symbol: Symbol) -> &mut Self {
        self.globals.declare(symbol);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.globals.resolve(name)
    }

    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    pub fn resolve_class(&self, name: &str) -> Result<&ClassSymbol, LookupError> {
        self.resolve(name)
            .and_then(Symbol::as_class)
            .ok_or_else(|| LookupError::ClassNotFound(name.to_string()))
    }

    pub fn resolve_function(&self, name: &str) -> Result<&FuncSymbol, LookupError> {
        self.resolve(name)
            .and_then(Symbol::as_func)
            .ok_or_else(|| LookupError::FunctionNotFound(name.to_string()))
    }

    /// Returns the address of a variable's storage slot.
    pub fn addr_of(&self, var: &VarSymbol) -> Result<Addr, LookupError> {
        var.slot
            .as_ref()
            .map(|slot| slot.addr())
            .ok_or_else(|| LookupError::NoStorage(var.name.clone()))
    }

    /// Returns the inheritance chain of a class, ordered from the root base class down to the
    /// class itself.
    pub fn inheritance_chain(&self, class_name: &str) -> Result<Vec<&ClassSymbol>, LookupError> {
        let mut chain = vec![];
        let mut current = Some(self.resolve_class(class_name)?);

        while let Some(class) = current {
            if chain.iter().any(|c: &&ClassSymbol| c.name == class.name) {
                return Err(LookupError::InheritanceCycle(class.name.clone()));
            }
            chain.push(class);
            current = match &class.base {
                Some(base) => Some(self.resolve_class(base)?),
                None => None,
            };
        }

        chain.reverse();
        Ok(chain)
    }

    /// Returns the offset of a field within an instance of `class_name`: the number of fields
    /// declared in all ancestors of the declaring class, plus the field's position in it.
    pub fn field_offset(&self, class_name: &str, field_name: &str) -> Result<usize, LookupError> {
        let class = self.resolve_class(class_name)?;
        if let Some(offset) = class.field(field_name).and_then(|f| f.field_offset) {
            return Ok(offset);
        }

        let mut inherited = 0;
        for ancestor in self.inheritance_chain(class_name)? {
            if let Some(index) = ancestor.fields.index_of(field_name) {
                return Ok(inherited + index);
            }
            inherited += ancestor.fields.len();
        }

        Err(LookupError::FieldNotFound {
            class: class_name.to_string(),
            field: field_name.to_string(),
        })
    }

    /// Returns the declared type of a field, searching the class and its ancestors.
    pub fn field_type(&self, class_name: &str, field_name: &str) -> Result<&Type, LookupError> {
        self.inheritance_chain(class_name)?
            .into_iter()
            .rev()
            .find_map(|class| class.field(field_name))
            .map(|field| &field.ty)
            .ok_or_else(|| LookupError::FieldNotFound {
                class: class_name.to_string(),
                field: field_name.to_string(),
            })
    }

    /// Finds the most derived declaration of a method, returning it with its declaring class.
    pub fn find_method(
        &self,
        class_name: &str,
        method_name: &str,
    ) -> Result<(&ClassSymbol, &FuncSymbol), LookupError> {
        self.inheritance_chain(class_name)?
            .into_iter()
            .rev()
            .find_map(|class| class.method(method_name).map(|m| (class, m)))
            .ok_or_else(|| LookupError::MethodNotFound {
                class: class_name.to_string(),
                method: method_name.to_string(),
            })
    }

    /// Records the object layout of every class by storing each field's offset on its symbol.
    pub fn assign_field_offsets(&mut self) -> Result<(), LookupError> {
        let mut layouts = vec![];
        for class in self.globals.iter().filter_map(Symbol::as_class) {
            let mut offsets = vec![];
            for field in class.fields.keys() {
                offsets.push((field.clone(), self.field_offset(&class.name, field)?));
            }
            layouts.push((class.name.clone(), offsets));
        }

        for (class_name, offsets) in layouts {
            let mut class = self.resolve_class(&class_name)?.clone();
            for (field, offset) in offsets {
                if let Some(symbol) = class.fields.get_mut(&field) {
                    symbol.field_offset = Some(offset);
                }
            }
            self.globals.declare(Symbol::Class(class));
        }
        Ok(())
    }
}
