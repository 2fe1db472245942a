//! Frame layout of a function invocation.
//!
//! Slots are addressed relative to the frame pointer. Two control slots (return address and
//! saved frame pointer) are reserved beneath the parameters, so parameters start at +2 and
//! grow upwards. When the function is a method, `this` takes the slot at +1, adjacent to the
//! control slots. Locals start at -1 and grow downwards in declaration order.
use std::fmt::{self, Display, Formatter};

use crate::{
    ext::OrderedHashMap,
    il::{Addr, FRAME_POINTER},
};

/// Offset of the first parameter slot.
pub const FIRST_PARAM_OFFSET: isize = 2;
/// Offset of the `this` slot.
pub const THIS_OFFSET: isize = 1;
pub const THIS: &str = "this";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Param,
    Local,
    This,
    Temp,
}
impl Display for Region {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Region::Param => "param",
            Region::Local => "local",
            Region::This => "this",
            Region::Temp => "temp",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub region: Region,
    pub offset: isize,
}
impl Slot {
    pub fn addr(&self) -> Addr {
        Addr::new(FRAME_POINTER, self.offset)
    }
}

#[derive(Debug, Clone)]
pub struct ActivationRecord {
    pub func_name: String,
    slots: OrderedHashMap<String, Slot>,
    locals_size: isize,
    params_size: isize,
    has_this: bool,
}

impl ActivationRecord {
    pub fn new<S: Into<String>>(func_name: S) -> Self {
        Self {
            func_name: func_name.into(),
            slots: OrderedHashMap::new(),
            locals_size: 0,
            params_size: 0,
            has_this: false,
        }
    }

    pub fn add_param<S: Into<String>>(&mut self, name: S, size: usize) -> Slot {
        let offset = self.params_size + FIRST_PARAM_OFFSET;
        self.params_size += size as isize;
        self.insert(name.into(), Region::Param, offset)
    }

    pub fn add_this(&mut self) -> Slot {
        self.has_this = true;
        self.insert(THIS.to_string(), Region::This, THIS_OFFSET)
    }

    pub fn add_local<S: Into<String>>(&mut self, name: S, size: usize) -> Slot {
        self.locals_size += size as isize;
        let offset = -self.locals_size;
        self.insert(name.into(), Region::Local, offset)
    }

    /// Reserves a spill slot for a temporary below the locals.
    pub fn add_temp<S: Into<String>>(&mut self, name: S, size: usize) -> Slot {
        self.locals_size += size as isize;
        let offset = -self.locals_size;
        self.insert(name.into(), Region::Temp, offset)
    }

    pub fn addr_of(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().map(|(_, slot)| slot)
    }

    pub fn locals_size(&self) -> usize {
        self.locals_size as usize
    }

    pub fn params_size(&self) -> usize {
        self.params_size as usize
    }

    pub fn has_this(&self) -> bool {
        self.has_this
    }

    fn insert(&mut self, name: String, region: Region, offset: isize) -> Slot {
        let slot = Slot {
            name: name.clone(),
            region,
            offset,
        };
        self.slots.insert(name, slot.clone());
        slot
    }
}
