use log::trace;

use super::Label;

/// The jump targets of the innermost enclosing breakable statement.
#[derive(Debug, Clone)]
struct LoopLabels {
    /// Absent for a `switch` that is not nested in a loop.
    continue_lbl: Option<Label>,
    break_lbl: Label,
}

/// Issues unique labels and tracks the `continue`/`break` targets of nested loops.
#[derive(Debug)]
pub struct LabelManager {
    prefix: String,
    index: usize,
    loop_stack: Vec<LoopLabels>,
}

impl LabelManager {
    pub fn new() -> Self {
        Self::with_prefix("L")
    }

    pub fn with_prefix<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            index: 0,
            loop_stack: vec![],
        }
    }

    /// Generates a new label with the default prefix.
    pub fn next_label(&mut self) -> Label {
        let prefix = self.prefix.clone();
        self.next_label_with(&prefix)
    }

    /// Generates a new label with a custom prefix. The counter is shared between prefixes,
    /// so labels are unique across the whole run.
    pub fn next_label_with(&mut self, prefix: &str) -> Label {
        let label = Label::new(format!("{}{}", prefix, self.index));
        self.index += 1;
        label
    }

    pub fn push_loop(&mut self, continue_lbl: Label, break_lbl: Label) {
        trace!("enter loop (continue {}, break {})", continue_lbl, break_lbl);
        self.loop_stack.push(LoopLabels {
            continue_lbl: Some(continue_lbl),
            break_lbl,
        });
    }

    /// Enters a `switch`. A `break` leaves the switch, while a `continue` still targets the
    /// enclosing loop, if any.
    pub fn push_switch(&mut self, break_lbl: Label) {
        let continue_lbl = self
            .loop_stack
            .last()
            .and_then(|top| top.continue_lbl.clone());
        trace!("enter switch (break {})", break_lbl);
        self.loop_stack.push(LoopLabels {
            continue_lbl,
            break_lbl,
        });
    }

    /// Leaves the innermost loop or switch.
    ///
    /// # Panics
    /// When no loop is active, which means the caller issued unbalanced push/pop calls.
    pub fn pop_loop(&mut self) {
        assert!(!self.loop_stack.is_empty(), "loop stack underflow");
        self.loop_stack.pop();
        trace!("leave loop (depth {})", self.loop_stack.len());
    }

    /// # Panics
    /// When no loop is active.
    pub fn current_continue(&self) -> &Label {
        self.loop_stack
            .last()
            .and_then(|top| top.continue_lbl.as_ref())
            .unwrap_or_else(|| panic!("no active loop"))
    }

    /// # Panics
    /// When no loop or switch is active.
    pub fn current_break(&self) -> &Label {
        match self.loop_stack.last() {
            Some(top) => &top.break_lbl,
            None => panic!("no active loop"),
        }
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_stack.len()
    }
}

impl Default for LabelManager {
    fn default() -> Self {
        Self::new()
    }
}
