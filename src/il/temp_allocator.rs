use super::Temp;

/// Hands out temporary names, recycling freed ones in LIFO order.
///
/// No liveness analysis is performed: the caller must never read a temporary after freeing it.
#[derive(Debug)]
pub struct TempAllocator {
    prefix: String,
    index: usize,
    free_list: Vec<Temp>,
}

impl TempAllocator {
    pub fn new() -> Self {
        Self::with_prefix("t")
    }

    pub fn with_prefix<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            index: 0,
            free_list: vec![],
        }
    }

    /// Returns the most recently freed temporary, or a new unique one if none is free.
    pub fn next_temp(&mut self) -> Temp {
        if let Some(temp) = self.free_list.pop() {
            return temp;
        }

        let temp = Temp::new(format!("{}{}", self.prefix, self.index));
        self.index += 1;
        temp
    }

    /// Returns a temporary to the pool. Freeing a temporary that is already free does nothing.
    pub fn free(&mut self, temp: &Temp) {
        if !self.free_list.contains(temp) {
            self.free_list.push(temp.clone());
        }
    }

    /// Forgets all issued and freed temporaries.
    pub fn reset(&mut self) {
        self.index = 0;
        self.free_list.clear();
    }
}

impl Default for TempAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_temp_generates_ascending_temp_values() {
        let mut temps = TempAllocator::new();

        assert_eq!("t0", temps.next_temp().to_string());
        assert_eq!("t1", temps.next_temp().to_string());
    }

    #[test]
    fn freed_temp_is_reused_first() {
        let mut temps = TempAllocator::new();
        let t0 = temps.next_temp();
        let _t1 = temps.next_temp();

        temps.free(&t0);

        assert_eq!(t0, temps.next_temp());
        assert_eq!("t2", temps.next_temp().to_string());
    }

    #[test]
    fn reuse_is_last_in_first_out() {
        let mut temps = TempAllocator::new();
        let t0 = temps.next_temp();
        let t1 = temps.next_temp();

        temps.free(&t0);
        temps.free(&t1);

        assert_eq!(t1, temps.next_temp());
        assert_eq!(t0, temps.next_temp());
    }

    #[test]
    fn double_free_is_a_no_op() {
        let mut temps = TempAllocator::new();
        let t0 = temps.next_temp();

        temps.free(&t0);
        temps.free(&t0);

        assert_eq!(t0, temps.next_temp());
        assert_eq!("t1", temps.next_temp().to_string());
    }

    #[test]
    fn reset_restarts_numbering() {
        let mut temps = TempAllocator::with_prefix("tmp");
        let t0 = temps.next_temp();
        temps.next_temp();
        temps.free(&t0);

        temps.reset();

        assert_eq!("tmp0", temps.next_temp().to_string());
        assert_eq!("tmp1", temps.next_temp().to_string());
    }
}
