//! The unified evaluation and call stack.

use quill_value::Variant;

use crate::errors::RunError;

/// A fixed-capacity stack of values.
///
/// Capacity is reserved up front and never grows: running out is a
/// `StackOverflow`, not a reallocation. Underflow and out-of-range slot
/// access can only come from a malformed program and report
/// `InvalidProgram`.
#[derive(Debug)]
pub struct ValueStack {
    values: Vec<Variant>,
    capacity: usize,
}

impl ValueStack {
    pub fn with_capacity(capacity: usize) -> Self {
        ValueStack {
            values: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Live values, bottom first.
    pub fn as_slice(&self) -> &[Variant] {
        &self.values
    }

    #[inline]
    pub fn push(&mut self, value: Variant) -> Result<(), RunError> {
        if self.values.len() >= self.capacity {
            return Err(RunError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.values.push(value);
        Ok(())
    }

    /// Push `count` nulls.
    pub fn push_nulls(&mut self, count: usize) -> Result<(), RunError> {
        if self.values.len() + count > self.capacity {
            return Err(RunError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.values.resize(self.values.len() + count, Variant::Null);
        Ok(())
    }

    #[inline]
    pub fn pop(&mut self) -> Result<Variant, RunError> {
        self.values
            .pop()
            .ok_or_else(|| RunError::invalid("stack underflow"))
    }

    /// Value `depth` places below the top (0 = top).
    #[inline]
    pub fn peek(&self, depth: usize) -> Result<Variant, RunError> {
        self.values
            .len()
            .checked_sub(depth + 1)
            .map(|index| self.values[index])
            .ok_or_else(|| RunError::invalid("stack underflow"))
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<Variant, RunError> {
        self.values
            .get(index)
            .copied()
            .ok_or_else(|| RunError::invalid(format!("stack slot {index} out of range")))
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Variant) -> Result<(), RunError> {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RunError::invalid(format!("stack slot {index} out of range"))),
        }
    }

    /// Drop `count` values from the top.
    pub fn drop_top(&mut self, count: usize) -> Result<(), RunError> {
        let len = self
            .values
            .len()
            .checked_sub(count)
            .ok_or_else(|| RunError::invalid("stack underflow"))?;
        self.values.truncate(len);
        Ok(())
    }

    /// Cut the stack down to `len` values.
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn overflow_is_reported_at_capacity() {
        let mut stack = ValueStack::with_capacity(2);
        stack.push(Variant::Int32(1)).unwrap();
        stack.push(Variant::Int32(2)).unwrap();
        assert_eq!(
            stack.push(Variant::Null),
            Err(RunError::StackOverflow { capacity: 2 })
        );
        assert!(stack.push_nulls(1).is_err());
    }

    #[test]
    fn peek_counts_from_the_top() {
        let mut stack = ValueStack::with_capacity(4);
        stack.push(Variant::Int32(1)).unwrap();
        stack.push(Variant::Int32(2)).unwrap();
        assert_eq!(stack.peek(0).unwrap(), Variant::Int32(2));
        assert_eq!(stack.peek(1).unwrap(), Variant::Int32(1));
        assert!(stack.peek(2).is_err());
    }

    #[test]
    fn underflow_is_an_invalid_program() {
        let mut stack = ValueStack::with_capacity(4);
        assert_eq!(stack.pop().unwrap_err().kind_name(), "InvalidProgram");
        assert!(stack.drop_top(1).is_err());
    }

    #[test]
    fn slots_are_addressed_from_the_bottom() {
        let mut stack = ValueStack::with_capacity(4);
        stack.push_nulls(3).unwrap();
        stack.set(1, Variant::Int64(9)).unwrap();
        assert_eq!(stack.get(1).unwrap(), Variant::Int64(9));
        assert!(stack.set(3, Variant::Null).is_err());
    }
}
