//! Call frame implementation for function calls

use crate::value::Closure;
use std::rc::Rc;

/// Call frame for one running closure
///
/// The main program runs in a frame too, wrapping the top-level instructions
/// in a closure with no parameters and no captures.
///
/// ## Stack Layout Example
///
/// ```text
/// caller calls add(1, 2), which declares one extra local:
///
/// ... | [closure add][arg 1][arg 2][local] | <- sp
///                    ^
///                    base_pointer
/// ```
///
/// Local N lives at `stack[base_pointer + N]`; the callee sits at
/// `base_pointer - 1`, so resetting `sp` there on return drops the callee,
/// the arguments and the locals in one step.
#[derive(Debug, Clone)]
pub struct Frame {
    pub closure: Rc<Closure>,
    /// Offset of the next instruction to fetch
    pub ip: usize,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    #[inline(always)]
    pub fn instructions(&self) -> &[u8] {
        &self.closure.func.instructions
    }
}
