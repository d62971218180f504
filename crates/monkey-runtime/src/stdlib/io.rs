//! Output builtins

use super::{BuiltinError, OutputWriter};
use crate::value::Value;

/// Write each argument's rendering on its own line; returns null
pub fn puts(args: &[Value], out: &OutputWriter) -> Result<Value, BuiltinError> {
    let mut writer = out.borrow_mut();
    for arg in args {
        writeln!(writer, "{}", arg).map_err(|e| BuiltinError::Output(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| BuiltinError::Output(e.to_string()))?;
    Ok(Value::NULL)
}
