use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::AstNode;

impl Interpreter<'_> {
    pub(crate) fn execute_return(&mut self, expr: Option<&AstNode>) -> Result<(), RuntimeError> {
        self.return_value = match expr {
            Some(ret_expr) => Some(self.evaluate_expr(ret_expr)?),
            None => None,
        };
        self.control_flow = ControlFlow::Return;
        Ok(())
    }

    pub(crate) fn execute_break(&mut self) -> Result<(), RuntimeError> {
        self.control_flow = ControlFlow::Break;
        Ok(())
    }

    pub(crate) fn execute_continue(&mut self) -> Result<(), RuntimeError> {
        self.control_flow = ControlFlow::Continue;
        Ok(())
    }
}
