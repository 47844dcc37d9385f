pub mod access;
pub mod assign;
pub mod binary;
pub mod unary;

// Most of the operator code is `impl Interpreter`; the free helpers are shared
// with the builtins.
