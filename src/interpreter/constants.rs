// Constants for the stepscope pipeline

/// Upper bound on rounds of a fixed-point rewrite pass
/// Shrinking rules settle long before this; it only stops a runaway rule
pub const MAX_FIXED_POINT_ITERATIONS: usize = 64;

/// Default cap on captured steps used by the CLI
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Maximum nesting of HostLang calls before a RangeError is raised
pub const MAX_CALL_DEPTH: usize = 2_000;

/// Stack size of the worker thread that walks the AST (64 MiB)
pub const INTERPRETER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Largest integer a HostLang number represents exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Longest array a program may build
/// Larger requests raise `RangeError: Invalid array length` instead of allocating
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// Longest string, in bytes, a program may build
pub const MAX_STRING_LENGTH: usize = 1 << 28;

/// Widest BigInt, in bits, arithmetic may produce
pub const MAX_BIGINT_BITS: u64 = 1 << 24;
