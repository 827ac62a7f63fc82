/*!
# Rewriter - Type-Directed Expression Rewriting

Replaces operator and converting-constructor calls on one configured target
type with explicit free-function calls, leaving every other byte untouched.

## Architecture

- `RewrittenSet`: ranges already consumed by a completed rewrite
- `TypeClassifier`: is an operand (minus implicit conversions) of the target type?
- `EditBuffer`: original text plus disjoint range → replacement edits
- `RewriteEngine`: traversal-driven rewrite with eager operand recursion

## Naming

With target type `T` and operator name `op` (`add`, `sub`, `mul`, `div`):

| left is `T` | right is `T` | call                 |
|-------------|--------------|----------------------|
| yes         | yes          | `T_op(l,r)`          |
| yes         | no           | `T_op_real(l,r)`     |
| no          | yes          | `real_op_T(l,r)`     |

Converting constructors become `to_T(args...)`.

## Example Usage

```rust
use oprewrite_core::{rewrite, BinaryOp, RewriteConfig, TreeBuilder};

let source = "a * 2.0f";
let mut builder = TreeBuilder::new(source);
let a = builder.leaf(0..1, Some("complex"));
let two = builder.leaf(4..8, Some("float"));
let mul = builder.binary(BinaryOp::Mul, a, two, Some("complex"));
let tree = builder.finish(mul);

let output = rewrite(source, &tree, &RewriteConfig::default())?;
assert_eq!(output.text, "complex_mul_real(a,2.0f)");
# Ok::<(), oprewrite_core::RewriteError>(())
```
*/

pub mod classifier;
pub mod edit_buffer;
pub mod engine;
pub mod report;
pub mod tracker;


// Re-export main types
pub use classifier::TypeClassifier;
pub use edit_buffer::EditBuffer;
pub use engine::RewriteEngine;
pub use report::{RewriteOutput, RewriteReport, RewriteWarning};
pub use tracker::RewrittenSet;

use crate::tree::ExprTree;
use crate::{Result, RewriteConfig};

/// Run one full rewrite pass over `source` using the front end's `tree`
pub fn rewrite(source: &str, tree: &ExprTree, config: &RewriteConfig) -> Result<RewriteOutput> {
    RewriteEngine::new(source, tree, config).run()
}
