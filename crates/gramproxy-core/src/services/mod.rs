//! Services that implement the interception behavior on top of the ports.

pub mod body_rewriter;
pub mod grammar_loader;

pub use body_rewriter::{BodyRewrite, BodyRewriter, PassthroughReason};
pub use grammar_loader::{
    DEFAULT_GRAMMAR_PATH, FileGrammarProvider, GRAMMAR_PATH_ENV, resolve_grammar_path,
};
