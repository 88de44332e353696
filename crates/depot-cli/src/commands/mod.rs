pub mod completions;
pub mod inspect;
pub mod solve;
pub mod validate;
