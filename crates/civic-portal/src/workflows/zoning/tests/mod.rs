mod common;
mod documents;
mod transitions;
