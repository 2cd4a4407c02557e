//! Core data types: links, states, actions and request values.

mod action;
mod link;
mod link_set;
mod request;
mod state;

pub use action::{ActionInfo, Field};
pub use link::Link;
pub use link_set::LinkSet;
pub use request::{clone_request, Request, RequestOptions, Response};
pub use state::{Representation, State};
