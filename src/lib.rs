//! # ketting_rs
//!
//! A client for hypermedia REST APIs. Start from a bookmark URI, follow
//! typed links, and let the client take care of content negotiation,
//! caching and cache invalidation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Client: bookmark, live resource registry, format registry │
//! ├───────────────┬───────────────────┬──────────────────────┤
//! │ Resource      │ FollowOne/Many    │ Action               │
//! │ get/put/post  │ lazy traversal    │ form submission      │
//! ├───────────────┴───────────────────┴──────────────────────┤
//! │ Fetcher: origin-scoped middleware → Transport (reqwest)  │
//! ├──────────────────────────────────────────────────────────┤
//! │ Representors: HAL, Siren, JSON, text, binary → State     │
//! ├──────────────────────────────────────────────────────────┤
//! │ Cache: Never / Forever / Short(ttl)                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | `Client`, `Resource`, follow builders, actions, transport |
//! | [`middleware`] | Fetch middleware trait and the built-in middlewares |
//! | [`representor`] | Media type adapters and the format registry |
//! | [`cache`] | State cache policies |
//! | [`types`] | `Link`, `LinkSet`, `State`, `ActionInfo`, request values |
//! | [`protocol`] | `Link` header parsing, URI templates, header helpers |
//! | [`error`] | `Error` and `Result` |
//!
//! # Quick Start
//!
//! ```no_run
//! use ketting_rs::{Client, RequestOptions};
//!
//! # async fn run() -> ketting_rs::Result<()> {
//! let client = Client::new("https://api.example.org/")?;
//!
//! let articles = client.follow("articles").follow_all("item").await?;
//! for article in articles {
//!     let state = article.get(RequestOptions::default()).await?;
//!     println!("{} {:?}", state.uri, state.data);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod representor;
pub mod types;

pub use cache::{Cache, CachePolicy, ForeverCache, NeverCache, ShortCache};
pub use client::{
    Action, Client, ClientConfig, Fetcher, FollowMany, FollowOne, RequestInit, Resource,
    ResourceEvent, ReqwestTransport, Transport, WeakClient,
};
pub use error::{Error, HttpError, Problem, Result};
pub use middleware::{Middleware, Next};
pub use representor::{Format, FormatRegistry};
pub use types::{
    ActionInfo, Field, Link, LinkSet, Representation, Request, RequestOptions, Response, State,
};
