//! Wire-level helpers: header parsing, `Link` headers and URI templates.

pub mod headers;
pub mod link_header;
pub mod uri_template;

pub use headers::{
    content_type, is_no_store, is_safe_method, request_signature, strip_media_type_params,
};
pub use link_header::{parse_link_header, parse_link_headers, HttpLink};
pub use uri_template::expand_template;

/// Header names that are not in `http::header`.
pub mod constants {
    pub const PREFER: &str = "prefer";
    pub const PREFER_PUSH: &str = "prefer-push";
    pub const DEPRECATION: &str = "deprecation";
    pub const SUNSET: &str = "sunset";

    pub mod rels {
        pub const INVALIDATES: &str = "invalidates";
        pub const DEPRECATION: &str = "deprecation";
        pub const SELF: &str = "self";
    }
}
