//! Cursor-based pagination types for GraphQL
//!
//! Implements the Relay Connection specification for list queries. Cursors
//! are opaque base64 strings wrapping the row offset.
//!
//! Usage: Use the `define_connection!` macro to create type-specific connections.

use async_graphql::SimpleObject;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::db::{Page, Paged};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Information about pagination in a connection
#[derive(SimpleObject, Debug, Clone, Default)]
pub struct PageInfo {
    /// When paginating forwards, are there more items?
    pub has_next_page: bool,
    /// When paginating backwards, are there more items?
    pub has_previous_page: bool,
    /// Cursor of the first item in this page
    pub start_cursor: Option<String>,
    /// Cursor of the last item in this page
    pub end_cursor: Option<String>,
    /// Total count of matching items
    pub total_count: Option<i64>,
}

/// An edge in a connection (internal use)
#[derive(Debug, Clone)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: String,
}

/// A paginated connection result (internal use)
#[derive(Debug, Clone)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

/// Macro to define a GraphQL connection type for a specific entity
///
/// Usage:
/// ```ignore
/// define_connection!(PostConnection, PostEdge, Post);
/// ```
#[macro_export]
macro_rules! define_connection {
    ($conn_name:ident, $edge_name:ident, $node_type:ty) => {
        /// Edge containing a node and cursor
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $edge_name {
            /// The item at the end of the edge
            pub node: $node_type,
            /// A cursor for pagination
            pub cursor: String,
        }

        /// Connection containing edges and page info
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $conn_name {
            /// The edges in this connection
            pub edges: Vec<$edge_name>,
            /// Pagination information
            pub page_info: $crate::graphql::pagination::PageInfo,
        }

        impl From<$crate::graphql::pagination::Connection<$node_type>> for $conn_name {
            fn from(conn: $crate::graphql::pagination::Connection<$node_type>) -> Self {
                Self {
                    edges: conn
                        .edges
                        .into_iter()
                        .map(|e| $edge_name {
                            node: e.node,
                            cursor: e.cursor,
                        })
                        .collect(),
                    page_info: conn.page_info,
                }
            }
        }
    };
}

impl<T> Connection<T> {
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo {
                total_count: Some(0),
                ..Default::default()
            },
        }
    }

    /// Build a connection from one page of store results
    pub fn from_paged<R: Into<T>>(paged: Paged<R>, page: Page) -> Self {
        let offset = page.offset;
        let has_next_page = offset + (paged.items.len() as i64) < paged.total;

        let edges: Vec<Edge<T>> = paged
            .items
            .into_iter()
            .enumerate()
            .map(|(i, record)| Edge {
                cursor: encode_cursor(offset + i as i64),
                node: record.into(),
            })
            .collect();

        let page_info = PageInfo {
            has_next_page,
            has_previous_page: offset > 0,
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
            total_count: Some(paged.total),
        };

        Self { edges, page_info }
    }
}

/// Encode an offset as a cursor string
pub fn encode_cursor(offset: i64) -> String {
    BASE64.encode(format!("cursor:{}", offset))
}

/// Decode a cursor string to an offset
pub fn decode_cursor(cursor: &str) -> ApiResult<i64> {
    let invalid = || ApiError::Validation(format!("invalid cursor: {}", cursor));

    let decoded = BASE64.decode(cursor).map_err(|_| invalid())?;
    let s = String::from_utf8(decoded).map_err(|_| invalid())?;
    s.strip_prefix("cursor:")
        .and_then(|n| n.parse::<i64>().ok())
        .filter(|n| *n >= 0)
        .ok_or_else(invalid)
}

/// Turn `first`/`after` arguments into a store page
pub fn page_args(first: Option<i32>, after: Option<String>) -> ApiResult<Page> {
    let limit = match first {
        Some(n) if n < 0 => {
            return Err(ApiError::Validation("first must not be negative".into()));
        }
        Some(n) => (n as i64).min(MAX_PAGE_SIZE),
        None => DEFAULT_PAGE_SIZE,
    };

    let offset = match after {
        Some(cursor) => decode_cursor(&cursor)?
            .checked_add(1)
            .ok_or_else(|| ApiError::Validation(format!("invalid cursor: {}", cursor)))?,
        None => 0,
    };

    Ok(Page::new(offset, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_cursor_roundtrip() {
        for offset in [0, 1, 100, 999999] {
            assert_eq!(decode_cursor(&encode_cursor(offset)).unwrap(), offset);
        }
    }

    #[test]
    fn test_bad_cursor_is_validation_error() {
        assert_matches!(decode_cursor("%%%"), Err(ApiError::Validation(_)));
        assert_matches!(
            decode_cursor(&BASE64.encode("offset:3")),
            Err(ApiError::Validation(_))
        );
    }

    #[test]
    fn test_after_last_representable_cursor_is_rejected() {
        assert_matches!(
            page_args(Some(10), Some(encode_cursor(i64::MAX))),
            Err(ApiError::Validation(_))
        );
    }

    #[test]
    fn test_page_args_defaults_and_cap() {
        assert_eq!(page_args(None, None).unwrap(), Page::new(0, 25));
        assert_eq!(page_args(Some(1000), None).unwrap(), Page::new(0, 100));
        assert_matches!(page_args(Some(-1), None), Err(ApiError::Validation(_)));
    }

    #[test]
    fn test_page_args_after_cursor() {
        let page = page_args(Some(10), Some(encode_cursor(10))).unwrap();
        assert_eq!(page, Page::new(11, 10));
    }

    #[test]
    fn test_from_paged_page_info() {
        let paged = Paged {
            items: vec![3, 4],
            total: 6,
        };
        let conn: Connection<i64> = Connection::from_paged(paged, Page::new(3, 2));
        assert!(conn.page_info.has_next_page);
        assert!(conn.page_info.has_previous_page);
        assert_eq!(conn.page_info.start_cursor, Some(encode_cursor(3)));
        assert_eq!(conn.edges[1].cursor, encode_cursor(4));
        assert_eq!(conn.page_info.total_count, Some(6));
    }
}
