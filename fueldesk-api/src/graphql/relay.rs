//! Relay plumbing: global ids and offset-based connections.
//!
//! A global id is `base64("<NodeType>:<pk>")`. Cursors are
//! `base64("arrayconnection:<offset>")`, where the offset is the row's
//! position in the filtered, id-ordered result set.

use async_graphql::{
    connection::{self, Connection, CursorType, Edge},
    ErrorExtensions, OutputType,
};
use std::future::Future;

use crate::error::ApiError;

const CURSOR_PREFIX: &str = "arrayconnection:";

/// Upper bound on `first`/`last`, also the page size when neither is given
pub const MAX_PAGE_SIZE: usize = 100;

pub fn to_global_id(type_name: &str, id: i64) -> async_graphql::ID {
    async_graphql::ID(base64::encode(format!("{}:{}", type_name, id)))
}

/// Splits a global id into its type name and primary key
pub fn from_global_id(global_id: &str) -> Option<(String, i64)> {
    let raw = base64::decode(global_id).ok()?;
    let raw = String::from_utf8(raw).ok()?;
    let (type_name, pk) = raw.split_once(':')?;
    let pk = pk.parse::<i64>().ok()?;

    Some((type_name.to_string(), pk))
}

/// Resolves a global id that must name a `type_name` row
///
/// Undecodable ids and ids of another node type are reported as not found,
/// the same as a well-formed id whose row is gone.
pub fn decode_id(global_id: &str, type_name: &str) -> Result<i64, ApiError> {
    match from_global_id(global_id) {
        Some((name, pk)) if name == type_name => Ok(pk),
        _ => Err(ApiError::NotFound(format!(
            "{} matching query does not exist.",
            type_name.trim_end_matches("Node")
        ))),
    }
}

/// Position of an edge in a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCursor(pub usize);

impl CursorType for OffsetCursor {
    type Error = ApiError;

    fn decode_cursor(s: &str) -> Result<Self, Self::Error> {
        let invalid = || ApiError::BadRequest(format!("Invalid cursor: {:?}", s));

        let raw = base64::decode(s).map_err(|_| invalid())?;
        let raw = String::from_utf8(raw).map_err(|_| invalid())?;
        let offset = raw
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(invalid)?;

        Ok(OffsetCursor(offset))
    }

    fn encode_cursor(&self) -> String {
        base64::encode(format!("{}{}", CURSOR_PREFIX, self.0))
    }
}

/// Slice of a result set selected by the connection arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl Window {
    /// Applies `after`/`before` and then `first`/`last` to `total` rows
    pub fn new(
        total: usize,
        after: Option<OffsetCursor>,
        before: Option<OffsetCursor>,
        first: Option<usize>,
        last: Option<usize>,
    ) -> Result<Self, ApiError> {
        for (name, value) in [("first", first), ("last", last)] {
            if let Some(n) = value {
                if n > MAX_PAGE_SIZE {
                    return Err(ApiError::BadRequest(format!(
                        "Requesting {} records exceeds the `{}` limit of {} records.",
                        n, name, MAX_PAGE_SIZE
                    )));
                }
            }
        }

        let mut start = after.map(|c| c.0.saturating_add(1)).unwrap_or(0).min(total);
        let mut end = before.map(|c| c.0).unwrap_or(total).min(total).max(start);

        if let Some(first) = first {
            end = end.min(start + first);
        }
        if let Some(last) = last {
            start = start.max(end.saturating_sub(last));
        }
        if first.is_none() && last.is_none() {
            end = end.min(start + MAX_PAGE_SIZE);
        }

        Ok(Self { start, end, total })
    }

    pub fn offset(&self) -> i64 {
        self.start as i64
    }

    pub fn limit(&self) -> i64 {
        (self.end - self.start) as i64
    }

    pub fn has_previous_page(&self) -> bool {
        self.start > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.end < self.total
    }
}

/// Builds a connection over `total` rows, fetching only the selected window
///
/// `fetch` receives `(limit, offset)` and returns the nodes in id order.
pub async fn paginate<Node, F, Fut>(
    total: i64,
    after: Option<String>,
    before: Option<String>,
    first: Option<i32>,
    last: Option<i32>,
    fetch: F,
) -> async_graphql::Result<Connection<OffsetCursor, Node>>
where
    Node: OutputType,
    F: FnOnce(i64, i64) -> Fut,
    Fut: Future<Output = Result<Vec<Node>, ApiError>>,
{
    let total = usize::try_from(total).unwrap_or(0);

    connection::query_with::<OffsetCursor, _, _, _, _>(
        after,
        before,
        first,
        last,
        |after, before, first, last| async move {
            let window = Window::new(total, after, before, first, last).map_err(|e| e.extend())?;
            let nodes = fetch(window.limit(), window.offset())
                .await
                .map_err(|e| e.extend())?;

            let mut conn = Connection::new(window.has_previous_page(), window.has_next_page());
            for (i, node) in nodes.into_iter().enumerate() {
                conn.edges
                    .push(Edge::new(OffsetCursor(window.start + i), node));
            }
            async_graphql::Result::<Connection<OffsetCursor, Node>>::Ok(conn)
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_id_matches_relay_encoding() {
        let id = to_global_id("FuelNode", 1);
        assert_eq!(id.0, "RnVlbE5vZGU6MQ==");
        assert_eq!(from_global_id(&id), Some(("FuelNode".to_string(), 1)));
    }

    #[test]
    fn test_decode_id_rejects_other_types() {
        let id = to_global_id("PaymentNode", 3);
        assert_eq!(decode_id(&id, "PaymentNode"), Ok(3));
        assert!(matches!(
            decode_id(&id, "FuelNode"),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            decode_id("not base64!", "FuelNode"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_cursor_encoding() {
        let cursor = OffsetCursor(0);
        assert_eq!(cursor.encode_cursor(), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(OffsetCursor::decode_cursor("YXJyYXljb25uZWN0aW9uOjA=").unwrap(), cursor);
        assert!(OffsetCursor::decode_cursor("garbage").is_err());
    }

    #[test]
    fn test_window_first_after() {
        let window = Window::new(10, Some(OffsetCursor(2)), None, Some(3), None).unwrap();
        assert_eq!((window.start, window.end), (3, 6));
        assert!(window.has_previous_page());
        assert!(window.has_next_page());
    }

    #[test]
    fn test_window_last_before() {
        let window = Window::new(10, None, Some(OffsetCursor(5)), None, Some(2)).unwrap();
        assert_eq!((window.start, window.end), (3, 5));
        assert_eq!(window.limit(), 2);
    }

    #[test]
    fn test_window_defaults_and_bounds() {
        let window = Window::new(250, None, None, None, None).unwrap();
        assert_eq!((window.start, window.end), (0, MAX_PAGE_SIZE));

        let window = Window::new(4, Some(OffsetCursor(10)), None, Some(5), None).unwrap();
        assert_eq!(window.limit(), 0);
        assert!(!window.has_next_page());

        assert!(Window::new(4, None, None, Some(MAX_PAGE_SIZE + 1), None).is_err());
    }

    #[test]
    fn test_window_after_largest_cursor_is_empty() {
        let raw = base64::encode(format!("{}{}", CURSOR_PREFIX, usize::MAX));
        let after = OffsetCursor::decode_cursor(&raw).unwrap();

        let window = Window::new(5, Some(after), None, Some(1), None).unwrap();

        assert_eq!((window.start, window.end), (5, 5));
        assert_eq!(window.limit(), 0);
        assert!(!window.has_next_page());
    }
}
