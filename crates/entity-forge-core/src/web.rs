// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Framework-neutral routing description for generated controllers.
//!
//! A generated `{Entity}Controller` exposes handler methods returning
//! [`Reply`] values and a `routes()` table that hosts mount in the web
//! framework of their choice:
//!
//! ```rust
//! use entity_forge_core::web::{Method, RouteTable};
//!
//! let table = RouteTable::new("/books")
//!     .route(Method::Get, "", "find_all")
//!     .route(Method::Get, "/{id}", "get_by_id");
//!
//! let route = table.find(Method::Get, "/books/{id}").unwrap();
//! assert_eq!(route.operation, "get_by_id");
//! ```

use std::fmt;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete
}

impl Method {
    /// Uppercase method name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE"
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Status(pub u16);

impl Status {
    /// `200 OK`
    pub const OK: Self = Self(200);
    /// `201 Created`
    pub const CREATED: Self = Self(201);
    /// `204 No Content`
    pub const NO_CONTENT: Self = Self(204);
    /// `400 Bad Request`
    pub const BAD_REQUEST: Self = Self(400);
    /// `404 Not Found`
    pub const NOT_FOUND: Self = Self(404);
    /// `409 Conflict`
    pub const CONFLICT: Self = Self(409);
    /// `422 Unprocessable Entity`
    pub const UNPROCESSABLE_ENTITY: Self = Self(422);
    /// `500 Internal Server Error`
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Check for a 2xx code.
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

/// Handler result: a status and an optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    /// Response status.
    pub status: Status,
    /// Response body.
    pub body:   Option<T>
}

impl<T> Reply<T> {
    /// `200` with a body.
    pub fn ok(body: T) -> Self {
        Self {
            status: Status::OK,
            body:   Some(body)
        }
    }

    /// `201` with a body.
    pub fn created(body: T) -> Self {
        Self {
            status: Status::CREATED,
            body:   Some(body)
        }
    }

    /// `204` without body.
    pub fn no_content() -> Self {
        Self::empty(Status::NO_CONTENT)
    }

    /// Any status without body.
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            body: None
        }
    }
}

/// One mounted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// HTTP method.
    pub method:    Method,
    /// Full path with `{param}` placeholders.
    pub path:      String,
    /// Controller method handling the route.
    pub operation: &'static str
}

/// Routes of one controller below a base path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    base:   String,
    routes: Vec<Route>
}

impl RouteTable {
    /// Empty table below `base`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base:   base.into(),
            routes: Vec::new()
        }
    }

    /// Add a route; `suffix` is appended to the base path.
    #[must_use]
    pub fn route(mut self, method: Method, suffix: &str, operation: &'static str) -> Self {
        let path = format!("{}{}", self.base, suffix).replace("//", "/");
        self.routes.push(Route {
            method,
            path,
            operation
        });
        self
    }

    /// Base path.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Mounted routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route registered for this method and templated path.
    #[must_use]
    pub fn find(&self, method: Method, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_paths_are_normalized() {
        let table = RouteTable::new("/tags/").route(Method::Get, "/{id}", "get_by_id");
        assert_eq!(table.routes()[0].path, "/tags/{id}");
    }

    #[test]
    fn replies() {
        assert_eq!(Reply::created(1).status, Status::CREATED);
        assert_eq!(Reply::<()>::no_content().body, None);
        assert!(Status::NO_CONTENT.is_success());
        assert!(!Status::NOT_FOUND.is_success());
    }

    #[test]
    fn method_display() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
