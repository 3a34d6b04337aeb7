//! Request descriptors consumed by permission rules.

use crate::model::author::Actor;

/// HTTP method of the incoming request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
    Other(String),
}

impl Method {
    /// Parses a wire method name, case-insensitively.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    /// Read-only methods: `GET`, `HEAD`, `OPTIONS`. Unknown methods are unsafe.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Other(value) => value.as_str(),
        }
    }
}

/// Named view action the request targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Modify,
    Delete,
    /// Any read-type action (`list`, `retrieve`, `assessments`, ...).
    Other(String),
}

impl Action {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "add" => Self::Add,
            "modify" => Self::Modify,
            "delete" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    /// `modify` and `delete` are the ownership-gated actions.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Modify | Self::Delete)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
            Self::Other(value) => value.as_str(),
        }
    }
}

/// Everything a rule needs to know about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub method: Method,
    pub action: Action,
    pub actor: Actor,
}

impl AccessRequest {
    pub fn new(method: Method, action: Action, actor: Actor) -> Self {
        Self {
            method,
            action,
            actor,
        }
    }

    /// Builds a request from wire strings, e.g. `("PATCH", "modify", actor)`.
    pub fn from_wire(method: &str, action: &str, actor: Actor) -> Self {
        Self::new(Method::parse(method), Action::parse(action), actor)
    }

    /// Safe method and no ownership-gated action.
    pub(crate) fn is_plain_read(&self) -> bool {
        self.method.is_safe() && !self.action.is_mutation()
    }
}
