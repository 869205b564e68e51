//! Segment-wise prefix tree for a single HTTP method.
//!
//! A registered path is split on `/` after its leading slash. Segments starting with `:` are
//! parameters, every other segment is a literal stored lowercased. Request segments are
//! percent-decoded before matching. Matching is case-insensitive for literals; parameter values
//! keep the casing the client sent.

use std::borrow::Cow;

use http::Method;
use percent_encoding::percent_decode_str;
use tracing::trace;

use crate::context::PathParams;
use crate::error::RegistrationError;
use crate::handler::Pipeline;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(path: &str, raw: &str) -> Result<Self, RegistrationError> {
        match raw.strip_prefix(':') {
            Some("") => Err(RegistrationError::invalid_path(path, "parameter name is empty")),
            Some(name) => Ok(Self::Param(name.to_owned())),
            None => Ok(Self::Literal(fold_case(raw))),
        }
    }

    /// Whether a route using `self` would accept every request `other` accepts.
    fn overlaps(&self, other: &Segment) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Param(_), Self::Param(_)) => true,
            _ => false,
        }
    }

    fn matches_literal(&self, request_segment: &str) -> bool {
        match self {
            Self::Literal(text) => text.chars().eq(request_segment.chars().flat_map(char::to_lowercase)),
            Self::Param(_) => false,
        }
    }
}

struct Node {
    segment: Segment,
    // present only on terminal nodes
    pipeline: Option<Pipeline>,
    children: Vec<Node>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("segment", &self.segment)
            .field("handlers", &self.pipeline.as_ref().map(|pipeline| pipeline.len()))
            .field("children", &self.children)
            .finish()
    }
}

impl Node {
    fn new(segment: Segment) -> Self {
        Self { segment, pipeline: None, children: Vec::new() }
    }

    fn has_terminal(&self, segments: &[Segment]) -> bool {
        match segments.split_first() {
            None => self.pipeline.is_some(),
            Some((first, rest)) => {
                self.children.iter().filter(|child| child.segment.overlaps(first)).any(|child| child.has_terminal(rest))
            }
        }
    }

    fn insert(&mut self, segments: &[Segment], pipeline: Pipeline) {
        let Some((first, rest)) = segments.split_first() else {
            self.pipeline = Some(pipeline);
            return;
        };

        let index = match self.children.iter().position(|child| child.segment == *first) {
            Some(index) => index,
            None => {
                self.children.push(Node::new(first.clone()));
                self.children.len() - 1
            }
        };
        self.children[index].insert(rest, pipeline);
    }

    fn find(&self, segments: &[Cow<'_, str>], captures: &mut Vec<(String, String)>) -> Option<&Pipeline> {
        let Some((first, rest)) = segments.split_first() else {
            return self.pipeline.as_ref();
        };

        // a wild request segment may descend into any child
        let wild = first.starts_with(':');

        for child in &self.children {
            if let Segment::Literal(_) = child.segment {
                if wild || child.segment.matches_literal(first) {
                    if let Some(pipeline) = child.find(rest, captures) {
                        return Some(pipeline);
                    }
                }
            }
        }

        for child in &self.children {
            if let Segment::Param(name) = &child.segment {
                captures.push((name.clone(), first.to_string()));
                if let Some(pipeline) = child.find(rest, captures) {
                    return Some(pipeline);
                }
                captures.pop();
            }
        }

        None
    }
}

/// The routes registered for one HTTP method.
#[derive(Debug)]
pub(crate) struct Tree {
    root: Node,
}

impl Default for Tree {
    fn default() -> Self {
        Self { root: Node::new(Segment::Literal(String::new())) }
    }
}

impl Tree {
    pub(crate) fn insert(&mut self, method: &Method, path: &str, pipeline: Pipeline) -> Result<(), RegistrationError> {
        let segments = split_route(path)?;

        if self.root.has_terminal(&segments) {
            return Err(RegistrationError::route_conflict(method, path));
        }

        self.root.insert(&segments, pipeline);
        trace!(%method, path, "route registered");
        Ok(())
    }

    pub(crate) fn resolve(&self, path: &str) -> Option<(Pipeline, PathParams)> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let segments = trimmed.split('/').map(|raw| percent_decode_str(raw).decode_utf8_lossy()).collect::<Vec<_>>();

        let mut captures = Vec::new();
        let pipeline = self.root.find(&segments, &mut captures)?;
        Some((Pipeline::clone(pipeline), PathParams::from(captures)))
    }
}

// per character, so registration and matching fold the same way
fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

fn split_route(path: &str) -> Result<Vec<Segment>, RegistrationError> {
    let Some(trimmed) = path.strip_prefix('/') else {
        return Err(RegistrationError::invalid_path(path, "path must start with '/'"));
    };

    trimmed.split('/').map(|raw| Segment::parse(path, raw)).collect()
}
