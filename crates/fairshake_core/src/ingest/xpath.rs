//! ElementTree-style path queries over `roxmltree` documents.
//!
//! Supported syntax: `.`, `..`, `*`, tag names, `//` (descendants),
//! and predicates `[@attr]`, `[@attr='value']`, `[tag]`, `[N]` (1-based).
//! Paths are relative to the element they are evaluated on; absolute paths
//! are rejected.

use roxmltree::Node;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    Absolute(String),
    UnbalancedPredicate(String),
    UnsupportedPredicate(String),
    TrailingSeparator(String),
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "path query must not be empty"),
            Self::Absolute(path) => write!(f, "absolute path `{path}` is not supported"),
            Self::UnbalancedPredicate(path) => write!(f, "unbalanced `[` in path `{path}`"),
            Self::UnsupportedPredicate(predicate) => {
                write!(f, "unsupported path predicate `[{predicate}]`")
            }
            Self::TrailingSeparator(path) => write!(f, "path `{path}` ends with a separator"),
        }
    }
}

impl Error for PathError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    SelfNode,
    Parent,
    Any,
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    HasAttribute(String),
    AttributeEquals(String, String),
    HasChild(String),
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// Compiled path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    source: String,
    steps: Vec<Step>,
}

impl ElementPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let source = path.trim();
        if source.is_empty() {
            return Err(PathError::Empty);
        }
        if source.starts_with('/') {
            return Err(PathError::Absolute(source.to_string()));
        }

        let segments = split_segments(source)?;
        let mut steps = Vec::new();
        let mut axis = Axis::Child;
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                if index + 1 == segments.len() {
                    return Err(PathError::TrailingSeparator(source.to_string()));
                }
                axis = Axis::Descendant;
                continue;
            }
            steps.push(parse_step(segment, axis, source)?);
            axis = Axis::Child;
        }

        Ok(Self {
            source: source.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// All matching elements below `start`, in document order.
    pub fn find_all<'a, 'input>(&self, start: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
        let mut current = vec![start];
        for step in &self.steps {
            let mut next = Vec::new();
            for context in &current {
                let candidates = step_candidates(*context, step);
                next.extend(apply_predicates(candidates, &step.predicates));
            }
            next.sort_by_key(|node| node.id().get_usize());
            next.dedup_by_key(|node| node.id().get_usize());
            current = next;
        }
        current
    }
}

fn split_segments(source: &str) -> Result<Vec<String>, PathError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    for ch in source.chars() {
        match (ch, quote) {
            ('\'' | '"', None) if depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            (c, Some(open)) if c == open => {
                quote = None;
                current.push(ch);
            }
            ('[', None) => {
                depth += 1;
                current.push(ch);
            }
            (']', None) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| PathError::UnbalancedPredicate(source.to_string()))?;
                current.push(ch);
            }
            ('/', None) if depth == 0 => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(PathError::UnbalancedPredicate(source.to_string()));
    }
    segments.push(current);
    Ok(segments)
}

fn parse_step(segment: &str, axis: Axis, source: &str) -> Result<Step, PathError> {
    let (name, rest) = match segment.find('[') {
        Some(index) => segment.split_at(index),
        None => (segment, ""),
    };

    let test = match name {
        "." => NodeTest::SelfNode,
        ".." => NodeTest::Parent,
        "*" => NodeTest::Any,
        tag => NodeTest::Tag(tag.to_string()),
    };

    let mut predicates = Vec::new();
    let mut remaining = rest;
    while !remaining.is_empty() {
        let inner_end = remaining
            .find(']')
            .ok_or_else(|| PathError::UnbalancedPredicate(source.to_string()))?;
        predicates.push(parse_predicate(&remaining[1..inner_end])?);
        remaining = &remaining[inner_end + 1..];
        if !remaining.is_empty() && !remaining.starts_with('[') {
            return Err(PathError::UnbalancedPredicate(source.to_string()));
        }
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn parse_predicate(raw: &str) -> Result<Predicate, PathError> {
    let predicate = raw.trim();
    if let Some(attribute) = predicate.strip_prefix('@') {
        return match attribute.split_once('=') {
            Some((name, value)) => {
                let value = value.trim();
                let unquoted = value
                    .strip_prefix('\'')
                    .and_then(|v| v.strip_suffix('\''))
                    .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                    .ok_or_else(|| PathError::UnsupportedPredicate(predicate.to_string()))?;
                Ok(Predicate::AttributeEquals(
                    name.trim().to_string(),
                    unquoted.to_string(),
                ))
            }
            None => Ok(Predicate::HasAttribute(attribute.trim().to_string())),
        };
    }
    if let Ok(position) = predicate.parse::<usize>() {
        if position == 0 {
            return Err(PathError::UnsupportedPredicate(predicate.to_string()));
        }
        return Ok(Predicate::Position(position));
    }
    if !predicate.is_empty()
        && predicate
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Ok(Predicate::HasChild(predicate.to_string()));
    }
    Err(PathError::UnsupportedPredicate(predicate.to_string()))
}

fn step_candidates<'a, 'input>(context: Node<'a, 'input>, step: &Step) -> Vec<Node<'a, 'input>> {
    match (&step.test, step.axis) {
        (NodeTest::SelfNode, Axis::Child) => vec![context],
        (NodeTest::SelfNode, Axis::Descendant) => context
            .descendants()
            .filter(|node| node.is_element())
            .collect(),
        (NodeTest::Parent, _) => context
            .parent()
            .filter(|node| node.is_element())
            .into_iter()
            .collect(),
        (test, Axis::Child) => context
            .children()
            .filter(|node| matches_test(*node, test))
            .collect(),
        (test, Axis::Descendant) => context
            .descendants()
            .skip(1)
            .filter(|node| matches_test(*node, test))
            .collect(),
    }
}

fn matches_test(node: Node<'_, '_>, test: &NodeTest) -> bool {
    if !node.is_element() {
        return false;
    }
    match test {
        NodeTest::Any => true,
        NodeTest::Tag(tag) => node.tag_name().name() == tag,
        NodeTest::SelfNode | NodeTest::Parent => false,
    }
}

fn apply_predicates<'a, 'input>(
    mut nodes: Vec<Node<'a, 'input>>,
    predicates: &[Predicate],
) -> Vec<Node<'a, 'input>> {
    for predicate in predicates {
        nodes = match predicate {
            Predicate::Position(position) => nodes
                .into_iter()
                .filter(|node| sibling_position(*node) == Some(*position))
                .collect(),
            Predicate::HasAttribute(name) => nodes
                .into_iter()
                .filter(|node| node.has_attribute(name.as_str()))
                .collect(),
            Predicate::AttributeEquals(name, value) => nodes
                .into_iter()
                .filter(|node| node.attribute(name.as_str()) == Some(value.as_str()))
                .collect(),
            Predicate::HasChild(tag) => nodes
                .into_iter()
                .filter(|node| {
                    node.children()
                        .any(|child| child.is_element() && child.tag_name().name() == tag)
                })
                .collect(),
        };
    }
    nodes
}

/// 1-based index of `node` among its parent's children sharing its tag.
fn sibling_position(node: Node<'_, '_>) -> Option<usize> {
    let parent = node.parent()?;
    let tag = node.tag_name();
    parent
        .children()
        .filter(|sibling| sibling.is_element() && sibling.tag_name() == tag)
        .position(|sibling| sibling == node)
        .map(|index| index + 1)
}
