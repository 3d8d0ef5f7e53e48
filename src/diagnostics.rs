//! Human-readable compile diagnostics.
//!
//! Each variant carries the structured facts of one failure. `Display`
//! renders the message; [`with_location`] appends the source position.

use crate::error::{ErrorKind, Location};
use crate::metadata::{OptionError, ValueType};

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    UnknownComponent {
        name: String,
    },
    MissingOption {
        node: String,
        component: String,
        option: String,
    },
    UnknownOptions {
        component: String,
        keys: Vec<String>,
    },
    InvalidOption {
        node: String,
        component: String,
        source: OptionError,
    },
    UnknownHandle {
        handle: String,
        node: String,
        component: String,
        valid: Vec<String>,
    },
    TupleUnpack {
        component: String,
        outputs: Vec<String>,
        requested: usize,
    },
    IncompatibleType {
        found: ValueType,
        expected: ValueType,
        input: String,
        node: String,
    },
    TimeframeRequired {
        node: String,
        component: String,
    },
    DuplicateNode {
        id: String,
    },
    Redefinition {
        name: String,
    },
    UnknownVariable {
        name: String,
    },
    Unsupported {
        construct: String,
    },
    InvalidInput {
        node: String,
        component: String,
        reason: String,
    },
    AmbiguousOutput {
        name: String,
        component: String,
        outputs: Vec<String>,
    },
    InvalidSpecial {
        parameter: String,
        reason: String,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Diagnostic::UnknownComponent { .. } => ErrorKind::UnknownTransform,
            Diagnostic::MissingOption { .. } => ErrorKind::MissingRequiredOption,
            Diagnostic::UnknownOptions { .. } => ErrorKind::UnknownOptions,
            Diagnostic::InvalidOption { .. } => ErrorKind::InvalidOptionType,
            Diagnostic::UnknownHandle { .. } => ErrorKind::UnknownOutputHandle,
            Diagnostic::TupleUnpack { .. } => ErrorKind::TupleArityMismatch,
            Diagnostic::IncompatibleType { .. } => ErrorKind::IncompatibleOperandType,
            Diagnostic::TimeframeRequired { .. } => ErrorKind::TimeframeRequiredButAbsent,
            Diagnostic::DuplicateNode { .. } | Diagnostic::Redefinition { .. } => {
                ErrorKind::DuplicateNodeId
            }
            Diagnostic::UnknownVariable { .. } => ErrorKind::UnknownVariable,
            Diagnostic::Unsupported { .. } => ErrorKind::UnsupportedSyntax,
            Diagnostic::InvalidInput { .. } => ErrorKind::InvalidInput,
            Diagnostic::AmbiguousOutput { .. } => ErrorKind::AmbiguousOutput,
            Diagnostic::InvalidSpecial { .. } => ErrorKind::InvalidSpecialParameter,
        }
    }

    /// The graph node the diagnostic is about, when one exists.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Diagnostic::MissingOption { node, .. }
            | Diagnostic::InvalidOption { node, .. }
            | Diagnostic::UnknownHandle { node, .. }
            | Diagnostic::IncompatibleType { node, .. }
            | Diagnostic::TimeframeRequired { node, .. }
            | Diagnostic::InvalidInput { node, .. } => Some(node),
            Diagnostic::DuplicateNode { id } => Some(id),
            _ => None,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownComponent { name } => {
                writeln!(f, "Unknown component '{name}()'")?;
                writeln!(f, "{INDENT}This component is not registered or does not exist.")?;
                write!(
                    f,
                    "{INDENT}Check the component name for typos or verify it's included in the system."
                )
            }
            Diagnostic::MissingOption {
                node,
                component,
                option,
            } => write!(
                f,
                "Node '{node}' of type '{component}' is missing required option '{option}'"
            ),
            Diagnostic::UnknownOptions { component, keys } => {
                write!(f, "Unknown options for '{component}()': {}", format_list(keys))
            }
            Diagnostic::InvalidOption {
                node,
                component,
                source,
            } => write!(f, "Node '{node}' of type '{component}': {source}"),
            Diagnostic::UnknownHandle {
                handle,
                node,
                component,
                valid,
            } => {
                writeln!(f, "Unknown handle '{handle}' on node '{node}'")?;
                writeln!(f, "{INDENT}Component: {component}()")?;
                if valid.is_empty() {
                    write!(f, "{INDENT}This component has no accessible handles")
                } else {
                    write!(f, "{INDENT}Valid handles: {}", format_list(valid))
                }
            }
            Diagnostic::TupleUnpack {
                component,
                outputs,
                requested,
            } => {
                writeln!(f, "Tuple unpacking error for component '{component}()'")?;
                write!(
                    f,
                    "{INDENT}Component returns: {}",
                    counted(outputs.len(), "output")
                )?;
                if !outputs.is_empty() {
                    write!(f, " [{}]", format_list(outputs))?;
                }
                writeln!(f)?;
                write!(
                    f,
                    "{INDENT}Trying to unpack into: {}",
                    counted(*requested, "variable")
                )
            }
            Diagnostic::IncompatibleType {
                found,
                expected,
                input,
                node,
            } => write!(
                f,
                "Cannot use type {found} as {expected} for input '{input}' of '{node}'"
            ),
            Diagnostic::TimeframeRequired { node, component } => write!(
                f,
                "Node '{node}' of type '{component}' requires a timeframe but none could be resolved"
            ),
            Diagnostic::DuplicateNode { id } => write!(f, "Node id '{id}' is already defined"),
            Diagnostic::Redefinition { name } => {
                write!(f, "Variable '{name}' is already bound")
            }
            Diagnostic::UnknownVariable { name } => write!(f, "Unknown variable '{name}'"),
            Diagnostic::Unsupported { construct } => {
                write!(f, "Unsupported syntax: {construct}")
            }
            Diagnostic::InvalidInput {
                node,
                component,
                reason,
            } => write!(f, "Invalid input for node '{node}' of type '{component}': {reason}"),
            Diagnostic::AmbiguousOutput {
                name,
                component,
                outputs,
            } => write!(
                f,
                "'{name}' refers to '{component}()' which returns {} [{}]; select one with '{name}.<handle>'",
                counted(outputs.len(), "output"),
                format_list(outputs)
            ),
            Diagnostic::InvalidSpecial { parameter, reason } => {
                write!(f, "Invalid '{parameter}' parameter: {reason}")
            }
        }
    }
}

/// Append the source position when the parser supplied one.
pub fn with_location(message: &str, location: Option<Location>) -> String {
    match location {
        Some(location) => format!("{message} ({location})"),
        None => message.to_string(),
    }
}

pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
