//! Named extension points with a built-in default and an optional override.
//!
//! A [`Hook`] is a plain `Copy` value that can live in a `const`. Hook sets
//! ([`LogHooks`](crate::LogHooks), [`AllocHooks`](crate::AllocHooks)) expose
//! their slots as associated consts, so once a set is picked as a type
//! parameter the resolved behavior is a compile-time constant and calling it
//! is a direct call. Nothing is looked up per invocation.
//!
//! # Examples
//!
//! ```rust
//! use linkhook::{Hook, Resolution};
//!
//! fn twice(x: u32) -> u32 { x * 2 }
//! fn thrice(x: u32) -> u32 { x * 3 }
//!
//! const SCALE: Hook<fn(u32) -> u32> = Hook::new("scale", twice);
//! const CUSTOM_SCALE: Hook<fn(u32) -> u32> = SCALE.with_override(thrice);
//!
//! assert_eq!(SCALE.resolve()(2), 4);
//! assert_eq!(CUSTOM_SCALE.resolve()(2), 6);
//! assert_eq!(CUSTOM_SCALE.resolution(), Resolution::Override);
//! ```

use colored::*;
use prettytable::{color, Attr, Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which implementation backs a hook slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// A caller-supplied implementation was wired in.
    Override,
    /// The slot's built-in default is used.
    Default,
    /// Optional slot with nothing wired. Invoking it panics.
    Absent,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Override => write!(f, "override"),
            Resolution::Default => write!(f, "default"),
            Resolution::Absent => write!(f, "absent"),
        }
    }
}

/// One extension point.
///
/// `F` is normally a function pointer type such as `fn(usize, usize)`.
#[derive(Clone, Copy)]
pub struct Hook<F: Copy + 'static> {
    name: &'static str,
    default: Option<F>,
    custom: Option<F>,
}

impl<F: Copy + 'static> Hook<F> {
    /// Slot with a built-in default.
    pub const fn new(name: &'static str, default: F) -> Self {
        Self {
            name,
            default: Some(default),
            custom: None,
        }
    }

    /// Optional slot without a default. Callers must check [`Hook::is_present`]
    /// before calling [`Hook::resolve`].
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            custom: None,
        }
    }

    /// The same slot with `custom` wired in place of the default.
    pub const fn with_override(self, custom: F) -> Self {
        Self {
            name: self.name,
            default: self.default,
            custom: Some(custom),
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn is_present(&self) -> bool {
        self.custom.is_some() || self.default.is_some()
    }

    pub const fn resolution(&self) -> Resolution {
        if self.custom.is_some() {
            Resolution::Override
        } else if self.default.is_some() {
            Resolution::Default
        } else {
            Resolution::Absent
        }
    }

    /// Returns the active behavior: the override when wired, the default otherwise.
    ///
    /// # Panics
    ///
    /// Panics when the slot is optional and nothing was wired. That is a
    /// composition defect, not a runtime condition.
    #[inline(always)]
    pub fn resolve(&self) -> F {
        match (self.custom, self.default) {
            (Some(f), _) | (None, Some(f)) => f,
            (None, None) => missing_hook(self.name),
        }
    }
}

impl<F: Copy + 'static> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("resolution", &self.resolution())
            .finish()
    }
}

#[cold]
#[inline(never)]
fn missing_hook(name: &'static str) -> ! {
    panic!("hook `{name}` was invoked but no implementation is wired; check is_present() first")
}

/// Name and resolution of one slot, as listed by a hook set's `wiring()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInfo {
    pub name: String,
    pub resolution: Resolution,
}

impl HookInfo {
    pub fn of<F: Copy + 'static>(hook: &Hook<F>) -> Self {
        Self {
            name: hook.name().to_string(),
            resolution: hook.resolution(),
        }
    }
}

impl fmt::Display for HookInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.resolution)
    }
}

/// Prints a table of slots and how each one resolved.
pub fn print_wiring(title: &str, wiring: &[HookInfo]) {
    let use_colors = std::env::var("NO_COLOR").is_err();

    let mut table = Table::new();
    let header_cells: Vec<Cell> = ["Hook", "Resolution"]
        .into_iter()
        .map(|header| {
            if use_colors {
                Cell::new(header)
                    .with_style(Attr::Bold)
                    .with_style(Attr::ForegroundColor(color::CYAN))
            } else {
                Cell::new(header).with_style(Attr::Bold)
            }
        })
        .collect();
    table.add_row(Row::new(header_cells));

    for info in wiring {
        table.add_row(Row::new(vec![
            Cell::new(&info.name),
            Cell::new(&info.resolution.to_string()),
        ]));
    }

    println!("{} {}", "[linkhook]".blue().bold(), title);
    table.printstd();
}
