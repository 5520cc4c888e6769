//! Caller resolution from stack-trace text
//!
//! The standard library only exposes a backtrace as text, so the immediate
//! caller is found by parsing that text into frames and skipping frames that
//! belong to the logging facility. Two line shapes are understood:
//!
//! - Rust backtraces: `  3: my_app::worker::Worker::do_work`
//!   (followed by `at src/worker.rs:10:5` lines, which are skipped)
//! - dotted traces: `com.example.Worker.doWork:42`

use std::backtrace::Backtrace;

/// Class and method of one stack frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerFrame {
    pub class_name: String,
    pub method_name: String,
}

impl CallerFrame {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }
}

/// Source of the current call stack, most recent call first
pub trait CallerResolver {
    /// All frames not belonging to the logging facility
    fn frames(&self) -> Vec<CallerFrame>;

    /// The nearest frame outside the logging facility
    ///
    /// Falls back to empty class and method names when nothing resolves.
    fn caller(&self) -> CallerFrame {
        self.frames().into_iter().next().unwrap_or_default()
    }
}

/// Classes of this crate that must never be reported as a caller
const FACILITY_CLASSES: &[&str] = &[
    concat!(module_path!(), "::BacktraceResolver"),
    concat!(module_path!(), "::CallerResolver"),
    crate::logger::LOGGER_CLASS,
];

/// Runtime crates whose frames precede or wrap every call
const RUNTIME_PREFIXES: &[&str] = &["std::", "core::", "alloc::", "backtrace::"];

/// Resolves callers from a freshly captured [`Backtrace`]
///
/// Frames from the standard library and from this crate's logger are
/// skipped. Inlined or stripped builds may yield no frames at all.
#[derive(Debug, Clone)]
pub struct BacktraceResolver {
    ignored: Vec<String>,
}

impl BacktraceResolver {
    pub fn new() -> Self {
        Self {
            ignored: FACILITY_CLASSES.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Also skip frames of `class_name`, e.g. an application's own logging wrapper
    pub fn ignore_class(mut self, class_name: impl Into<String>) -> Self {
        self.ignored.push(class_name.into());
        self
    }
}

impl Default for BacktraceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CallerResolver for BacktraceResolver {
    fn frames(&self) -> Vec<CallerFrame> {
        let trace = Backtrace::force_capture().to_string();
        parse_stack_trace(&trace, &self.ignored)
            .into_iter()
            .filter(|frame| !is_runtime_class(&frame.class_name))
            .collect()
    }
}

/// Resolves callers from a fixed stack-trace text
#[derive(Debug, Clone)]
pub struct StaticTraceResolver {
    trace: String,
    ignored: Vec<String>,
}

impl StaticTraceResolver {
    pub fn new(trace: impl Into<String>, ignored: &[&str]) -> Self {
        Self {
            trace: trace.into(),
            ignored: ignored.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CallerResolver for StaticTraceResolver {
    fn frames(&self) -> Vec<CallerFrame> {
        parse_stack_trace(&self.trace, &self.ignored)
    }
}

/// Parse stack-trace text into frames, most recent call first
///
/// Lines that do not look like a frame are skipped, as are frames whose
/// class (with generic arguments removed) equals one of `ignored`.
pub fn parse_stack_trace(trace: &str, ignored: &[String]) -> Vec<CallerFrame> {
    trace
        .lines()
        .filter_map(parse_frame_line)
        .filter(|frame| !is_ignored(&frame.class_name, ignored))
        .collect()
}

/// Parse a single line into a frame
fn parse_frame_line(line: &str) -> Option<CallerFrame> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("at ") {
        return None;
    }

    let symbol = strip_frame_index(line);
    if symbol.contains("::") {
        parse_rust_symbol(symbol)
    } else {
        parse_dotted_symbol(symbol)
    }
}

/// Drop a leading `12: ` frame number
fn strip_frame_index(line: &str) -> &str {
    match line.split_once(':') {
        Some((index, rest))
            if !index.is_empty()
                && index.bytes().all(|b| b.is_ascii_digit())
                && !rest.starts_with(':') =>
        {
            rest.trim_start()
        }
        _ => line,
    }
}

/// `crate::module::Type<T>::method::h0123456789abcdef`
fn parse_rust_symbol(symbol: &str) -> Option<CallerFrame> {
    let symbol = strip_symbol_hash(symbol);

    let mut segments = split_top_level(symbol);
    while segments.len() > 2 && segments.last() == Some(&"{{closure}}") {
        segments.pop();
    }
    let (method, class) = segments.split_last()?;
    if class.is_empty() || method.is_empty() || !is_identifier_like(method) {
        return None;
    }

    let class = class.join("::");
    Some(CallerFrame::new(self_type(&class), *method))
}

/// `a.b.Class.method:lineInfo`
fn parse_dotted_symbol(symbol: &str) -> Option<CallerFrame> {
    let (qualified, _line_info) = symbol.split_once(':')?;
    let qualified = qualified.trim();
    if qualified.is_empty() || qualified.contains(char::is_whitespace) {
        return None;
    }

    let (class, method) = qualified.rsplit_once('.')?;
    if class.is_empty() || method.is_empty() {
        return None;
    }

    Some(CallerFrame::new(class, method))
}

/// Remove the `::h<16 hex digits>` suffix of legacy-mangled symbols
fn strip_symbol_hash(symbol: &str) -> &str {
    if let Some((head, hash)) = symbol.rsplit_once("::h") {
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return head;
        }
    }
    symbol
}

/// Split on `::` outside of `<...>`
fn split_top_level(symbol: &str) -> Vec<&str> {
    let bytes = symbol.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&symbol[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&symbol[start..]);

    segments
}

/// `<T as Trait>` → `T`, `<[T]>` → `[T]`
fn self_type(class: &str) -> &str {
    let Some(inner) = class.strip_prefix('<').and_then(|c| c.strip_suffix('>')) else {
        return class;
    };

    let mut depth = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ' ' if depth == 0 && inner[i..].starts_with(" as ") => return &inner[..i],
            _ => {}
        }
    }
    inner
}

/// `Logger<S>` → `Logger`
fn strip_generics(class: &str) -> String {
    let mut out = String::with_capacity(class.len());
    let mut depth = 0usize;
    for c in class.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_identifier_like(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '{' | '}' | '<' | '>'))
}

fn is_ignored(class: &str, ignored: &[String]) -> bool {
    let class = strip_generics(class);
    ignored.iter().any(|ignored| *ignored == class)
}

fn is_runtime_class(class: &str) -> bool {
    RUNTIME_PREFIXES.iter().any(|prefix| class.starts_with(prefix))
}
