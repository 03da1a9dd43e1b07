//! Source mapping utilities for the rule preprocessor
//!
//! Tracks registered source files, hands out compact byte-offset locations for
//! tokens, and converts those locations back to line/column positions when a
//! diagnostic has to be rendered.

use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Sentinel for locations that do not belong to any file
    pub const fn invalid() -> Self {
        Self(u32::MAX)
    }

    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

/// A compact location: a byte offset inside one registered file.
///
/// Locations are plain values. Synthesised tokens borrow the location of a
/// real token, possibly nudged with [`SourceLocation::with_offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub file_id: FileId,
    pub offset: u32,
}

impl SourceLocation {
    pub const fn new(file_id: FileId, offset: u32) -> Self {
        Self { file_id, offset }
    }

    pub const fn unknown() -> Self {
        Self::new(FileId::invalid(), 0)
    }

    pub const fn is_valid(self) -> bool {
        self.file_id.is_valid()
    }

    /// Location shifted by `delta` bytes, clamped at the start of the file.
    pub fn with_offset(self, delta: i32) -> Self {
        let offset = if delta < 0 {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta as u32)
        };
        Self::new(self.file_id, offset)
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}", self.file_id.as_u32(), self.offset)
        } else {
            write!(f, "<unknown>")
        }
    }
}

/// Half-open range `[begin, end)` of locations in one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub const fn new(begin: SourceLocation, end: SourceLocation) -> Self {
        Self { begin, end }
    }

    pub fn is_valid(&self) -> bool {
        self.begin.is_valid() && self.begin.file_id == self.end.file_id
    }

    pub fn contains(&self, loc: SourceLocation) -> bool {
        self.is_valid()
            && loc.file_id == self.begin.file_id
            && loc.offset >= self.begin.offset
            && loc.offset < self.end.offset
    }

    pub fn len(&self) -> u32 {
        self.end.offset.saturating_sub(self.begin.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Line/column position in source code (both 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

/// A resolved span, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
    pub file_id: FileId,
}

impl SourceSpan {
    pub fn new(start: SourcePosition, end: SourcePosition, file_id: FileId) -> Self {
        Self {
            start,
            end,
            file_id,
        }
    }

    /// Span used for diagnostics that have no usable location
    pub fn unknown() -> Self {
        let pos = SourcePosition::new(0, 0, 0);
        Self::new(pos, pos, FileId::invalid())
    }
}

/// One registered source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    pub line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: String, content: String) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            name,
            content,
            line_starts,
        }
    }

    /// Text of a line, without its terminator (1-based line numbers)
    pub fn get_line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 || line_number > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_number - 1];
        let end = self
            .line_starts
            .get(line_number)
            .copied()
            .unwrap_or(self.content.len());
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Convert a byte offset to line and column (1-based)
    pub fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_index).copied().unwrap_or(0);
        (line_index + 1, offset - line_start + 1)
    }

    pub fn offset_to_position(&self, offset: usize) -> SourcePosition {
        let (line, column) = self.offset_to_line_col(offset);
        SourcePosition::new(line, column, offset)
    }

    /// Source text in `[begin, end)`, if inside the file
    pub fn slice(&self, begin: usize, end: usize) -> Option<&str> {
        self.content.get(begin..end)
    }
}

/// Owns every source file of one compilation
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: HashMap<FileId, SourceFile>,
    next_id: u32,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> FileId {
        let file_id = FileId(self.next_id);
        self.next_id += 1;
        self.files
            .insert(file_id, SourceFile::new(name.into(), content.into()));
        file_id
    }

    pub fn get_file(&self, file_id: FileId) -> Option<&SourceFile> {
        self.files.get(&file_id)
    }

    pub fn get_line(&self, file_id: FileId, line_number: usize) -> Option<&str> {
        self.get_file(file_id)?.get_line(line_number)
    }

    pub fn offset_to_line_col(&self, file_id: FileId, offset: usize) -> Option<(usize, usize)> {
        self.get_file(file_id)
            .map(|file| file.offset_to_line_col(offset))
    }

    /// Resolve a location into a line/column position
    pub fn position(&self, loc: SourceLocation) -> Option<SourcePosition> {
        self.get_file(loc.file_id)
            .map(|file| file.offset_to_position(loc.offset as usize))
    }

    /// Span covering `length` bytes starting at `loc`.
    ///
    /// Invalid locations resolve to [`SourceSpan::unknown`].
    pub fn span_for(&self, loc: SourceLocation, length: u32) -> SourceSpan {
        match self.get_file(loc.file_id) {
            Some(file) => {
                let start = loc.offset as usize;
                let end = start + length.max(1) as usize;
                SourceSpan::new(
                    file.offset_to_position(start),
                    file.offset_to_position(end),
                    loc.file_id,
                )
            }
            None => SourceSpan::unknown(),
        }
    }

    /// Span covering a whole range
    pub fn span_for_range(&self, range: SourceRange) -> SourceSpan {
        self.span_for(range.begin, range.len())
    }

    /// Human-readable `file:line:column` for a location
    pub fn describe(&self, loc: SourceLocation) -> String {
        match (self.get_file(loc.file_id), self.position(loc)) {
            (Some(file), Some(pos)) => format!("{}:{}:{}", file.name, pos.line, pos.column),
            _ => "<unknown>".to_string(),
        }
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    for (i, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            line_starts.push(i + 1);
        }
    }
    line_starts
}
