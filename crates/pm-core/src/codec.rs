//! Markdown metadata codec.
//!
//! A work item's README is the single source of truth. This module reads the
//! handful of tagged lines it cares about and rewrites them in place, line by
//! line, so that prose anywhere else in the document survives byte for byte.
//!
//! Recognised lines (labels are case-insensitive):
//!
//! ```text
//! # Feature: <title>
//! ## Status: <TOKEN>
//! ## Phase: <token>
//! ## Progress: <digits>%
//! ## Assigned To: <text>
//! ## <Name> Phase            (opens a task section)
//! - [ ] <task>  /  - [x] <task>
//! ```

use crate::types::{ItemStatus, ItemType, Phase};
use crate::workitem::{Task, WorkItem};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).unwrap())
        }
    };
}

pattern!(title_re, r"(?i)^#\s+(?:feature|bug|experiment):\s*(.+)$");
pattern!(heading_re, r"^#\s");
pattern!(status_re, r"(?i)^(\s*##\s*Status:[ \t]*)(\w+)");
pattern!(phase_re, r"(?i)^(\s*##\s*Phase:[ \t]*)(\w+)");
pattern!(progress_re, r"(?i)^(\s*##\s*Progress:[ \t]*)(\d+)%");
pattern!(assignee_re, r"(?i)^(\s*##\s*Assigned\s+To:[ \t]*)(.*)$");
pattern!(phase_section_re, r"(?i)^\s*##\s+(\w+)\s+Phase\b");
pattern!(task_re, r"^\s*-\s*\[([ xX])\]\s*(.+)$");
pattern!(unchecked_re, r"^(\s*-\s*)\[ \]");

// ---------------------------------------------------------------------------
// Line handling
// ---------------------------------------------------------------------------

/// A document split on `\n`. Each entry keeps any trailing `\r`, so joining
/// reproduces the input exactly.
struct Lines(Vec<String>);

impl Lines {
    fn split(text: &str) -> Self {
        Lines(text.split('\n').map(str::to_string).collect())
    }

    fn join(self) -> String {
        self.0.join("\n")
    }

    fn position(&self, re: &Regex) -> Option<usize> {
        self.0.iter().position(|l| re.is_match(body(l)))
    }

    /// Rewrite every line matching `re`. Returns whether any line matched.
    fn rewrite(&mut self, re: &Regex, f: impl Fn(&regex::Captures<'_>) -> String) -> bool {
        let mut hit = false;
        for line in &mut self.0 {
            let (text, eol) = split_eol(line);
            if let Some(caps) = re.captures(text) {
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                let replaced = format!("{}{}{}", &text[..whole.start], f(&caps), &text[whole.end..]);
                *line = format!("{replaced}{eol}");
                hit = true;
            }
        }
        hit
    }

    /// Insert `new_line` after line `idx`, separated by a blank line. With no
    /// anchor the line goes to the top of the document.
    fn insert_after(&mut self, idx: Option<usize>, new_line: String) {
        match idx {
            Some(i) => {
                self.0.insert(i + 1, new_line);
                self.0.insert(i + 1, String::new());
            }
            None => {
                self.0.insert(0, String::new());
                self.0.insert(0, new_line);
            }
        }
    }
}

fn split_eol(line: &str) -> (&str, &str) {
    match line.strip_suffix('\r') {
        Some(text) => (text, "\r"),
        None => (line, ""),
    }
}

fn body(line: &str) -> &str {
    split_eol(line).0
}

fn group<'t>(caps: &regex::Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

/// Parse a work-item document. Never fails: anything missing or malformed
/// falls back to the defaults of [`WorkItem::new`].
pub fn parse(name: &str, text: &str) -> WorkItem {
    let mut item = WorkItem::new(name);
    let mut status = None;
    let mut section = Phase::Discovery;

    for raw in text.split('\n') {
        let line = body(raw);

        if item.title.is_none() {
            if let Some(caps) = title_re().captures(line) {
                item.title = Some(group(&caps, 1).trim().to_string());
            }
        }

        if let Some(caps) = status_re().captures(line) {
            status = Some(ItemStatus::from_token(group(&caps, 2)));
        }

        if let Some(caps) = phase_re().captures(line) {
            let token = group(&caps, 2);
            match Phase::from_str(token) {
                Ok(phase) => item.phase = phase,
                Err(_) => tracing::warn!(item = %name, token, "ignoring unrecognized phase"),
            }
        }

        if let Some(caps) = progress_re().captures(line) {
            if let Ok(value) = group(&caps, 2).parse::<u32>() {
                item.progress = value.min(100) as u8;
            }
        }

        if let Some(caps) = assignee_re().captures(line) {
            item.assigned_to = group(&caps, 2).trim().to_string();
        }

        if let Some(caps) = phase_section_re().captures(line) {
            if let Ok(phase) = Phase::from_str(group(&caps, 1)) {
                section = phase;
            }
        }

        if let Some(caps) = task_re().captures(line) {
            item.tasks.push(Task {
                description: group(&caps, 2).trim().to_string(),
                completed: group(&caps, 1).eq_ignore_ascii_case("x"),
                phase: section,
                assigned_to: String::new(),
            });
        }
    }

    item.status = status.unwrap_or_else(ItemStatus::unknown);
    item.item_type = ItemType::from_name_prefix(name);
    for task in &mut item.tasks {
        task.assigned_to = item.assigned_to.clone();
    }
    item
}

/// Count `(total, completed)` task lines in document order.
pub fn count_tasks(text: &str) -> (usize, usize) {
    text.split('\n')
        .filter_map(|l| task_re().captures(body(l)))
        .fold((0, 0), |(total, done), caps| {
            let checked = group(&caps, 1).eq_ignore_ascii_case("x");
            (total + 1, done + usize::from(checked))
        })
}

// ---------------------------------------------------------------------------
// Rewrites
// ---------------------------------------------------------------------------

fn apply_status(lines: &mut Lines, status: &ItemStatus) {
    let hit = lines.rewrite(status_re(), |c| format!("{}{}", group(c, 1), status));
    if !hit {
        let anchor = lines
            .position(phase_re())
            .or_else(|| lines.position(heading_re()));
        lines.insert_after(anchor, format!("## Status: {status}"));
    }
}

fn apply_phase(lines: &mut Lines, phase: Phase) {
    let hit = lines.rewrite(phase_re(), |c| format!("{}{}", group(c, 1), phase));
    if !hit {
        let anchor = lines.position(heading_re());
        lines.insert_after(anchor, format!("## Phase: {phase}"));
    }
}

/// Replace the status token, or insert a status line after the phase line
/// (the first heading when there is none).
pub fn set_status(text: &str, status: &ItemStatus) -> String {
    let mut lines = Lines::split(text);
    apply_status(&mut lines, status);
    lines.join()
}

/// Replace the phase token, or insert a phase line after the first heading.
pub fn set_phase(text: &str, phase: Phase) -> String {
    let mut lines = Lines::split(text);
    apply_phase(&mut lines, phase);
    lines.join()
}

/// Both rewrites in one pass, so the caller writes the document once.
pub fn set_phase_and_status(text: &str, phase: Phase, status: &ItemStatus) -> String {
    let mut lines = Lines::split(text);
    apply_phase(&mut lines, phase);
    apply_status(&mut lines, status);
    lines.join()
}

/// Replace the percentage, or insert a progress line after the status line.
pub fn set_progress(text: &str, percent: u8) -> String {
    let mut lines = Lines::split(text);
    let hit = lines.rewrite(progress_re(), |c| format!("{}{percent}%", group(c, 1)));
    if !hit {
        let anchor = lines
            .position(status_re())
            .or_else(|| lines.position(heading_re()));
        lines.insert_after(anchor, format!("## Progress: {percent}%"));
    }
    lines.join()
}

/// Replace the assignee, or insert an assignee line after the phase line.
pub fn set_assignee(text: &str, assignee: &str) -> String {
    let mut lines = Lines::split(text);
    let hit = lines.rewrite(assignee_re(), |c| {
        let label = group(c, 1);
        if label.ends_with([' ', '\t']) {
            format!("{label}{assignee}")
        } else {
            format!("{label} {assignee}")
        }
    });
    if !hit {
        let anchor = lines
            .position(phase_re())
            .or_else(|| lines.position(status_re()))
            .or_else(|| lines.position(heading_re()));
        lines.insert_after(anchor, format!("## Assigned To: {assignee}"));
    }
    lines.join()
}

/// Check the `index`-th task line of the whole document (zero-based, checked
/// or not). Returns `None` when the document has fewer task lines.
pub fn complete_task(text: &str, index: usize) -> Option<String> {
    let mut lines = Lines::split(text);
    let line = lines
        .0
        .iter_mut()
        .filter(|l| task_re().is_match(body(l)))
        .nth(index)?;
    let (content, eol) = split_eol(line);
    let checked = unchecked_re().replace(content, "${1}[x]").into_owned();
    *line = format!("{checked}{eol}");
    Some(lines.join())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
